//! Top-level application orchestration.
//!
//! `src/main.rs` only maps the result to an exit code; this module:
//! - installs the tracing subscriber (stderr, so stdout stays the report)
//! - parses CLI arguments and layers them over the environment config
//! - runs the shared pipeline
//! - prints reports/plots and writes optional exports

use clap::Parser;

use crate::cli::{Cli, Command, DataArgs, PredictArgs, TrainArgs};
use crate::data::{SyntheticConfig, SyntheticProcessor};
use crate::domain::ForecastConfig;
use crate::error::AppError;
use crate::io::{DataProcessor, build_processor};
use crate::models::{ForestConfig, RegressionStrategy, strategy_for};

pub mod pipeline;

/// Entry point for the `gforecast` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();
    let cli = Cli::parse();

    let config = config_from_args(&cli.data, ForecastConfig::from_env()?)?;
    let processor = processor_from_args(&cli.data, &config)?;

    match cli.command {
        Command::Tickers => handle_tickers(processor.as_ref()),
        Command::Graph => handle_graph(processor.as_ref(), &config),
        Command::Train(args) => handle_train(processor.as_ref(), &cli.data, &config, args),
        Command::Predict(args) => handle_predict(processor.as_ref(), &cli.data, &config, args),
    }
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    // `try_init` so a second call (tests, embedding) is a no-op.
    let _ = if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init()
    };
}

/// Apply CLI overrides on top of `base` and validate the result.
pub fn config_from_args(args: &DataArgs, base: ForecastConfig) -> Result<ForecastConfig, AppError> {
    let mut config = base;
    if let Some(path) = &args.csv {
        config.csv_path = path.clone();
    }
    if let Some(t) = args.threshold {
        config.correlation_threshold = t;
    }
    if let Some(d) = args.train_end {
        config.train_end = d;
    }
    if let Some(d) = args.eval_start {
        config.eval_start = d;
    }
    if let Some(d) = args.eval_end {
        config.eval_end = d;
    }
    config.validate()?;
    Ok(config)
}

fn processor_from_args(args: &DataArgs, config: &ForecastConfig) -> Result<Box<dyn DataProcessor>, AppError> {
    if args.synthetic {
        return Ok(Box::new(SyntheticProcessor::new(SyntheticConfig::with_seed(args.seed))));
    }
    build_processor("stocks", &config.csv_path)
}

fn strategy_from_args(args: &DataArgs) -> Box<dyn RegressionStrategy> {
    let mut forest = ForestConfig {
        seed: args.seed,
        ..ForestConfig::default()
    };
    if let Some(n) = args.trees {
        forest.n_trees = n;
    }
    strategy_for(args.strategy, forest)
}

fn handle_tickers(processor: &dyn DataProcessor) -> Result<(), AppError> {
    let loaded = processor.load()?;
    let tickers = loaded.table.tickers();
    if tickers.is_empty() {
        return Err(AppError::EmptyResult("No tickers found.".to_string()));
    }
    print!("{}", crate::report::format_tickers(&tickers));
    Ok(())
}

fn handle_graph(processor: &dyn DataProcessor, config: &ForecastConfig) -> Result<(), AppError> {
    let stage = pipeline::run_graph_stage(processor, config)?;

    println!("{}", crate::report::format_load_report(&stage.source, &stage.report));
    println!(
        "{}",
        crate::report::format_graph_summary(&stage.graph.summary(), config.correlation_threshold)
    );
    print!("{}", crate::report::format_feature_table(&stage.features));
    Ok(())
}

fn handle_train(
    processor: &dyn DataProcessor,
    args: &DataArgs,
    config: &ForecastConfig,
    train: TrainArgs,
) -> Result<(), AppError> {
    let run = pipeline::run_pipeline(processor, strategy_from_args(args), config)?;
    let metrics = run.forecaster.metrics().ok_or(AppError::NotFitted)?;

    println!("{}", crate::report::format_load_report(&run.stage.source, &run.stage.report));
    print!(
        "{}",
        crate::report::format_training_summary(run.forecaster.strategy_kind(), config, &metrics)
    );

    if let Some(path) = &train.export_metrics {
        crate::io::write_metrics_json(path, run.forecaster.strategy_kind(), config, metrics)?;
        tracing::info!(path = %path.display(), "wrote metrics");
    }
    Ok(())
}

fn handle_predict(
    processor: &dyn DataProcessor,
    args: &DataArgs,
    config: &ForecastConfig,
    predict: PredictArgs,
) -> Result<(), AppError> {
    let run = pipeline::run_pipeline(processor, strategy_from_args(args), config)?;
    let prediction = run
        .forecaster
        .predict_ticker(&run.stage.table, &run.stage.features, &predict.ticker)?;

    if let Some(metrics) = run.forecaster.metrics() {
        println!(
            "{}",
            crate::report::format_training_summary(run.forecaster.strategy_kind(), config, &metrics)
        );
    }
    print!("{}", crate::report::format_prediction_table(&predict.ticker, &prediction));

    if !predict.no_plot {
        println!();
        print!(
            "{}",
            crate::plot::render_prediction_plot(&prediction, predict.width, predict.height)
        );
    }

    if let Some(path) = &predict.export {
        crate::io::write_prediction_csv(path, &predict.ticker, &prediction)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn cli_overrides_win_over_base_config() {
        let cli = Cli::parse_from(["gforecast", "--threshold", "0.8", "--train-end", "2024-06-30", "graph"]);
        let base = ForecastConfig {
            correlation_threshold: 0.5,
            ..ForecastConfig::default()
        };
        let config = config_from_args(&cli.data, base).unwrap();
        assert_eq!(config.correlation_threshold, 0.8);
        assert_eq!(config.train_end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(config.eval_end, ForecastConfig::default().eval_end);
    }

    #[test]
    fn overrides_are_validated() {
        let cli = Cli::parse_from([
            "gforecast",
            "--eval-start",
            "2025-06-01",
            "--eval-end",
            "2025-01-01",
            "train",
        ]);
        let err = config_from_args(&cli.data, ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }

    #[test]
    fn synthetic_flag_selects_generator() {
        let cli = Cli::parse_from(["gforecast", "--synthetic", "--seed", "9", "tickers"]);
        let p = processor_from_args(&cli.data, &ForecastConfig::default()).unwrap();
        assert!(p.describe().contains("seed 9"));
    }
}
