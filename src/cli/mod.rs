//! Command-line parsing for `gforecast`.
//!
//! Argument parsing stays here; dispatch lives in `crate::app` and the
//! modeling code never sees clap types.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::StrategyKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "gforecast",
    version,
    about = "Stock close forecaster with correlation-graph features"
)]
pub struct Cli {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the sorted ticker list.
    Tickers,
    /// Build the correlation graph and print per-ticker graph metrics.
    Graph,
    /// Train the selected strategy and print validation metrics.
    Train(TrainArgs),
    /// Train, then predict the evaluation window for one ticker.
    Predict(PredictArgs),
}

/// Data source, strategy and config overrides shared by every command.
///
/// Unset overrides fall back to `GFORECAST_*` environment variables, then to
/// built-in defaults.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Price CSV (Date, Ticker, Open, High, Low, Close, Volume).
    #[arg(long, global = true)]
    pub csv: Option<PathBuf>,

    /// Use generated prices instead of a CSV.
    #[arg(long, global = true, conflicts_with = "csv")]
    pub synthetic: bool,

    /// Seed for synthetic prices and the random forest.
    #[arg(long, global = true, default_value_t = 42)]
    pub seed: u64,

    /// Regression strategy.
    #[arg(long, global = true, value_enum, default_value_t = StrategyKind::Linear)]
    pub strategy: StrategyKind,

    /// Edge when close correlation is strictly above this value.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Training rows are strictly before this date (YYYY-MM-DD).
    #[arg(long, global = true)]
    pub train_end: Option<NaiveDate>,

    /// First date of the evaluation window (inclusive).
    #[arg(long, global = true)]
    pub eval_start: Option<NaiveDate>,

    /// Last date of the evaluation window (inclusive).
    #[arg(long, global = true)]
    pub eval_end: Option<NaiveDate>,

    /// Number of trees for the random forest.
    #[arg(long, global = true)]
    pub trees: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Write validation metrics and the effective config as JSON.
    #[arg(long = "export-metrics")]
    pub export_metrics: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Ticker to predict.
    #[arg(short = 't', long)]
    pub ticker: String,

    /// Write the aligned actual/predicted series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Skip the ASCII chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
