//! Shared forecasting workflow used by every CLI command.
//!
//! load -> correlation graph -> graph features -> train
//!
//! Front-ends only present the returned artifacts.

use crate::domain::ForecastConfig;
use crate::error::AppError;
use crate::fit::Forecaster;
use crate::graph::{FeatureTable, TickerGraph, build_graph, extract_features};
use crate::io::{DataProcessor, LoadReport, PriceTable};
use crate::models::RegressionStrategy;

/// Graph method used by the pipeline.
pub const GRAPH_METHOD: &str = "correlation";

/// Table plus everything derived from it, before any model is fitted.
#[derive(Debug, Clone)]
pub struct GraphStage {
    pub source: String,
    pub table: PriceTable,
    pub report: LoadReport,
    pub graph: TickerGraph,
    pub features: FeatureTable,
}

/// All computed outputs of a full run.
#[derive(Debug)]
pub struct RunOutput {
    pub stage: GraphStage,
    /// Fitted; `predict` can be called directly.
    pub forecaster: Forecaster,
}

/// Load the table and derive the graph and its features.
pub fn run_graph_stage(processor: &dyn DataProcessor, config: &ForecastConfig) -> Result<GraphStage, AppError> {
    config.validate()?;

    let loaded = processor.load()?;
    let graph = build_graph(GRAPH_METHOD, &loaded.table, config.correlation_threshold)?;
    let features = extract_features(&graph);

    Ok(GraphStage {
        source: processor.describe(),
        table: loaded.table,
        report: loaded.report,
        graph,
        features,
    })
}

/// Execute the full pipeline and return a trained forecaster with its inputs.
pub fn run_pipeline(
    processor: &dyn DataProcessor,
    strategy: Box<dyn RegressionStrategy>,
    config: &ForecastConfig,
) -> Result<RunOutput, AppError> {
    let stage = run_graph_stage(processor, config)?;

    let mut forecaster = Forecaster::new(strategy, config.clone());
    forecaster.train(&stage.table, &stage.features)?;

    Ok(RunOutput { stage, forecaster })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticConfig, SyntheticProcessor};
    use crate::error::ErrorKind;
    use crate::models::LinearRegressionStrategy;

    #[test]
    fn synthetic_run_trains_and_predicts() {
        let processor = SyntheticProcessor::new(SyntheticConfig::with_seed(5));
        let config = ForecastConfig::default();
        let run = run_pipeline(&processor, Box::new(LinearRegressionStrategy), &config).unwrap();

        assert_eq!(run.stage.features.len(), run.stage.graph.node_count());
        assert!(run.forecaster.is_fitted());
        let p = run.forecaster.predict(&run.stage.table, &run.stage.features).unwrap();
        assert!(!p.is_empty());
        assert!(p.mae.is_finite());
    }

    #[test]
    fn invalid_config_fails_before_loading() {
        let processor = SyntheticProcessor::default();
        let config = ForecastConfig {
            correlation_threshold: 2.0,
            ..ForecastConfig::default()
        };
        let err = run_graph_stage(&processor, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
