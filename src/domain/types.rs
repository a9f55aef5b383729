//! Shared domain types.
//!
//! These are plain data carriers passed between the store, the graph layer,
//! the trainer and the reports. Derived artifacts (graph features, merged rows)
//! are recomputed per run and never persisted.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One OHLCV observation for a ticker on a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Structural metrics of one ticker in the correlation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphFeatureRow {
    pub ticker: String,
    pub degree: f64,
    pub closeness: f64,
    pub betweenness: f64,
    pub clustering: f64,
}

/// Names of the regression inputs, in the order of [`MergedFeatureRow::features`].
pub const FEATURE_COLUMNS: [&str; 8] = [
    "open",
    "high",
    "low",
    "volume",
    "degree",
    "closeness",
    "betweenness",
    "clustering",
];

/// A price record joined with its ticker's graph features.
///
/// Graph features are broadcast identically to every date of the ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedFeatureRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub degree: f64,
    pub closeness: f64,
    pub betweenness: f64,
    pub clustering: f64,
    /// Regression target.
    pub close: f64,
}

impl MergedFeatureRow {
    pub fn new(record: &PriceRecord, graph: &GraphFeatureRow) -> Self {
        Self {
            ticker: record.ticker.clone(),
            date: record.date,
            open: record.open,
            high: record.high,
            low: record.low,
            volume: record.volume,
            degree: graph.degree,
            closeness: graph.closeness,
            betweenness: graph.betweenness,
            clustering: graph.clustering,
            close: record.close,
        }
    }

    /// Feature vector laid out as [`FEATURE_COLUMNS`].
    pub fn features(&self) -> [f64; 8] {
        [
            self.open,
            self.high,
            self.low,
            self.volume,
            self.degree,
            self.closeness,
            self.betweenness,
            self.clustering,
        ]
    }
}

/// Validation diagnostics computed on the held-out slice of the training window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainMetrics {
    pub mae: f64,
    pub mse: f64,
    pub r2: f64,
    /// Rows the pipeline was fitted on.
    pub n_fit: usize,
    /// Rows in the held-out validation slice.
    pub n_validation: usize,
}

/// Evaluation-window output handed to presentation: aligned by row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub mae: f64,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Which regression algorithm the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Ordinary least squares.
    Linear,
    /// Bagged regression trees.
    RandomForest,
}

impl StrategyKind {
    /// Tag understood by [`crate::models::build_strategy`].
    pub fn tag(self) -> &'static str {
        match self {
            StrategyKind::Linear => "linear",
            StrategyKind::RandomForest => "random_forest",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            StrategyKind::Linear => "Linear Regression",
            StrategyKind::RandomForest => "Random Forest",
        }
    }
}
