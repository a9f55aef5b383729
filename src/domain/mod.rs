//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - price observations (`PriceRecord`) and derived rows (`GraphFeatureRow`, `MergedFeatureRow`)
//! - training / prediction outputs (`TrainMetrics`, `Prediction`)
//! - run configuration (`ForecastConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
