//! Model training and evaluation.
//!
//! - `metrics`: MAE / MSE / R²
//! - `trainer`: feature join, chronological split, train / predict

pub mod metrics;
pub mod trainer;

pub use metrics::*;
pub use trainer::*;
