//! Regression models and the strategy abstraction that selects between them.
//!
//! Every regressor implements [`Regressor`]; a [`RegressionStrategy`] wraps one
//! behind a standardizing [`Pipeline`] so the trainer stays model-agnostic.

pub mod forest;
pub mod linear;
pub mod scaler;
pub mod strategy;
pub mod tree;

pub use forest::*;
pub use linear::*;
pub use scaler::*;
pub use strategy::*;
pub use tree::*;
