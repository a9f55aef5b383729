//! Numerical utilities: summary statistics, correlation, least squares.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
