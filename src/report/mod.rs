//! Terminal reports: ticker lists, graph metrics, training and prediction tables.

pub mod format;

pub use format::*;
