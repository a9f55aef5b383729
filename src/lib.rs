//! `graph-forecast` library crate.
//!
//! The binary (`gforecast`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the graph, feature and model layers can be reused on their own
//!
//! Data flow: price table -> correlation graph -> per-ticker graph metrics ->
//! join with prices -> regression strategy -> train / predict.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod graph;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
