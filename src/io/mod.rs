//! Input/output helpers.
//!
//! - CSV ingest + row cleaning (`ingest`)
//! - the price table and its sources (`store`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;
pub mod store;

pub use export::*;
pub use ingest::*;
pub use store::*;
