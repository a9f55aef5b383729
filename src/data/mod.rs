//! Built-in data sources that do not read a file.

pub mod sample;

pub use sample::*;
