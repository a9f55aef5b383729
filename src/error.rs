use chrono::NaiveDate;
use thiserror::Error;

/// Error taxonomy for the forecasting pipeline.
///
/// Every variant is a deterministic logic error: retrying with the same inputs
/// fails the same way, so nothing here is retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Unknown tag, missing columns, duplicated rows, bad configuration.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid graph type '{0}'")]
    InvalidGraphType(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("No data found for period {start}..={end}")]
    NoDataForPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Model pipeline is not fitted; call train first")]
    NotFitted,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Numeric error: {0}")]
    Numeric(String),
}

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    InvalidRange,
    EmptyResult,
    NotFitted,
    Io,
    Numeric,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidGraphType(_) => ErrorKind::InvalidInput,
            AppError::InvalidRange { .. } => ErrorKind::InvalidRange,
            AppError::EmptyResult(_) | AppError::NoDataForPeriod { .. } => ErrorKind::EmptyResult,
            AppError::NotFitted => ErrorKind::NotFitted,
            AppError::Io(_) => ErrorKind::Io,
            AppError::Numeric(_) => ErrorKind::Numeric,
        }
    }

    /// Process exit code used by the `gforecast` binary.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::InvalidRange | ErrorKind::Io => 2,
            ErrorKind::EmptyResult => 3,
            ErrorKind::NotFitted | ErrorKind::Numeric => 4,
        }
    }
}
