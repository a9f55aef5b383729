//! Run configuration.
//!
//! All calendar boundaries and the correlation cutoff live here instead of being
//! scattered through the pipeline. Values are layered:
//!
//! 1. documented defaults ([`ForecastConfig::default`])
//! 2. environment (`.env` is honoured via `dotenvy`)
//! 3. CLI flags (applied by `app`)

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default edge cutoff for the correlation graph (strictly greater than).
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.6;

/// Fraction of the ordered training rows held out for validation.
pub const DEFAULT_VALIDATION_FRACTION: f64 = 0.2;

/// Environment variable names.
pub const ENV_CSV: &str = "GFORECAST_CSV";
pub const ENV_THRESHOLD: &str = "GFORECAST_THRESHOLD";
pub const ENV_TRAIN_END: &str = "GFORECAST_TRAIN_END";
pub const ENV_EVAL_START: &str = "GFORECAST_EVAL_START";
pub const ENV_EVAL_END: &str = "GFORECAST_EVAL_END";

/// Tunables shared by the graph builder and the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Source CSV (ignored when running on synthetic data).
    pub csv_path: PathBuf,
    /// Edges are added when correlation is strictly above this value.
    pub correlation_threshold: f64,
    /// Training rows have `date < train_end`.
    pub train_end: NaiveDate,
    /// Inclusive evaluation window start.
    pub eval_start: NaiveDate,
    /// Inclusive evaluation window end.
    pub eval_end: NaiveDate,
    /// Held-out share of the training rows (taken from the end).
    pub validation_fraction: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("stocks_data_2020_2025.csv"),
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            train_end: ymd(2025, 1, 1),
            eval_start: ymd(2025, 1, 1),
            eval_end: ymd(2025, 5, 31),
            validation_fraction: DEFAULT_VALIDATION_FRACTION,
        }
    }
}

impl ForecastConfig {
    /// Defaults overridden by `GFORECAST_*` variables from the process environment
    /// (and a `.env` file, if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ForecastConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_CSV) {
            config.csv_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_THRESHOLD) {
            config.correlation_threshold = raw.trim().parse().map_err(|_| {
                AppError::InvalidInput(format!("{ENV_THRESHOLD} must be a number, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_TRAIN_END) {
            config.train_end = parse_config_date(ENV_TRAIN_END, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EVAL_START) {
            config.eval_start = parse_config_date(ENV_EVAL_START, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EVAL_END) {
            config.eval_end = parse_config_date(ENV_EVAL_END, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.correlation_threshold.is_finite()
            && (-1.0..1.0).contains(&self.correlation_threshold))
        {
            return Err(AppError::InvalidInput(format!(
                "correlation threshold must lie in [-1, 1), got {}",
                self.correlation_threshold
            )));
        }
        if self.eval_start > self.eval_end {
            return Err(AppError::InvalidRange {
                start: self.eval_start,
                end: self.eval_end,
            });
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(AppError::InvalidInput(format!(
                "validation fraction must lie in (0, 1), got {}",
                self.validation_fraction
            )));
        }
        Ok(())
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn parse_config_date(name: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("{name} must be YYYY-MM-DD, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_boundaries() {
        let c = ForecastConfig::default();
        assert_eq!(c.correlation_threshold, 0.6);
        assert_eq!(c.train_end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(c.eval_start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(c.eval_end, NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            (ENV_THRESHOLD, "0.75"),
            (ENV_TRAIN_END, "2024-07-01"),
            (ENV_CSV, "prices.csv"),
        ]
        .into_iter()
        .collect();

        let c = ForecastConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.correlation_threshold, 0.75);
        assert_eq!(c.train_end, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(c.csv_path, PathBuf::from("prices.csv"));
    }

    #[test]
    fn reversed_eval_window_is_invalid_range() {
        let vars: HashMap<&str, &str> =
            [(ENV_EVAL_START, "2025-06-01"), (ENV_EVAL_END, "2025-01-01")].into_iter().collect();
        let err = ForecastConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }

    #[test]
    fn garbage_threshold_is_invalid_input() {
        let err = ForecastConfig::from_lookup(|k| (k == ENV_THRESHOLD).then(|| "high".to_string()))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
