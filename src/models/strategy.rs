//! Pluggable regression strategies.
//!
//! A strategy only knows how to build a fresh, unfitted [`Pipeline`]. The
//! trainer owns the pipeline and never needs to know which regressor sits
//! behind it.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::domain::StrategyKind;
use crate::error::AppError;
use crate::models::{ForestConfig, LinearRegression, RandomForestRegressor, StandardScaler};

/// Fit/predict contract shared by every regressor.
pub trait Regressor: fmt::Debug + Send + Sync {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), AppError>;
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError>;
}

/// Standardization followed by a regressor, fitted and applied as a unit.
#[derive(Debug)]
pub struct Pipeline {
    scaler: StandardScaler,
    regressor: Box<dyn Regressor>,
    fitted: bool,
}

impl Pipeline {
    pub fn new(regressor: Box<dyn Regressor>) -> Self {
        Self {
            scaler: StandardScaler::new(),
            regressor,
            fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), AppError> {
        if x.nrows() != y.len() {
            return Err(AppError::InvalidInput(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            )));
        }
        self.fitted = false;
        self.scaler.fit(x)?;
        let z = self.scaler.transform(x)?;
        self.regressor.fit(&z, y)?;
        self.fitted = true;
        Ok(())
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        if !self.fitted {
            return Err(AppError::NotFitted);
        }
        let z = self.scaler.transform(x)?;
        let out = self.regressor.predict(&z)?;
        if out.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Numeric("Regressor produced a non-finite prediction.".to_string()));
        }
        Ok(out)
    }
}

pub trait RegressionStrategy: fmt::Debug + Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// A new, unfitted pipeline.
    fn build_pipeline(&self) -> Pipeline;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegressionStrategy;

impl RegressionStrategy for LinearRegressionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Linear
    }

    fn build_pipeline(&self) -> Pipeline {
        Pipeline::new(Box::new(LinearRegression::new()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomForestStrategy {
    pub config: ForestConfig,
}

impl RandomForestStrategy {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }
}

impl RegressionStrategy for RandomForestStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RandomForest
    }

    fn build_pipeline(&self) -> Pipeline {
        Pipeline::new(Box::new(RandomForestRegressor::new(self.config)))
    }
}

type StrategyCtor = fn() -> Box<dyn RegressionStrategy>;

fn linear() -> Box<dyn RegressionStrategy> {
    Box::new(LinearRegressionStrategy)
}

fn random_forest() -> Box<dyn RegressionStrategy> {
    Box::new(RandomForestStrategy::default())
}

const STRATEGIES: &[(&str, StrategyCtor)] = &[("linear", linear), ("random_forest", random_forest)];

pub fn strategy_tags() -> Vec<&'static str> {
    STRATEGIES.iter().map(|(tag, _)| *tag).collect()
}

/// Look up a strategy by tag. Hyphenated spellings (`random-forest`) are accepted.
pub fn build_strategy(tag: &str) -> Result<Box<dyn RegressionStrategy>, AppError> {
    let key = tag.trim().to_ascii_lowercase().replace('-', "_");
    STRATEGIES
        .iter()
        .find(|(t, _)| *t == key)
        .map(|(_, ctor)| ctor())
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Unknown strategy '{tag}' (expected one of: {})",
                strategy_tags().join(", ")
            ))
        })
}

/// Strategy for a parsed CLI choice; `forest` only affects the random forest.
pub fn strategy_for(kind: StrategyKind, forest: ForestConfig) -> Box<dyn RegressionStrategy> {
    match kind {
        StrategyKind::Linear => Box::new(LinearRegressionStrategy),
        StrategyKind::RandomForest => Box::new(RandomForestStrategy::new(forest)),
    }
}
