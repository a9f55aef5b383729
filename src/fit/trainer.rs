//! Train / predict contract around a pluggable regression strategy.
//!
//! Lifecycle:
//!
//! - `Forecaster::new` starts unfitted; `predict` fails with `NotFitted`
//! - `train` joins prices with graph features, keeps `date < train_end`, orders
//!   rows by date and holds out the most recent `validation_fraction` of them
//!   (rounded up) to score a freshly built pipeline
//! - `predict` applies the current pipeline to the evaluation window
//! - calling `train` again replaces the pipeline and metrics
//!
//! `train` needs `&mut self` and `predict` only `&self`, so a shared forecaster
//! goes behind an `RwLock` with predict as the reader.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};

use crate::domain::{FEATURE_COLUMNS, ForecastConfig, MergedFeatureRow, Prediction, StrategyKind, TrainMetrics};
use crate::error::AppError;
use crate::fit::metrics::{mae, mse, r2};
use crate::graph::FeatureTable;
use crate::io::PriceTable;
use crate::models::{Pipeline, RegressionStrategy};

/// Inner join of price rows with graph features on ticker, in table order.
///
/// Rows whose ticker has no feature row are dropped.
pub fn merge_features(table: &PriceTable, features: &FeatureTable) -> Vec<MergedFeatureRow> {
    table
        .records()
        .iter()
        .filter_map(|r| features.get(&r.ticker).map(|g| MergedFeatureRow::new(r, g)))
        .collect()
}

/// Design matrix (`FEATURE_COLUMNS` order) and close-price target.
pub fn design_matrix(rows: &[MergedFeatureRow]) -> (DMatrix<f64>, DVector<f64>) {
    let x = DMatrix::from_fn(rows.len(), FEATURE_COLUMNS.len(), |i, j| rows[i].features()[j]);
    let y = DVector::from_iterator(rows.len(), rows.iter().map(|r| r.close));
    (x, y)
}

/// Sizes of the `(fit, validation)` slices for `n` ordered rows.
pub fn split_sizes(n: usize, validation_fraction: f64) -> (usize, usize) {
    // Nudge down so exact products like 5 * 0.2 don't round up to 2.
    let n_val = ((n as f64 * validation_fraction) - 1e-9).ceil().max(0.0) as usize;
    let n_val = n_val.min(n);
    (n - n_val, n_val)
}

#[derive(Debug)]
struct FittedModel {
    pipeline: Pipeline,
    metrics: TrainMetrics,
}

#[derive(Debug)]
pub struct Forecaster {
    strategy: Box<dyn RegressionStrategy>,
    config: ForecastConfig,
    fitted: Option<FittedModel>,
}

impl Forecaster {
    pub fn new(strategy: Box<dyn RegressionStrategy>, config: ForecastConfig) -> Self {
        Self {
            strategy,
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Validation metrics of the latest successful `train`.
    pub fn metrics(&self) -> Option<TrainMetrics> {
        self.fitted.as_ref().map(|f| f.metrics)
    }

    /// Fit a new pipeline on history before `train_end`.
    ///
    /// On error the previously fitted pipeline (if any) is kept.
    pub fn train(&mut self, table: &PriceTable, features: &FeatureTable) -> Result<TrainMetrics, AppError> {
        let train_end = self.config.train_end;
        let mut rows: Vec<MergedFeatureRow> = merge_features(table, features)
            .into_iter()
            .filter(|r| r.date < train_end)
            .collect();
        if rows.is_empty() {
            return Err(AppError::EmptyResult(format!(
                "No training rows before {train_end} after joining graph features."
            )));
        }

        // Stable: rows sharing a date keep table order.
        rows.sort_by_key(|r| r.date);

        let (n_fit, n_val) = split_sizes(rows.len(), self.config.validation_fraction);
        if n_fit == 0 || n_val == 0 {
            return Err(AppError::EmptyResult(format!(
                "{} training rows cannot be split into fit and validation slices.",
                rows.len()
            )));
        }

        let (fit_rows, val_rows) = rows.split_at(n_fit);
        let (x_fit, y_fit) = design_matrix(fit_rows);
        let (x_val, y_val) = design_matrix(val_rows);

        let mut pipeline = self.strategy.build_pipeline();
        pipeline.fit(&x_fit, &y_fit)?;
        let pred = pipeline.predict(&x_val)?;

        let actual = y_val.as_slice();
        let predicted = pred.as_slice();
        let metrics = TrainMetrics {
            mae: mae(actual, predicted),
            mse: mse(actual, predicted),
            r2: r2(actual, predicted),
            n_fit,
            n_validation: n_val,
        };

        tracing::info!(
            strategy = self.strategy.kind().tag(),
            n_fit,
            n_validation = n_val,
            mae = metrics.mae,
            mse = metrics.mse,
            r2 = metrics.r2,
            "trained forecaster"
        );

        self.fitted = Some(FittedModel { pipeline, metrics });
        Ok(metrics)
    }

    /// Predict closes over `[eval_start, eval_end]`, aligned with table order.
    pub fn predict(&self, table: &PriceTable, features: &FeatureTable) -> Result<Prediction, AppError> {
        let fitted = self.fitted.as_ref().ok_or(AppError::NotFitted)?;
        let (start, end) = (self.config.eval_start, self.config.eval_end);
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }

        let rows: Vec<MergedFeatureRow> = merge_features(table, features)
            .into_iter()
            .filter(|r| in_window(r.date, start, end))
            .collect();
        if rows.is_empty() {
            return Err(AppError::NoDataForPeriod { start, end });
        }

        let (x, y) = design_matrix(&rows);
        let predicted: Vec<f64> = fitted.pipeline.predict(&x)?.iter().copied().collect();
        let actual: Vec<f64> = y.iter().copied().collect();
        let error = mae(&actual, &predicted);

        tracing::info!(rows = rows.len(), %start, %end, mae = error, "predicted evaluation window");

        Ok(Prediction {
            dates: rows.iter().map(|r| r.date).collect(),
            actual,
            predicted,
            mae: error,
        })
    }

    /// [`Forecaster::predict`] restricted to one ticker's rows.
    pub fn predict_ticker(
        &self,
        table: &PriceTable,
        features: &FeatureTable,
        ticker: &str,
    ) -> Result<Prediction, AppError> {
        if !table.records().iter().any(|r| r.ticker == ticker) {
            return Err(AppError::InvalidInput(format!("Unknown ticker '{ticker}'")));
        }
        self.predict(&table.subset_for_ticker(ticker), features)
    }
}

fn in_window(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}
