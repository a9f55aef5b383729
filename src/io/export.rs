//! Export prediction series (CSV) and training diagnostics (JSON).
//!
//! Both are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{ForecastConfig, Prediction, StrategyKind, TrainMetrics};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    ticker: &'a str,
    date: NaiveDate,
    actual_close: f64,
    predicted_close: f64,
    error: f64,
}

/// Write an aligned `ticker,date,actual_close,predicted_close,error` series to CSV.
pub fn write_prediction_csv(path: &Path, ticker: &str, prediction: &Prediction) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::Io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for ((&date, &actual), &predicted) in prediction
        .dates
        .iter()
        .zip(prediction.actual.iter())
        .zip(prediction.predicted.iter())
    {
        writer
            .serialize(ExportRow {
                ticker,
                date,
                actual_close: actual,
                predicted_close: predicted,
                error: predicted - actual,
            })
            .map_err(|e| AppError::Io(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::Io(format!("Failed to flush export CSV: {e}")))?;

    tracing::info!(path = %path.display(), rows = prediction.len(), "wrote prediction export");
    Ok(())
}

/// Portable summary of a training run.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsFile<'a> {
    pub tool: &'static str,
    pub strategy: StrategyKind,
    pub config: &'a ForecastConfig,
    pub metrics: TrainMetrics,
}

/// Write training diagnostics as pretty JSON.
pub fn write_metrics_json(
    path: &Path,
    strategy: StrategyKind,
    config: &ForecastConfig,
    metrics: TrainMetrics,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create metrics JSON '{}': {e}", path.display())))?;

    let doc = MetricsFile {
        tool: "gforecast",
        strategy,
        config,
        metrics,
    };
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::Io(format!("Failed to write metrics JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("gforecast-{name}-{}", std::process::id()))
    }

    fn prediction() -> Prediction {
        Prediction {
            dates: vec![
                NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            ],
            actual: vec![100.0, 101.5],
            predicted: vec![99.0, 102.0],
            mae: 0.75,
        }
    }

    #[test]
    fn prediction_csv_reads_back_with_quoted_ticker() {
        let path = temp_path("export.csv");
        write_prediction_csv(&path, "BRK,B", &prediction()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["ticker", "date", "actual_close", "predicted_close", "error"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "BRK,B");
        assert_eq!(&rows[0][1], "2025-01-02");
        assert_eq!(rows[0][4].parse::<f64>().unwrap(), -1.0);
        assert_eq!(rows[1][3].parse::<f64>().unwrap(), 102.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn metrics_json_carries_strategy_and_metrics() {
        let path = temp_path("metrics.json");
        let metrics = TrainMetrics {
            mae: 0.5,
            mse: 0.25,
            r2: 0.9,
            n_fit: 80,
            n_validation: 20,
        };
        write_metrics_json(&path, StrategyKind::RandomForest, &ForecastConfig::default(), metrics).unwrap();

        let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["tool"], "gforecast");
        assert_eq!(doc["strategy"], "random-forest");
        assert_eq!(doc["metrics"]["n_fit"], 80);
        assert_eq!(doc["metrics"]["mse"], 0.25);
        assert!(doc["config"].is_object());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn export_into_missing_directory_is_io_error() {
        let path = Path::new("/nonexistent/gforecast/out.csv");
        let err = write_prediction_csv(path, "A", &prediction()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
