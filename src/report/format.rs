//! Plain-text tables for the terminal.
//!
//! Every function returns a `String` so the CLI decides where it goes and tests
//! can compare output directly.

use crate::domain::{ForecastConfig, Prediction, StrategyKind, TrainMetrics};
use crate::graph::{FeatureTable, GraphSummary};
use crate::io::LoadReport;

/// Maximum row errors listed in a load summary.
const MAX_LISTED_ROW_ERRORS: usize = 5;

pub fn format_tickers(tickers: &[String]) -> String {
    let mut out = format!("Tickers ({}):\n", tickers.len());
    for t in tickers {
        out.push_str(&format!("  {t}\n"));
    }
    out
}

pub fn format_load_report(source: &str, report: &LoadReport) -> String {
    let mut out = format!(
        "Source: {source}\nRows: read={} used={} dropped={}\n",
        report.rows_read,
        report.rows_used,
        report.rows_dropped()
    );
    for e in report.row_errors.iter().take(MAX_LISTED_ROW_ERRORS) {
        let ticker = e.ticker.as_deref().unwrap_or("?");
        out.push_str(&format!("  line {:>6} [{}] {}\n", e.line, truncate(ticker, 8), e.message));
    }
    if report.row_errors.len() > MAX_LISTED_ROW_ERRORS {
        out.push_str(&format!(
            "  ... {} more\n",
            report.row_errors.len() - MAX_LISTED_ROW_ERRORS
        ));
    }
    out
}

pub fn format_graph_summary(summary: &GraphSummary, threshold: f64) -> String {
    let weight = summary
        .mean_weight
        .map(|w| format!("{w:.4}"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Correlation graph (corr > {threshold}):\n  nodes={} edges={} density={:.4} isolated={} mean_weight={weight}\n",
        summary.nodes, summary.edges, summary.density, summary.isolated
    )
}

/// Per-ticker graph metrics, sorted by ticker.
pub fn format_feature_table(features: &FeatureTable) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:>10} {:>10} {:>12} {:>10}",
            "ticker", "degree", "closeness", "betweenness", "clustering"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<10} {:-<10} {:-<12} {:-<10}\n", "", "", "", "", ""));

    for r in features.sorted() {
        out.push_str(&format!(
            "{:<10} {:>10.4} {:>10.4} {:>12.4} {:>10.4}\n",
            truncate(&r.ticker, 10),
            r.degree,
            r.closeness,
            r.betweenness,
            r.clustering
        ));
    }
    out
}

pub fn format_training_summary(strategy: StrategyKind, config: &ForecastConfig, metrics: &TrainMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== gforecast - {} ===\n", strategy.display_name()));
    out.push_str(&format!(
        "Training window: date < {} | fit={} validation={} ({:.0}% held out)\n",
        config.train_end,
        metrics.n_fit,
        metrics.n_validation,
        config.validation_fraction * 100.0
    ));
    out.push_str(&format!(
        "Validation: MAE={:.4} MSE={:.4} R2={:.4}\n",
        metrics.mae, metrics.mse, metrics.r2
    ));
    out
}

/// Row-by-row actual vs predicted closes for one ticker.
pub fn format_prediction_table(ticker: &str, prediction: &Prediction) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Predictions for {ticker}: n={} MAE={:.4}\n",
        prediction.len(),
        prediction.mae
    ));
    out.push_str(format!("{:<10} {:>12} {:>12} {:>10}", "date", "actual", "predicted", "error").trim_end());
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<12} {:-<12} {:-<10}\n", "", "", "", ""));

    for ((d, a), p) in prediction.dates.iter().zip(&prediction.actual).zip(&prediction.predicted) {
        out.push_str(&format!("{d:<10} {a:>12.4} {p:>12.4} {:>10.4}\n", p - a));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
