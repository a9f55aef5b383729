//! Tabular price store.
//!
//! `PriceTable` owns the canonical `PriceRecord` collection for a run. Every
//! query returns fresh rows; nothing here mutates the stored data after
//! construction.
//!
//! Sources are behind the `DataProcessor` trait and selected by tag through
//! `build_processor`, so the pipeline never names a concrete loader.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::PriceRecord;
use crate::error::AppError;
use crate::io::ingest::{LoadReport, load_price_csv};

/// Queryable per-ticker OHLCV time series.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    records: Vec<PriceRecord>,
}

impl PriceTable {
    /// Build a table, enforcing one record per `(ticker, date)`.
    pub fn from_records(records: Vec<PriceRecord>) -> Result<Self, AppError> {
        let mut seen: HashSet<(&str, NaiveDate)> = HashSet::with_capacity(records.len());
        for r in &records {
            if !seen.insert((r.ticker.as_str(), r.date)) {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate row for ticker {} on {}",
                    r.ticker, r.date
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct tickers, sorted ascending.
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers = self.tickers_in_discovery_order();
        tickers.sort();
        tickers
    }

    /// Distinct tickers in order of first appearance.
    pub fn tickers_in_discovery_order(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.ticker.as_str()))
            .map(|r| r.ticker.clone())
            .collect()
    }

    /// Rows for one ticker, sorted by date ascending. Unknown tickers yield no rows.
    pub fn filter_by_ticker(&self, ticker: &str) -> Vec<PriceRecord> {
        let mut rows: Vec<PriceRecord> = self
            .records
            .iter()
            .filter(|r| r.ticker == ticker)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.date);
        rows
    }

    /// Same rows as `filter_by_ticker`, wrapped as a table (for train/predict on one name).
    pub fn subset_for_ticker(&self, ticker: &str) -> PriceTable {
        PriceTable {
            records: self.filter_by_ticker(ticker),
        }
    }

    /// Earliest and latest date present.
    pub fn date_coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// Keep rows with `start <= date <= end`.
pub fn filter_by_date_range(
    rows: &[PriceRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceRecord>, AppError> {
    if start > end {
        return Err(AppError::InvalidRange { start, end });
    }
    Ok(rows
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .cloned()
        .collect())
}

/// A loaded table together with its ingest diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: PriceTable,
    pub report: LoadReport,
}

/// Something that can produce a `PriceTable`.
pub trait DataProcessor {
    /// Short label for logs and reports.
    fn describe(&self) -> String;

    fn load(&self) -> Result<LoadedTable, AppError>;
}

/// Daily stock prices from a CSV export.
#[derive(Debug, Clone)]
pub struct StockCsvProcessor {
    path: PathBuf,
}

impl StockCsvProcessor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataProcessor for StockCsvProcessor {
    fn describe(&self) -> String {
        format!("stocks csv {}", self.path.display())
    }

    fn load(&self) -> Result<LoadedTable, AppError> {
        let (records, report) = load_price_csv(&self.path)?;
        let table = PriceTable::from_records(records)?;
        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            dropped = report.rows_dropped(),
            "loaded price table"
        );
        Ok(LoadedTable { table, report })
    }
}

type ProcessorCtor = fn(&Path) -> Box<dyn DataProcessor>;

fn stock_csv(path: &Path) -> Box<dyn DataProcessor> {
    Box::new(StockCsvProcessor::new(path))
}

/// Tag → constructor table for file-backed sources.
const PROCESSORS: &[(&str, ProcessorCtor)] = &[("stocks", stock_csv)];

/// Known processor tags.
pub fn processor_tags() -> Vec<&'static str> {
    PROCESSORS.iter().map(|(tag, _)| *tag).collect()
}

/// Build a data processor by tag (`"stocks"`).
pub fn build_processor(tag: &str, path: &Path) -> Result<Box<dyn DataProcessor>, AppError> {
    PROCESSORS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, ctor)| ctor(path))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Unknown data processor '{tag}' (known: {})",
                processor_tags().join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ticker: &str, y: i32, m: u32, d: u32, close: f64) -> PriceRecord {
        PriceRecord {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    fn sample_table() -> PriceTable {
        PriceTable::from_records(vec![
            rec("MSFT", 2024, 1, 3, 10.0),
            rec("AAPL", 2024, 1, 3, 20.0),
            rec("MSFT", 2024, 1, 2, 11.0),
            rec("AAPL", 2024, 1, 1, 21.0),
            rec("KO", 2024, 1, 5, 30.0),
            rec("AAPL", 2024, 1, 2, 22.0),
        ])
        .unwrap()
    }

    #[test]
    fn tickers_are_distinct_and_sorted() {
        let table = sample_table();
        assert_eq!(table.tickers(), vec!["AAPL", "KO", "MSFT"]);
        assert_eq!(table.tickers_in_discovery_order(), vec!["MSFT", "AAPL", "KO"]);
    }

    #[test]
    fn filter_by_ticker_sorts_by_date() {
        let table = sample_table();
        let rows = table.filter_by_ticker("AAPL");
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.ticker == "AAPL"));
        assert!(rows.windows(2).all(|w| w[0].date <= w[1].date));
        // Stored order is untouched.
        assert_eq!(table.records()[0].ticker, "MSFT");
        assert!(table.filter_by_ticker("ZZZ").is_empty());
    }

    #[test]
    fn date_range_is_inclusive_and_validated() {
        let table = sample_table();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        let rows = filter_by_date_range(table.records(), start, end).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.date >= start && r.date <= end));

        let err = filter_by_date_range(table.records(), end, start).unwrap_err();
        assert_eq!(err, AppError::InvalidRange { start: end, end: start });

        let single = filter_by_date_range(table.records(), start, start).unwrap();
        assert_eq!(single.len(), 2);
    }

    #[test]
    fn duplicate_ticker_date_is_rejected() {
        let err = PriceTable::from_records(vec![rec("A", 2024, 1, 1, 1.0), rec("A", 2024, 1, 1, 2.0)])
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn processor_factory_validates_tag() {
        assert!(build_processor("stocks", Path::new("x.csv")).is_ok());
        let err = build_processor("bonds", Path::new("x.csv")).err().unwrap();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m.contains("bonds")));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = StockCsvProcessor::new("/definitely/not/here.csv").load().unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
