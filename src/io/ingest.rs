//! CSV ingest and normalization.
//!
//! Turns a daily OHLCV export (one row per ticker and date) into clean
//! `PriceRecord`s that are safe to pivot and regress on.
//!
//! - **Strict schema** for the required columns (missing column = `InvalidInput`)
//! - **Row-level cleaning**: rows with an unparseable date or a missing/non-finite
//!   number are dropped and reported, never fatal
//! - Extra columns (`Adj Close`, `dividends`, ...) are ignored

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::PriceRecord;
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 7] = ["date", "ticker", "open", "high", "low", "close", "volume"];

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub ticker: Option<String>,
    pub message: String,
}

/// What happened while loading: counts plus every dropped row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

impl LoadReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_used
    }
}

/// Open and parse a price CSV from disk.
pub fn load_price_csv(path: &Path) -> Result<(Vec<PriceRecord>, LoadReport), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_price_records(file)
}

/// Parse price rows from any reader.
pub fn read_price_records<R: Read>(source: R) -> Result<(Vec<PriceRecord>, LoadReport), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::InvalidInput(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        report.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                report.row_errors.push(RowError {
                    line,
                    ticker: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => records.push(row),
            Err(message) => report.row_errors.push(RowError {
                line,
                ticker: get_field(&record, &header_map, "ticker").map(str::to_string),
                message,
            }),
        }
    }

    report.rows_used = records.len();
    if records.is_empty() {
        return Err(AppError::EmptyResult(format!(
            "No valid price rows remain after cleaning ({} read).",
            report.rows_read
        )));
    }

    if !report.row_errors.is_empty() {
        tracing::warn!(
            dropped = report.row_errors.len(),
            read = report.rows_read,
            "dropped unparseable price rows"
        );
    }
    tracing::debug!(rows = report.rows_used, "price rows loaded");

    Ok((records, report))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<PriceRecord, String> {
    let ticker = get_required(record, header_map, "ticker")?.to_string();
    let date = parse_date(get_required(record, header_map, "date")?)?;

    Ok(PriceRecord {
        ticker,
        date,
        open: parse_number(record, header_map, "open")?,
        high: parse_number(record, header_map, "high")?,
        low: parse_number(record, header_map, "low")?,
        close: parse_number(record, header_map, "close")?,
        volume: parse_number(record, header_map, "volume")?,
    })
}

fn get_field<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    get_field(record, header_map, name).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_number(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Result<f64, String> {
    let raw = get_required(record, header_map, name)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid number in `{name}`: '{raw}'")),
    }
}

/// Parse a calendar date, keeping only the date part of timestamps.
///
/// The upstream downloader writes either plain ISO dates or exchange-local
/// timestamps such as `2020-01-02 00:00:00-05:00`. Slash and dash dates with
/// the year last read month-first (`02/01/2020` is February 1st); the
/// day-first reading is only tried when month-first is impossible.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const DATE_FMTS: [&str; 6] = [
        "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y",
    ];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    const OFFSET_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    for fmt in OFFSET_FMTS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.date_naive());
        }
    }
    Err(format!("Invalid date '{s}'."))
}
