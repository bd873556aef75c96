//! CSV ingest and validation.
//!
//! This module turns a daily price CSV into a `PriceSeries`:
//!
//! - **Strict schema** for the date and price columns (clear errors naming the line)
//! - **Row policy**: abort on the first bad row (`strict`, default) or skip and
//!   report bad rows (`drop`)
//! - **Deterministic behavior**: output is sorted by date with unique dates
//! - **Separation of concerns**: no analysis logic here

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{DateOrder, LoadConfig, PriceRecord, PriceSeries, RowPolicy};

/// Why a CSV could not be turned into a price series.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to open CSV '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error at line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },
    #[error("Missing required column: `{0}`")]
    MissingColumn(String),
    #[error("Line {line}: invalid date '{value}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY, DD/MM/YYYY.")]
    InvalidDate { line: usize, value: String },
    #[error("Line {line}: invalid price '{value}' (must be a finite number).")]
    InvalidPrice { line: usize, value: String },
    #[error("Line {line}: duplicate date {date}.")]
    DuplicateDate { line: usize, date: NaiveDate },
    #[error("No valid rows in CSV.")]
    Empty,
    #[error("Invalid price series: {0}")]
    Series(String),
}

impl ParseError {
    /// 1-based CSV line the error refers to, if it is row-level.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Csv { line, .. }
            | ParseError::InvalidDate { line, .. }
            | ParseError::InvalidPrice { line, .. }
            | ParseError::DuplicateDate { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// A row skipped under `RowPolicy::Drop`.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the series plus what happened along the way.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: PriceSeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Names of the auxiliary columns carried on each record.
    pub aux_columns: Vec<String>,
}

/// Load a price CSV from disk.
pub fn load_price_series(path: &Path, config: &LoadConfig) -> Result<IngestedSeries, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let ingested = read_price_series(file, config)?;

    tracing::info!(
        path = %path.display(),
        rows_read = ingested.rows_read,
        rows_used = ingested.series.len(),
        rows_dropped = ingested.row_errors.len(),
        "loaded price series"
    );
    for err in &ingested.row_errors {
        tracing::warn!(line = err.line, "dropped row: {}", err.message);
    }

    Ok(ingested)
}

/// Parse a price CSV from any reader.
pub fn read_price_series<R: std::io::Read>(
    reader: R,
    config: &LoadConfig,
) -> Result<IngestedSeries, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|source| ParseError::Csv { line: 1, source })?
        .clone();

    let header_map = build_header_map(&headers);
    let date_col = normalize_header_name(&config.date_column);
    let price_col = normalize_header_name(&config.price_column);
    let date_idx = *header_map
        .get(&date_col)
        .ok_or_else(|| ParseError::MissingColumn(config.date_column.clone()))?;
    let price_idx = *header_map
        .get(&price_col)
        .ok_or_else(|| ParseError::MissingColumn(config.price_column.clone()))?;

    let aux_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| *idx != date_idx && *idx != price_idx && !name.trim().is_empty())
        .map(|(idx, name)| (idx, normalize_header_name(name)))
        .collect();

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the header and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|source| ParseError::Csv { line, source })
            .and_then(|record| parse_row(&record, line, date_idx, price_idx, &aux_columns, config.date_order))
            .and_then(|rec| {
                if seen.contains(&rec.date) {
                    Err(ParseError::DuplicateDate { line, date: rec.date })
                } else {
                    Ok(rec)
                }
            });

        match parsed {
            Ok(rec) => {
                seen.insert(rec.date);
                records.push(rec);
            }
            Err(err) => match config.row_policy {
                RowPolicy::Strict => return Err(err),
                RowPolicy::Drop => row_errors.push(RowError {
                    line: err.line().unwrap_or(line),
                    message: err.to_string(),
                }),
            },
        }
    }

    if records.is_empty() {
        return Err(ParseError::Empty);
    }

    let series = into_series(records)?;

    Ok(IngestedSeries {
        series,
        row_errors,
        rows_read,
        aux_columns: aux_columns.into_iter().map(|(_, name)| name).collect(),
    })
}

/// Sort into a series. Duplicates are normally rejected per row before this.
fn into_series(records: Vec<PriceRecord>) -> Result<PriceSeries, ParseError> {
    PriceSeries::from_records(records).map_err(|e| ParseError::Series(e.message().to_string()))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(
    record: &StringRecord,
    line: usize,
    date_idx: usize,
    price_idx: usize,
    aux_columns: &[(usize, String)],
    date_order: DateOrder,
) -> Result<PriceRecord, ParseError> {
    let raw_date = record.get(date_idx).map(str::trim).unwrap_or("");
    let date = parse_date(raw_date, date_order).ok_or_else(|| ParseError::InvalidDate {
        line,
        value: raw_date.to_string(),
    })?;

    let raw_price = record.get(price_idx).map(str::trim).unwrap_or("");
    let price = parse_price(raw_price).ok_or_else(|| ParseError::InvalidPrice {
        line,
        value: raw_price.to_string(),
    })?;

    let aux: BTreeMap<String, String> = aux_columns
        .iter()
        .filter_map(|(idx, name)| {
            let value = record.get(*idx)?.trim();
            (!value.is_empty()).then(|| (name.clone(), value.to_string()))
        })
        .collect();

    Ok(PriceRecord { date, price, aux })
}

fn parse_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    // Year-first forms are unambiguous; the rest follow `order`.
    const ISO_FMTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    if s.is_empty() {
        return None;
    }
    for fmt in ISO_FMTS.into_iter().chain(order.formats()) {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn parse_price(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
