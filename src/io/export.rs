//! CSV exports of the batch analyses.
//!
//! The files are meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::domain::ForecastRecord;
use crate::error::AppError;
use crate::outliers::OutlierReport;

/// Headers are written explicitly so an empty export still has one.
fn create_writer(path: &Path, what: &str) -> Result<csv::Writer<std::fs::File>, AppError> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create {what} CSV '{}': {e}", path.display())))
}

fn write_error(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::new(2, format!("Failed to write {what} CSV: {e}"))
}

/// Write `date,predicted_price` rows with ISO dates.
pub fn write_forecast_csv(path: &Path, records: &[ForecastRecord]) -> Result<(), AppError> {
    let mut writer = create_writer(path, "forecast")?;
    writer
        .write_record(["date", "predicted_price"])
        .map_err(|e| write_error("forecast", e))?;
    for rec in records {
        writer.serialize(rec).map_err(|e| write_error("forecast", e))?;
    }
    writer.flush().map_err(|e| write_error("forecast", e))?;
    tracing::info!(path = %path.display(), rows = records.len(), "forecast written");
    Ok(())
}

/// Write one row per record: its context, bound and flag.
pub fn write_outliers_csv(path: &Path, report: &OutlierReport) -> Result<(), AppError> {
    let mut writer = create_writer(path, "outlier")?;
    writer
        .write_record(["date", "price", "context", "is_outlier", "score"])
        .map_err(|e| write_error("outlier", e))?;
    for flag in &report.flags {
        writer
            .write_record([
                flag.date.format("%Y-%m-%d").to_string(),
                format!("{:.4}", flag.price),
                flag.context.to_string(),
                flag.is_outlier.to_string(),
                flag.score.map(|s| format!("{s:.4}")).unwrap_or_default(),
            ])
            .map_err(|e| write_error("outlier", e))?;
    }
    writer.flush().map_err(|e| write_error("outlier", e))?;
    tracing::info!(path = %path.display(), rows = report.flags.len(), "outlier table written");
    Ok(())
}
