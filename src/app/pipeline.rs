//! Shared load/analyze steps used by the binaries.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! settings -> CSV ingest -> outlier detection / forecast
//!
//! The entry points in `app` then only deal with presentation and output files.

use crate::config::Settings;
use crate::error::AppError;
use crate::forecast::{Forecast, forecast};
use crate::io::ingest::{IngestedSeries, load_price_series};
use crate::outliers::{OutlierReport, detect_outliers};

/// Load the configured CSV.
pub fn load(settings: &Settings) -> Result<IngestedSeries, AppError> {
    Ok(load_price_series(&settings.data.path, &settings.data.load)?)
}

#[derive(Debug, Clone)]
pub struct OutlierRun {
    pub ingest: IngestedSeries,
    pub report: OutlierReport,
}

pub fn run_outliers(settings: &Settings) -> Result<OutlierRun, AppError> {
    settings.outliers.validate()?;
    let ingest = load(settings)?;
    let report = detect_outliers(&ingest.series, &settings.outliers);
    Ok(OutlierRun { ingest, report })
}

#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub ingest: IngestedSeries,
    pub forecast: Forecast,
}

/// Fit and predict; writing the CSV is left to the caller.
pub fn run_forecast(settings: &Settings) -> Result<ForecastRun, AppError> {
    settings.forecast.validate()?;
    let ingest = load(settings)?;
    let forecast = forecast(&ingest.series, &settings.forecast)?;
    Ok(ForecastRun { ingest, forecast })
}
