//! Long-horizon daily price forecast.
//!
//! Responsibilities:
//!
//! - check that the history is long enough to see the yearly cycle
//! - fit trend + seasonality candidates and pick one by BIC (parallel)
//! - predict every day of the target month

pub mod fitter;
pub mod model;
pub mod selection;

pub use fitter::*;
pub use model::*;
pub use selection::*;

use chrono::NaiveDate;

use crate::domain::{ForecastConfig, ForecastRecord, PriceSeries, month_days};
use crate::error::AppError;

/// Predictions plus the model that produced them.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub records: Vec<ForecastRecord>,
    pub selection: FitSelection,
    /// Date the trend term is measured from (first observation).
    pub origin: NaiveDate,
    pub last_observed: NaiveDate,
    /// Days from the last observation to the last predicted date.
    pub horizon_days: i64,
}

/// Fit the history and predict one price per day of the configured month.
///
/// Fails rather than falling back: too little history, an invalid target, or
/// a non-finite prediction are all errors.
pub fn forecast(series: &PriceSeries, config: &ForecastConfig) -> Result<Forecast, AppError> {
    config.validate()?;

    let (Some(origin), Some(last_observed)) = (series.first_date(), series.last_date()) else {
        return Err(AppError::new(3, "Cannot forecast from an empty price series."));
    };

    let span_days = (last_observed - origin).num_days();
    if span_days < config.min_history_days {
        return Err(AppError::new(
            3,
            format!(
                "Insufficient history for a seasonal forecast: {span_days} days observed, at least {} required.",
                config.min_history_days
            ),
        ));
    }

    let targets = month_days(config.target_year, config.target_month);
    let Some(&last_target) = targets.last() else {
        return Err(AppError::new(
            2,
            format!(
                "Invalid forecast target {}-{:02}.",
                config.target_year, config.target_month
            ),
        ));
    };

    let selection = fit_and_select(series, origin, config)?;
    let best = &selection.best;

    let mut records = Vec::with_capacity(targets.len());
    for date in targets {
        let predicted_price = predict(best.model, origin, date, &best.betas);
        if !predicted_price.is_finite() {
            return Err(AppError::new(
                4,
                format!("Non-finite forecast for {date}."),
            ));
        }
        records.push(ForecastRecord { date, predicted_price });
    }

    let horizon_days = (last_target - last_observed).num_days();
    tracing::info!(
        days = records.len(),
        horizon_days,
        model = %best.model.display_name(),
        "forecast complete"
    );

    Ok(Forecast {
        records,
        selection,
        origin,
        last_observed,
        horizon_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRecord;

    fn seasonal_series(start: NaiveDate, days: usize) -> PriceSeries {
        let records = start
            .iter_days()
            .take(days)
            .enumerate()
            .map(|(i, d)| {
                let t = i as f64 / 365.25;
                let price = 100.0 + 4.0 * t + 10.0 * (std::f64::consts::TAU * t).sin();
                PriceRecord::new(d, price)
            })
            .collect();
        PriceSeries::from_records(records).unwrap()
    }

    #[test]
    fn forecast_covers_every_day_of_february_2022() {
        let start = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let series = seasonal_series(start, 5 * 365);
        let fc = forecast(&series, &ForecastConfig::default()).unwrap();

        assert_eq!(fc.records.len(), 28);
        for (i, rec) in fc.records.iter().enumerate() {
            assert_eq!(rec.date, NaiveDate::from_ymd_opt(2022, 2, 1 + i as u32).unwrap());
            assert!(rec.predicted_price.is_finite());
        }
        assert!(fc.horizon_days > 5 * 365);
    }

    #[test]
    fn forecast_extrapolates_trend_and_season() {
        let start = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let series = seasonal_series(start, 5 * 365);
        let config = ForecastConfig {
            weekly: false,
            ..ForecastConfig::default()
        };
        let fc = forecast(&series, &config).unwrap();

        // Noise-free input: the fitted model reproduces the generating curve.
        let d = NaiveDate::from_ymd_opt(2022, 2, 14).unwrap();
        let t = (d - start).num_days() as f64 / 365.25;
        let expected = 100.0 + 4.0 * t + 10.0 * (std::f64::consts::TAU * t).sin();
        let got = fc.records[13].predicted_price;
        assert!((got - expected).abs() < 1e-4, "got {got}, expected {expected}");
    }

    #[test]
    fn short_history_fails_loudly() {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let series = seasonal_series(start, 200);
        let err = forecast(&series, &ForecastConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("Insufficient history"));
    }

    #[test]
    fn empty_series_fails() {
        let err = forecast(&PriceSeries::default(), &ForecastConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
