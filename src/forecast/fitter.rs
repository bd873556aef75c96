//! Least-squares fit of a single candidate model.
//!
//! Given the observed `(date, price)` pairs and a `SeasonalModel`, build the
//! design matrix, solve for the coefficients, and report the residual error.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};

use crate::domain::PriceSeries;
use crate::error::AppError;
use crate::forecast::model::{SeasonalModel, fill_design_row, predict};
use crate::math::solve_least_squares;

/// Fitted coefficients for one candidate.
#[derive(Debug, Clone)]
pub struct ModelFit {
    pub model: SeasonalModel,
    pub betas: Vec<f64>,
    pub sse: f64,
    pub rmse: f64,
}

/// Fit one candidate model to the whole series.
pub fn fit_model(model: SeasonalModel, series: &PriceSeries, origin: NaiveDate) -> Result<ModelFit, AppError> {
    let records = series.records();
    if records.is_empty() {
        return Err(AppError::new(3, "No data points to fit."));
    }

    let n = records.len();
    let p = model.beta_len();

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, rec) in records.iter().enumerate() {
        fill_design_row(model, origin, rec.date, &mut row);
        for (j, v) in row.iter().enumerate() {
            x[(i, j)] = *v;
        }
    }
    let y = DVector::from_iterator(n, records.iter().map(|r| r.price));

    let beta = solve_least_squares(&x, &y).ok_or_else(|| {
        AppError::new(
            4,
            format!("Least-squares solve failed for model '{}'.", model.display_name()),
        )
    })?;
    let betas: Vec<f64> = beta.iter().copied().collect();

    let sse: f64 = records
        .iter()
        .map(|r| {
            let e = r.price - predict(model, origin, r.date, &betas);
            e * e
        })
        .sum();
    if !sse.is_finite() {
        return Err(AppError::new(4, "Non-finite residuals during model fit."));
    }

    Ok(ModelFit {
        model,
        betas,
        sse,
        rmse: (sse / n as f64).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRecord;

    #[test]
    fn recovers_known_coefficients() {
        let origin = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let model = SeasonalModel::new(2, false);
        let truth = [120.0, 3.0, 15.0, -4.0, 2.0, 1.0];

        let records: Vec<PriceRecord> = origin
            .iter_days()
            .take(3 * 365)
            .map(|d| PriceRecord::new(d, predict(model, origin, d, &truth)))
            .collect();
        let series = PriceSeries::from_records(records).unwrap();

        let fit = fit_model(model, &series, origin).unwrap();
        for (got, want) in fit.betas.iter().zip(truth) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
        assert!(fit.rmse < 1e-6);
    }

    #[test]
    fn empty_series_is_an_error() {
        let origin = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let err = fit_model(SeasonalModel::new(1, true), &PriceSeries::default(), origin).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
