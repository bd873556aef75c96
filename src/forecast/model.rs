//! Model evaluation for the trend + seasonality regression.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given date (for OLS)
//! - predict the price for a given date (for forecasts and residuals)
//!
//! Column layout: intercept, linear trend (years since origin), one sin/cos pair
//! per yearly harmonic, then six day-of-week indicators (Tuesday..Sunday,
//! Monday is the baseline) when weekly effects are enabled.

use chrono::{Datelike, NaiveDate};

use crate::math::{fourier_pair, years_since};

const WEEKDAY_COLUMNS: usize = 6;

/// Structure of one candidate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalModel {
    /// Number of yearly sin/cos pairs.
    pub harmonics: usize,
    /// Whether day-of-week indicators are included.
    pub weekly: bool,
}

impl SeasonalModel {
    pub fn new(harmonics: usize, weekly: bool) -> Self {
        Self { harmonics, weekly }
    }

    /// Number of regression coefficients.
    pub fn beta_len(self) -> usize {
        2 + 2 * self.harmonics + if self.weekly { WEEKDAY_COLUMNS } else { 0 }
    }

    /// Parameter count used by information criteria.
    pub fn param_count(self) -> usize {
        self.beta_len()
    }

    pub fn display_name(self) -> String {
        if self.weekly {
            format!("trend + {}h yearly + weekday", self.harmonics)
        } else {
            format!("trend + {}h yearly", self.harmonics)
        }
    }
}

/// Fill a design row for `date`.
///
/// # Panics
/// Panics if `out` is shorter than `model.beta_len()`.
pub fn fill_design_row(model: SeasonalModel, origin: NaiveDate, date: NaiveDate, out: &mut [f64]) {
    let t = years_since(origin, date);
    out[0] = 1.0;
    out[1] = t;

    let mut col = 2;
    for h in 1..=model.harmonics {
        let (s, c) = fourier_pair(t, h);
        out[col] = s;
        out[col + 1] = c;
        col += 2;
    }

    if model.weekly {
        // 0 = Monday .. 6 = Sunday
        let dow = date.weekday().num_days_from_monday() as usize;
        for i in 0..WEEKDAY_COLUMNS {
            out[col + i] = if dow == i + 1 { 1.0 } else { 0.0 };
        }
    }
}

/// Predicted price for `date`.
pub fn predict(model: SeasonalModel, origin: NaiveDate, date: NaiveDate, betas: &[f64]) -> f64 {
    let mut row = vec![0.0; model.beta_len()];
    fill_design_row(model, origin, date, &mut row);
    row.iter().zip(betas).map(|(x, b)| x * b).sum()
}
