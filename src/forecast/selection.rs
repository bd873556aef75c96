//! Harmonic-count selection using BIC with guardrails.
//!
//! Every candidate `1..=max_harmonics` is fitted and scored:
//! - SSE / RMSE
//! - BIC = n * ln(SSE/n) + k * ln(n)
//!
//! Selection rules:
//! 1. Exclude underdetermined candidates: require `n >= k + 5`
//! 2. Choose the candidate with minimum BIC
//! 3. If a simpler candidate is within 2 BIC points of the best, pick it instead

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::domain::{ForecastConfig, PriceSeries};
use crate::error::AppError;
use crate::forecast::fitter::{ModelFit, fit_model};
use crate::forecast::model::SeasonalModel;

/// Minimum number of extra observations beyond parameter count.
const MIN_N_BUFFER: usize = 5;

/// Fit quality diagnostics.
#[derive(Debug, Clone)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub bic: f64,
    pub n: usize,
}

/// Fitted coefficients plus diagnostics for one candidate.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub model: SeasonalModel,
    pub betas: Vec<f64>,
    pub quality: FitQuality,
}

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct FitSelection {
    pub best: FitResult,
    /// Fits for all attempted candidates, ordered by harmonic count.
    pub fits: Vec<FitResult>,
    /// Candidates that were skipped and why.
    pub skipped: Vec<(SeasonalModel, String)>,
}

/// Fit every candidate and select the best one.
pub fn fit_and_select(
    series: &PriceSeries,
    origin: NaiveDate,
    config: &ForecastConfig,
) -> Result<FitSelection, AppError> {
    let n = series.len();

    let mut candidates = Vec::new();
    let mut skipped = Vec::new();
    for harmonics in 1..=config.max_harmonics {
        let model = SeasonalModel::new(harmonics, config.weekly);
        let k = model.param_count();
        if n < k + MIN_N_BUFFER {
            skipped.push((
                model,
                format!("Underdetermined: n={n} < k+{MIN_N_BUFFER}={}", k + MIN_N_BUFFER),
            ));
            continue;
        }
        candidates.push(model);
    }

    // Candidates are independent; results come back in candidate order.
    let outcomes: Vec<(SeasonalModel, Result<ModelFit, AppError>)> = candidates
        .par_iter()
        .map(|&model| (model, fit_model(model, series, origin)))
        .collect();

    let mut fits = Vec::new();
    for (model, outcome) in outcomes {
        match outcome {
            Ok(fit) => fits.push(to_fit_result(fit, n)),
            Err(e) => skipped.push((model, e.to_string())),
        }
    }

    if fits.is_empty() {
        return Err(AppError::new(
            3,
            format!("Insufficient data to fit any forecast model ({n} observations)."),
        ));
    }

    let best = select_by_bic(&fits);
    tracing::info!(
        model = %best.model.display_name(),
        bic = best.quality.bic,
        rmse = best.quality.rmse,
        candidates = fits.len(),
        "selected forecast model"
    );

    Ok(FitSelection { best, fits, skipped })
}

fn to_fit_result(fit: ModelFit, n: usize) -> FitResult {
    let k = fit.model.param_count();
    FitResult {
        model: fit.model,
        betas: fit.betas,
        quality: FitQuality {
            sse: fit.sse,
            rmse: fit.rmse,
            bic: bic(n, fit.sse, k),
            n,
        },
    }
}

fn bic(n: usize, sse: f64, k: usize) -> f64 {
    let n_f = n as f64;
    let sse_per = (sse / n_f).max(1e-12);
    n_f * sse_per.ln() + (k as f64) * n_f.ln()
}

fn select_by_bic(fits: &[FitResult]) -> FitResult {
    let mut best = &fits[0];
    for f in &fits[1..] {
        if f.quality.bic < best.quality.bic {
            best = f;
        }
    }
    let best_bic = best.quality.bic;

    // `fits` is ordered by increasing complexity.
    fits.iter()
        .find(|f| f.quality.bic <= best_bic + 2.0)
        .unwrap_or(best)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRecord;
    use crate::forecast::model::predict;

    fn result(harmonics: usize, bic: f64) -> FitResult {
        FitResult {
            model: SeasonalModel::new(harmonics, false),
            betas: vec![],
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                bic,
                n: 100,
            },
        }
    }

    #[test]
    fn bic_prefers_simpler_when_close() {
        let chosen = select_by_bic(&[result(1, 10.0), result(2, 8.5), result(3, 20.0)]);
        assert_eq!(chosen.model.harmonics, 1);

        let chosen = select_by_bic(&[result(1, 10.0), result(2, 5.0)]);
        assert_eq!(chosen.model.harmonics, 2);
    }

    #[test]
    fn skips_underdetermined_candidates() {
        let origin = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let records: Vec<PriceRecord> = origin
            .iter_days()
            .take(10)
            .map(|d| PriceRecord::new(d, 100.0))
            .collect();
        let series = PriceSeries::from_records(records).unwrap();

        let config = ForecastConfig::default();
        let err = fit_and_select(&series, origin, &config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn selects_true_harmonic_count() {
        let origin = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let truth_model = SeasonalModel::new(2, false);
        let truth = [150.0, 2.0, 20.0, 5.0, -8.0, 3.0];
        // Small deterministic wiggle so SSE is not exactly zero for every candidate.
        let records: Vec<PriceRecord> = origin
            .iter_days()
            .take(4 * 365)
            .enumerate()
            .map(|(i, d)| {
                let noise = ((i * 7919) % 13) as f64 * 0.05 - 0.3;
                PriceRecord::new(d, predict(truth_model, origin, d, &truth) + noise)
            })
            .collect();
        let series = PriceSeries::from_records(records).unwrap();

        let config = ForecastConfig {
            max_harmonics: 4,
            weekly: false,
            ..ForecastConfig::default()
        };
        let selection = fit_and_select(&series, origin, &config).unwrap();
        assert_eq!(selection.fits.len(), 4);
        assert_eq!(selection.best.model.harmonics, 2);
    }
}
