//! Basis functions for the trend + seasonality regression.
//!
//! Time is measured in (fractional) years since an origin date, so the yearly
//! cycle has period 1 and harmonic `h` contributes
//!
//! - `sin(2π·h·t)`
//! - `cos(2π·h·t)`
//!
//! Using 365.25 days per year keeps the phase from drifting across leap years.

use std::f64::consts::TAU;

use chrono::NaiveDate;

/// Mean length of a calendar year in days.
pub const YEAR_DAYS: f64 = 365.25;

/// Fractional years from `origin` to `date` (negative before the origin).
pub fn years_since(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64 / YEAR_DAYS
}

/// `(sin, cos)` of the given yearly harmonic at time `t` (years).
pub fn fourier_pair(t: f64, harmonic: usize) -> (f64, f64) {
    let angle = TAU * harmonic as f64 * t;
    angle.sin_cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourier_pair_is_periodic_in_years() {
        for h in 1..=4 {
            let (s0, c0) = fourier_pair(0.3, h);
            let (s1, c1) = fourier_pair(1.3, h);
            assert!((s0 - s1).abs() < 1e-9);
            assert!((c0 - c1).abs() < 1e-9);
        }
        let (s, c) = fourier_pair(0.0, 1);
        assert!(s.abs() < 1e-12 && (c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn years_since_counts_days() {
        let origin = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
        let later = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        // 2012..2016 spans 1461 days (one leap year).
        assert!((years_since(origin, later) - 4.0).abs() < 1e-12);
        assert!(years_since(later, origin) < 0.0);
    }
}
