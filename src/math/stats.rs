//! Descriptive statistics over price slices.
//!
//! Conventions follow the usual data-frame defaults:
//! - standard deviation is the sample estimate (`n - 1` denominator)
//! - quantiles interpolate linearly between closest ranks

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; `None` for fewer than two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() as f64 - 1.0)).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Quantile `q` in `[0, 1]` of an ascending-sorted slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Values sorted ascending (NaNs are not expected here; they sort as equal).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

/// First and third quartiles.
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    let s = sorted(values);
    Some((quantile_sorted(&s, 0.25)?, quantile_sorted(&s, 0.75)?))
}

/// Percentage change from `prev` to `curr`; `None` when `prev` is zero.
pub fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 || !prev.is_finite() || !curr.is_finite() {
        return None;
    }
    Some((curr - prev) / prev * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_moments() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        let sd = std_dev(&v).unwrap();
        assert!((sd - 2.138089935).abs() < 1e-8, "sd={sd}");
        assert_eq!(min(&v), Some(2.0));
        assert_eq!(max(&v), Some(9.0));
        assert_eq!(std_dev(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&v), Some(2.5));
        assert_eq!(quartiles(&v), Some((1.75, 3.25)));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn pct_change_guards_zero() {
        let change = pct_change(100.0, 110.0).unwrap();
        assert!((change - 10.0).abs() < 1e-9);
        assert_eq!(pct_change(0.0, 1.0), None);
    }
}
