//! Per-year and per-period aggregates shown on the dashboard.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::domain::{PriceSeries, iso_week, quarter};
use crate::math::{max, mean, median, min, pct_change, std_dev};

/// One row of the year-over-year summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSummary {
    pub year: i32,
    pub days: usize,
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// Change of the mean versus the previous row, in percent.
    pub yoy_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearVolatility {
    pub year: i32,
    pub std: Option<f64>,
    /// `(max - min) / mean * 100`.
    pub range_pct: Option<f64>,
}

/// Aggregate of one (year, period) bucket: a month, quarter or ISO week.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodStats {
    pub year: i32,
    pub period: u32,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

fn prices_by_year(series: &PriceSeries) -> BTreeMap<i32, Vec<f64>> {
    let mut out: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for rec in series.records() {
        out.entry(rec.date.year()).or_default().push(rec.price);
    }
    out
}

/// Summary per year present in `series`, ascending.
///
/// The year-over-year change compares each row with the row before it, so a
/// gap in the selected years compares across the gap.
pub fn yearly_summary(series: &PriceSeries) -> Vec<YearSummary> {
    let mut out: Vec<YearSummary> = Vec::new();
    for (year, prices) in prices_by_year(series) {
        let (Some(m), Some(med), Some(lo), Some(hi)) = (mean(&prices), median(&prices), min(&prices), max(&prices)) else {
            continue;
        };
        let yoy_change_pct = out.last().and_then(|prev| pct_change(prev.mean, m));
        out.push(YearSummary {
            year,
            days: prices.len(),
            mean: m,
            median: med,
            std: std_dev(&prices),
            min: lo,
            max: hi,
            yoy_change_pct,
        });
    }
    out
}

pub fn yearly_volatility(series: &PriceSeries) -> Vec<YearVolatility> {
    prices_by_year(series)
        .into_iter()
        .map(|(year, prices)| {
            let range_pct = match (min(&prices), max(&prices), mean(&prices)) {
                (Some(lo), Some(hi), Some(m)) if m != 0.0 => Some((hi - lo) / m * 100.0),
                _ => None,
            };
            YearVolatility {
                year,
                std: std_dev(&prices),
                range_pct,
            }
        })
        .collect()
}

fn period_stats(series: &PriceSeries, period_of: fn(NaiveDate) -> u32) -> Vec<PeriodStats> {
    let mut buckets: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for rec in series.records() {
        buckets
            .entry((rec.date.year(), period_of(rec.date)))
            .or_default()
            .push(rec.price);
    }
    buckets
        .into_iter()
        .filter_map(|((year, period), prices)| {
            Some(PeriodStats {
                year,
                period,
                mean: mean(&prices)?,
                std: std_dev(&prices),
                min: min(&prices)?,
                max: max(&prices)?,
            })
        })
        .collect()
}

pub fn monthly_stats(series: &PriceSeries) -> Vec<PeriodStats> {
    period_stats(series, |d| d.month())
}

pub fn quarterly_stats(series: &PriceSeries) -> Vec<PeriodStats> {
    period_stats(series, quarter)
}

pub fn weekly_stats(series: &PriceSeries) -> Vec<PeriodStats> {
    period_stats(series, iso_week)
}
