//! Dispersion-based outlier detection over local contexts.
//!
//! Each record is judged against the other records of its context (its month,
//! its year, or the whole series). A context needs at least
//! `min_context_points` records before any of them can be flagged.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::{ContextKey, Granularity, OutlierConfig, OutlierFlag, PriceRecord, PriceSeries, SpreadMethod};
use crate::math::{mean, median, quartiles, std_dev};

/// Bound and outcome for one context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSummary {
    pub key: ContextKey,
    pub n: usize,
    /// `false` when the context had too few points to judge.
    pub evaluated: bool,
    pub center: Option<f64>,
    pub spread: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub flagged: usize,
}

/// Detection output: one flag per record (series order) plus per-context bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub flags: Vec<OutlierFlag>,
    pub contexts: Vec<ContextSummary>,
    pub config: OutlierConfig,
}

impl OutlierReport {
    /// Flagged records only, in date order.
    pub fn outliers(&self) -> impl Iterator<Item = &OutlierFlag> {
        self.flags.iter().filter(|f| f.is_outlier)
    }

    pub fn outlier_count(&self) -> usize {
        self.outliers().count()
    }

    pub fn is_outlier(&self, date: chrono::NaiveDate) -> bool {
        self.flags
            .binary_search_by_key(&date, |f| f.date)
            .map(|idx| self.flags[idx].is_outlier)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy)]
struct Bound {
    center: f64,
    spread: f64,
    lower: f64,
    upper: f64,
}

/// Flag records whose price falls outside their context's bound.
///
/// The result depends only on the series and the configuration.
pub fn detect_outliers(series: &PriceSeries, config: &OutlierConfig) -> OutlierReport {
    let k = config.effective_multiplier();

    let mut groups: BTreeMap<ContextKey, Vec<&PriceRecord>> = BTreeMap::new();
    for rec in series.records() {
        groups
            .entry(context_key(rec, config.granularity))
            .or_default()
            .push(rec);
    }

    let mut contexts = Vec::with_capacity(groups.len());
    let mut flags = Vec::with_capacity(series.len());

    for (key, records) in &groups {
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        let bound = if prices.len() >= config.min_context_points {
            compute_bound(&prices, config.method, k)
        } else {
            None
        };

        let mut flagged = 0usize;
        for rec in records {
            let (is_outlier, score) = match bound {
                Some(b) => {
                    let tol = 1e-9 * b.center.abs().max(1.0);
                    let out = rec.price < b.lower - tol || rec.price > b.upper + tol;
                    let score = (b.spread > 0.0).then(|| (rec.price - b.center) / b.spread);
                    (out, score)
                }
                None => (false, None),
            };
            if is_outlier {
                flagged += 1;
            }
            flags.push(OutlierFlag {
                date: rec.date,
                price: rec.price,
                context: *key,
                is_outlier,
                score,
            });
        }

        contexts.push(ContextSummary {
            key: *key,
            n: prices.len(),
            evaluated: bound.is_some(),
            center: bound.map(|b| b.center),
            spread: bound.map(|b| b.spread),
            lower: bound.map(|b| b.lower),
            upper: bound.map(|b| b.upper),
            flagged,
        });
    }

    // Contexts are contiguous in time for every granularity, but sort anyway so
    // the flag table always lines up with the series.
    flags.sort_by_key(|f| f.date);

    let report = OutlierReport {
        flags,
        contexts,
        config: config.clone(),
    };
    tracing::debug!(
        contexts = report.contexts.len(),
        outliers = report.outlier_count(),
        method = config.method.display_name(),
        multiplier = k,
        "outlier detection finished"
    );
    report
}

fn context_key(rec: &PriceRecord, granularity: Granularity) -> ContextKey {
    match granularity {
        Granularity::Month => ContextKey::Month {
            year: rec.date.year(),
            month: rec.date.month(),
        },
        Granularity::Year => ContextKey::Year(rec.date.year()),
        Granularity::Series => ContextKey::Series,
    }
}

fn compute_bound(prices: &[f64], method: SpreadMethod, k: f64) -> Option<Bound> {
    match method {
        SpreadMethod::Iqr => {
            let (q1, q3) = quartiles(prices)?;
            let iqr = q3 - q1;
            Some(Bound {
                center: median(prices)?,
                spread: iqr,
                lower: q1 - k * iqr,
                upper: q3 + k * iqr,
            })
        }
        SpreadMethod::Zscore => {
            let m = mean(prices)?;
            let sd = std_dev(prices)?;
            Some(Bound {
                center: m,
                spread: sd,
                lower: m - k * sd,
                upper: m + k * sd,
            })
        }
    }
}
