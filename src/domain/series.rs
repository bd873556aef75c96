//! Daily price observations and the ordered series built from them.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::error::AppError;

/// One row of the input CSV after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub price: f64,
    /// Remaining CSV columns, keyed by normalized header name, as raw text.
    pub aux: BTreeMap<String, String>,
}

impl PriceRecord {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price,
            aux: BTreeMap::new(),
        }
    }

    /// Numeric value of an auxiliary column (e.g. `occupancy`), if present and parseable.
    pub fn aux_f64(&self, name: &str) -> Option<f64> {
        let v = self.aux.get(name)?.trim().parse::<f64>().ok()?;
        if v.is_finite() { Some(v) } else { None }
    }
}

/// Records ordered ascending by date with no duplicate dates.
///
/// Gaps between dates are allowed. Once built, a series is never mutated;
/// filtered views return new series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    /// Sort records by date and reject duplicate dates.
    pub fn from_records(mut records: Vec<PriceRecord>) -> Result<Self, AppError> {
        records.sort_by_key(|r| r.date);
        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(AppError::new(
                2,
                format!("Duplicate date {} in price series.", pair[0].date),
            ));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Distinct calendar years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.date.year()).collect();
        years.dedup();
        years
    }

    /// Records of a single year, in date order.
    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &PriceRecord> {
        self.records.iter().filter(move |r| r.date.year() == year)
    }

    /// A new series restricted to the given years.
    pub fn filter_years(&self, years: &[i32]) -> PriceSeries {
        PriceSeries {
            records: self
                .records
                .iter()
                .filter(|r| years.contains(&r.date.year()))
                .cloned()
                .collect(),
        }
    }

    pub fn prices(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.price).collect()
    }
}
