//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - deserialized from the TOML settings file
//! - selected from the command line (`ValueEnum`)
//! - exported to CSV alongside the computed analytics

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// What the loader does with rows it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Abort the load on the first malformed row or duplicate date.
    #[default]
    Strict,
    /// Skip malformed rows (and later duplicates) and report them.
    Drop,
}

/// Field order tried first for slash or dash dates without a leading year.
///
/// The other order is still tried when the preferred one cannot be a valid
/// date, so `12/31/2015` and `31/12/2015` load under either setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// `01/02/2015` is January 2.
    #[default]
    Mdy,
    /// `01/02/2015` is February 1.
    Dmy,
}

impl DateOrder {
    /// chrono formats for this order, preferred one first.
    pub fn formats(self) -> [&'static str; 4] {
        match self {
            DateOrder::Mdy => ["%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y", "%d-%m-%Y"],
            DateOrder::Dmy => ["%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y", "%m-%d-%Y"],
        }
    }
}

/// CSV schema and row handling for the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Header of the date column (matched case-insensitively).
    pub date_column: String,
    /// Header of the price column (matched case-insensitively).
    pub price_column: String,
    pub row_policy: RowPolicy,
    pub date_order: DateOrder,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            price_column: "price".to_string(),
            row_policy: RowPolicy::Strict,
            date_order: DateOrder::Mdy,
        }
    }
}

/// How the series is partitioned into local contexts for outlier detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One context per calendar month of each year.
    #[default]
    Month,
    /// One context per calendar year.
    Year,
    /// The whole series is a single context.
    Series,
}

/// Center/spread pair used to build the outlier bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpreadMethod {
    /// Median center, interquartile range spread; bound is `[Q1 - k·IQR, Q3 + k·IQR]`.
    #[default]
    Iqr,
    /// Mean center, sample standard deviation spread; bound is `mean ± k·std`.
    Zscore,
}

impl SpreadMethod {
    pub fn default_multiplier(self) -> f64 {
        match self {
            SpreadMethod::Iqr => 1.5,
            SpreadMethod::Zscore => 3.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SpreadMethod::Iqr => "IQR",
            SpreadMethod::Zscore => "z-score",
        }
    }
}

/// Outlier detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub granularity: Granularity,
    pub method: SpreadMethod,
    /// Spread multiple; `None` uses the method default (1.5 for IQR, 3.0 for z-score).
    pub multiplier: Option<f64>,
    /// Contexts with fewer points than this are not evaluated.
    pub min_context_points: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            method: SpreadMethod::Iqr,
            multiplier: None,
            min_context_points: 4,
        }
    }
}

impl OutlierConfig {
    pub fn effective_multiplier(&self) -> f64 {
        self.multiplier
            .unwrap_or_else(|| self.method.default_multiplier())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let k = self.effective_multiplier();
        if !(k.is_finite() && k > 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid outlier multiplier {k} (must be finite and > 0)."),
            ));
        }
        if self.min_context_points < 2 {
            return Err(AppError::new(
                2,
                "Outlier `min_context_points` must be >= 2.",
            ));
        }
        Ok(())
    }
}

/// Forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub target_year: i32,
    /// 1-based month of `target_year` to predict, one value per day.
    pub target_month: u32,
    /// Largest number of yearly sin/cos pairs tried during model selection.
    pub max_harmonics: usize,
    /// Include day-of-week effects.
    pub weekly: bool,
    /// Minimum span of history (days) required before fitting.
    pub min_history_days: i64,
    /// Where the prediction CSV is written.
    pub output: PathBuf,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            target_year: 2022,
            target_month: 2,
            max_harmonics: 4,
            weekly: true,
            min_history_days: 730,
            output: PathBuf::from("forecast_feb_2022.csv"),
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=12).contains(&self.target_month) {
            return Err(AppError::new(
                2,
                format!("Invalid forecast target month {} (expected 1-12).", self.target_month),
            ));
        }
        if self.max_harmonics == 0 {
            return Err(AppError::new(2, "Forecast `max_harmonics` must be >= 1."));
        }
        if self.min_history_days < 0 {
            return Err(AppError::new(2, "Forecast `min_history_days` must be >= 0."));
        }
        Ok(())
    }
}

/// Which comparison the main dashboard chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonKind {
    #[default]
    Overlay,
    Monthly,
    Quarterly,
    Weekly,
}

impl ComparisonKind {
    pub const ALL: [ComparisonKind; 4] = [
        ComparisonKind::Overlay,
        ComparisonKind::Monthly,
        ComparisonKind::Quarterly,
        ComparisonKind::Weekly,
    ];

    /// Query-string value.
    pub fn key(self) -> &'static str {
        match self {
            ComparisonKind::Overlay => "overlay",
            ComparisonKind::Monthly => "monthly",
            ComparisonKind::Quarterly => "quarterly",
            ComparisonKind::Weekly => "weekly",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key.trim())
    }

    pub fn label(self) -> &'static str {
        match self {
            ComparisonKind::Overlay => "Overlay by Day of Year",
            ComparisonKind::Monthly => "Monthly Averages",
            ComparisonKind::Quarterly => "Quarterly Comparison",
            ComparisonKind::Weekly => "Weekly Patterns",
        }
    }
}

/// The local context a record is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextKey {
    Month { year: i32, month: u32 },
    Year(i32),
    Series,
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextKey::Month { year, month } => write!(f, "{year}-{month:02}"),
            ContextKey::Year(year) => write!(f, "{year}"),
            ContextKey::Series => write!(f, "all"),
        }
    }
}

/// Outlier verdict for one record; kept beside the series, never inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierFlag {
    pub date: NaiveDate,
    pub price: f64,
    pub context: ContextKey,
    pub is_outlier: bool,
    /// Signed distance from the context center in units of spread.
    ///
    /// `None` when the context was too small to evaluate or had zero spread.
    pub score: Option<f64>,
}

/// One predicted day; serializes as a `date,predicted_price` CSV row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    #[serde(serialize_with = "four_decimals")]
    pub predicted_price: f64,
}

fn four_decimals<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.4}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlier_defaults() {
        let cfg = OutlierConfig::default();
        assert_eq!(cfg.granularity, Granularity::Month);
        assert_eq!(cfg.effective_multiplier(), 1.5);
        assert_eq!(cfg.min_context_points, 4);

        let z = OutlierConfig {
            method: SpreadMethod::Zscore,
            ..OutlierConfig::default()
        };
        assert_eq!(z.effective_multiplier(), 3.0);
    }

    #[test]
    fn outlier_validation() {
        let bad = OutlierConfig {
            multiplier: Some(-1.0),
            ..OutlierConfig::default()
        };
        assert_eq!(bad.validate().unwrap_err().exit_code(), 2);
        assert!(OutlierConfig::default().validate().is_ok());
    }

    #[test]
    fn forecast_validation() {
        assert!(ForecastConfig::default().validate().is_ok());
        let bad = ForecastConfig {
            target_month: 13,
            ..ForecastConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn comparison_keys_round_trip() {
        for kind in ComparisonKind::ALL {
            assert_eq!(ComparisonKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ComparisonKind::from_key("bogus"), None);
    }

    #[test]
    fn context_key_display() {
        assert_eq!(ContextKey::Month { year: 2014, month: 3 }.to_string(), "2014-03");
        assert_eq!(ContextKey::Year(2015).to_string(), "2015");
        assert_eq!(ContextKey::Series.to_string(), "all");
    }
}
