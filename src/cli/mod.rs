//! Command-line parsing for the three binaries.
//!
//! Flags only override `Settings`; every default lives in `config`. Keeping the
//! parsing here leaves the analysis code free of clap types.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::domain::{DateOrder, Granularity, RowPolicy, SpreadMethod};

/// `hotel-dashboard`: host and port only.
#[derive(Debug, Parser)]
#[command(name = "hotel-dashboard", version, about = "Interactive year-over-year hotel price dashboard")]
pub struct DashboardArgs {
    /// Interface to bind (default from `server.host`).
    #[arg(long, env = "HOTEL_HOST")]
    pub host: Option<String>,

    /// Port to listen on (default from `server.port`).
    #[arg(long, env = "HOTEL_PORT")]
    pub port: Option<u16>,
}

impl DashboardArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}

/// Input options shared by the batch binaries.
#[derive(Debug, Clone, clap::Args)]
pub struct InputArgs {
    /// Price CSV to analyze (default from `data.path` / `HOTEL_PRICES_CSV`).
    #[arg(long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Abort on malformed rows (`strict`) or skip and report them (`drop`).
    #[arg(long, value_enum)]
    pub row_policy: Option<RowPolicy>,

    /// Read `01/02/2015` as January 2 (`mdy`) or February 1 (`dmy`).
    #[arg(long, value_enum)]
    pub date_order: Option<DateOrder>,
}

impl InputArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.data {
            settings.data.path = path.clone();
        }
        if let Some(policy) = self.row_policy {
            settings.data.load.row_policy = policy;
        }
        if let Some(order) = self.date_order {
            settings.data.load.date_order = order;
        }
    }
}

/// `hotel-outliers`: batch outlier report.
#[derive(Debug, Parser)]
#[command(name = "hotel-outliers", version, about = "Flag unusual daily hotel prices")]
pub struct OutliersArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Context each price is judged against.
    #[arg(long, value_enum)]
    pub granularity: Option<Granularity>,

    /// Center/spread statistic used for the bound.
    #[arg(long, value_enum)]
    pub method: Option<SpreadMethod>,

    /// Spread multiplier (default 1.5 for iqr, 3.0 for zscore).
    #[arg(long)]
    pub multiplier: Option<f64>,

    /// Minimum context size before any of its records can be flagged.
    #[arg(long)]
    pub min_context_points: Option<usize>,

    /// Write every record with its flag and score to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

impl OutliersArgs {
    pub fn apply(&self, settings: &mut Settings) {
        self.input.apply(settings);
        let cfg = &mut settings.outliers;
        if let Some(g) = self.granularity {
            cfg.granularity = g;
        }
        if let Some(m) = self.method {
            cfg.method = m;
        }
        if self.multiplier.is_some() {
            cfg.multiplier = self.multiplier;
        }
        if let Some(n) = self.min_context_points {
            cfg.min_context_points = n;
        }
    }
}

/// `hotel-forecast`: fit the history and write the target month's predictions.
#[derive(Debug, Parser)]
#[command(name = "hotel-forecast", version, about = "Forecast daily hotel prices for a future month")]
pub struct ForecastArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Prediction CSV (default from `forecast.output`).
    #[arg(long, value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Largest number of yearly harmonics tried.
    #[arg(long)]
    pub max_harmonics: Option<usize>,

    /// Drop the day-of-week terms.
    #[arg(long)]
    pub no_weekly: bool,
}

impl ForecastArgs {
    pub fn apply(&self, settings: &mut Settings) {
        self.input.apply(settings);
        let cfg = &mut settings.forecast;
        if let Some(path) = &self.output {
            cfg.output = path.clone();
        }
        if let Some(h) = self.max_harmonics {
            cfg.max_harmonics = h;
        }
        if self.no_weekly {
            cfg.weekly = false;
        }
    }
}
