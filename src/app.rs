//! Top-level application orchestration.
//!
//! The binaries in `src/main.rs` and `src/bin/` are intentionally tiny; this
//! module is the "real main" for each of them:
//! - parses CLI arguments on top of the layered settings
//! - installs logging
//! - runs the pipeline
//! - prints reports and writes output files

use std::sync::Arc;

use clap::Parser;

use crate::cli::{DashboardArgs, ForecastArgs, OutliersArgs};
use crate::config::Settings;
use crate::error::AppError;
use crate::web::DashboardState;

pub mod pipeline;

fn settings_with(apply: impl FnOnce(&mut Settings)) -> Result<Settings, AppError> {
    let mut settings = Settings::load()?;
    apply(&mut settings);
    settings.validate()?;
    crate::telemetry::init_logging(&settings.logging.level)?;
    Ok(settings)
}

/// Entry point for `hotel-dashboard`.
pub fn run_dashboard() -> Result<(), AppError> {
    let args = DashboardArgs::parse();
    let settings = settings_with(|s| args.apply(s))?;

    let ingest = pipeline::load(&settings)?;
    let state = Arc::new(DashboardState::new(ingest.series, &settings.outliers));
    tracing::info!(
        records = state.series.len(),
        outliers = state.outliers.outlier_count(),
        "dashboard data ready"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))?;
    runtime.block_on(crate::web::serve(state, &settings.server.host, settings.server.port))
}

/// Entry point for `hotel-outliers`.
pub fn run_outliers() -> Result<(), AppError> {
    let args = OutliersArgs::parse();
    let settings = settings_with(|s| args.apply(s))?;

    let run = pipeline::run_outliers(&settings)?;
    println!("{}", crate::report::format_dataset_summary(&run.ingest));
    println!("{}", crate::report::format_outlier_report(&run.report, &run.ingest.series));

    if let Some(path) = &args.export {
        crate::io::export::write_outliers_csv(path, &run.report)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Entry point for `hotel-forecast`.
pub fn run_forecast() -> Result<(), AppError> {
    let args = ForecastArgs::parse();
    let settings = settings_with(|s| args.apply(s))?;

    let run = pipeline::run_forecast(&settings)?;
    println!("{}", crate::report::format_dataset_summary(&run.ingest));
    println!("{}", crate::report::format_forecast_summary(&run.forecast));

    let output = &settings.forecast.output;
    crate::io::export::write_forecast_csv(output, &run.forecast.records)?;
    println!("Wrote {} predictions to {}", run.forecast.records.len(), output.display());
    Ok(())
}
