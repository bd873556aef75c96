//! Structured logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

/// Install the global subscriber. `RUST_LOG` overrides `level` when set.
///
/// Logs go to stderr so the batch reports on stdout stay clean.
pub fn init_logging(level: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::new(2, format!("Invalid log level '{level}': {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| AppError::new(4, format!("Failed to init logging: {e}")))?;

    Ok(())
}
