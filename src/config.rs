//! Layered settings shared by the three binaries.
//!
//! Precedence, lowest first: built-in defaults, the TOML file named by
//! `HOTEL_PRICES_CONFIG`, then the `HOTEL_PRICES_CSV` / `HOTEL_PRICES_LOG`
//! environment variables. Command-line flags are applied on top by `app`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{ForecastConfig, LoadConfig, OutlierConfig};
use crate::error::AppError;

pub const CONFIG_ENV: &str = "HOTEL_PRICES_CONFIG";
pub const CSV_ENV: &str = "HOTEL_PRICES_CSV";
pub const LOG_ENV: &str = "HOTEL_PRICES_LOG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub outliers: OutlierConfig,
    pub forecast: ForecastConfig,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Input CSV location and schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub path: PathBuf,
    #[serde(flatten)]
    pub load: LoadConfig,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cleaned_data.csv"),
            load: LoadConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter; `RUST_LOG` still wins.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load `.env`, then the optional TOML file, then environment overrides.
    ///
    /// Callers run `validate` once their own overrides are applied.
    pub fn load() -> Result<Self, AppError> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let mut settings = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
        Self::from_toml(&content).map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(CSV_ENV).filter(|s| !s.trim().is_empty()) {
            self.data.path = PathBuf::from(path.trim());
        }
        if let Some(level) = lookup(LOG_ENV).filter(|s| !s.trim().is_empty()) {
            self.logging.level = level.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.outliers.validate()?;
        self.forecast.validate()?;
        if self.server.host.trim().is_empty() {
            return Err(AppError::new(2, "server.host must not be empty."));
        }
        Ok(())
    }
}
