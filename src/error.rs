//! Application error type shared by all binaries.
//!
//! Exit codes:
//! - `2`: input or configuration problems (missing file, malformed row, bad setting)
//! - `3`: not enough data for the requested analysis
//! - `4`: numerical or internal failures (solver, rendering, server I/O)

use crate::io::ingest::ParseError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::new(2, err.to_string())
    }
}
