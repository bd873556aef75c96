//! Outlier detection.
//!
//! Responsibilities:
//!
//! - partition the series into contexts (month / year / whole series)
//! - compute a center and spread per context (median + IQR, or mean + std)
//! - flag records beyond the configured multiple of the spread

pub mod detector;

pub use detector::*;
