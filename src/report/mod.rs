//! Reporting utilities: yearly/period aggregates and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analysis code stays clean and testable
//! - output changes are localized

pub mod format;
pub mod summary;

pub use format::*;
pub use summary::*;
