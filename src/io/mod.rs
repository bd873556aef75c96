//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - forecast and outlier CSV exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
