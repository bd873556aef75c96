//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the loaded data (`PriceRecord`, `PriceSeries`)
//! - calendar alignment helpers (`aligned_position`, `month_days`)
//! - configuration enums and structs (`LoadConfig`, `OutlierConfig`, `ForecastConfig`)
//! - analysis outputs (`OutlierFlag`, `ForecastRecord`)

pub mod calendar;
pub mod series;
pub mod types;

pub use calendar::*;
pub use series::*;
pub use types::*;
