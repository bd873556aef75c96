//! Dashboard charts.
//!
//! - `views`: aligns years and turns aggregates into render-ready `ChartSpec`s
//! - `svg`: draws a `ChartSpec` with Plotters into an SVG string

pub mod svg;
pub mod views;

pub use svg::*;
pub use views::*;
