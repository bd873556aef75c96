//! Mathematical utilities: descriptive statistics, seasonal basis functions and least squares.

pub mod basis;
pub mod ols;
pub mod stats;

pub use basis::*;
pub use ols::*;
pub use stats::*;
