//! `hotel-prices` library crate.
//!
//! The binaries (`hotel-dashboard`, `hotel-outliers`, `hotel-forecast`) are thin
//! wrappers around this library so that:
//!
//! - core logic is testable without spawning processes or sockets
//! - the dashboard and the batch reports share one loader and one set of analyses
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod outliers;
pub mod report;
pub mod telemetry;
pub mod viz;
pub mod web;
