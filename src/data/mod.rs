//! Synthetic data generation for tests and demos.

pub mod sample;

pub use sample::*;
