//! Least squares solver.
//!
//! The forecaster solves one small regression per candidate harmonic count:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD handles the tall design matrix (many days, at most ~17 columns).
//!   Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.
//! - Sparse histories can make sin/cos columns nearly collinear; the solve is
//!   retried with looser singular-value tolerances before giving up.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
