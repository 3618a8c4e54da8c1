//! Linear least squares.
//!
//! Two places in the crate solve small linear problems:
//!
//! - every Levenberg–Marquardt step solves the damped normal equations, written
//!   as an augmented (tall) least-squares system `[J; sqrt(λD)] δ ≈ [r; 0]`
//! - the sinusoid frequency estimate removes a best-fit line before the FFT
//!
//! Both are tall systems (more rows than columns), so they go through SVD;
//! nalgebra's `QR::solve` only accepts square matrices.

use nalgebra::{DMatrix, DVector};

/// Minimize `|x β - y|²` for `β`.
///
/// `None` when no tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    [1e-12, 1e-10, 1e-8]
        .into_iter()
        .filter_map(|tol| svd.solve(y, tol).ok())
        .find(|beta| beta.iter().all(|v| v.is_finite()))
}

/// Fit `y ≈ intercept + slope * x`, returning `(intercept, slope)`.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len();
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let rhs = DVector::from_column_slice(y);
    let beta = solve_least_squares(&design, &rhs)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_overdetermined_exact_system() {
        // y = 2 + 3x sampled at x = 0, 1, 2
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_trend_under_symmetric_noise() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 1.5 - 0.25 * v + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let (a, b) = fit_line(&x, &y).unwrap();
        assert!((b + 0.25).abs() < 0.05, "slope {b}");
        assert!((a - 1.5).abs() < 0.2, "intercept {a}");
    }

    #[test]
    fn fit_line_needs_two_points() {
        assert!(fit_line(&[1.0], &[2.0]).is_none());
    }
}
