//! Least squares solver.
//!
//! The linear strategy solves
//!
//! ```text
//! minimize Σ (y_i - b - x_i^T β)^2
//! ```
//!
//! on standardized features. The graph columns are constant within a ticker, so
//! the design matrix is frequently rank deficient (e.g. a single-ticker
//! training set makes every graph column zero after centering). SVD gives the
//! minimum-norm solution in that case instead of failing.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Progressively looser singular-value cutoffs for near-collinear designs.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ≈ intercept + x β`, returning `(intercept, β)`.
pub fn fit_with_intercept(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<(f64, DVector<f64>)> {
    let (n, p) = x.shape();
    if n == 0 || n != y.len() {
        return None;
    }

    let design = DMatrix::from_fn(n, p + 1, |i, j| if j == 0 { 1.0 } else { x[(i, j - 1)] });
    let beta = solve_least_squares(&design, y)?;
    let coef = DVector::from_iterator(p, beta.iter().skip(1).copied());
    Some((beta[0], coef))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn intercept_fit_tolerates_a_zero_column() {
        // Second column is all zeros (a centred constant feature).
        let x = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0, 7.0]);

        let (b0, coef) = fit_with_intercept(&x, &y).unwrap();
        assert!((b0 - 1.0).abs() < 1e-9);
        assert!((coef[0] - 2.0).abs() < 1e-9);
        assert!(coef[1].abs() < 1e-9);
    }
}
