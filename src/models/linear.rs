//! Ordinary least squares regressor.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::fit_with_intercept;
use crate::models::Regressor;

/// `y ≈ b + x β`, solved by SVD least squares.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    intercept: f64,
    coef: Option<DVector<f64>>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> Option<&DVector<f64>> {
        self.coef.as_ref()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), AppError> {
        if x.nrows() == 0 {
            return Err(AppError::EmptyResult("No rows to fit.".to_string()));
        }
        let (b0, coef) = fit_with_intercept(x, y)
            .ok_or_else(|| AppError::Numeric("Least squares solve failed.".to_string()))?;
        self.intercept = b0;
        self.coef = Some(coef);
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        let coef = self.coef.as_ref().ok_or(AppError::NotFitted)?;
        if x.ncols() != coef.len() {
            return Err(AppError::InvalidInput(format!(
                "Model expects {} features, got {}",
                coef.len(),
                x.ncols()
            )));
        }
        let mut out = x * coef;
        out.add_scalar_mut(self.intercept);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_known_plane() {
        // y = 1 + 2 a - 3 b
        let rows: Vec<(f64, f64)> = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (2.0, 1.0), (3.0, 5.0)];
        let x = DMatrix::from_fn(rows.len(), 2, |i, j| if j == 0 { rows[i].0 } else { rows[i].1 });
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|(a, b)| 1.0 + 2.0 * a - 3.0 * b));

        let mut m = LinearRegression::new();
        m.fit(&x, &y).unwrap();
        assert!((m.intercept() - 1.0).abs() < 1e-9);
        let c = m.coefficients().unwrap();
        assert!((c[0] - 2.0).abs() < 1e-9);
        assert!((c[1] + 3.0).abs() < 1e-9);

        let pred = m.predict(&DMatrix::from_row_slice(1, 2, &[10.0, 1.0])).unwrap();
        assert!((pred[0] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn predict_before_fit_is_not_fitted() {
        let m = LinearRegression::new();
        assert_eq!(m.predict(&DMatrix::zeros(1, 2)).unwrap_err(), AppError::NotFitted);
    }
}
