//! Column standardization (zero mean, unit variance).

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::{mean as mean_of, population_variance};

/// Per-column `(x - mean) / std`, learned from the training matrix only.
///
/// Uses the population standard deviation. Columns with zero variance are
/// centred but not rescaled.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    mean: Option<DVector<f64>>,
    scale: Option<DVector<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    pub fn fit(&mut self, x: &DMatrix<f64>) -> Result<(), AppError> {
        let (n, p) = x.shape();
        if n == 0 {
            return Err(AppError::EmptyResult("Cannot fit scaler on zero rows.".to_string()));
        }

        let mut mean = DVector::zeros(p);
        let mut scale = DVector::from_element(p, 1.0);
        for j in 0..p {
            let col: Vec<f64> = x.column(j).iter().copied().collect();
            let (Some(m), Some(var)) = (mean_of(&col), population_variance(&col)) else {
                continue;
            };
            let sd = var.sqrt();
            mean[j] = m;
            if sd.is_finite() && sd > f64::EPSILON * m.abs().max(1.0) {
                scale[j] = sd;
            }
        }

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(AppError::NotFitted);
        };
        if x.ncols() != mean.len() {
            return Err(AppError::InvalidInput(format!(
                "Scaler expects {} columns, got {}",
                mean.len(),
                x.ncols()
            )));
        }
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| (x[(i, j)] - mean[j]) / scale[j]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_columns() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 10.0, 2.0, 10.0, 3.0, 10.0, 4.0, 10.0]);
        let mut s = StandardScaler::new();
        s.fit(&x).unwrap();
        let z = s.transform(&x).unwrap();

        let col0 = z.column(0);
        assert!(col0.sum().abs() < 1e-12);
        let var0 = col0.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!((var0 - 1.0).abs() < 1e-12);

        // Constant column: centred, not blown up.
        assert!(z.column(1).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn transform_uses_training_statistics() {
        let train = DMatrix::from_row_slice(2, 1, &[0.0, 2.0]);
        let mut s = StandardScaler::new();
        s.fit(&train).unwrap();
        let z = s.transform(&DMatrix::from_row_slice(1, 1, &[4.0])).unwrap();
        assert!((z[(0, 0)] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn unfitted_transform_fails() {
        let s = StandardScaler::new();
        let err = s.transform(&DMatrix::zeros(1, 1)).unwrap_err();
        assert_eq!(err, AppError::NotFitted);
    }
}
