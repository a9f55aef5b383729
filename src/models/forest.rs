//! Bagged ensemble of regression trees.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Regressor;
use crate::models::tree::{RegressionTree, TreeConfig};

/// Random forest configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (`None` = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (`None` = all)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), AppError> {
        let n = x.nrows();
        if n == 0 {
            return Err(AppError::EmptyResult("No rows to fit.".to_string()));
        }
        if self.config.n_trees == 0 {
            return Err(AppError::InvalidInput("Forest needs at least one tree.".to_string()));
        }

        let cfg = self.config;
        // Each tree is seeded from its index.
        let trees: Vec<RegressionTree> = (0..cfg.n_trees)
            .into_par_iter()
            .map(|i| {
                let seed = cfg.seed.wrapping_add(i as u64);
                let rows: Vec<usize> = if cfg.bootstrap {
                    let mut rng = StdRng::seed_from_u64(seed);
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };

                let mut tree = RegressionTree::new(TreeConfig {
                    max_depth: cfg.max_depth,
                    min_samples_split: cfg.min_samples_split,
                    min_samples_leaf: cfg.min_samples_leaf,
                    max_features: cfg.max_features,
                    seed: seed.wrapping_mul(0x9E37_79B9_7F4A_7C15),
                });
                tree.fit_rows(x, y, &rows);
                tree
            })
            .collect();

        tracing::debug!(trees = trees.len(), rows = n, "fitted random forest");
        self.trees = trees;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        if self.trees.is_empty() {
            return Err(AppError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(AppError::InvalidInput(format!(
                "Model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let k = self.trees.len() as f64;
        let out: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(x, row)).sum::<f64>() / k)
            .collect();
        Ok(DVector::from_vec(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (DMatrix<f64>, DVector<f64>) {
        let n = 60;
        let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y = DVector::from_fn(n, |i, _| 3.0 * i as f64 + if i % 7 > 3 { 5.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = data();
        let cfg = ForestConfig {
            n_trees: 12,
            ..Default::default()
        };
        let mut a = RandomForestRegressor::new(cfg);
        let mut b = RandomForestRegressor::new(cfg);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.n_trees(), 12);
    }

    #[test]
    fn fits_training_data_closely() {
        let (x, y) = data();
        let mut f = RandomForestRegressor::new(ForestConfig {
            n_trees: 20,
            ..Default::default()
        });
        f.fit(&x, &y).unwrap();
        let pred = f.predict(&x).unwrap();
        let mae = (&pred - &y).abs().mean();
        assert!(mae < 5.0, "mae {mae}");
    }

    #[test]
    fn without_bootstrap_trees_reproduce_targets() {
        let (x, y) = data();
        let mut f = RandomForestRegressor::new(ForestConfig {
            n_trees: 3,
            bootstrap: false,
            ..Default::default()
        });
        f.fit(&x, &y).unwrap();
        let pred = f.predict(&x).unwrap();
        for i in 0..y.len() {
            assert!((pred[i] - y[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn predict_before_fit_is_not_fitted() {
        let f = RandomForestRegressor::new(ForestConfig::default());
        assert_eq!(f.predict(&DMatrix::zeros(1, 2)).unwrap_err(), AppError::NotFitted);
    }
}
