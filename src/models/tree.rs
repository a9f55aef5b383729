//! CART regression tree (variance reduction splits).

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` considers all of them.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Position in the sorted order: `sorted[..at]` goes left.
    at: usize,
    sse: f64,
}

/// Nodes live in a flat arena; the root is `nodes[0]`.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    config: TreeConfig,
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Fit on the rows of `x` named by `rows` (repeats allowed, for bootstrap samples).
    pub fn fit_rows(&mut self, x: &DMatrix<f64>, y: &DVector<f64>, rows: &[usize]) {
        self.nodes.clear();
        if rows.is_empty() {
            self.nodes.push(Node::Leaf { value: 0.0 });
            return;
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut idx = rows.to_vec();
        self.grow(x, y, &mut idx, 0, &mut rng);
    }

    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) {
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &rows);
    }

    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    at = if x[(row, *feature)] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Recursively build the subtree for `idx`; returns its arena position.
    fn grow(&mut self, x: &DMatrix<f64>, y: &DVector<f64>, idx: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let n = idx.len();
        let mean = idx.iter().map(|&i| y[i]).sum::<f64>() / n as f64;
        let sse = idx.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>();

        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let depth_ok = self.config.max_depth.is_none_or(|d| depth < d);
        if !depth_ok || n < self.config.min_samples_split || n < 2 * self.config.min_samples_leaf || sse <= 1e-12 {
            return slot;
        }

        let Some(best) = self.best_split(x, y, idx, sse, rng) else {
            return slot;
        };

        idx.sort_by(|&a, &b| x[(a, best.feature)].total_cmp(&x[(b, best.feature)]));
        let (left_idx, right_idx) = idx.split_at_mut(best.at);
        let left = self.grow(x, y, left_idx, depth + 1, rng);
        let right = self.grow(x, y, right_idx, depth + 1, rng);

        self.nodes[slot] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        slot
    }

    /// Sorted sweep over candidate features using running sums of `y` and `y²`.
    fn best_split(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        idx: &[usize],
        parent_sse: f64,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n = idx.len();
        let p = x.ncols();
        let mut features: Vec<usize> = (0..p).collect();
        if let Some(m) = self.config.max_features.filter(|&m| m < p) {
            features.shuffle(rng);
            features.truncate(m.max(1));
        }

        let total: f64 = idx.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = idx.iter().map(|&i| y[i] * y[i]).sum();
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<BestSplit> = None;
        let mut sorted = idx.to_vec();
        for &f in &features {
            sorted.sort_by(|&a, &b| x[(a, f)].total_cmp(&x[(b, f)]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..n {
                let yi = y[sorted[k - 1]];
                left_sum += yi;
                left_sq += yi * yi;

                let lo = x[(sorted[k - 1], f)];
                let hi = x[(sorted[k], f)];
                if k < min_leaf || n - k < min_leaf || hi <= lo {
                    continue;
                }

                let nl = k as f64;
                let nr = (n - k) as f64;
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);

                if best.as_ref().is_none_or(|b| sse < b.sse) {
                    let mid = lo + (hi - lo) / 2.0;
                    // Guard against the midpoint rounding onto `hi`.
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(BestSplit {
                        feature: f,
                        threshold,
                        at: k,
                        sse,
                    });
                }
            }
        }

        best.filter(|b| b.sse < parent_sse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_function_is_learned_exactly() {
        let x = DMatrix::from_fn(10, 1, |i, _| i as f64);
        let y = DVector::from_fn(10, |i, _| if i < 5 { 1.0 } else { 7.0 });
        let mut t = RegressionTree::new(TreeConfig::default());
        t.fit(&x, &y);

        assert_eq!(t.node_count(), 3);
        for i in 0..10 {
            assert_eq!(t.predict_row(&x, i), y[i]);
        }
    }

    #[test]
    fn depth_zero_is_the_mean() {
        let x = DMatrix::from_fn(4, 1, |i, _| i as f64);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0, 6.0]);
        let mut t = RegressionTree::new(TreeConfig {
            max_depth: Some(0),
            ..Default::default()
        });
        t.fit(&x, &y);
        assert_eq!(t.predict_row(&x, 0), 3.0);
    }

    #[test]
    fn min_leaf_blocks_small_children() {
        let x = DMatrix::from_fn(4, 1, |i, _| i as f64);
        let y = DVector::from_vec(vec![0.0, 0.0, 0.0, 10.0]);
        let mut t = RegressionTree::new(TreeConfig {
            min_samples_leaf: 2,
            ..Default::default()
        });
        t.fit(&x, &y);
        // Only the 2 | 2 split is allowed.
        assert_eq!(t.predict_row(&x, 3), 5.0);
        assert_eq!(t.predict_row(&x, 0), 0.0);
    }

    #[test]
    fn tied_feature_values_are_not_split() {
        let x = DMatrix::from_element(3, 1, 1.0);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let mut t = RegressionTree::new(TreeConfig::default());
        t.fit(&x, &y);
        assert_eq!(t.node_count(), 1);
        assert_eq!(t.predict_row(&x, 0), 2.0);
    }
}
