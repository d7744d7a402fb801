//! Gradient-boosted regression trees for the residual correction
//!
//! Small exact-greedy CART ensemble: each round fits a depth-limited
//! regression tree to the current residuals and adds it at the learning
//! rate. Splits minimize the summed squared error of the two children.
//! Tree-based, so features need no scaling. The random seed is pinned by
//! default so a refit on the same data reproduces the same model.

use crate::error::{ForecastError, Result};
use crate::models::{FeatureMatrix, Regressor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Default number of boosting rounds.
pub const DEFAULT_ESTIMATORS: usize = 40;

/// Default shrinkage applied to each tree.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Default tree depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Default seed for the row-subsampling generator.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf { value } => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] < *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

/// Gradient-boosted decision tree regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoost {
    /// Name of the model
    name: String,
    /// Number of boosting rounds
    n_estimators: usize,
    /// Shrinkage applied to each tree's contribution
    learning_rate: f64,
    /// Depth limit per tree
    max_depth: usize,
    /// Minimum rows on each side of a split
    min_leaf: usize,
    /// Fraction of rows drawn per round; 1.0 disables subsampling
    subsample: f64,
    /// Seed for the subsampling generator
    seed: u64,
    /// Whether fit has run
    fitted: bool,
    /// Constant baseline prediction (training-target mean)
    base_score: f64,
    /// Fitted trees, in boosting order
    trees: Vec<Node>,
}

impl GradientBoost {
    /// Create a new booster with the given rounds and learning rate.
    pub fn new(n_estimators: usize, learning_rate: f64) -> Result<Self> {
        if n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "Need at least one boosting round".to_string(),
            ));
        }
        if learning_rate <= 0.0 || learning_rate > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Learning rate must be in (0, 1]".to_string(),
            ));
        }

        Ok(Self {
            name: format!(
                "Gradient boosting ({} trees, lr={})",
                n_estimators, learning_rate
            ),
            n_estimators,
            learning_rate,
            max_depth: DEFAULT_MAX_DEPTH,
            min_leaf: 1,
            subsample: 1.0,
            seed: DEFAULT_SEED,
            fitted: false,
            base_score: 0.0,
            trees: Vec::new(),
        })
    }

    /// Override the per-tree depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Draw only a fraction of the rows each round.
    pub fn with_subsample(mut self, subsample: f64) -> Result<Self> {
        if subsample <= 0.0 || subsample > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Subsample fraction must be in (0, 1]".to_string(),
            ));
        }
        self.subsample = subsample;
        Ok(self)
    }

    /// Override the subsampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn grow_tree(
        &self,
        features: &FeatureMatrix,
        residuals: &[f64],
        indices: &[usize],
        depth: usize,
    ) -> Node {
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| residuals[i]).sum();
        let mean = sum / n as f64;

        if depth >= self.max_depth || n < 2 * self.min_leaf || n < 2 {
            return Node::Leaf { value: mean };
        }

        let sum_sq: f64 = indices.iter().map(|&i| residuals[i] * residuals[i]).sum();
        let parent_sse = sum_sq - sum * sum / n as f64;

        let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, sse)
        for feature in 0..features.n_features() {
            let mut order: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (features.row(i)[feature], residuals[i]))
                .collect();
            order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for split_at in 1..n {
                let (value, residual) = order[split_at - 1];
                left_sum += residual;
                left_sq += residual * residual;

                // Can only cut between distinct feature values
                if value >= order[split_at].0 {
                    continue;
                }
                if split_at < self.min_leaf || n - split_at < self.min_leaf {
                    continue;
                }

                let left_n = split_at as f64;
                let right_n = (n - split_at) as f64;
                let right_sum = sum - left_sum;
                let right_sq = sum_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / left_n)
                    + (right_sq - right_sum * right_sum / right_n);

                if best.map_or(true, |(_, _, best_sse)| sse < best_sse) {
                    let threshold = (value + order[split_at].0) / 2.0;
                    best = Some((feature, threshold, sse));
                }
            }
        }

        match best {
            Some((feature, threshold, sse)) if sse < parent_sse - 1e-12 => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| features.row(i)[feature] < threshold);

                Node::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow_tree(features, residuals, &left_idx, depth + 1)),
                    right: Box::new(self.grow_tree(features, residuals, &right_idx, depth + 1)),
                }
            }
            _ => Node::Leaf { value: mean },
        }
    }
}

impl Regressor for GradientBoost {
    fn fit(&mut self, features: &FeatureMatrix, target: &[f64]) -> Result<()> {
        let n = features.n_rows();
        if n == 0 {
            return Err(ForecastError::DataError(
                "Empty training data".to_string(),
            ));
        }
        if target.len() != n {
            return Err(ForecastError::ValidationError(format!(
                "Features have {} rows but target has {}",
                n,
                target.len()
            )));
        }

        self.base_score = target.iter().sum::<f64>() / n as f64;
        self.trees = Vec::with_capacity(self.n_estimators);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut predictions = vec![self.base_score; n];

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = target
                .iter()
                .zip(predictions.iter())
                .map(|(y, p)| y - p)
                .collect();

            let indices: Vec<usize> = if self.subsample < 1.0 {
                let take = ((n as f64 * self.subsample).round() as usize).max(1);
                let mut all: Vec<usize> = (0..n).collect();
                all.shuffle(&mut rng);
                all.truncate(take);
                all.sort_unstable();
                all
            } else {
                (0..n).collect()
            };

            let tree = self.grow_tree(features, &residuals, &indices, 0);
            for (i, prediction) in predictions.iter_mut().enumerate() {
                *prediction += self.learning_rate * tree.predict(features.row(i));
            }
            self.trees.push(tree);
        }

        self.fitted = true;
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(ForecastError::ForecastingError(
                "Residual model has not been fitted".to_string(),
            ));
        }

        Ok(features
            .iter_rows()
            .map(|row| {
                self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|tree| self.learning_rate * tree.predict(row))
                        .sum::<f64>()
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
