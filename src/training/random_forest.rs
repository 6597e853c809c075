//! Random Forest classifier

use super::decision_tree::DecisionTree;
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Bagged ensemble of Gini decision trees for binary classification.
///
/// Each tree trains on a bootstrap sample over a random sqrt-sized feature
/// subset; the predicted probability is the fraction of trees voting for
/// the positive class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    feature_subsets: Vec<Vec<usize>>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub random_state: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            feature_subsets: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            random_state: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth per tree
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(ChurnError::TrainingError(
                "cannot train forest on empty data".to_string(),
            ));
        }

        self.n_features = n_features;
        let subset_size = ((n_features as f64).sqrt().ceil() as usize).max(1);

        // Trees are independent, so each gets its own derived seed and the
        // ensemble builds in parallel.
        let fitted: Vec<(DecisionTree, Vec<usize>)> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let mut cols: Vec<usize> = (0..n_features).collect();
                cols.shuffle(&mut rng);
                cols.truncate(subset_size);
                cols.sort_unstable();

                let x_rows = x.select(Axis(0), &sample_indices);
                let x_boot = x_rows.select(Axis(1), &cols);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new_classifier()
                    .with_min_samples_split(self.min_samples_split);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }
                tree.fit(&x_boot, &y_boot)?;
                Ok((tree, cols))
            })
            .collect::<Result<_>>()?;

        let (trees, feature_subsets): (Vec<_>, Vec<_>) = fitted.into_iter().unzip();
        self.trees = trees;
        self.feature_subsets = feature_subsets;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut totals = vec![0.0; self.n_features];
        for (tree, cols) in self.trees.iter().zip(self.feature_subsets.iter()) {
            if let Some(imp) = tree.feature_importances() {
                for (j, &col) in cols.iter().enumerate() {
                    if j < imp.len() {
                        totals[col] += imp[j];
                    }
                }
            }
        }
        let total: f64 = totals.iter().sum();
        if total > 0.0 {
            for v in &mut totals {
                *v /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(totals));
    }

    /// Probability of the positive class per sample (vote fraction).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ChurnError::ModelNotFitted);
        }

        let votes: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .zip(self.feature_subsets.par_iter())
            .map(|(tree, cols)| {
                let x_sub = x.select(Axis(1), cols);
                tree.predict(&x_sub)
            })
            .collect::<Result<_>>()?;

        let n_trees = votes.len() as f64;
        let proba: Vec<f64> = (0..x.nrows())
            .map(|i| votes.iter().map(|v| v[i]).sum::<f64>() / n_trees)
            .collect();

        Ok(Array1::from_vec(proba))
    }

    /// Predict binary labels at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}
