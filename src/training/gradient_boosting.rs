//! Gradient boosting classifier
//!
//! Binary classifier boosting MSE regression trees on log-odds residuals.

use super::decision_tree::DecisionTree;
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Gradient boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Row fraction per boosting round (1.0 = no subsampling)
    pub subsample: f64,
    /// Column fraction per boosting round (1.0 = all features)
    pub colsample_bytree: f64,
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: 42,
        }
    }
}

/// Gradient boosting binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    feature_subsets: Vec<Vec<usize>>,
    initial_prediction: f64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_subsets: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Fit the ensemble to binary labels (0/1)
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
                "cannot train boosting ensemble on empty data".to_string(),
            ));
        }

        self.n_features = n_features;

        let pos = y.iter().filter(|&&v| v >= 0.5).count() as f64;
        let neg = n_samples as f64 - pos;
        if pos == 0.0 || neg == 0.0 {
            return Err(ChurnError::TrainingError(
                "boosting requires both classes in the training data".to_string(),
            ));
        }
        self.initial_prediction = (pos / neg).ln();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        let mut raw_scores = Array1::from_elem(n_samples, self.initial_prediction);

        let n_rows = ((n_samples as f64 * self.config.subsample).round() as usize)
            .clamp(1, n_samples);
        let n_cols = ((n_features as f64 * self.config.colsample_bytree).round() as usize)
            .clamp(1, n_features);

        self.trees.clear();
        self.feature_subsets.clear();

        for _ in 0..self.config.n_estimators {
            // negative gradient of log loss: residual = y - sigmoid(score)
            let residuals: Array1<f64> = y
                .iter()
                .zip(raw_scores.iter())
                .map(|(&yi, &s)| yi - sigmoid(s))
                .collect();

            let mut rows: Vec<usize> = (0..n_samples).collect();
            rows.shuffle(&mut rng);
            rows.truncate(n_rows);

            let mut cols: Vec<usize> = (0..n_features).collect();
            cols.shuffle(&mut rng);
            cols.truncate(n_cols);
            cols.sort_unstable();

            let x_round = x.select(Axis(0), &rows).select(Axis(1), &cols);
            let r_round: Array1<f64> =
                Array1::from_vec(rows.iter().map(|&i| residuals[i]).collect());

            let mut tree = DecisionTree::new_regressor()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit(&x_round, &r_round)?;

            let x_full = x.select(Axis(1), &cols);
            let update = tree.predict(&x_full)?;
            raw_scores = raw_scores + update.mapv(|u| u * self.config.learning_rate);

            self.trees.push(tree);
            self.feature_subsets.push(cols);
        }

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

    /// Probability of the positive class per sample.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ChurnError::ModelNotFitted);
        }

        let mut scores = Array1::from_elem(x.nrows(), self.initial_prediction);
        for (tree, cols) in self.trees.iter().zip(self.feature_subsets.iter()) {
            let x_sub = x.select(Axis(1), cols);
            let update = tree.predict(&x_sub)?;
            scores = scores + update.mapv(|u| u * self.config.learning_rate);
        }

        Ok(scores.mapv(sigmoid))
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

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
