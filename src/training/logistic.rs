//! Logistic regression
//!
//! L2-regularized logistic regression fit by full-batch gradient descent.

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Logistic regression binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Option<Array1<f64>>,
    bias: f64,
    /// L2 regularization strength (inverse of C)
    pub alpha: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            weights: None,
            bias: 0.0,
            alpha: 1.0,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
        }
    }

    /// Set L2 regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set regularization from the inverse strength C (sklearn convention)
    pub fn with_c(mut self, c: f64) -> Self {
        self.alpha = 1.0 / c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Fit to binary labels (0/1)
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
                "cannot fit logistic regression on empty data".to_string(),
            ));
        }

        let n = n_samples as f64;
        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;

        for _ in 0..self.max_iter {
            let scores = x.dot(&weights) + bias;
            let proba = scores.mapv(sigmoid);
            let errors = &proba - y;

            // L2 penalty on the weights only, never the intercept
            let grad_w = x.t().dot(&errors) / n + self.alpha * &weights / n;
            let grad_b = errors.sum() / n;

            weights = weights - self.learning_rate * &grad_w;
            bias -= self.learning_rate * grad_b;

            let grad_norm = grad_w.mapv(f64::abs).sum() + grad_b.abs();
            if grad_norm < self.tol {
                break;
            }
        }

        self.weights = Some(weights);
        self.bias = bias;
        Ok(self)
    }

    /// Probability of the positive class per sample.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self.weights.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        if x.ncols() != weights.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", weights.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok((x.dot(weights) + self.bias).mapv(sigmoid))
    }

    /// Predict binary labels at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_predict_separable() {
        let x = array![
            [-2.0],
            [-1.5],
            [-1.0],
            [-0.5],
            [0.5],
            [1.0],
            [1.5],
            [2.0]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];

        let mut lr = LogisticRegression::new().with_c(1.0);
        lr.fit(&x, &y).unwrap();

        let predictions = lr.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_proba_monotone_in_feature() {
        let x = array![[-1.0], [0.0], [1.0], [2.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut lr = LogisticRegression::new();
        lr.fit(&x, &y).unwrap();

        let proba = lr.predict_proba(&x).unwrap();
        assert!(proba[0] < proba[1]);
        assert!(proba[1] < proba[2]);
        assert!(proba[2] < proba[3]);
    }

    #[test]
    fn test_stronger_regularization_shrinks_weights() {
        let x = array![[-2.0], [-1.0], [1.0], [2.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut weak = LogisticRegression::new().with_c(10.0);
        let mut strong = LogisticRegression::new().with_c(0.01);
        weak.fit(&x, &y).unwrap();
        strong.fit(&x, &y).unwrap();

        let w_weak = weak.weights.as_ref().unwrap()[0].abs();
        let w_strong = strong.weights.as_ref().unwrap()[0].abs();
        assert!(w_strong < w_weak);
    }

    #[test]
    fn test_unfitted_is_error() {
        let lr = LogisticRegression::new();
        let x = array![[1.0]];
        assert!(matches!(
            lr.predict_proba(&x),
            Err(ChurnError::ModelNotFitted)
        ));
    }
}
