//! Model training
//!
//! From-scratch classifiers over ndarray matrices, plus the metrics and
//! cross-validation machinery used to compare them.

pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod logistic;
pub mod metrics;
pub mod random_forest;

pub use cross_validation::{CVSplit, StratifiedKFold};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use logistic::LogisticRegression;
pub use metrics::{
    accuracy, classification_report, roc_auc, roc_curve, ClassMetrics, ClassificationReport,
    RocPoints,
};
pub use random_forest::RandomForest;

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A fitted binary classifier of any supported family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingClassifier),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    /// Probability of the positive class per sample.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::RandomForest(m) => m.predict_proba(x),
            Classifier::GradientBoosting(m) => m.predict_proba(x),
            Classifier::LogisticRegression(m) => m.predict_proba(x),
        }
    }

    /// Predict binary labels at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::RandomForest(m) => m.predict(x),
            Classifier::GradientBoosting(m) => m.predict(x),
            Classifier::LogisticRegression(m) => m.predict(x),
        }
    }

    /// Per-feature importance weights, if the family exposes them.
    ///
    /// Tree ensembles report impurity-based importances; logistic
    /// regression reports none.
    pub fn importance_weights(&self) -> Option<Vec<f64>> {
        match self {
            Classifier::RandomForest(m) => m.feature_importances().map(|a| a.to_vec()),
            Classifier::GradientBoosting(m) => m.feature_importances().map(|a| a.to_vec()),
            Classifier::LogisticRegression(_) => None,
        }
    }
}
