//! Telco customer churn analysis
//!
//! A batch pipeline that loads a customer table, summarizes it, trains and
//! compares three classifier families under cross-validated grid search,
//! selects the best by ROC-AUC, extracts feature importances, persists one
//! JSON result record, and exposes a single-customer predictor.
//!
//! # Modules
//!
//! - [`data`] - CSV loading, exploratory summary, cleaning and splitting
//! - [`preprocessing`] - Imputation, scaling, one-hot encoding
//! - [`training`] - Classifier implementations, metrics, cross-validation
//! - [`selection`] - Hyperparameter grid search and model comparison
//! - [`explain`] - Feature importance extraction
//! - [`predict`] - Single-record churn predictor
//! - [`report`] - Analysis result aggregation and JSON persistence
//! - [`analysis`] - End-to-end pipeline entry point

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod selection;
pub mod explain;
pub mod predict;
pub mod report;
pub mod analysis;

pub use analysis::{run_analysis, run_analysis_to};
pub use error::{ChurnError, Result};
pub use predict::{ChurnPredictor, Prediction};
pub use report::AnalysisResult;
pub use selection::ModelBundle;

/// Seed used for every stochastic step (splits, forests, boosting).
/// A configuration constant so repeated runs select the same model.
pub const RANDOM_SEED: u64 = 42;

/// Decision threshold for the binary churn label.
pub const CHURN_THRESHOLD: f64 = 0.5;
