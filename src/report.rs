//! Analysis result persistence

use crate::data::EdaReport;
use crate::error::Result;
use crate::selection::ModelReport;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Default output file, written to the working directory
pub const RESULTS_FILE: &str = "churn_analysis_results.json";

/// The winning family with its evaluation record flattened alongside
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestModel {
    pub name: String,
    #[serde(flatten)]
    pub report: ModelReport,
}

/// Everything one analysis run produces, in its serialized shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub eda: EdaReport,
    pub best_model: BestModel,
    /// Per-family evaluation records, comparison order
    pub all_models: Map<String, Value>,
    /// Per-family held-out ROC curves, comparison order
    pub roc_data: Map<String, Value>,
    /// Winning model's top features, weight-descending (empty when the
    /// family reports none)
    pub feature_importances: Map<String, Value>,
}

impl AnalysisResult {
    /// Write the record as pretty JSON, overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "analysis results saved");
        Ok(())
    }

    /// Reload a previously saved record.
    pub fn load(path: &Path) -> Result<AnalysisResult> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
