//! End-to-end analysis pipeline
//!
//! One-shot batch run: load, summarize, clean, split, preprocess, search,
//! explain, persist, and hand back a ready predictor.

use crate::data::{clean, load_dataset, summarize, train_test_split};
use crate::error::Result;
use crate::explain::feature_importances;
use crate::predict::ChurnPredictor;
use crate::preprocessing::FeaturePreprocessor;
use crate::report::{AnalysisResult, BestModel, RESULTS_FILE};
use crate::selection::ModelSelector;
use crate::RANDOM_SEED;
use serde_json::{json, Map};
use std::path::Path;
use tracing::info;

/// Evaluation share of the stratified split
const TEST_SIZE: f64 = 0.2;

/// Run the full churn analysis on one customer file.
///
/// Writes `churn_analysis_results.json` to the working directory and
/// returns the in-memory record alongside a predictor bound to the
/// winning model.
pub fn run_analysis(path: &Path) -> Result<(AnalysisResult, ChurnPredictor)> {
    run_analysis_to(path, Path::new(RESULTS_FILE))
}

/// Same as [`run_analysis`] with an explicit output location.
pub fn run_analysis_to(
    path: &Path,
    output: &Path,
) -> Result<(AnalysisResult, ChurnPredictor)> {
    let df = load_dataset(path)?;

    info!("computing exploratory summary");
    let eda = summarize(&df)?;

    info!("cleaning and splitting");
    let prepared = clean(&df)?;
    let split = train_test_split(&prepared, TEST_SIZE, RANDOM_SEED)?;

    let mut preprocessor = FeaturePreprocessor::new(
        prepared.numeric_columns.clone(),
        prepared.categorical_columns.clone(),
    );
    let x_train = preprocessor.fit_transform(&split.x_train)?;
    let x_test = preprocessor.transform(&split.x_test)?;
    info!(
        train_rows = x_train.nrows(),
        test_rows = x_test.nrows(),
        features = x_train.ncols(),
        "feature matrices ready"
    );

    let outcome = ModelSelector::default().select(
        preprocessor,
        &x_train,
        &split.y_train,
        &x_test,
        &split.y_test,
    )?;

    let importances = feature_importances(&outcome.bundle);

    let mut all_models = Map::new();
    let mut roc_data = Map::new();
    for family in &outcome.families {
        all_models.insert(
            family.family.name().to_string(),
            serde_json::to_value(&family.report)?,
        );
        roc_data.insert(
            family.family.name().to_string(),
            json!({ "fpr": family.roc.fpr, "tpr": family.roc.tpr }),
        );
    }

    let best = outcome.best();
    let result = AnalysisResult {
        eda,
        best_model: BestModel {
            name: best.family.name().to_string(),
            report: best.report.clone(),
        },
        all_models,
        roc_data,
        feature_importances: importances.as_map(),
    };
    result.save(output)?;

    let predictor = ChurnPredictor::new(outcome.bundle);
    Ok((result, predictor))
}
