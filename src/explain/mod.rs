//! Feature importance extraction

use crate::selection::ModelBundle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Number of top features retained in the report
pub const TOP_FEATURES: usize = 15;

/// Outcome of importance extraction for the winning model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportanceReport {
    /// Ordered name → weight map, descending
    Available(Map<String, Value>),
    /// The family exposes no importance concept
    Unavailable { reason: String },
}

impl ImportanceReport {
    /// The map serialized into the analysis record: an empty object when
    /// the model family has nothing to report.
    pub fn as_map(&self) -> Map<String, Value> {
        match self {
            ImportanceReport::Available(map) => map.clone(),
            ImportanceReport::Unavailable { .. } => Map::new(),
        }
    }
}

/// Top features of the winning model, weight-descending.
///
/// Names come from the preprocessor's expanded feature list; weights from
/// the model. The two are zipped positionally and truncated to the shorter
/// side. A failing name accessor degrades to index names rather than
/// aborting the run.
pub fn feature_importances(bundle: &ModelBundle) -> ImportanceReport {
    let weights = match bundle.model.importance_weights() {
        Some(w) => w,
        None => {
            return ImportanceReport::Unavailable {
                reason: format!(
                    "{} exposes no feature importances",
                    bundle.family.name()
                ),
            }
        }
    };

    let names = match bundle.preprocessor.expanded_feature_names() {
        Ok(names) => names,
        Err(err) => {
            // part of the CLI contract, so printed as well as traced
            eprintln!("Warning: feature names unavailable ({}), using index names", err);
            warn!(error = %err, "feature names unavailable, falling back to indices");
            (0..weights.len()).map(|i| format!("Feature_{}", i)).collect()
        }
    };

    let mut pairs: Vec<(String, f64)> = names
        .into_iter()
        .zip(weights.iter().copied())
        .collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    pairs.truncate(TOP_FEATURES);

    let mut map = Map::new();
    for (name, weight) in pairs {
        map.insert(name, Value::from(weight));
    }
    ImportanceReport::Available(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::FeaturePreprocessor;
    use crate::selection::ModelFamily;
    use crate::training::{Classifier, LogisticRegression, RandomForest};
    use ndarray::{Array1, Array2};
    use polars::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn fitted_bundle(model: Classifier) -> ModelBundle {
        let df = df!(
            "tenure" => &[1.0, 20.0, 40.0, 60.0],
            "Contract" => &["Month-to-month", "One year", "Two year", "One year"],
        )
        .unwrap();
        let mut preprocessor = FeaturePreprocessor::new(
            vec!["tenure".to_string()],
            vec!["Contract".to_string()],
        );
        preprocessor.fit(&df).unwrap();
        ModelBundle {
            family: match model {
                Classifier::LogisticRegression(_) => ModelFamily::LogisticRegression,
                _ => ModelFamily::RandomForest,
            },
            model,
            preprocessor,
        }
    }

    fn training_data(n_features: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let n = 40;
        let mut x = Array2::zeros((n, n_features));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let label = (i % 2) as f64;
            y[i] = label;
            for j in 0..n_features {
                x[[i, j]] = label + rng.gen::<f64>() * 0.3;
            }
        }
        (x, y)
    }

    #[test]
    fn test_logistic_is_unavailable() {
        let (x, y) = training_data(4);
        let mut lr = LogisticRegression::new();
        lr.fit(&x, &y).unwrap();
        let bundle = fitted_bundle(Classifier::LogisticRegression(lr));

        let report = feature_importances(&bundle);
        assert!(matches!(report, ImportanceReport::Unavailable { .. }));
        assert!(report.as_map().is_empty());
    }

    #[test]
    fn test_more_weights_than_names_truncates() {
        // model trained on a wider matrix than the preprocessor expands to:
        // 6 weights against 4 names must keep only the named features
        let (x, y) = training_data(6);
        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();
        let bundle = fitted_bundle(Classifier::RandomForest(rf));
        assert_eq!(bundle.preprocessor.expanded_feature_names().unwrap().len(), 4);

        let report = feature_importances(&bundle);
        let map = report.as_map();
        assert_eq!(map.len(), 4);
        assert!(map.keys().all(|k| !k.starts_with("Feature_")));
    }

    #[test]
    fn test_fewer_weights_than_names_truncates() {
        // 3 weights against 4 names: the unmatched name is dropped
        let (x, y) = training_data(3);
        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();
        let bundle = fitted_bundle(Classifier::RandomForest(rf));

        let report = feature_importances(&bundle);
        assert_eq!(report.as_map().len(), 3);
    }

    #[test]
    fn test_unfitted_names_fall_back_to_indices() {
        let (x, y) = training_data(4);
        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        // name accessor fails on an unfitted preprocessor; the report
        // degrades to index names instead of erroring
        let bundle = ModelBundle {
            family: ModelFamily::RandomForest,
            model: Classifier::RandomForest(rf),
            preprocessor: FeaturePreprocessor::new(
                vec!["tenure".to_string()],
                vec!["Contract".to_string()],
            ),
        };

        let report = feature_importances(&bundle);
        let map = report.as_map();
        assert_eq!(map.len(), 4);
        assert!(map.keys().all(|k| k.starts_with("Feature_")));
    }

    #[test]
    fn test_forest_importances_sorted_descending() {
        let (x, y) = training_data(4);
        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();
        let bundle = fitted_bundle(Classifier::RandomForest(rf));

        let report = feature_importances(&bundle);
        let map = report.as_map();
        assert!(!map.is_empty());
        assert!(map.len() <= TOP_FEATURES);

        let weights: Vec<f64> = map.values().filter_map(|v| v.as_f64()).collect();
        assert!(weights.windows(2).all(|w| w[0] >= w[1]));
    }
}
