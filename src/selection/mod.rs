//! Model selection
//!
//! Cross-validated grid search over three classifier families, scored by
//! mean ROC-AUC, with held-out evaluation of each family's best candidate.

use crate::error::{ChurnError, Result};
use crate::preprocessing::FeaturePreprocessor;
use crate::training::{
    accuracy, classification_report, roc_auc, roc_curve, ClassificationReport, Classifier,
    GradientBoostingClassifier, GradientBoostingConfig, LogisticRegression, RandomForest,
    RocPoints, StratifiedKFold,
};
use crate::RANDOM_SEED;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

/// Classifier family under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    RandomForest,
    GradientBoosting,
    LogisticRegression,
}

impl ModelFamily {
    /// Fixed comparison order, also the tie-break order.
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::RandomForest,
        ModelFamily::GradientBoosting,
        ModelFamily::LogisticRegression,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::RandomForest => "random_forest",
            ModelFamily::GradientBoosting => "gradient_boosting",
            ModelFamily::LogisticRegression => "logistic_regression",
        }
    }
}

/// One hyperparameter candidate
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSet {
    Forest {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
    },
    Boosting {
        n_estimators: usize,
        learning_rate: f64,
        max_depth: usize,
    },
    Logistic {
        c: f64,
    },
}

impl ParamSet {
    /// The discrete grid searched for one family.
    pub fn grid(family: ModelFamily) -> Vec<ParamSet> {
        match family {
            ModelFamily::RandomForest => {
                let mut grid = Vec::new();
                for &n_estimators in &[100, 200] {
                    for &max_depth in &[None, Some(10), Some(20)] {
                        for &min_samples_split in &[2, 5] {
                            grid.push(ParamSet::Forest {
                                n_estimators,
                                max_depth,
                                min_samples_split,
                            });
                        }
                    }
                }
                grid
            }
            ModelFamily::GradientBoosting => {
                let mut grid = Vec::new();
                for &n_estimators in &[100, 200] {
                    for &learning_rate in &[0.05, 0.1] {
                        for &max_depth in &[3, 5] {
                            grid.push(ParamSet::Boosting {
                                n_estimators,
                                learning_rate,
                                max_depth,
                            });
                        }
                    }
                }
                grid
            }
            ModelFamily::LogisticRegression => [0.1, 1.0, 10.0]
                .iter()
                .map(|&c| ParamSet::Logistic { c })
                .collect(),
        }
    }

    /// Fit a fresh model with these hyperparameters.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Classifier> {
        match *self {
            ParamSet::Forest {
                n_estimators,
                max_depth,
                min_samples_split,
            } => {
                let mut model = RandomForest::new(n_estimators)
                    .with_max_depth(max_depth)
                    .with_min_samples_split(min_samples_split)
                    .with_random_state(RANDOM_SEED);
                model.fit(x, y)?;
                Ok(Classifier::RandomForest(model))
            }
            ParamSet::Boosting {
                n_estimators,
                learning_rate,
                max_depth,
            } => {
                let mut model = GradientBoostingClassifier::new(GradientBoostingConfig {
                    n_estimators,
                    learning_rate,
                    max_depth,
                    random_state: RANDOM_SEED,
                    ..Default::default()
                });
                model.fit(x, y)?;
                Ok(Classifier::GradientBoosting(model))
            }
            ParamSet::Logistic { c } => {
                let mut model = LogisticRegression::new().with_c(c);
                model.fit(x, y)?;
                Ok(Classifier::LogisticRegression(model))
            }
        }
    }

    /// Hyperparameters as a JSON object for the analysis record.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match *self {
            ParamSet::Forest {
                n_estimators,
                max_depth,
                min_samples_split,
            } => {
                map.insert("n_estimators".to_string(), json!(n_estimators));
                map.insert(
                    "max_depth".to_string(),
                    max_depth.map_or(Value::Null, |d| json!(d)),
                );
                map.insert("min_samples_split".to_string(), json!(min_samples_split));
            }
            ParamSet::Boosting {
                n_estimators,
                learning_rate,
                max_depth,
            } => {
                map.insert("n_estimators".to_string(), json!(n_estimators));
                map.insert("learning_rate".to_string(), json!(learning_rate));
                map.insert("max_depth".to_string(), json!(max_depth));
            }
            ParamSet::Logistic { c } => {
                map.insert("C".to_string(), json!(c));
            }
        }
        map
    }
}

/// Held-out evaluation record for one family's best candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub best_params: Map<String, Value>,
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
    pub roc_auc: f64,
}

/// One family's search outcome
#[derive(Debug, Clone)]
pub struct FamilyResult {
    pub family: ModelFamily,
    pub model: Classifier,
    pub report: ModelReport,
    pub roc: RocPoints,
    pub cv_auc: f64,
}

/// Winning model paired with the preprocessor it was trained behind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub family: ModelFamily,
    pub model: Classifier,
    pub preprocessor: FeaturePreprocessor,
}

/// Full comparison outcome across all families
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub bundle: ModelBundle,
    /// Per-family reports in comparison order
    pub families: Vec<FamilyResult>,
    pub best_index: usize,
}

impl SelectionOutcome {
    pub fn best(&self) -> &FamilyResult {
        &self.families[self.best_index]
    }
}

/// Grid-search driver
#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub n_folds: usize,
    pub seed: u64,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self {
            n_folds: 5,
            seed: RANDOM_SEED,
        }
    }
}

impl ModelSelector {
    pub fn new(n_folds: usize, seed: u64) -> Self {
        Self { n_folds, seed }
    }

    /// Search every family's grid, refit each family's best candidate on the
    /// full training subset, and crown the family with the highest held-out
    /// ROC-AUC. Exact ties go to the earlier family in comparison order.
    pub fn select(
        &self,
        preprocessor: FeaturePreprocessor,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<SelectionOutcome> {
        let splits = StratifiedKFold::new(self.n_folds, self.seed).split(y_train)?;

        let mut families = Vec::with_capacity(ModelFamily::ALL.len());
        for family in ModelFamily::ALL {
            let grid = ParamSet::grid(family);
            info!(
                family = family.name(),
                candidates = grid.len(),
                "grid search"
            );

            let scored: Vec<(ParamSet, f64)> = grid
                .into_par_iter()
                .map(|params| {
                    let mut fold_scores = Vec::with_capacity(splits.len());
                    for split in &splits {
                        let x_fold = x_train.select(Axis(0), &split.train_indices);
                        let y_fold = Array1::from_vec(
                            split.train_indices.iter().map(|&i| y_train[i]).collect(),
                        );
                        let x_val = x_train.select(Axis(0), &split.test_indices);
                        let y_val = Array1::from_vec(
                            split.test_indices.iter().map(|&i| y_train[i]).collect(),
                        );

                        let model = params.fit(&x_fold, &y_fold)?;
                        let proba = model.predict_proba(&x_val)?;
                        let score = roc_auc(&y_val, &proba).map_err(|_| {
                            ChurnError::TrainingError(format!(
                                "fold {} holds a single class", split.fold_idx
                            ))
                        })?;
                        fold_scores.push(score);
                    }
                    let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                    Ok((params, mean))
                })
                .collect::<Result<_>>()?;

            // strictly-greater comparison keeps the first candidate on ties
            let (best_params, cv_auc) = scored
                .into_iter()
                .fold(None::<(ParamSet, f64)>, |best, cand| match best {
                    Some((_, s)) if cand.1 <= s => best,
                    _ => Some(cand),
                })
                .ok_or_else(|| {
                    ChurnError::TrainingError(format!("empty grid for {}", family.name()))
                })?;

            let model = best_params.fit(x_train, y_train)?;
            let proba = model.predict_proba(x_test)?;
            let predictions = proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 });

            let test_auc = roc_auc(y_test, &proba).map_err(|_| {
                ChurnError::TrainingError("held-out subset holds a single class".to_string())
            })?;
            let report = ModelReport {
                best_params: best_params.to_map(),
                accuracy: accuracy(y_test, &predictions)?,
                classification_report: classification_report(y_test, &predictions)?,
                roc_auc: test_auc,
            };
            let roc = roc_curve(y_test, &proba)?;

            info!(
                family = family.name(),
                cv_auc = %format!("{:.4}", cv_auc),
                test_auc = %format!("{:.4}", test_auc),
                "family evaluated"
            );

            families.push(FamilyResult {
                family,
                model,
                report,
                roc,
                cv_auc,
            });
        }

        let best_index = families
            .iter()
            .enumerate()
            .fold(0, |best, (i, fam)| {
                if fam.report.roc_auc > families[best].report.roc_auc {
                    i
                } else {
                    best
                }
            });

        info!(
            family = families[best_index].family.name(),
            roc_auc = %format!("{:.4}", families[best_index].report.roc_auc),
            "best model selected"
        );

        let bundle = ModelBundle {
            family: families[best_index].family,
            model: families[best_index].model.clone(),
            preprocessor,
        };

        Ok(SelectionOutcome {
            bundle,
            families,
            best_index,
        })
    }
}
