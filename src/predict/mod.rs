//! Single-customer prediction

use crate::error::{ChurnError, Result};
use crate::selection::ModelBundle;
use crate::CHURN_THRESHOLD;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker for a categorical field absent from the input record.
///
/// It never appears in the fit-time vocabulary, so the encoder treats it
/// as an unseen category and emits all-zero indicators.
const ABSENT_CATEGORY: &str = "absent";

/// Scored outcome for one customer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub probability: f64,
    /// "Yes" above the churn threshold, "No" otherwise
    pub prediction: String,
}

/// Scores raw customer records against the winning model.
///
/// Holds its own copy of the bundle; all methods take `&self`, so one
/// predictor can serve many threads.
#[derive(Debug, Clone)]
pub struct ChurnPredictor {
    bundle: ModelBundle,
}

impl ChurnPredictor {
    pub fn new(bundle: ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Score one customer record.
    ///
    /// Fields the preprocessor does not know are dropped. Missing numeric
    /// fields default to 0; a non-numeric value in a numeric field becomes
    /// missing and is median-imputed. Missing categorical fields become an
    /// unseen marker category, encoding to all-zero indicators.
    pub fn predict(&self, record: &Map<String, Value>) -> Result<Prediction> {
        let preprocessor = &self.bundle.preprocessor;
        let mut columns: Vec<Column> = Vec::with_capacity(
            preprocessor.numeric_columns().len() + preprocessor.categorical_columns().len(),
        );

        for name in preprocessor.numeric_columns() {
            let value = match record.get(name) {
                None | Some(Value::Null) => Some(0.0),
                Some(v) => coerce_numeric(v),
            };
            columns.push(Column::new(name.as_str().into(), &[value]));
        }

        for name in preprocessor.categorical_columns() {
            let value = match record.get(name) {
                None | Some(Value::Null) => ABSENT_CATEGORY.to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            columns.push(Column::new(name.as_str().into(), &[value.as_str()]));
        }

        let df = DataFrame::new(columns).map_err(|e| ChurnError::DataError(e.to_string()))?;
        let features = preprocessor.transform(&df)?;
        let probability = self.bundle.model.predict_proba(&features)?[0];

        let prediction = if probability >= CHURN_THRESHOLD {
            "Yes"
        } else {
            "No"
        };
        Ok(Prediction {
            probability,
            prediction: prediction.to_string(),
        })
    }
}

/// Numeric fields accept numbers and numeric-looking strings; anything
/// else becomes missing.
fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::FeaturePreprocessor;
    use crate::selection::ModelFamily;
    use crate::training::{Classifier, LogisticRegression};
    use ndarray::Array1;
    use serde_json::json;

    fn fitted_predictor() -> ChurnPredictor {
        let df = df!(
            "tenure" => &[1.0, 5.0, 40.0, 60.0, 2.0, 55.0],
            "MonthlyCharges" => &[70.0, 85.0, 30.0, 25.0, 90.0, 20.0],
            "Contract" => &[
                "Month-to-month",
                "Month-to-month",
                "Two year",
                "Two year",
                "Month-to-month",
                "One year",
            ],
        )
        .unwrap();
        let mut preprocessor = FeaturePreprocessor::new(
            vec!["tenure".to_string(), "MonthlyCharges".to_string()],
            vec!["Contract".to_string()],
        );
        let x = preprocessor.fit_transform(&df).unwrap();
        let y = Array1::from_vec(vec![1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);

        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        ChurnPredictor::new(ModelBundle {
            family: ModelFamily::LogisticRegression,
            model: Classifier::LogisticRegression(model),
            preprocessor,
        })
    }

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_predict_complete_record() {
        let predictor = fitted_predictor();
        let out = predictor
            .predict(&record(json!({
                "tenure": 2,
                "MonthlyCharges": 88.0,
                "Contract": "Month-to-month",
            })))
            .unwrap();

        assert!((0.0..=1.0).contains(&out.probability));
        assert!(out.prediction == "Yes" || out.prediction == "No");
    }

    #[test]
    fn test_threshold_consistency() {
        let predictor = fitted_predictor();
        let out = predictor
            .predict(&record(json!({
                "tenure": 60,
                "MonthlyCharges": 20.0,
                "Contract": "Two year",
            })))
            .unwrap();
        let expected = if out.probability >= CHURN_THRESHOLD {
            "Yes"
        } else {
            "No"
        };
        assert_eq!(out.prediction, expected);
    }

    #[test]
    fn test_missing_fields_tolerated() {
        let predictor = fitted_predictor();
        // no categorical, no numeric fields at all
        let out = predictor.predict(&record(json!({}))).unwrap();
        assert!((0.0..=1.0).contains(&out.probability));
    }

    #[test]
    fn test_non_numeric_string_in_numeric_field() {
        let predictor = fitted_predictor();
        let out = predictor
            .predict(&record(json!({
                "tenure": "not a number",
                "MonthlyCharges": "42.5",
                "Contract": "One year",
            })))
            .unwrap();
        assert!((0.0..=1.0).contains(&out.probability));
    }

    #[test]
    fn test_extra_fields_dropped() {
        let predictor = fitted_predictor();
        let with_extra = predictor
            .predict(&record(json!({
                "tenure": 10,
                "MonthlyCharges": 50.0,
                "Contract": "One year",
                "customerID": "9999-ZZZZZ",
                "unrelated": [1, 2, 3],
            })))
            .unwrap();
        let without = predictor
            .predict(&record(json!({
                "tenure": 10,
                "MonthlyCharges": 50.0,
                "Contract": "One year",
            })))
            .unwrap();
        assert_eq!(with_extra, without);
    }
}
