//! Composite preprocessing pipeline

use super::{ExpandsFeatureNames, ImputeStrategy, Imputer, OneHotEncoder, StandardScaler};
use crate::error::{ChurnError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Composite feature transformation: numeric branch (median impute +
/// standard scale) and categorical branch (most-frequent impute + one-hot).
///
/// The output column order is fixed: numeric columns first, in their
/// original order, then each categorical column expanded in fit-time
/// vocabulary order. That order is identical between training, evaluation,
/// and single-record prediction — the central correctness invariant of this
/// type. Fit only on training data; apply everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePreprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Imputer,
    categorical_imputer: Imputer,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    is_fitted: bool,
}

impl FeaturePreprocessor {
    pub fn new(numeric_columns: Vec<String>, categorical_columns: Vec<String>) -> Self {
        Self {
            numeric_columns,
            categorical_columns,
            numeric_imputer: Imputer::new(ImputeStrategy::Median),
            categorical_imputer: Imputer::new(ImputeStrategy::MostFrequent),
            scaler: StandardScaler::new(),
            encoder: OneHotEncoder::new(),
            is_fitted: false,
        }
    }

    /// Learn imputation values, scaling parameters, and the one-hot
    /// vocabulary from the training frame.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.numeric_imputer.fit(df, &self.numeric_columns)?;

        let mut scaled_columns = Vec::with_capacity(self.numeric_columns.len());
        for name in &self.numeric_columns {
            let mut values = numeric_values(df, name)?;
            self.numeric_imputer.impute_numeric(name, &mut values)?;
            let filled: Vec<f64> = values.into_iter().flatten().collect();
            scaled_columns.push((name.clone(), filled));
        }
        self.scaler.fit(&scaled_columns)?;

        if !self.categorical_columns.is_empty() {
            self.categorical_imputer.fit(df, &self.categorical_columns)?;

            let mut encoder_input = Vec::with_capacity(self.categorical_columns.len());
            let mut owned: Vec<(String, Vec<String>)> = Vec::new();
            for name in &self.categorical_columns {
                let raw = string_values(df, name)?;
                let imputed: Vec<String> = raw
                    .iter()
                    .map(|v| {
                        self.categorical_imputer
                            .impute_category(name, v.as_deref())
                            .map(|s| s.to_string())
                    })
                    .collect::<Result<_>>()?;
                owned.push((name.clone(), imputed));
            }
            for (name, values) in &owned {
                encoder_input.push((name.clone(), values.iter().map(|s| s.as_str()).collect()));
            }
            self.encoder.fit(&encoder_input)?;
        } else {
            self.encoder.fit(&[])?;
        }

        self.is_fitted = true;
        debug!(
            numeric = self.numeric_columns.len(),
            expanded = self.n_output_features(),
            "preprocessor fitted"
        );
        Ok(self)
    }

    /// Transform a frame into the fixed-order feature matrix.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut matrix = Array2::zeros((n_rows, self.n_output_features()));

        for (j, name) in self.numeric_columns.iter().enumerate() {
            let mut values = numeric_values(df, name)?;
            self.numeric_imputer.impute_numeric(name, &mut values)?;
            let mut filled: Vec<f64> = values.into_iter().flatten().collect();
            self.scaler.transform(name, &mut filled)?;
            for (i, v) in filled.into_iter().enumerate() {
                matrix[[i, j]] = v;
            }
        }

        let mut offset = self.numeric_columns.len();
        for name in &self.categorical_columns {
            let raw = string_values(df, name)?;
            for (i, value) in raw.iter().enumerate() {
                let resolved = self.categorical_imputer.impute_category(name, value.as_deref())?;
                // unseen categories leave every indicator at zero
                if let Some(k) = self.encoder.category_index(name, resolved)? {
                    matrix[[i, offset + k]] = 1.0;
                }
            }
            offset += self.encoder.cardinality(name)?;
        }

        Ok(matrix)
    }

    /// Fit on a frame and transform it in one step.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Width of the transformed feature matrix.
    pub fn n_output_features(&self) -> usize {
        self.numeric_columns.len() + self.encoder.output_width()
    }

    /// Human-readable names of the expanded feature columns, in the exact
    /// order `transform` produces them.
    pub fn expanded_feature_names(&self) -> Result<Vec<String>> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        let mut names = self.numeric_columns.clone();
        names.extend(self.encoder.expanded_names()?);
        Ok(names)
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }
}

/// Extract one numeric column as optional floats.
fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ChurnError::FeatureNotFound(name.to_string()))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    Ok(casted
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .into_iter()
        .collect())
}

/// Extract one categorical column as optional strings.
fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| ChurnError::FeatureNotFound(name.to_string()))?;
    let ca = column
        .str()
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_frame() -> DataFrame {
        df!(
            "tenure" => &[Some(1.0), Some(10.0), None, Some(40.0)],
            "Contract" => &[Some("Month-to-month"), Some("One year"), Some("Month-to-month"), None],
        )
        .unwrap()
    }

    fn fitted() -> FeaturePreprocessor {
        let mut pre = FeaturePreprocessor::new(
            vec!["tenure".to_string()],
            vec!["Contract".to_string()],
        );
        pre.fit(&training_frame()).unwrap();
        pre
    }

    #[test]
    fn test_output_shape_and_order() {
        let pre = fitted();
        // 1 numeric + 2 contract categories
        assert_eq!(pre.n_output_features(), 3);
        assert_eq!(
            pre.expanded_feature_names().unwrap(),
            vec!["tenure", "Contract_Month-to-month", "Contract_One year"]
        );
    }

    #[test]
    fn test_transform_imputes_and_encodes() {
        let pre = fitted();
        let x = pre.transform(&training_frame()).unwrap();
        assert_eq!(x.shape(), &[4, 3]);

        // row 2: tenure was missing, imputed to the median then scaled,
        // so it must be finite
        assert!(x[[2, 0]].is_finite());
        // row 0 is Month-to-month
        assert_eq!(x[[0, 1]], 1.0);
        assert_eq!(x[[0, 2]], 0.0);
        // row 3: Contract was missing, imputed to the mode (Month-to-month)
        assert_eq!(x[[3, 1]], 1.0);
    }

    #[test]
    fn test_unseen_category_encodes_all_zeros() {
        let pre = fitted();
        let unseen = df!(
            "tenure" => &[5.0],
            "Contract" => &["Two year"],
        )
        .unwrap();
        let x = pre.transform(&unseen).unwrap();
        assert_eq!(x[[0, 1]], 0.0);
        assert_eq!(x[[0, 2]], 0.0);
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let pre = FeaturePreprocessor::new(vec!["tenure".to_string()], vec![]);
        assert!(pre.transform(&training_frame()).is_err());
    }
}
