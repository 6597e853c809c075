//! Standard scaling for numeric features

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for one fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    mean: f64,
    std: f64,
}

/// Standardizes columns to zero mean and unit variance.
/// Parameters are learned from training data only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Learn mean and std per column from already-imputed values.
    pub fn fit(&mut self, columns: &[(String, Vec<f64>)]) -> Result<&mut Self> {
        for (name, values) in columns {
            if values.is_empty() {
                return Err(ChurnError::ValidationError(format!(
                    "cannot fit scaler on empty column {}",
                    name
                )));
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            self.params.insert(
                name.clone(),
                ScalerParams {
                    mean,
                    // constant columns pass through unscaled
                    std: if std > 0.0 { std } else { 1.0 },
                },
            );
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale values of one column in place.
    pub fn transform(&self, column: &str, values: &mut [f64]) -> Result<()> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        let params = self
            .params
            .get(column)
            .ok_or_else(|| ChurnError::FeatureNotFound(column.to_string()))?;
        for v in values.iter_mut() {
            *v = (*v - params.mean) / params.std;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardization() {
        let mut scaler = StandardScaler::new();
        scaler
            .fit(&[("x".to_string(), vec![1.0, 2.0, 3.0, 4.0])])
            .unwrap();

        let mut values = vec![1.0, 2.0, 3.0, 4.0];
        scaler.transform("x", &mut values).unwrap();

        let mean: f64 = values.iter().sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-9);
        let var: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert!((var - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_is_passed_through() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[("x".to_string(), vec![7.0, 7.0])]).unwrap();

        let mut values = vec![7.0];
        scaler.transform("x", &mut values).unwrap();
        assert_eq!(values[0], 0.0);
    }

    #[test]
    fn test_unknown_column_errors() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[("x".to_string(), vec![1.0])]).unwrap();
        let mut values = vec![1.0];
        assert!(scaler.transform("y", &mut values).is_err());
    }
}
