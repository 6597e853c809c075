//! Missing value imputation

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Imputation strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Per-column median (numeric branch)
    Median,
    /// Per-column most frequent value (categorical branch)
    MostFrequent,
}

/// Learned fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Number(f64),
    Category(String),
}

/// Missing value imputer; fill values are learned from training data only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: HashMap<String, FillValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Learn per-column fill values from the given columns.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for name in columns {
            let column = df
                .column(name)
                .map_err(|_| ChurnError::FeatureNotFound(name.clone()))?;

            let fill = match self.strategy {
                ImputeStrategy::Median => FillValue::Number(median(column)?),
                ImputeStrategy::MostFrequent => FillValue::Category(most_frequent(column)?),
            };
            self.fill_values.insert(name.clone(), fill);
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Fill value learned for one column, if any.
    pub fn fill_value(&self, column: &str) -> Option<&FillValue> {
        self.fill_values.get(column)
    }

    /// Fill a numeric value sequence in place of nulls.
    pub fn impute_numeric(&self, column: &str, values: &mut [Option<f64>]) -> Result<()> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        let fill = match self.fill_values.get(column) {
            Some(FillValue::Number(v)) => *v,
            _ => return Err(ChurnError::FeatureNotFound(column.to_string())),
        };
        for v in values.iter_mut() {
            if v.is_none() || v.is_some_and(|x| x.is_nan()) {
                *v = Some(fill);
            }
        }
        Ok(())
    }

    /// Resolve one categorical value, substituting the learned mode for nulls.
    pub fn impute_category<'a>(&'a self, column: &str, value: Option<&'a str>) -> Result<&'a str> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        match value {
            Some(v) => Ok(v),
            None => match self.fill_values.get(column) {
                Some(FillValue::Category(fill)) => Ok(fill.as_str()),
                _ => Err(ChurnError::FeatureNotFound(column.to_string())),
            },
        }
    }
}

fn median(column: &Column) -> Result<f64> {
    let ca = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .clone();
    ca.median().ok_or_else(|| {
        ChurnError::DataError(format!("column {} has no values to impute from", column.name()))
    })
}

fn most_frequent(column: &Column) -> Result<String> {
    let ca = column
        .str()
        .map_err(|e| ChurnError::DataError(e.to_string()))?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    counts
        .into_iter()
        // ties broken lexicographically for determinism
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(v, _)| v.to_string())
        .ok_or_else(|| {
            ChurnError::DataError(format!("column {} has no values to impute from", column.name()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_fill() {
        let df = df!("x" => &[Some(1.0), None, Some(3.0), Some(100.0)]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&df, &["x".to_string()]).unwrap();

        let mut values = vec![Some(5.0), None];
        imputer.impute_numeric("x", &mut values).unwrap();
        assert_eq!(values[0], Some(5.0));
        assert_eq!(values[1], Some(3.0));
    }

    #[test]
    fn test_most_frequent_fill() {
        let df = df!("c" => &[Some("a"), Some("b"), Some("b"), None]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        imputer.fit(&df, &["c".to_string()]).unwrap();

        assert_eq!(imputer.impute_category("c", None).unwrap(), "b");
        assert_eq!(imputer.impute_category("c", Some("z")).unwrap(), "z");
    }

    #[test]
    fn test_unfitted_errors() {
        let imputer = Imputer::new(ImputeStrategy::Median);
        let mut values = vec![None];
        assert!(imputer.impute_numeric("x", &mut values).is_err());
    }
}
