//! One-hot encoding for categorical features

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capability of a preprocessing branch to report its expanded output names.
/// Resolved once at preprocessor-build time instead of probed at
/// explanation time.
pub trait ExpandsFeatureNames {
    fn expanded_names(&self) -> Result<Vec<String>>;
}

/// One-hot encoder with an ignore-unknown policy: a category never seen
/// during fit produces all-zero indicators instead of an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Column order as given at fit time
    columns: Vec<String>,
    /// Fit-time vocabulary per column, lexicographically sorted
    vocabulary: HashMap<String, Vec<String>>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            vocabulary: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Learn the category vocabulary per column from already-imputed values.
    pub fn fit(&mut self, columns: &[(String, Vec<&str>)]) -> Result<&mut Self> {
        self.columns.clear();
        self.vocabulary.clear();

        for (name, values) in columns {
            let mut categories: Vec<String> = values.iter().map(|s| s.to_string()).collect();
            categories.sort();
            categories.dedup();
            if categories.is_empty() {
                return Err(ChurnError::ValidationError(format!(
                    "cannot fit encoder on empty column {}",
                    name
                )));
            }
            self.columns.push(name.clone());
            self.vocabulary.insert(name.clone(), categories);
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Number of indicator columns one input column expands into.
    pub fn cardinality(&self, column: &str) -> Result<usize> {
        self.categories(column).map(|c| c.len())
    }

    /// Fit-time vocabulary of one column.
    pub fn categories(&self, column: &str) -> Result<&[String]> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        self.vocabulary
            .get(column)
            .map(|v| v.as_slice())
            .ok_or_else(|| ChurnError::FeatureNotFound(column.to_string()))
    }

    /// Index of a category within its column's vocabulary.
    /// `None` for unseen categories — the caller leaves all indicators zero.
    pub fn category_index(&self, column: &str, value: &str) -> Result<Option<usize>> {
        let categories = self.categories(column)?;
        Ok(categories.iter().position(|c| c == value))
    }

    /// Total width of the encoded output.
    pub fn output_width(&self) -> usize {
        self.columns
            .iter()
            .map(|c| self.vocabulary.get(c).map_or(0, |v| v.len()))
            .sum()
    }
}

impl ExpandsFeatureNames for OneHotEncoder {
    /// Indicator names as `<column>_<category>` in fit-time order.
    fn expanded_names(&self) -> Result<Vec<String>> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        let mut names = Vec::with_capacity(self.output_width());
        for column in &self.columns {
            let categories = self
                .vocabulary
                .get(column)
                .ok_or_else(|| ChurnError::FeatureNotFound(column.clone()))?;
            for category in categories {
                names.push(format!("{}_{}", column, category));
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> OneHotEncoder {
        let mut encoder = OneHotEncoder::new();
        encoder
            .fit(&[(
                "Contract".to_string(),
                vec!["Two year", "Month-to-month", "One year", "Month-to-month"],
            )])
            .unwrap();
        encoder
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let encoder = fitted();
        assert_eq!(
            encoder.categories("Contract").unwrap(),
            &["Month-to-month", "One year", "Two year"]
        );
    }

    #[test]
    fn test_unseen_category_is_ignored() {
        let encoder = fitted();
        assert_eq!(encoder.category_index("Contract", "absent").unwrap(), None);
        assert_eq!(
            encoder.category_index("Contract", "One year").unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_expanded_names() {
        let encoder = fitted();
        assert_eq!(
            encoder.expanded_names().unwrap(),
            vec![
                "Contract_Month-to-month",
                "Contract_One year",
                "Contract_Two year"
            ]
        );
    }
}
