//! Exploratory data summary
//!
//! Read-only statistics over the loaded table, in a shape that serializes
//! to nested maps of primitives.

use crate::data::TARGET_COLUMN;
use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Exploratory summary of the raw dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdaReport {
    /// Missing value count per column
    pub missing_values: BTreeMap<String, u64>,
    /// Missing value percentage per column, in [0, 100]
    pub missing_percent: BTreeMap<String, f64>,
    /// Describe-style statistics for numeric columns
    pub statistics: BTreeMap<String, BTreeMap<String, f64>>,
    /// Target class distribution as percentages
    pub churn_distribution: BTreeMap<String, f64>,
    /// Pairwise Pearson correlations over numeric columns
    pub correlation_matrix: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Compute the exploratory summary of a loaded table.
pub fn summarize(df: &DataFrame) -> Result<EdaReport> {
    let n_rows = df.height();

    let mut missing_values = BTreeMap::new();
    let mut missing_percent = BTreeMap::new();
    for col in df.get_columns() {
        let nulls = col.null_count() as u64;
        missing_values.insert(col.name().to_string(), nulls);
        let pct = if n_rows > 0 {
            nulls as f64 / n_rows as f64 * 100.0
        } else {
            0.0
        };
        missing_percent.insert(col.name().to_string(), pct);
    }

    let numeric_cols = numeric_column_names(df);

    let mut statistics = BTreeMap::new();
    for name in &numeric_cols {
        let ca = float_chunked(df, name)?;
        statistics.insert(name.clone(), describe(&ca));
    }

    let churn_distribution = target_distribution(df)?;

    let correlation_matrix = correlations(df, &numeric_cols)?;

    Ok(EdaReport {
        missing_values,
        missing_percent,
        statistics,
        churn_distribution,
        correlation_matrix,
    })
}

/// Names of columns with a numeric dtype, in frame order.
fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric())
        .map(|c| c.name().to_string())
        .collect()
}

fn float_chunked(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
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
        .clone())
}

/// Count, mean, std, min, quartiles, max of one numeric column.
fn describe(ca: &Float64Chunked) -> BTreeMap<String, f64> {
    let mut stats = BTreeMap::new();
    let values: Vec<f64> = ca.into_iter().flatten().collect();

    stats.insert("count".to_string(), values.len() as f64);
    if values.is_empty() {
        return stats;
    }

    if let Some(mean) = ca.mean() {
        stats.insert("mean".to_string(), mean);
    }
    if let Some(std) = ca.std(1) {
        stats.insert("std".to_string(), std);
    }

    let mut sorted = values;
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    stats.insert("min".to_string(), sorted[0]);
    stats.insert("25%".to_string(), quantile(&sorted, 0.25));
    stats.insert("50%".to_string(), quantile(&sorted, 0.50));
    stats.insert("75%".to_string(), quantile(&sorted, 0.75));
    stats.insert("max".to_string(), sorted[sorted.len() - 1]);

    stats
}

/// Linear-interpolated quantile of a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Target class shares as percentages over non-null values.
fn target_distribution(df: &DataFrame) -> Result<BTreeMap<String, f64>> {
    let column = df
        .column(TARGET_COLUMN)
        .map_err(|_| ChurnError::FeatureNotFound(TARGET_COLUMN.to_string()))?;
    let ca = column
        .str()
        .map_err(|e| ChurnError::DataError(format!("target column is not string-typed: {}", e)))?;

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut total = 0u64;
    for value in ca.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return Err(ChurnError::DataError(
            "target column has no values".to_string(),
        ));
    }

    Ok(counts
        .into_iter()
        .map(|(k, v)| (k, v as f64 / total as f64 * 100.0))
        .collect())
}

/// Full pairwise Pearson correlation matrix over numeric columns,
/// computed on rows where both values are present.
fn correlations(
    df: &DataFrame,
    numeric_cols: &[String],
) -> Result<BTreeMap<String, BTreeMap<String, f64>>> {
    let columns: Vec<Vec<Option<f64>>> = numeric_cols
        .iter()
        .map(|name| float_chunked(df, name).map(|ca| ca.into_iter().collect()))
        .collect::<Result<_>>()?;

    let mut matrix = BTreeMap::new();
    for (i, name_i) in numeric_cols.iter().enumerate() {
        let mut row = BTreeMap::new();
        for (j, name_j) in numeric_cols.iter().enumerate() {
            row.insert(name_j.clone(), pearson(&columns[i], &columns[j]));
        }
        matrix.insert(name_i.clone(), row);
    }
    Ok(matrix)
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}
