//! Cleaning, target separation, and stratified splitting

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Target column holding the Yes/No churn label.
pub const TARGET_COLUMN: &str = "Churn";

/// Identity column; carries no predictive signal and is dropped.
pub const ID_COLUMN: &str = "customerID";

/// Charges column that arrives string-typed when polluted with whitespace.
pub const CHARGES_COLUMN: &str = "TotalCharges";

/// Binary-categorical fields mapped to {0, 1} by exact string match.
pub const BINARY_COLUMNS: [&str; 6] = [
    "gender",
    "Partner",
    "Dependents",
    "PhoneService",
    "PaperlessBilling",
    TARGET_COLUMN,
];

/// Cleaned features with the target separated out and the feature partition
/// fixed for the rest of the run.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Feature columns only (no id, no target)
    pub features: DataFrame,
    /// Binary target in {0.0, 1.0}
    pub target: Array1<f64>,
    /// Numeric feature names in frame order
    pub numeric_columns: Vec<String>,
    /// Categorical feature names in frame order
    pub categorical_columns: Vec<String>,
}

/// Disjoint stratified train/evaluation partition.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Clean the raw table and separate the target.
///
/// - `TotalCharges` strings are coerced to numbers, unparsable entries
///   (stray whitespace) become missing rather than failing the run;
/// - the identity column is dropped if present;
/// - binary fields map Yes/Male to 1 and No/Female to 0, anything else
///   becomes missing;
/// - remaining columns are partitioned by dtype into numeric vs categorical.
pub fn clean(df: &DataFrame) -> Result<PreparedData> {
    let mut frame = df.clone();

    if let Ok(col) = frame.column(CHARGES_COLUMN) {
        if col.dtype() == &DataType::String {
            let coerced = coerce_numeric(col)?;
            frame = frame
                .with_column(coerced)
                .map_err(|e| ChurnError::DataError(e.to_string()))?
                .clone();
        }
    }

    if frame.column(ID_COLUMN).is_ok() {
        frame = frame
            .drop(ID_COLUMN)
            .map_err(|e| ChurnError::DataError(e.to_string()))?;
    }

    for name in BINARY_COLUMNS {
        let mapped = match frame.column(name) {
            Ok(col) if col.dtype() == &DataType::String => map_binary(col)?,
            _ => continue,
        };
        frame = frame
            .with_column(mapped)
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();
    }

    // Separate the target; rows whose label did not map are unusable and
    // are dropped before modeling.
    let target_col = frame
        .column(TARGET_COLUMN)
        .map_err(|_| ChurnError::FeatureNotFound(TARGET_COLUMN.to_string()))?;
    let target_ca = target_col
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .clone();

    let keep: Vec<u32> = target_ca
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i as u32))
        .collect();
    if keep.len() < frame.height() {
        warn!(
            dropped = frame.height() - keep.len(),
            "rows with unmappable target labels dropped"
        );
    }
    if keep.is_empty() {
        return Err(ChurnError::DataError(
            "no rows with a usable target label".to_string(),
        ));
    }

    let idx = IdxCa::from_vec("idx".into(), keep);
    let frame = frame
        .take(&idx)
        .map_err(|e| ChurnError::DataError(e.to_string()))?;

    let target: Array1<f64> = frame
        .column(TARGET_COLUMN)
        .map_err(|_| ChurnError::FeatureNotFound(TARGET_COLUMN.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .into_iter()
        .flatten()
        .collect();

    let features = frame
        .drop(TARGET_COLUMN)
        .map_err(|e| ChurnError::DataError(e.to_string()))?;

    // Partition by runtime value type; the partition stays fixed from
    // training through prediction.
    let mut numeric_columns = Vec::new();
    let mut categorical_columns = Vec::new();
    for col in features.get_columns() {
        if col.dtype().is_primitive_numeric() {
            numeric_columns.push(col.name().to_string());
        } else if col.dtype() == &DataType::String {
            categorical_columns.push(col.name().to_string());
        } else {
            return Err(ChurnError::DataError(format!(
                "unsupported dtype {:?} in column {}",
                col.dtype(),
                col.name()
            )));
        }
    }

    debug!(
        numeric = numeric_columns.len(),
        categorical = categorical_columns.len(),
        rows = features.height(),
        "data cleaned"
    );

    Ok(PreparedData {
        features,
        target,
        numeric_columns,
        categorical_columns,
    })
}

/// Parse a string column to floats; unparsable values become null.
fn coerce_numeric(column: &Column) -> Result<Column> {
    let ca = column
        .str()
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    let parsed: Float64Chunked = ca
        .into_iter()
        .map(|opt| opt.and_then(|s| s.trim().parse::<f64>().ok()))
        .collect();
    Ok(parsed.with_name(column.name().clone()).into_column())
}

/// Map Yes/Male to 1.0 and No/Female to 0.0; other content becomes null.
fn map_binary(column: &Column) -> Result<Column> {
    let ca = column
        .str()
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    let mapped: Float64Chunked = ca
        .into_iter()
        .map(|opt| {
            opt.and_then(|s| match s {
                "Yes" | "Male" => Some(1.0),
                "No" | "Female" => Some(0.0),
                _ => None,
            })
        })
        .collect();
    Ok(mapped.with_name(column.name().clone()).into_column())
}

/// Stratified train/evaluation split with a fixed seed.
///
/// Class indices are shuffled independently and the tail share of each
/// class goes to the evaluation subset, preserving the churn rate on both
/// sides.
pub fn train_test_split(
    prepared: &PreparedData,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(ChurnError::ValidationError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n = prepared.target.len();
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for (i, &y) in prepared.target.iter().enumerate() {
        if y >= 0.5 {
            positives.push(i);
        } else {
            negatives.push(i);
        }
    }
    if positives.is_empty() || negatives.is_empty() {
        return Err(ChurnError::ValidationError(
            "stratified split requires both classes to be present".to_string(),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    positives.shuffle(&mut rng);
    negatives.shuffle(&mut rng);

    let mut train_idx = Vec::with_capacity(n);
    let mut test_idx = Vec::new();
    for class in [&negatives, &positives] {
        let n_test = ((class.len() as f64) * test_size).round() as usize;
        let n_test = n_test.clamp(1, class.len() - 1);
        test_idx.extend_from_slice(&class[..n_test]);
        train_idx.extend_from_slice(&class[n_test..]);
    }
    train_idx.sort_unstable();
    test_idx.sort_unstable();

    let take = |indices: &[usize]| -> Result<DataFrame> {
        let idx = IdxCa::from_vec("idx".into(), indices.iter().map(|&i| i as u32).collect());
        prepared
            .features
            .take(&idx)
            .map_err(|e| ChurnError::DataError(e.to_string()))
    };
    let gather = |indices: &[usize]| -> Array1<f64> {
        indices.iter().map(|&i| prepared.target[i]).collect()
    };

    Ok(TrainTestSplit {
        x_train: take(&train_idx)?,
        x_test: take(&test_idx)?,
        y_train: gather(&train_idx),
        y_test: gather(&test_idx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df!(
            "customerID" => &["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"],
            "gender" => &["Male", "Female", "Male", "Female", "Male", "Female", "Male", "Female", "Male", "Female"],
            "tenure" => &[1i64, 5, 10, 20, 30, 40, 50, 60, 65, 70],
            "TotalCharges" => &["10.5", " ", "300.0", "800.4", "1200", "2000.1", "2500", "3000", "3300.9", "3600"],
            "Contract" => &["Month-to-month", "One year", "Month-to-month", "Two year", "One year",
                            "Two year", "Month-to-month", "One year", "Two year", "Month-to-month"],
            "Churn" => &["Yes", "No", "Yes", "No", "No", "No", "Yes", "No", "No", "Yes"],
        )
        .unwrap()
    }

    #[test]
    fn test_clean_drops_id_and_target() {
        let prepared = clean(&raw_frame()).unwrap();
        assert!(prepared.features.column(ID_COLUMN).is_err());
        assert!(prepared.features.column(TARGET_COLUMN).is_err());
        assert_eq!(prepared.target.len(), 10);
    }

    #[test]
    fn test_charges_coercion_keeps_rows() {
        let prepared = clean(&raw_frame()).unwrap();
        let charges = prepared.features.column(CHARGES_COLUMN).unwrap();
        assert_eq!(charges.dtype(), &DataType::Float64);
        // the whitespace entry became missing instead of failing the run
        assert_eq!(charges.null_count(), 1);
    }

    #[test]
    fn test_binary_mapping_and_partition() {
        let prepared = clean(&raw_frame()).unwrap();
        assert!(prepared.numeric_columns.contains(&"gender".to_string()));
        assert!(prepared.numeric_columns.contains(&"tenure".to_string()));
        assert!(prepared.numeric_columns.contains(&CHARGES_COLUMN.to_string()));
        assert_eq!(prepared.categorical_columns, vec!["Contract".to_string()]);

        // every feature belongs to exactly one subset
        let total = prepared.numeric_columns.len() + prepared.categorical_columns.len();
        assert_eq!(total, prepared.features.width());
    }

    #[test]
    fn test_split_is_stratified() {
        let prepared = clean(&raw_frame()).unwrap();
        let split = train_test_split(&prepared, 0.2, 42).unwrap();

        let full_rate = prepared.target.mean().unwrap();
        let train_rate = split.y_train.mean().unwrap();
        assert!((full_rate - train_rate).abs() < 0.15);
        assert_eq!(
            split.y_train.len() + split.y_test.len(),
            prepared.target.len()
        );
    }

    #[test]
    fn test_split_reproducible() {
        let prepared = clean(&raw_frame()).unwrap();
        let a = train_test_split(&prepared, 0.2, 42).unwrap();
        let b = train_test_split(&prepared, 0.2, 42).unwrap();
        assert_eq!(a.y_train, b.y_train);
        assert_eq!(a.y_test, b.y_test);
    }
}
