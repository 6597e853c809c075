//! Dataset loading

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Load a delimited customer table with a header row.
///
/// Schema is inferred from the first rows, so a charges column polluted with
/// stray whitespace comes back as a string column and is coerced later by
/// the cleaning step. Any IO or parse failure is fatal to the run.
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| {
        ChurnError::DataError(format!("cannot open {}: {}", path.display(), e))
    })?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| ChurnError::DataError(format!("cannot parse {}: {}", path.display(), e)))?;

    debug!(rows = df.height(), cols = df.width(), "dataset loaded");
    println!(
        "Dataset loaded with {} rows and {} columns",
        df.height(),
        df.width()
    );

    Ok(df)
}
