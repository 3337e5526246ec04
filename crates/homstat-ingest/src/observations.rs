//! Loading prepared observation tables.

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use tracing::debug;

use homstat_model::StatError;
use homstat_model::schema::REQUIRED_COLUMNS;

/// Read a prepared observation table from CSV.
///
/// Dtypes are inferred per file; downstream access goes through
/// `AnyValue` conversions, so the exact inferred types do not matter.
/// Missing required columns are an error up front rather than a silent
/// all-null read later.
pub fn read_observations(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to read CSV: {}", path.display()))?;
    validate_columns(&df)?;
    debug!(path = %path.display(), rows = df.height(), "observation table loaded");
    Ok(df)
}

pub fn validate_columns(df: &DataFrame) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        return Err(StatError::MissingColumn(missing.join(", ")).into());
    }
    Ok(())
}
