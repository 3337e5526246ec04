//! Cell-level access helpers for observation frames.
//!
//! The CSV reader infers dtypes per file, so all reads go through
//! `AnyValue` conversions instead of assuming a concrete chunked type.

use homstat_common::{any_to_f64, any_to_i64, any_to_string};
use polars::prelude::{AnyValue, DataFrame};

/// String value of a cell; empty string for nulls and missing columns.
pub fn str_at(df: &DataFrame, name: &str, idx: usize) -> String {
    match df.column(name) {
        Ok(column) => any_to_string(column.get(idx).unwrap_or(AnyValue::Null)),
        Err(_) => String::new(),
    }
}

/// Numeric value of a cell; `None` for nulls and missing columns.
pub fn f64_at(df: &DataFrame, name: &str, idx: usize) -> Option<f64> {
    let column = df.column(name).ok()?;
    any_to_f64(column.get(idx).unwrap_or(AnyValue::Null))
}

/// Integer value of a cell; `None` for nulls and missing columns.
pub fn i64_at(df: &DataFrame, name: &str, idx: usize) -> Option<i64> {
    let column = df.column(name).ok()?;
    any_to_i64(column.get(idx).unwrap_or(AnyValue::Null))
}

/// Year of a row, if present.
pub fn year_at(df: &DataFrame, name: &str, idx: usize) -> Option<i32> {
    i64_at(df, name, idx).and_then(|y| i32::try_from(y).ok())
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}
