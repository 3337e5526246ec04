//! Shared utilities for homstat crates.
//!
//! Polars DataFrame cell helpers and the common rounding rule used by
//! every aggregation in the workspace.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use polars::{
    any_to_f64, any_to_i64, any_to_string, format_numeric, parse_f64, parse_i64, round2,
};
