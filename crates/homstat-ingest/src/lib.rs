//! Data ingestion: raw UNODC CTS preparation and loading of the
//! processed observation table.

pub mod observations;
pub mod prepare;

pub use observations::{read_observations, validate_columns};
pub use prepare::{TARGET_INDICATOR, prepare_observations};
