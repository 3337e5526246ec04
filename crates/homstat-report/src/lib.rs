//! CSV output writing for the analysis pipeline.

mod csv_out;

pub use csv_out::{CsvOutputOptions, write_table, write_tables};
