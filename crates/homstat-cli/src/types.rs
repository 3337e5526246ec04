use std::path::PathBuf;

use polars::prelude::DataFrame;

use homstat_core::CoverageReport;
use homstat_model::{SegmentKey, YearWindow};

#[derive(Debug)]
pub struct PrepareResult {
    pub rows: usize,
    pub countries: usize,
    pub output: PathBuf,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct CoverageResult {
    pub report: CoverageReport,
    pub threshold: f64,
    pub segment: Option<SegmentKey>,
}

#[derive(Debug)]
pub struct RankResult {
    pub window: YearWindow,
    pub segment: Option<SegmentKey>,
    pub country_table: DataFrame,
    pub region_table: DataFrame,
    pub excluded: Vec<String>,
    pub written: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct SeriesResult {
    pub mode_label: &'static str,
    pub window: YearWindow,
    pub country_rows: usize,
    pub region_rows: usize,
    pub excluded: Vec<String>,
    pub written: Vec<PathBuf>,
}
