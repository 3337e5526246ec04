//! Country and region rankings over a year window.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::{debug, info};

use homstat_common::round2;
use homstat_model::schema::{
    COUNT, COUNTRY, MEAN_RATE, METHOD, POPULATION, RATE, REGION_GROUP, YEAR,
};
use homstat_model::{SegmentKey, StatError, YearWindow};

use crate::aggregate::{AggregationMethod, RateAccumulator};
use crate::coverage::{CoverageReport, evaluate_coverage};
use crate::frame::{f64_at, str_at, year_at};
use crate::region::RegionMap;

#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    pub window: YearWindow,
    /// Minimum coverage score for inclusion, inclusive, in [0, 1].
    pub coverage_threshold: f64,
    pub segment: Option<SegmentKey>,
}

/// Country ranking plus the coverage decisions behind it.
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Columns: Country, [segment], mean_homicides_rate, method,
    /// region_group; sorted ascending by rate.
    pub table: DataFrame,
    pub selected: Vec<String>,
    pub excluded: Vec<String>,
    pub coverage: CoverageReport,
}

struct RankRecord {
    country: String,
    segment: String,
    rate: f64,
    method: AggregationMethod,
    region: String,
}

/// Rank countries by their aggregated rate over the window.
///
/// Countries below the coverage threshold are dropped from the ranking
/// and reported in `excluded`; they are never an error.
pub fn rank_countries(
    df: &DataFrame,
    countries: &[String],
    options: RankingOptions,
    regions: &RegionMap,
) -> Result<Ranking> {
    if !(0.0..=1.0).contains(&options.coverage_threshold) {
        return Err(StatError::InvalidThreshold(options.coverage_threshold).into());
    }
    let coverage = evaluate_coverage(df, countries, options.window, options.segment)?;
    let selected = coverage.passing(options.coverage_threshold);
    let excluded = coverage.excluded(options.coverage_threshold);
    if !excluded.is_empty() {
        info!(
            window = %options.window,
            threshold = options.coverage_threshold,
            excluded = ?excluded,
            "countries below coverage threshold"
        );
    }

    let segment_column = options.segment.map(SegmentKey::column);
    let mut groups: BTreeMap<(String, String), RateAccumulator> = BTreeMap::new();
    for idx in 0..df.height() {
        let country = str_at(df, COUNTRY, idx);
        if !selected.contains(&country) {
            continue;
        }
        let Some(year) = year_at(df, YEAR, idx) else {
            continue;
        };
        if !options.window.contains(year) {
            continue;
        }
        let segment_value = segment_column.map_or_else(String::new, |name| str_at(df, name, idx));
        groups.entry((country, segment_value)).or_default().add(
            f64_at(df, RATE, idx),
            f64_at(df, COUNT, idx),
            f64_at(df, POPULATION, idx),
        );
    }

    let mut records = Vec::with_capacity(groups.len());
    for ((country, segment), accumulator) in &groups {
        let Some((rate, method)) = accumulator.finish() else {
            continue;
        };
        if method == AggregationMethod::Mean {
            debug!(country = %country, segment = %segment, "weighting inputs incomplete, using mean of rates");
        }
        let region = regions.require(country)?.to_string();
        records.push(RankRecord {
            country: country.clone(),
            segment: segment.clone(),
            rate: round2(rate),
            method,
            region,
        });
    }
    records.sort_by(|a, b| a.rate.total_cmp(&b.rate));

    let table = records_to_frame(&records, segment_column)?;
    Ok(Ranking {
        table,
        selected,
        excluded,
        coverage,
    })
}

fn records_to_frame(records: &[RankRecord], segment_column: Option<&str>) -> Result<DataFrame> {
    let countries: Vec<&str> = records.iter().map(|r| r.country.as_str()).collect();
    let rates: Vec<f64> = records.iter().map(|r| r.rate).collect();
    let methods: Vec<&str> = records.iter().map(|r| r.method.as_str()).collect();
    let region_labels: Vec<&str> = records.iter().map(|r| r.region.as_str()).collect();

    let mut columns = vec![Series::new(COUNTRY.into(), countries).into()];
    if let Some(name) = segment_column {
        let segments: Vec<&str> = records.iter().map(|r| r.segment.as_str()).collect();
        columns.push(Series::new(name.into(), segments).into());
    }
    columns.push(Series::new(MEAN_RATE.into(), rates).into());
    columns.push(Series::new(METHOD.into(), methods).into());
    columns.push(Series::new(REGION_GROUP.into(), region_labels).into());
    Ok(DataFrame::new(columns)?)
}

/// Roll a country ranking up to regions.
///
/// Region figures are the unweighted mean of the entity-level aggregates
/// belonging to the region (a rollup of rollups), not a re-derivation
/// from raw observations.
pub fn rank_regions(ranking: &DataFrame, segment: Option<SegmentKey>) -> Result<DataFrame> {
    let segment_column = segment.map(SegmentKey::column);
    let mut sums: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    for idx in 0..ranking.height() {
        let region = str_at(ranking, REGION_GROUP, idx);
        let Some(rate) = f64_at(ranking, MEAN_RATE, idx) else {
            continue;
        };
        let segment_value =
            segment_column.map_or_else(String::new, |name| str_at(ranking, name, idx));
        let entry = sums.entry((region, segment_value)).or_insert((0.0, 0));
        entry.0 += rate;
        entry.1 += 1;
    }

    struct RegionRecord {
        region: String,
        segment: String,
        rate: f64,
    }
    let mut records: Vec<RegionRecord> = sums
        .into_iter()
        .map(|((region, segment), (sum, n))| RegionRecord {
            region,
            segment,
            rate: round2(sum / n as f64),
        })
        .collect();
    records.sort_by(|a, b| a.rate.total_cmp(&b.rate));

    let region_labels: Vec<&str> = records.iter().map(|r| r.region.as_str()).collect();
    let rates: Vec<f64> = records.iter().map(|r| r.rate).collect();
    let mut columns = vec![Series::new(REGION_GROUP.into(), region_labels).into()];
    if let Some(name) = segment_column {
        let segments: Vec<&str> = records.iter().map(|r| r.segment.as_str()).collect();
        columns.push(Series::new(name.into(), segments).into());
    }
    columns.push(Series::new(MEAN_RATE.into(), rates).into());
    Ok(DataFrame::new(columns)?)
}
