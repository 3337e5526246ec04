//! Time-series segmentation and the default analysis window.
//!
//! A series is the observation table restricted to one breakdown of the
//! data (totals, by sex, by remapped age bucket, by situational
//! category), one row per country-year, sorted by (country, segment,
//! year). The age breakdown re-aggregates raw age groups into buckets
//! and therefore recomputes the year-over-year change, which the source
//! diff column no longer describes after remapping.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use polars::prelude::{BooleanChunked, DataFrame, NamedFrom, NewChunkedArray, Series};
use tracing::{debug, info};

use homstat_common::round2;
use homstat_model::schema::{
    AGE, CATEGORY, COUNT, COUNTRY, DIMENSION, DIMENSION_SITUATIONAL, MEAN_RATE, POPULATION, RATE,
    RATE_ABS_CHANGE, REGION_GROUP, SEX, TOTAL, YEAR,
};
use homstat_model::{SegmentKey, StatError, YearWindow};

use crate::aggregate::{AggregationMethod, RateAccumulator};
use crate::coverage::evaluate_coverage;
use crate::frame::{f64_at, str_at, year_at};

/// Lower-bound year used when the table offers nothing to infer from.
pub const DEFAULT_EPOCH: i32 = 1990;

/// Which breakdown of the observation table a series shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMode {
    /// National totals: Dimension, Sex and Age all "Total".
    Total,
    /// Sex breakdown of the totals.
    BySex,
    /// Age breakdown, remapped through the configured bucket table.
    ByAge,
    /// Situational-category breakdown.
    ByCategory,
}

impl SeriesMode {
    pub fn segment(self) -> Option<SegmentKey> {
        match self {
            SeriesMode::Total => None,
            SeriesMode::BySex => Some(SegmentKey::Sex),
            SeriesMode::ByAge => Some(SegmentKey::Age),
            SeriesMode::ByCategory => Some(SegmentKey::Category),
        }
    }

    fn matches(self, dimension: &str, sex: &str, age: &str) -> bool {
        match self {
            SeriesMode::Total => dimension == TOTAL && sex == TOTAL && age == TOTAL,
            SeriesMode::BySex => dimension == TOTAL && sex != TOTAL && age == TOTAL,
            SeriesMode::ByAge => dimension == TOTAL && sex == TOTAL && age != TOTAL,
            SeriesMode::ByCategory => {
                dimension == DIMENSION_SITUATIONAL && sex == TOTAL && age == TOTAL
            }
        }
    }
}

/// Restrict an observation table to the rows of one breakdown.
///
/// The prepared table interleaves national totals with by-sex, by-age
/// and situational-context rows; aggregating across breakdowns would
/// double-count, so rankings and coverage runs work on one breakdown
/// at a time.
pub fn filter_breakdown(df: &DataFrame, mode: SeriesMode) -> Result<DataFrame> {
    let keep: Vec<bool> = (0..df.height())
        .map(|idx| {
            mode.matches(
                &str_at(df, DIMENSION, idx),
                &str_at(df, SEX, idx),
                &str_at(df, AGE, idx),
            )
        })
        .collect();
    let mask = BooleanChunked::from_slice("breakdown".into(), &keep);
    Ok(df.filter(&mask)?)
}

struct SeriesRow {
    country: String,
    region: String,
    segment: String,
    year: i32,
    rate: Option<f64>,
    count: Option<f64>,
    population: Option<f64>,
    abs_change: Option<f64>,
}

/// Per-country-year series for one segmentation mode.
///
/// Output columns: Country, region_group, [segment], Year,
/// homicides_rate, homicides_rate_abs_change; sorted by
/// (country, segment, year). For [`SeriesMode::ByAge`] the segment column
/// holds bucket labels and the rate/change columns are re-derived.
pub fn country_series(
    df: &DataFrame,
    countries: &[String],
    mode: SeriesMode,
    age_buckets: &BTreeMap<String, String>,
) -> Result<DataFrame> {
    let requested: BTreeSet<&str> = countries.iter().map(String::as_str).collect();
    let mut rows: Vec<SeriesRow> = Vec::new();
    let mut dropped_ages: BTreeSet<String> = BTreeSet::new();

    for idx in 0..df.height() {
        let country = str_at(df, COUNTRY, idx);
        if !requested.contains(country.as_str()) {
            continue;
        }
        let dimension = str_at(df, DIMENSION, idx);
        let sex = str_at(df, SEX, idx);
        let age = str_at(df, AGE, idx);
        if !mode.matches(&dimension, &sex, &age) {
            continue;
        }
        let Some(year) = year_at(df, YEAR, idx) else {
            continue;
        };
        let segment = match mode {
            SeriesMode::Total => String::new(),
            SeriesMode::BySex => sex,
            SeriesMode::ByCategory => str_at(df, CATEGORY, idx),
            SeriesMode::ByAge => match age_buckets.get(&age) {
                Some(bucket) => bucket.clone(),
                None => {
                    dropped_ages.insert(age);
                    continue;
                }
            },
        };
        rows.push(SeriesRow {
            country,
            region: str_at(df, REGION_GROUP, idx),
            segment,
            year,
            rate: f64_at(df, RATE, idx),
            count: f64_at(df, COUNT, idx),
            population: f64_at(df, POPULATION, idx),
            abs_change: f64_at(df, RATE_ABS_CHANGE, idx),
        });
    }
    if !dropped_ages.is_empty() {
        debug!(labels = ?dropped_ages, "age labels outside the bucket table dropped");
    }

    if mode == SeriesMode::ByAge {
        rows = rebucket_age_rows(rows);
    }
    rows.sort_by(|a, b| {
        (a.country.as_str(), a.segment.as_str(), a.year)
            .cmp(&(b.country.as_str(), b.segment.as_str(), b.year))
    });
    rows_to_frame(&rows, mode.segment().map(SegmentKey::column))
}

/// Re-aggregate bucket-labelled rows per (country, region, year, bucket)
/// and recompute the year-over-year change within (country, bucket).
fn rebucket_age_rows(rows: Vec<SeriesRow>) -> Vec<SeriesRow> {
    let mut groups: BTreeMap<(String, String, String, i32), RateAccumulator> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.country, row.region, row.segment, row.year))
            .or_default()
            .add(row.rate, row.count, row.population);
    }

    let mut fallback_groups = 0usize;
    let mut out: Vec<SeriesRow> = Vec::with_capacity(groups.len());
    for ((country, region, bucket, year), accumulator) in groups {
        let Some((rate, method)) = accumulator.finish() else {
            continue;
        };
        if method == AggregationMethod::Mean {
            fallback_groups += 1;
        }
        out.push(SeriesRow {
            country,
            region,
            segment: bucket,
            year,
            rate: Some(round2(rate)),
            count: None,
            population: None,
            abs_change: None,
        });
    }
    if fallback_groups > 0 {
        debug!(
            groups = fallback_groups,
            "bucket re-aggregation fell back to mean of rates"
        );
    }

    // BTreeMap order is (country, region, bucket, year), so consecutive
    // rows of one bucket are already year-ordered.
    let mut previous: Option<(String, String, f64)> = None;
    for row in &mut out {
        let rate = row.rate.unwrap_or(0.0);
        row.abs_change = match &previous {
            Some((country, bucket, prev_rate))
                if country == &row.country && bucket == &row.segment =>
            {
                Some(round2(rate - prev_rate))
            }
            _ => None,
        };
        previous = Some((row.country.clone(), row.segment.clone(), rate));
    }
    out
}

fn rows_to_frame(rows: &[SeriesRow], segment_column: Option<&str>) -> Result<DataFrame> {
    let countries: Vec<&str> = rows.iter().map(|r| r.country.as_str()).collect();
    let region_labels: Vec<&str> = rows.iter().map(|r| r.region.as_str()).collect();
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    let rates: Vec<Option<f64>> = rows.iter().map(|r| r.rate).collect();
    let changes: Vec<Option<f64>> = rows.iter().map(|r| r.abs_change).collect();

    let mut columns = vec![
        Series::new(COUNTRY.into(), countries).into(),
        Series::new(REGION_GROUP.into(), region_labels).into(),
    ];
    if let Some(name) = segment_column {
        let segments: Vec<&str> = rows.iter().map(|r| r.segment.as_str()).collect();
        columns.push(Series::new(name.into(), segments).into());
    }
    columns.push(Series::new(YEAR.into(), years).into());
    columns.push(Series::new(RATE.into(), rates).into());
    columns.push(Series::new(RATE_ABS_CHANGE.into(), changes).into());
    Ok(DataFrame::new(columns)?)
}

/// Infer the default analysis window from observed years.
///
/// Lower bound: 25th percentile (nearest rank) of the distinct years
/// observed for `reference_region`; falls back to the overall minimum
/// year, then to [`DEFAULT_EPOCH`]. Upper bound: the overall maximum
/// year. A table without any year is an error.
pub fn infer_window(df: &DataFrame, reference_region: &str) -> Result<YearWindow> {
    let mut all_years: BTreeSet<i32> = BTreeSet::new();
    let mut reference_years: BTreeSet<i32> = BTreeSet::new();
    for idx in 0..df.height() {
        let Some(year) = year_at(df, YEAR, idx) else {
            continue;
        };
        all_years.insert(year);
        if str_at(df, REGION_GROUP, idx) == reference_region {
            reference_years.insert(year);
        }
    }
    let Some(&end) = all_years.iter().next_back() else {
        return Err(StatError::EmptyTable.into());
    };
    let start = if reference_years.is_empty() {
        all_years
            .iter()
            .next()
            .copied()
            .unwrap_or(DEFAULT_EPOCH)
    } else {
        let sorted: Vec<i32> = reference_years.into_iter().collect();
        let rank = (0.25 * (sorted.len() - 1) as f64).round() as usize;
        sorted[rank]
    };
    let window = YearWindow::new(start.min(end), end)?;
    debug!(reference_region, window = %window, "analysis window inferred");
    Ok(window)
}

/// Regional series for one segmentation mode.
#[derive(Debug, Clone)]
pub struct RegionSeries {
    /// Columns: region_group, [segment], Year, mean_homicides_rate;
    /// sorted by (region, segment, year).
    pub table: DataFrame,
    pub window: YearWindow,
    pub selected: Vec<String>,
    pub excluded: Vec<String>,
}

/// Per-region-year mean of the country series.
///
/// Countries enter a regional aggregate only when they pass the coverage
/// threshold over the analysis window (given or inferred); region values
/// are the unweighted mean of country rates for that year.
pub fn region_series(
    df: &DataFrame,
    countries: &[String],
    mode: SeriesMode,
    age_buckets: &BTreeMap<String, String>,
    coverage_threshold: f64,
    window: Option<YearWindow>,
    reference_region: &str,
) -> Result<RegionSeries> {
    if !(0.0..=1.0).contains(&coverage_threshold) {
        return Err(StatError::InvalidThreshold(coverage_threshold).into());
    }
    let series = country_series(df, countries, mode, age_buckets)?;
    let window = match window {
        Some(window) => window,
        None => infer_window(&series, reference_region)?,
    };
    let coverage = evaluate_coverage(&series, countries, window, mode.segment())?;
    let selected = coverage.passing(coverage_threshold);
    let excluded = coverage.excluded(coverage_threshold);
    if !excluded.is_empty() {
        info!(
            window = %window,
            threshold = coverage_threshold,
            excluded = ?excluded,
            "countries left out of regional series"
        );
    }

    let mut sums: BTreeMap<(String, String, i32), (f64, usize)> = BTreeMap::new();
    for idx in 0..series.height() {
        let country = str_at(&series, COUNTRY, idx);
        if !selected.contains(&country) {
            continue;
        }
        let Some(year) = year_at(&series, YEAR, idx) else {
            continue;
        };
        if !window.contains(year) {
            continue;
        }
        let Some(rate) = f64_at(&series, RATE, idx) else {
            continue;
        };
        let segment_value = mode
            .segment()
            .map_or_else(String::new, |key| str_at(&series, key.column(), idx));
        let region = str_at(&series, REGION_GROUP, idx);
        let entry = sums.entry((region, segment_value, year)).or_insert((0.0, 0));
        entry.0 += rate;
        entry.1 += 1;
    }

    let keys: Vec<(String, String, i32)> = sums.keys().cloned().collect();
    let region_labels: Vec<&str> = keys.iter().map(|(region, _, _)| region.as_str()).collect();
    let years: Vec<i32> = keys.iter().map(|(_, _, year)| *year).collect();
    let rates: Vec<f64> = keys
        .iter()
        .map(|key| {
            let (sum, n) = sums[key];
            round2(sum / n as f64)
        })
        .collect();

    let mut columns = vec![Series::new(REGION_GROUP.into(), region_labels).into()];
    if let Some(key) = mode.segment() {
        let segments: Vec<&str> = keys.iter().map(|(_, segment, _)| segment.as_str()).collect();
        columns.push(Series::new(key.column().into(), segments).into());
    }
    columns.push(Series::new(YEAR.into(), years).into());
    columns.push(Series::new(MEAN_RATE.into(), rates).into());

    Ok(RegionSeries {
        table: DataFrame::new(columns)?,
        window,
        selected,
        excluded,
    })
}
