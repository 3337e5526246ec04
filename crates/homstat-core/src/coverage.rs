//! Data-coverage evaluation.
//!
//! A country's coverage score over a window is the fraction of years for
//! which at least one observation exists, in [0, 1]. With a segmentation
//! key the overall score is the minimum across the segment values observed
//! in the restricted table, so a country failing one sex or age group
//! fails overall.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::debug;

use homstat_common::round2;
use homstat_model::schema::{COUNTRY, YEAR};
use homstat_model::{SegmentKey, YearWindow};

use crate::frame::{str_at, year_at};

/// Coverage of one requested country.
#[derive(Debug, Clone)]
pub struct CoverageEntry {
    pub country: String,
    /// Overall score; the minimum across `segments` when segmented.
    pub score: f64,
    /// Per-segment scores, empty when no segmentation key was given.
    pub segments: BTreeMap<String, f64>,
}

/// Scores for all requested countries, in request order.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    pub window: YearWindow,
    pub entries: Vec<CoverageEntry>,
}

impl CoverageReport {
    pub fn score(&self, country: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.country == country)
            .map(|entry| entry.score)
    }

    /// Countries meeting the threshold (inclusive).
    pub fn passing(&self, threshold: f64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.score >= threshold)
            .map(|entry| entry.country.clone())
            .collect()
    }

    /// Countries below the threshold, including those with no data at all.
    pub fn excluded(&self, threshold: f64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.score < threshold)
            .map(|entry| entry.country.clone())
            .collect()
    }
}

/// Score the requested countries over `window`.
///
/// Countries absent from the table score 0.0; with a segmentation key,
/// a country missing one of the observed segment values scores 0.0 for
/// that segment and therefore overall.
pub fn evaluate_coverage(
    df: &DataFrame,
    countries: &[String],
    window: YearWindow,
    segment: Option<SegmentKey>,
) -> Result<CoverageReport> {
    let requested: BTreeSet<&str> = countries.iter().map(String::as_str).collect();
    let segment_column = segment.map(SegmentKey::column);

    // Distinct years present per (country, segment value).
    let mut years_present: BTreeMap<(String, String), BTreeSet<i32>> = BTreeMap::new();
    let mut segment_universe: BTreeSet<String> = BTreeSet::new();

    for idx in 0..df.height() {
        let country = str_at(df, COUNTRY, idx);
        if !requested.contains(country.as_str()) {
            continue;
        }
        let Some(year) = year_at(df, YEAR, idx) else {
            continue;
        };
        if !window.contains(year) {
            continue;
        }
        let segment_value = match segment_column {
            Some(name) => {
                let value = str_at(df, name, idx);
                segment_universe.insert(value.clone());
                value
            }
            None => String::new(),
        };
        years_present
            .entry((country, segment_value))
            .or_default()
            .insert(year);
    }

    let span_years = f64::from(window.len_years());
    let mut entries = Vec::with_capacity(countries.len());
    for country in countries {
        let entry = if segment_column.is_some() {
            let mut segments = BTreeMap::new();
            let mut overall: Option<f64> = None;
            for segment_value in &segment_universe {
                let present = years_present
                    .get(&(country.clone(), segment_value.clone()))
                    .map_or(0, BTreeSet::len);
                let score = round2(present as f64 / span_years);
                overall = Some(overall.map_or(score, |current| current.min(score)));
                segments.insert(segment_value.clone(), score);
            }
            CoverageEntry {
                country: country.clone(),
                score: overall.unwrap_or(0.0),
                segments,
            }
        } else {
            let present = years_present
                .get(&(country.clone(), String::new()))
                .map_or(0, BTreeSet::len);
            CoverageEntry {
                country: country.clone(),
                score: round2(present as f64 / span_years),
                segments: BTreeMap::new(),
            }
        };
        entries.push(entry);
    }

    debug!(
        window = %window,
        requested = countries.len(),
        with_data = entries.iter().filter(|entry| entry.score > 0.0).count(),
        "coverage evaluated"
    );
    Ok(CoverageReport { window, entries })
}
