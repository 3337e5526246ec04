//! Preparation of the raw UNODC CTS intentional-homicide export.
//!
//! The raw file carries one row per (country, breakdown, year, unit of
//! measurement): rates per 100,000 and raw counts arrive as separate
//! rows sharing a key. Preparation pairs them back up, derives the
//! implied population from count and rate, applies the region labelling
//! rules and harmonized naming, and adds the year-over-year rate change
//! within each breakdown.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::{info, warn};

use homstat_common::{parse_f64, parse_i64, round2};
use homstat_model::RegionRules;
use homstat_model::StatError;
use homstat_model::schema::{
    AGE, CATEGORY, COUNT, COUNTRY, DIMENSION, POPULATION, RATE, RATE_ABS_CHANGE, RATE_SCALE,
    REGION, REGION_GROUP, SEX, SUBREGION, YEAR,
};

/// Indicator rows the pipeline keeps; the CTS export mixes several.
pub const TARGET_INDICATOR: &str = "Victims of intentional homicide";

const INDICATOR: &str = "Indicator";
const UNIT: &str = "Unit of measurement";
const VALUE: &str = "VALUE";
const UNIT_RATE: &str = "Rate per 100,000 population";
const UNIT_COUNT: &str = "Counts";

/// Join key of the rate/count row pair, raw source naming.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ObservationKey {
    country: String,
    region: String,
    subregion: String,
    dimension: String,
    category: String,
    sex: String,
    age: String,
    year: i64,
}

struct PreparedRow {
    key: ObservationKey,
    rate: f64,
    count: f64,
    population: Option<i64>,
    region_group: String,
    abs_change: Option<f64>,
}

/// Shape the raw CTS CSV into the processed observation table.
///
/// Only rows whose rate and count both exist survive the pairing; the
/// population is `count * 100,000 / rate`, left null when the rate is
/// zero. Output is sorted by (country, dimension, category, sex, age,
/// year) with the rate change computed within that grouping.
pub fn prepare_observations(path: &Path, rules: &RegionRules) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open raw CTS file: {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StatError::MissingColumn(name.to_string()).into())
    };
    let indicator_idx = column(INDICATOR)?;
    let unit_idx = column(UNIT)?;
    let value_idx = column(VALUE)?;
    let country_idx = column(COUNTRY)?;
    let region_idx = column(REGION)?;
    let subregion_idx = column(SUBREGION)?;
    let dimension_idx = column(DIMENSION)?;
    let category_idx = column(CATEGORY)?;
    let sex_idx = column(SEX)?;
    let age_idx = column(AGE)?;
    let year_idx = column(YEAR)?;

    let mut rates: BTreeMap<ObservationKey, f64> = BTreeMap::new();
    let mut counts: BTreeMap<ObservationKey, f64> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        if field(indicator_idx) != TARGET_INDICATOR {
            continue;
        }
        let (Some(year), Some(value)) = (
            parse_i64(field(year_idx)),
            parse_f64(field(value_idx)),
        ) else {
            skipped += 1;
            continue;
        };
        let key = ObservationKey {
            country: field(country_idx).to_string(),
            region: field(region_idx).to_string(),
            subregion: field(subregion_idx).to_string(),
            dimension: field(dimension_idx).to_string(),
            category: field(category_idx).to_string(),
            sex: field(sex_idx).to_string(),
            age: field(age_idx).to_string(),
            year,
        };
        match field(unit_idx) {
            UNIT_RATE => {
                rates.insert(key, value);
            }
            UNIT_COUNT => {
                counts.insert(key, value);
            }
            _ => {}
        }
    }
    if skipped > 0 {
        warn!(rows = skipped, "raw rows with unparseable year or value skipped");
    }

    let mut rows: Vec<PreparedRow> = Vec::with_capacity(rates.len());
    for (key, rate) in rates {
        let Some(&count) = counts.get(&key) else {
            continue;
        };
        let population = (rate > 0.0)
            .then(|| (count * RATE_SCALE / rate).round())
            .map(|p| p as i64);
        let country = rules.rename_country(&key.country).to_string();
        let region_group = rules.region_group(&country, &key.region);
        let category = rules.rename_category(&key.category).to_string();
        rows.push(PreparedRow {
            key: ObservationKey {
                country,
                category,
                ..key
            },
            rate: round2(rate),
            count,
            population,
            region_group,
            abs_change: None,
        });
    }

    rows.sort_by(|a, b| {
        let ka = &a.key;
        let kb = &b.key;
        (&ka.country, &ka.dimension, &ka.category, &ka.sex, &ka.age, ka.year).cmp(&(
            &kb.country,
            &kb.dimension,
            &kb.category,
            &kb.sex,
            &kb.age,
            kb.year,
        ))
    });

    // Year-over-year change within each (country, dimension, category,
    // sex, age) group; rows are already grouped and year-ordered.
    let mut previous: Option<(ObservationKey, f64)> = None;
    for row in &mut rows {
        row.abs_change = match &previous {
            Some((key, prev_rate)) if same_group(key, &row.key) => {
                Some(round2(row.rate - prev_rate))
            }
            _ => None,
        };
        previous = Some((row.key.clone(), row.rate));
    }

    info!(
        path = %path.display(),
        rows = rows.len(),
        "raw CTS export prepared"
    );
    rows_to_frame(&rows)
}

fn same_group(a: &ObservationKey, b: &ObservationKey) -> bool {
    a.country == b.country
        && a.dimension == b.dimension
        && a.category == b.category
        && a.sex == b.sex
        && a.age == b.age
}

fn rows_to_frame(rows: &[PreparedRow]) -> Result<DataFrame> {
    let columns = vec![
        Series::new(COUNTRY.into(), rows.iter().map(|r| r.key.country.as_str()).collect::<Vec<_>>())
            .into(),
        Series::new(REGION.into(), rows.iter().map(|r| r.key.region.as_str()).collect::<Vec<_>>())
            .into(),
        Series::new(
            SUBREGION.into(),
            rows.iter().map(|r| r.key.subregion.as_str()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(YEAR.into(), rows.iter().map(|r| r.key.year).collect::<Vec<_>>()).into(),
        Series::new(
            DIMENSION.into(),
            rows.iter().map(|r| r.key.dimension.as_str()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            CATEGORY.into(),
            rows.iter().map(|r| r.key.category.as_str()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(SEX.into(), rows.iter().map(|r| r.key.sex.as_str()).collect::<Vec<_>>()).into(),
        Series::new(AGE.into(), rows.iter().map(|r| r.key.age.as_str()).collect::<Vec<_>>()).into(),
        Series::new(RATE.into(), rows.iter().map(|r| r.rate).collect::<Vec<_>>()).into(),
        Series::new(COUNT.into(), rows.iter().map(|r| r.count).collect::<Vec<_>>()).into(),
        Series::new(POPULATION.into(), rows.iter().map(|r| r.population).collect::<Vec<_>>())
            .into(),
        Series::new(
            REGION_GROUP.into(),
            rows.iter().map(|r| r.region_group.as_str()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            RATE_ABS_CHANGE.into(),
            rows.iter().map(|r| r.abs_change).collect::<Vec<_>>(),
        )
        .into(),
    ];
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use homstat_common::{any_to_f64, any_to_i64, any_to_string};
    use polars::prelude::AnyValue;
    use std::io::Write;

    const HEADER: &str = "Iso3_code,Country,Region,Subregion,Indicator,Dimension,Category,Sex,Age,Year,Unit of measurement,VALUE";

    fn raw_row(
        country: &str,
        region: &str,
        year: i32,
        unit: &str,
        value: f64,
    ) -> String {
        // The rate unit label contains a comma, so it must be quoted.
        format!(
            "XXX,{country},{region},Sub,{TARGET_INDICATOR},Total,Total,Total,Total,{year},\"{unit}\",{value}"
        )
    }

    fn write_raw(lines: &[String]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        (dir, path)
    }

    fn cell<'a>(df: &'a DataFrame, name: &str, idx: usize) -> AnyValue<'a> {
        df.column(name).unwrap().get(idx).unwrap()
    }

    #[test]
    fn pairs_rates_with_counts_and_derives_population() {
        let (_dir, path) = write_raw(&[
            raw_row("France", "Europe", 2000, UNIT_RATE, 2.0),
            raw_row("France", "Europe", 2000, UNIT_COUNT, 1200.0),
        ]);
        let df = prepare_observations(&path, &RegionRules::default()).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(any_to_f64(cell(&df, RATE, 0)), Some(2.0));
        assert_eq!(any_to_f64(cell(&df, COUNT, 0)), Some(1200.0));
        // 1200 * 100_000 / 2.0
        assert_eq!(any_to_i64(cell(&df, POPULATION, 0)), Some(60_000_000));
    }

    #[test]
    fn unpaired_rows_are_dropped() {
        let (_dir, path) = write_raw(&[raw_row("France", "Europe", 2000, UNIT_RATE, 2.0)]);
        let df = prepare_observations(&path, &RegionRules::default()).unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn zero_rate_leaves_population_null() {
        let (_dir, path) = write_raw(&[
            raw_row("Monaco", "Europe", 2000, UNIT_RATE, 0.0),
            raw_row("Monaco", "Europe", 2000, UNIT_COUNT, 0.0),
        ]);
        let df = prepare_observations(&path, &RegionRules::default()).unwrap();
        assert_eq!(df.height(), 1);
        assert!(matches!(cell(&df, POPULATION, 0), AnyValue::Null));
    }

    #[test]
    fn applies_region_rules_and_renames() {
        let (_dir, path) = write_raw(&[
            raw_row("United States of America", "Americas", 2000, UNIT_RATE, 5.0),
            raw_row("United States of America", "Americas", 2000, UNIT_COUNT, 100.0),
            raw_row("Brazil", "Americas", 2000, UNIT_RATE, 20.0),
            raw_row("Brazil", "Americas", 2000, UNIT_COUNT, 400.0),
        ]);
        let df = prepare_observations(&path, &RegionRules::default()).unwrap();

        assert_eq!(any_to_string(cell(&df, COUNTRY, 0)), "Brazil");
        assert_eq!(any_to_string(cell(&df, REGION_GROUP, 0)), "Latam");
        assert_eq!(any_to_string(cell(&df, COUNTRY, 1)), "USA");
        assert_eq!(any_to_string(cell(&df, REGION_GROUP, 1)), "USA");
    }

    #[test]
    fn other_indicators_are_filtered_out() {
        let (_dir, path) = write_raw(&[
            "XXX,France,Europe,Sub,Persons arrested,Total,Total,Total,Total,2000,\"Rate per 100,000 population\",1.0"
                .to_string(),
        ]);
        let df = prepare_observations(&path, &RegionRules::default()).unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn rate_change_is_computed_within_a_group() {
        let (_dir, path) = write_raw(&[
            raw_row("France", "Europe", 2000, UNIT_RATE, 2.0),
            raw_row("France", "Europe", 2000, UNIT_COUNT, 100.0),
            raw_row("France", "Europe", 2001, UNIT_RATE, 3.5),
            raw_row("France", "Europe", 2001, UNIT_COUNT, 180.0),
            raw_row("Germany", "Europe", 2005, UNIT_RATE, 1.0),
            raw_row("Germany", "Europe", 2005, UNIT_COUNT, 800.0),
        ]);
        let df = prepare_observations(&path, &RegionRules::default()).unwrap();

        assert_eq!(df.height(), 3);
        assert!(matches!(cell(&df, RATE_ABS_CHANGE, 0), AnyValue::Null));
        assert_eq!(any_to_f64(cell(&df, RATE_ABS_CHANGE, 1)), Some(1.5));
        // New country starts a fresh group.
        assert!(matches!(cell(&df, RATE_ABS_CHANGE, 2), AnyValue::Null));
    }
}
