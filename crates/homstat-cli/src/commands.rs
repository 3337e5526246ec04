//! Subcommand orchestration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use homstat_core::frame::str_at;
use homstat_core::{
    RankingOptions, RegionMap, SeriesMode, country_series, evaluate_coverage, filter_breakdown,
    infer_window, rank_countries, rank_regions, region_series,
};
use homstat_ingest::{prepare_observations, read_observations};
use homstat_model::schema::COUNTRY;
use homstat_model::{AnalysisConfig, SegmentKey, YearWindow};
use homstat_report::{CsvOutputOptions, write_table, write_tables};

use crate::cli::{CoverageArgs, PrepareArgs, RankArgs, SeriesArgs, SeriesModeArg};
use crate::types::{CoverageResult, PrepareResult, RankResult, SeriesResult};

const PREPARED_FILE: &str = "processed_unodc_intentional_homicide_rate.csv";

pub fn run_prepare(args: &PrepareArgs) -> Result<PrepareResult> {
    let span = info_span!("prepare", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = load_config(args.config.as_deref(), None)?;
    let mut df = prepare_observations(&args.input, &config.region_rules)?;

    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("processed")
    });
    let options = CsvOutputOptions::new(output_dir).dry_run(args.dry_run);
    let output = write_table(&mut df, &options, PREPARED_FILE)?;

    let countries: BTreeSet<String> = (0..df.height())
        .map(|idx| str_at(&df, COUNTRY, idx))
        .collect();
    info!(
        rows = df.height(),
        countries = countries.len(),
        duration_ms = start.elapsed().as_millis(),
        "prepare finished"
    );
    Ok(PrepareResult {
        rows: df.height(),
        countries: countries.len(),
        output,
        dry_run: args.dry_run,
    })
}

pub fn run_coverage(args: &CoverageArgs) -> Result<CoverageResult> {
    let span = info_span!("coverage", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = load_config(args.config.as_deref(), args.threshold)?;
    let segment = args.segment.map(SegmentKey::from);
    let df = filter_breakdown(&read_observations(&args.input)?, breakdown_for(segment))?;
    let window = resolve_window(&df, &config, args.start_year, args.end_year)?;
    let report = evaluate_coverage(&df, &config.countries, window, segment)?;

    info!(
        window = %window,
        countries = report.entries.len(),
        duration_ms = start.elapsed().as_millis(),
        "coverage finished"
    );
    Ok(CoverageResult {
        report,
        threshold: config.coverage_threshold,
        segment,
    })
}

pub fn run_rank(args: &RankArgs) -> Result<RankResult> {
    let span = info_span!("rank", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = load_config(args.config.as_deref(), args.threshold)?;
    let segment = args.segment.map(SegmentKey::from);
    // Rankings aggregate one breakdown at a time; mixing totals with
    // by-sex/age/category rows would double-count counts and populations.
    let df = filter_breakdown(&read_observations(&args.input)?, breakdown_for(segment))?;
    let regions = RegionMap::from_frame(&df)?;
    let window = resolve_window(&df, &config, args.start_year, args.end_year)?;

    let ranking = rank_countries(
        &df,
        &config.countries,
        RankingOptions {
            window,
            coverage_threshold: config.coverage_threshold,
            segment,
        },
        &regions,
    )?;
    let region_table = rank_regions(&ranking.table, segment)?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| input_dir(&args.input));
    let options = CsvOutputOptions::new(output_dir).dry_run(args.dry_run);
    let suffix = segment_suffix(segment);
    let mut tables = vec![
        (format!("ranking_countries{suffix}.csv"), ranking.table.clone()),
        (format!("ranking_regions{suffix}.csv"), region_table.clone()),
    ];
    let written = write_tables(&mut tables, &options)?;

    info!(
        window = %window,
        ranked = ranking.table.height(),
        excluded = ranking.excluded.len(),
        duration_ms = start.elapsed().as_millis(),
        "rank finished"
    );
    Ok(RankResult {
        window,
        segment,
        country_table: ranking.table,
        region_table,
        excluded: ranking.excluded,
        written,
    })
}

pub fn run_series(args: &SeriesArgs) -> Result<SeriesResult> {
    let span = info_span!("series", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = load_config(args.config.as_deref(), args.threshold)?;
    let df = read_observations(&args.input)?;
    let mode = SeriesMode::from(args.mode);
    let mode_label = mode_label(args.mode);

    let window = match (args.start_year, args.end_year) {
        (None, None) => None,
        (start_year, end_year) => Some(resolve_window(&df, &config, start_year, end_year)?),
    };
    let countries = country_series(&df, &config.countries, mode, &config.age_buckets)?;
    let regions = region_series(
        &df,
        &config.countries,
        mode,
        &config.age_buckets,
        config.coverage_threshold,
        window,
        &config.reference_region,
    )?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| input_dir(&args.input));
    let options = CsvOutputOptions::new(output_dir).dry_run(args.dry_run);
    let mut tables = vec![
        (format!("series_{mode_label}_countries.csv"), countries),
        (format!("series_{mode_label}_regions.csv"), regions.table.clone()),
    ];
    let written = write_tables(&mut tables, &options)?;

    info!(
        mode = mode_label,
        window = %regions.window,
        duration_ms = start.elapsed().as_millis(),
        "series finished"
    );
    Ok(SeriesResult {
        mode_label,
        window: regions.window,
        country_rows: tables[0].1.height(),
        region_rows: regions.table.height(),
        excluded: regions.excluded,
        written,
    })
}

/// Load the analysis configuration, apply the CLI threshold override and
/// validate the result.
fn load_config(path: Option<&Path>, threshold: Option<f64>) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(threshold) = threshold {
        config.coverage_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

/// Explicit window bounds take precedence; anything missing is inferred
/// from the observed years.
fn resolve_window(
    df: &DataFrame,
    config: &AnalysisConfig,
    start: Option<i32>,
    end: Option<i32>,
) -> Result<YearWindow> {
    if let (Some(start), Some(end)) = (start, end) {
        return Ok(YearWindow::new(start, end)?);
    }
    let inferred = infer_window(df, &config.reference_region)?;
    Ok(YearWindow::new(
        start.unwrap_or(inferred.start()),
        end.unwrap_or(inferred.end()),
    )?)
}

fn input_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

/// Breakdown whose rows feed an unsegmented or segmented run.
fn breakdown_for(segment: Option<SegmentKey>) -> SeriesMode {
    match segment {
        None => SeriesMode::Total,
        Some(SegmentKey::Sex) => SeriesMode::BySex,
        Some(SegmentKey::Age) => SeriesMode::ByAge,
        Some(SegmentKey::Category) => SeriesMode::ByCategory,
    }
}

fn segment_suffix(segment: Option<SegmentKey>) -> &'static str {
    match segment {
        None => "",
        Some(SegmentKey::Sex) => "_by_sex",
        Some(SegmentKey::Age) => "_by_age",
        Some(SegmentKey::Category) => "_by_category",
    }
}

fn mode_label(mode: SeriesModeArg) -> &'static str {
    match mode {
        SeriesModeArg::Total => "total",
        SeriesModeArg::Sex => "sex",
        SeriesModeArg::Age => "age",
        SeriesModeArg::Category => "category",
    }
}
