//! CLI argument definitions for the homicide statistics pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use homstat_core::SeriesMode;
use homstat_model::SegmentKey;

#[derive(Parser)]
#[command(
    name = "homstat",
    version,
    about = "Homicide statistics pipeline - prepare, score, rank and segment UNODC data",
    long_about = "Process the UNODC CTS intentional-homicide export into analysis tables.\n\n\
                  Prepares raw data, scores per-country data coverage, ranks countries\n\
                  and regions by population-weighted rate, and builds time series for\n\
                  totals and sex, age and situational-category breakdowns."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Prepare the raw CTS export into the processed observation table.
    Prepare(PrepareArgs),

    /// Score data coverage of the comparison countries over a window.
    Coverage(CoverageArgs),

    /// Rank countries and regions by aggregated homicide rate.
    Rank(RankArgs),

    /// Build country and regional time series for one breakdown.
    Series(SeriesArgs),
}

#[derive(Parser)]
pub struct PrepareArgs {
    /// Path to the raw CTS CSV export.
    #[arg(value_name = "RAW_CSV")]
    pub input: PathBuf,

    /// Analysis configuration JSON (defaults used when omitted).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output directory (default: processed/ next to the input).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct CoverageArgs {
    /// Path to the processed observation table.
    #[arg(value_name = "OBSERVATIONS")]
    pub input: PathBuf,

    /// Analysis configuration JSON (defaults used when omitted).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// First year of the window (default: inferred from the table).
    #[arg(long = "start-year", value_name = "YEAR")]
    pub start_year: Option<i32>,

    /// Last year of the window (default: inferred from the table).
    #[arg(long = "end-year", value_name = "YEAR")]
    pub end_year: Option<i32>,

    /// Coverage threshold override, in [0, 1].
    #[arg(long = "threshold")]
    pub threshold: Option<f64>,

    /// Score per segment of a breakdown column as well as overall.
    #[arg(long = "segment", value_enum)]
    pub segment: Option<SegmentArg>,
}

#[derive(Parser)]
pub struct RankArgs {
    /// Path to the processed observation table.
    #[arg(value_name = "OBSERVATIONS")]
    pub input: PathBuf,

    /// Analysis configuration JSON (defaults used when omitted).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// First year of the window (default: inferred from the table).
    #[arg(long = "start-year", value_name = "YEAR")]
    pub start_year: Option<i32>,

    /// Last year of the window (default: inferred from the table).
    #[arg(long = "end-year", value_name = "YEAR")]
    pub end_year: Option<i32>,

    /// Coverage threshold override, in [0, 1].
    #[arg(long = "threshold")]
    pub threshold: Option<f64>,

    /// Rank within segments of a breakdown column.
    #[arg(long = "segment", value_enum)]
    pub segment: Option<SegmentArg>,

    /// Output directory for the ranking CSVs (default: input directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct SeriesArgs {
    /// Path to the processed observation table.
    #[arg(value_name = "OBSERVATIONS")]
    pub input: PathBuf,

    /// Analysis configuration JSON (defaults used when omitted).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Which breakdown of the data to build.
    #[arg(long = "mode", value_enum, default_value = "total")]
    pub mode: SeriesModeArg,

    /// First year of the coverage window (default: inferred).
    #[arg(long = "start-year", value_name = "YEAR")]
    pub start_year: Option<i32>,

    /// Last year of the coverage window (default: inferred).
    #[arg(long = "end-year", value_name = "YEAR")]
    pub end_year: Option<i32>,

    /// Coverage threshold override, in [0, 1].
    #[arg(long = "threshold")]
    pub threshold: Option<f64>,

    /// Output directory for the series CSVs (default: input directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// Breakdown column choices for segmented coverage and rankings.
#[derive(Clone, Copy, ValueEnum)]
pub enum SegmentArg {
    Sex,
    Age,
    Category,
}

impl From<SegmentArg> for SegmentKey {
    fn from(arg: SegmentArg) -> Self {
        match arg {
            SegmentArg::Sex => SegmentKey::Sex,
            SegmentArg::Age => SegmentKey::Age,
            SegmentArg::Category => SegmentKey::Category,
        }
    }
}

/// Series breakdown choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum SeriesModeArg {
    Total,
    Sex,
    Age,
    Category,
}

impl From<SeriesModeArg> for SeriesMode {
    fn from(arg: SeriesModeArg) -> Self {
        match arg {
            SeriesModeArg::Total => SeriesMode::Total,
            SeriesModeArg::Sex => SeriesMode::BySex,
            SeriesModeArg::Age => SeriesMode::ByAge,
            SeriesModeArg::Category => SeriesMode::ByCategory,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
