//! Analysis core: coverage scoring, rate aggregation, rankings and
//! time-series segmentation over prepared homicide observation tables.

pub mod aggregate;
pub mod coverage;
pub mod frame;
pub mod ranking;
pub mod region;
pub mod series;

pub use aggregate::{AggregationMethod, RateAccumulator};
pub use coverage::{CoverageEntry, CoverageReport, evaluate_coverage};
pub use ranking::{Ranking, RankingOptions, rank_countries, rank_regions};
pub use region::RegionMap;
pub use series::{
    DEFAULT_EPOCH, RegionSeries, SeriesMode, country_series, filter_breakdown, infer_window,
    region_series,
};
