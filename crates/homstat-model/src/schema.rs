//! Column names of the processed observation table.
//!
//! The table carries one row per (country, dimension, category, sex, age,
//! year) with a rate per 100,000 and, where the source reports raw counts,
//! the count and the implied population.

pub const COUNTRY: &str = "Country";
pub const REGION: &str = "Region";
pub const SUBREGION: &str = "Subregion";
pub const YEAR: &str = "Year";
pub const DIMENSION: &str = "Dimension";
pub const CATEGORY: &str = "Category";
pub const SEX: &str = "Sex";
pub const AGE: &str = "Age";

pub const RATE: &str = "homicides_rate";
pub const COUNT: &str = "homicides_count";
pub const POPULATION: &str = "population";
pub const REGION_GROUP: &str = "region_group";
pub const RATE_ABS_CHANGE: &str = "homicides_rate_abs_change";

/// Aggregated-rate column produced by the ranker and region series.
pub const MEAN_RATE: &str = "mean_homicides_rate";
/// Aggregation method column: "weighted" or "mean".
pub const METHOD: &str = "method";

/// Value marking an unsegmented total in Dimension, Sex, Age and Category.
pub const TOTAL: &str = "Total";
/// Dimension label of the situational-category breakdown in the UNODC CTS.
pub const DIMENSION_SITUATIONAL: &str = "by situational context";

/// Columns every processed observation table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    COUNTRY, YEAR, DIMENSION, CATEGORY, SEX, AGE, RATE, REGION_GROUP,
];

/// Rate scale: events per 100,000 population.
pub const RATE_SCALE: f64 = 100_000.0;
