//! Analysis configuration.
//!
//! Everything the core pipeline consumes as configuration lives here:
//! the country comparison list, the coverage threshold, the reference
//! region for window inference, the region labelling rules and the
//! age-bucket remapping table. Loaded from JSON by the CLI; the defaults
//! reproduce the upstream comparison setup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatError};

/// Categorical dimension used to split rankings and series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKey {
    Sex,
    Age,
    Category,
}

impl SegmentKey {
    /// Observation-table column this key segments on.
    pub fn column(self) -> &'static str {
        match self {
            SegmentKey::Sex => crate::schema::SEX,
            SegmentKey::Age => crate::schema::AGE,
            SegmentKey::Category => crate::schema::CATEGORY,
        }
    }
}

/// Rules assigning the chart-facing `region_group` label and harmonizing
/// source naming. Explicit configuration, never derived from row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRules {
    /// Countries promoted to their own region label (e.g. Spain, USA).
    #[serde(default)]
    pub country_overrides: BTreeMap<String, String>,
    /// Continental region relabels (e.g. Americas -> Latam).
    #[serde(default)]
    pub region_renames: BTreeMap<String, String>,
    /// Source country-name harmonization.
    #[serde(default)]
    pub country_renames: BTreeMap<String, String>,
    /// Source category-label harmonization.
    #[serde(default)]
    pub category_renames: BTreeMap<String, String>,
}

impl Default for RegionRules {
    fn default() -> Self {
        let country_overrides = BTreeMap::from([
            ("Spain".to_string(), "Spain".to_string()),
            ("USA".to_string(), "USA".to_string()),
        ]);
        let region_renames = BTreeMap::from([("Americas".to_string(), "Latam".to_string())]);
        let country_renames = BTreeMap::from([
            (
                "United Kingdom (England and Wales)".to_string(),
                "United Kingdom".to_string(),
            ),
            (
                "Venezuela (Bolivarian Republic of)".to_string(),
                "Venezuela".to_string(),
            ),
            ("United States of America".to_string(), "USA".to_string()),
        ]);
        let category_renames = BTreeMap::from([(
            "Socio-political homicide - terrorist offences".to_string(),
            "Terrorist homicide".to_string(),
        )]);
        Self {
            country_overrides,
            region_renames,
            country_renames,
            category_renames,
        }
    }
}

impl RegionRules {
    /// Harmonized country name for a raw source name.
    pub fn rename_country<'a>(&'a self, raw: &'a str) -> &'a str {
        self.country_renames.get(raw).map_or(raw, String::as_str)
    }

    /// Harmonized category label for a raw source label.
    pub fn rename_category<'a>(&'a self, raw: &'a str) -> &'a str {
        self.category_renames.get(raw).map_or(raw, String::as_str)
    }

    /// Region label for a (harmonized) country and its continental region.
    pub fn region_group(&self, country: &str, region: &str) -> String {
        if let Some(label) = self.country_overrides.get(country) {
            return label.clone();
        }
        self.region_renames
            .get(region)
            .cloned()
            .unwrap_or_else(|| region.to_string())
    }
}

/// Top-level analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Countries considered for rankings and series.
    #[serde(default = "default_countries")]
    pub countries: Vec<String>,
    /// Minimum coverage score for a country to enter a ranking or a
    /// regional aggregate, in [0, 1].
    #[serde(default = "default_threshold")]
    pub coverage_threshold: f64,
    /// Region whose observed years anchor the default analysis window.
    #[serde(default = "default_reference_region")]
    pub reference_region: String,
    /// Raw age label -> bucket label. Labels absent from the table are
    /// dropped from the age breakdown.
    #[serde(default = "default_age_buckets")]
    pub age_buckets: BTreeMap<String, String>,
    #[serde(default)]
    pub region_rules: RegionRules,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            coverage_threshold: default_threshold(),
            reference_region: default_reference_region(),
            age_buckets: default_age_buckets(),
            region_rules: RegionRules::default(),
        }
    }
}

impl AnalysisConfig {
    /// Validate value ranges. Called once after loading.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.coverage_threshold) {
            return Err(StatError::InvalidThreshold(self.coverage_threshold));
        }
        if self.countries.is_empty() {
            return Err(StatError::Message("country list is empty".to_string()));
        }
        Ok(())
    }
}

fn default_threshold() -> f64 {
    0.65
}

fn default_reference_region() -> String {
    "Europe".to_string()
}

fn default_age_buckets() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("0-9".to_string(), "0-17".to_string()),
        ("10-14".to_string(), "0-17".to_string()),
        ("15-17".to_string(), "0-17".to_string()),
        ("18-19".to_string(), "18-29".to_string()),
        ("20-24".to_string(), "18-29".to_string()),
        ("25-29".to_string(), "18-29".to_string()),
        ("30-44".to_string(), "30-44".to_string()),
        ("45-59".to_string(), "45-59".to_string()),
        ("60 and older".to_string(), "60+".to_string()),
    ])
}

fn default_countries() -> Vec<String> {
    [
        "Spain",
        "Portugal",
        "France",
        "Italy",
        "Germany",
        "United Kingdom",
        "Sweden",
        "Norway",
        "Denmark",
        "Romania",
        "Greece",
        "Brazil",
        "Mexico",
        "Colombia",
        "Venezuela",
        "Argentina",
        "El Salvador",
        "Chile",
        "Japan",
        "Republic of Korea",
        "Singapore",
        "China",
        "India",
        "Philippines",
        "Indonesia",
        "Thailand",
        "Türkiye",
        "Morocco",
        "Egypt",
        "South Africa",
        "USA",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        config.validate().expect("valid defaults");
        assert!(config.countries.contains(&"Spain".to_string()));
        assert_eq!(config.coverage_threshold, 0.65);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = AnalysisConfig {
            coverage_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StatError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn region_rules_apply_overrides_then_renames() {
        let rules = RegionRules::default();
        assert_eq!(rules.region_group("Spain", "Europe"), "Spain");
        assert_eq!(rules.region_group("Brazil", "Americas"), "Latam");
        assert_eq!(rules.region_group("Japan", "Asia"), "Asia");
        assert_eq!(rules.rename_country("United States of America"), "USA");
        assert_eq!(rules.rename_country("France"), "France");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let round: AnalysisConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(round.countries, config.countries);
        assert_eq!(round.reference_region, config.reference_region);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let round: AnalysisConfig =
            serde_json::from_str(r#"{"coverage_threshold": 0.8}"#).expect("deserialize");
        assert_eq!(round.coverage_threshold, 0.8);
        assert!(!round.countries.is_empty());
    }
}
