//! Validated country -> region lookup.
//!
//! Built once from the observation table. The source data is supposed to
//! assign every country a single `region_group`; a country appearing with
//! two different labels is a data defect and fails construction instead
//! of letting row order decide.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::DataFrame;
use tracing::debug;

use homstat_model::StatError;
use homstat_model::schema::{COUNTRY, REGION_GROUP};

use crate::frame::str_at;

#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    map: BTreeMap<String, String>,
}

impl RegionMap {
    /// Derive the lookup from the `Country` / `region_group` columns.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for idx in 0..df.height() {
            let country = str_at(df, COUNTRY, idx);
            let region = str_at(df, REGION_GROUP, idx);
            if country.is_empty() || region.is_empty() {
                continue;
            }
            match map.get(&country) {
                Some(existing) if existing != &region => {
                    return Err(StatError::RegionConflict {
                        country,
                        first: existing.clone(),
                        second: region,
                    }
                    .into());
                }
                Some(_) => {}
                None => {
                    map.insert(country, region);
                }
            }
        }
        debug!(countries = map.len(), "region map built");
        Ok(Self { map })
    }

    pub fn get(&self, country: &str) -> Option<&str> {
        self.map.get(country).map(String::as_str)
    }

    /// Region label for a country, erroring when the table never mapped it.
    pub fn require(&self, country: &str) -> Result<&str> {
        self.get(country)
            .ok_or_else(|| StatError::UnknownRegion(country.to_string()).into())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map
            .iter()
            .map(|(country, region)| (country.as_str(), region.as_str()))
    }
}
