//! Modeled groundwater levels from the SGU-HYPE model: model areas
//! (`omraden`) and modeled levels per area and day
//! (`grundvattennivaer-tidigare`).
//!
//! Situation and fill-degree values are percentiles and must lie in
//! `0..=100`; anything else is rejected at parse time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::dates::parse_optional;
use crate::{FeatureCollection, TableRecord};

/// Properties of a modeled groundwater area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaProperties {
    /// Area id.
    pub omrade_id: Option<i64>,
    /// URL of the area's time series.
    pub url_tidsserie: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TableRecord for AreaProperties {}

/// Properties of one modeled level record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelProperties {
    /// Model date (e.g. `"2024-08-01Z"`).
    pub datum: Option<String>,
    /// Area the level belongs to.
    pub omrade_id: Option<i64>,
    /// Object id.
    pub objectid: Option<i64>,
    /// Groundwater situation in small aquifers, percentile.
    #[serde(deserialize_with = "percentile")]
    pub grundvattensituation_sma: Option<f64>,
    /// Groundwater situation in large aquifers, percentile.
    #[serde(deserialize_with = "percentile")]
    pub grundvattensituation_stora: Option<f64>,
    /// Fill degree of small aquifers, percentile.
    #[serde(deserialize_with = "percentile")]
    pub fyllnadsgrad_sma: Option<f64>,
    /// Fill degree of large aquifers, percentile.
    #[serde(deserialize_with = "percentile")]
    pub fyllnadsgrad_stora: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LevelProperties {
    /// Parsed model date.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.datum.as_deref())
    }
}

impl TableRecord for LevelProperties {
    const PRIMARY_DATE: Option<&'static str> = Some("date");
    const DEFAULT_SERIES: Option<(&'static str, &'static str)> =
        Some(("date", "grundvattensituation_sma"));

    fn date_columns(&self) -> Vec<(&'static str, Option<DateTime<Utc>>)> {
        vec![("date", self.date())]
    }
}

/// A collection of modeled areas.
pub type AreaCollection = FeatureCollection<AreaProperties>;

/// A collection of modeled levels.
pub type LevelCollection = FeatureCollection<LevelProperties>;

fn percentile<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(de::Error::custom(format!(
            "percentile {v} is outside 0..=100"
        ))),
        other => Ok(other),
    }
}
