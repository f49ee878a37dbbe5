//! Observed groundwater levels: monitoring stations (`stationer`) and
//! level measurements (`nivaer`).
//!
//! These collections are usually queried by station code, so the property
//! structs keep the API's own field names.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_optional;
use crate::{FeatureCollection, TableRecord};

/// Properties of a groundwater monitoring station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationProperties {
    /// Internal row id.
    pub rowid: Option<i64>,
    /// Station code (e.g. `"95_2"`).
    pub platsbeteckning: Option<String>,
    /// Observation site name (e.g. `"Lagga_2"`).
    pub obsplatsnamn: Option<String>,
    /// Municipality.
    pub kommun: Option<String>,
    /// County.
    pub lan: Option<String>,
    /// Province.
    pub landskap: Option<String>,
    /// Aquifer type description.
    pub akvifer_tx: Option<String>,
    /// Well depth in metres.
    pub djup_m: Option<f64>,
    /// Top of pipe, metres above sea level.
    pub roropp_m_o_h: Option<f64>,
    /// Bottom of pipe, metres above sea level.
    pub rorbotten_m_o_h: Option<f64>,
    /// Ground surface, metres above sea level.
    pub markyta_m_o_h: Option<f64>,
    /// Station status (e.g. `"aktiv"`).
    pub status: Option<String>,
    /// Installation date.
    pub installerad: Option<String>,
    /// Decommissioning date.
    pub avslutad: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StationProperties {
    /// Parsed installation date.
    #[must_use]
    pub fn installation_date(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.installerad.as_deref())
    }

    /// Parsed decommissioning date.
    #[must_use]
    pub fn closure_date(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.avslutad.as_deref())
    }
}

impl TableRecord for StationProperties {
    fn date_columns(&self) -> Vec<(&'static str, Option<DateTime<Utc>>)> {
        vec![
            ("installation_date", self.installation_date()),
            ("closure_date", self.closure_date()),
        ]
    }
}

/// Properties of a single groundwater level measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementProperties {
    /// Code of the station the measurement belongs to.
    pub platsbeteckning: Option<String>,
    /// Observation timestamp as sent by the API.
    pub obsdatum: Option<String>,
    /// Groundwater level, metres above sea level.
    pub grundvattenniva_m_o_h: Option<f64>,
    /// Groundwater level, metres below the pipe top.
    pub grundvattenniva_m_urok: Option<f64>,
    /// Measurement method.
    pub metod_for_matning: Option<String>,
    /// Measurement equipment.
    pub matutrustning: Option<String>,
    /// Free-text comment.
    pub kommentar: Option<String>,
    /// Review status (e.g. `"godkänd"`).
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MeasurementProperties {
    /// Parsed observation timestamp.
    #[must_use]
    pub fn observation_date(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.obsdatum.as_deref())
    }
}

impl TableRecord for MeasurementProperties {
    const PRIMARY_DATE: Option<&'static str> = Some("observation_date");
    const DEFAULT_SERIES: Option<(&'static str, &'static str)> =
        Some(("observation_date", "grundvattenniva_m_o_h"));

    fn date_columns(&self) -> Vec<(&'static str, Option<DateTime<Utc>>)> {
        vec![("observation_date", self.observation_date())]
    }
}

/// A collection of monitoring stations.
pub type StationCollection = FeatureCollection<StationProperties>;

/// A collection of level measurements.
pub type MeasurementCollection = FeatureCollection<MeasurementProperties>;
