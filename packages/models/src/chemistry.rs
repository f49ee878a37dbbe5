//! Groundwater chemistry: sampling sites (`provplatser`) and laboratory
//! analysis results (`analysresultat`).
//!
//! The chemistry collections carry many coded Swedish columns, so these
//! structs use English field names and map each one to its wire key.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_optional;
use crate::{FeatureCollection, TableRecord};

/// Properties of a chemistry sampling site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSiteProperties {
    #[serde(rename = "platsbeteckning")]
    pub station_id: Option<String>,
    #[serde(rename = "provplatsnamn")]
    pub site_name: Option<String>,
    #[serde(rename = "nationellt_provplatsid")]
    pub national_site_id: Option<i64>,
    #[serde(rename = "eucd_stn")]
    pub eu_station_code: Option<String>,
    #[serde(rename = "eucd_gwb")]
    pub eu_groundwater_body: Option<String>,

    #[serde(rename = "provplatstyp")]
    pub site_type_code: Option<String>,
    #[serde(rename = "provplatstyp_tx")]
    pub site_type_description: Option<String>,
    #[serde(rename = "provplatskat_bedgr")]
    pub site_category_code: Option<String>,
    #[serde(rename = "provplatskat_bedgr_tx")]
    pub site_category_description: Option<String>,

    /// Projected north coordinate (SWEREF 99 TM).
    #[serde(rename = "n")]
    pub north_coordinate: Option<f64>,
    /// Projected east coordinate (SWEREF 99 TM).
    #[serde(rename = "e")]
    pub east_coordinate: Option<f64>,
    #[serde(rename = "positioneringsmetod")]
    pub positioning_method_code: Option<String>,
    #[serde(rename = "positioneringsmetod_tx")]
    pub positioning_method_description: Option<String>,
    #[serde(rename = "positionskvalitet")]
    pub position_quality_code: Option<String>,
    #[serde(rename = "positionskvalitet_tx")]
    pub position_quality_description: Option<String>,

    #[serde(rename = "lanskod")]
    pub county_code: Option<String>,
    #[serde(rename = "lan")]
    pub county: Option<String>,
    #[serde(rename = "kommunkod")]
    pub municipality_code: Option<String>,
    #[serde(rename = "kommun")]
    pub municipality: Option<String>,
    #[serde(rename = "region_bdgr")]
    pub region_code: Option<String>,
    #[serde(rename = "region_bdgr_tx")]
    pub region_description: Option<String>,
    #[serde(rename = "vattendistrikt")]
    pub water_district_code: Option<String>,
    #[serde(rename = "vattendistrikt_tx")]
    pub water_district_description: Option<String>,

    #[serde(rename = "refniva")]
    pub reference_level: Option<f64>,
    #[serde(rename = "hojdsystem")]
    pub elevation_system: Option<String>,
    #[serde(rename = "brunnsdjup")]
    pub well_depth: Option<f64>,
    #[serde(rename = "tecken_brunnsdjup")]
    pub well_depth_qualifier: Option<String>,
    #[serde(rename = "filterdjup_fran")]
    pub filter_depth_top: Option<f64>,
    #[serde(rename = "filterdjup_till")]
    pub filter_depth_bottom: Option<f64>,
    #[serde(rename = "tecken_filterdjup")]
    pub filter_depth_qualifier: Option<String>,

    #[serde(rename = "akvifer")]
    pub aquifer_code: Option<String>,
    #[serde(rename = "akvifer_tx")]
    pub aquifer_description: Option<String>,
    #[serde(rename = "genes_jord")]
    pub soil_genesis_code: Option<String>,
    #[serde(rename = "genes_jord_tx")]
    pub soil_genesis_description: Option<String>,
    #[serde(rename = "bergart")]
    pub rock_type_code: Option<String>,
    #[serde(rename = "bergart_tx")]
    pub rock_type_description: Option<String>,

    #[serde(rename = "etabldatum")]
    pub established_date: Option<String>,
    #[serde(rename = "nedlagdatum")]
    pub decommissioned_date: Option<String>,
    #[serde(rename = "antal_prov")]
    pub sample_count: Option<i64>,
    #[serde(rename = "programkoppl")]
    pub program_affiliation: Option<String>,
    /// `"ja"` / `"nej"`.
    #[serde(rename = "nationell")]
    pub national_monitoring: Option<String>,
    #[serde(rename = "regional")]
    pub regional_monitoring: Option<String>,
    #[serde(rename = "lokal")]
    pub local_monitoring: Option<String>,
    #[serde(rename = "symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "analyser_csv")]
    pub analyses_csv_url: Option<String>,
    #[serde(rename = "analyser_json")]
    pub analyses_json_url: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SamplingSiteProperties {
    /// Parsed establishment date.
    #[must_use]
    pub fn established(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.established_date.as_deref())
    }

    /// Parsed decommissioning date.
    #[must_use]
    pub fn decommissioned(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.decommissioned_date.as_deref())
    }
}

impl TableRecord for SamplingSiteProperties {
    fn date_columns(&self) -> Vec<(&'static str, Option<DateTime<Utc>>)> {
        vec![
            ("established_date", self.established()),
            ("decommissioned_date", self.decommissioned()),
        ]
    }
}

/// Properties of one laboratory analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResultProperties {
    #[serde(rename = "platsbeteckning")]
    pub station_id: Option<String>,
    #[serde(rename = "nationellt_provplatsid")]
    pub national_site_id: Option<i64>,
    #[serde(rename = "lan")]
    pub county_code: Option<String>,

    #[serde(rename = "provid")]
    pub sample_id: Option<String>,
    #[serde(rename = "provtyp")]
    pub sample_type: Option<String>,
    #[serde(rename = "inlevid")]
    pub delivery_id: Option<String>,
    #[serde(rename = "programnamn")]
    pub program_name: Option<String>,
    #[serde(rename = "programid")]
    pub program_id: Option<String>,
    #[serde(rename = "overvakningsmanual")]
    pub monitoring_manual: Option<String>,

    #[serde(rename = "provtagningsdat")]
    pub sampling_date: Option<String>,
    #[serde(rename = "inlamningsdat")]
    pub submission_date: Option<String>,

    /// Full parameter name (e.g. `"Klorid"`).
    #[serde(rename = "param")]
    pub parameter_name: Option<String>,
    /// Short parameter code (e.g. `"Cl"`).
    #[serde(rename = "param_kort")]
    pub parameter_short_name: Option<String>,
    #[serde(rename = "paramlopnr")]
    pub parameter_sequence_number: Option<i64>,

    #[serde(rename = "vattenberedn")]
    pub water_preparation: Option<String>,
    #[serde(rename = "provberedn")]
    pub sample_preparation: Option<String>,
    #[serde(rename = "labb")]
    pub laboratory: Option<String>,
    #[serde(rename = "metod")]
    pub method: Option<String>,

    #[serde(rename = "rapporteringsgrans")]
    pub reporting_limit: Option<f64>,
    #[serde(rename = "detektionsgrans")]
    pub detection_limit: Option<f64>,
    /// Qualifier such as `"<"` for values below the reporting limit.
    #[serde(rename = "matvardetalanm")]
    pub measurement_value_annotation: Option<String>,
    #[serde(rename = "matvardetal")]
    pub measurement_value: Option<f64>,
    #[serde(rename = "matvardespar")]
    pub measurement_value_span: Option<String>,
    #[serde(rename = "matvardetext")]
    pub measurement_value_text: Option<String>,
    #[serde(rename = "enhet")]
    pub unit: Option<String>,
    #[serde(rename = "matosakerhet")]
    pub measurement_uncertainty: Option<String>,

    #[serde(rename = "lastupdate")]
    pub last_updated: Option<String>,
    #[serde(rename = "radnummer")]
    pub row_number: Option<i64>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AnalysisResultProperties {
    /// Parsed sampling date.
    #[must_use]
    pub fn sampling_datetime(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.sampling_date.as_deref())
    }

    /// Parsed laboratory submission date.
    #[must_use]
    pub fn submission_datetime(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.submission_date.as_deref())
    }

    /// Parsed last-update timestamp.
    #[must_use]
    pub fn last_updated_datetime(&self) -> Option<DateTime<Utc>> {
        parse_optional(self.last_updated.as_deref())
    }
}

impl TableRecord for AnalysisResultProperties {
    const PRIMARY_DATE: Option<&'static str> = Some("sampling_date");
    const DEFAULT_SERIES: Option<(&'static str, &'static str)> =
        Some(("sampling_date", "matvardetal"));

    fn date_columns(&self) -> Vec<(&'static str, Option<DateTime<Utc>>)> {
        vec![
            ("sampling_date", self.sampling_datetime()),
            ("submission_date", self.submission_datetime()),
            ("last_updated", self.last_updated_datetime()),
        ]
    }
}

/// A collection of sampling sites.
pub type SamplingSiteCollection = FeatureCollection<SamplingSiteProperties>;

/// A collection of analysis results.
pub type AnalysisResultCollection = FeatureCollection<AnalysisResultProperties>;
