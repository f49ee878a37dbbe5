#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed records for the SGU (Geological Survey of Sweden) groundwater
//! OGC Features APIs.
//!
//! Every collection endpoint returns a GeoJSON `FeatureCollection`. This
//! crate provides the generic envelope ([`FeatureCollection`] /
//! [`Feature`]) plus one property struct per collection:
//!
//! - [`observed`]: monitoring stations and their level measurements
//! - [`modeled`]: modeled areas and modeled groundwater levels
//! - [`chemistry`]: water-chemistry sampling sites and analysis results
//!
//! The API uses Swedish field names on the wire. The level collections keep
//! them as-is; the chemistry structs expose English names and map them with
//! `#[serde(rename)]`. Fields the API adds later are kept in flattened
//! `extra` maps instead of being dropped.
//!
//! [`table`] flattens any typed collection into rows and columns for CSV
//! export or time-series extraction.

pub mod chemistry;
pub mod dates;
pub mod modeled;
pub mod observed;
pub mod table;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

pub use table::{Series, Table, TableError, TableRecord};

/// The `type` value of a GeoJSON feature collection envelope.
pub const FEATURE_COLLECTION_TYPE: &str = "FeatureCollection";

/// The `type` value of a single GeoJSON feature.
pub const FEATURE_TYPE: &str = "Feature";

/// A feature count reported by the server (`numberMatched`,
/// `totalFeatures`).
///
/// Some collections report `"unknown"` instead of a number when the server
/// does not compute the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureCount {
    /// An exact count.
    Exact(u64),
    /// A non-numeric sentinel such as `"unknown"`.
    Unknown(String),
}

impl FeatureCount {
    /// Returns the count if the server reported a number.
    #[must_use]
    pub const fn exact(&self) -> Option<u64> {
        match self {
            Self::Exact(count) => Some(*count),
            Self::Unknown(_) => None,
        }
    }
}

/// A link in a GeoJSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link URL.
    pub href: String,
    /// Link relation (e.g. `"self"`, `"next"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// Link media type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Link title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Coordinate reference system attached to a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    /// CRS type (usually `"name"`).
    #[serde(rename = "type")]
    pub crs_type: String,
    /// CRS properties (e.g. `{"name": "EPSG:4326"}`).
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// A single GeoJSON feature with typed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P> {
    /// Always `"Feature"`.
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    /// Feature identifier (e.g. `"stationer.4086"`).
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Feature geometry, if any.
    #[serde(default)]
    pub geometry: Option<geojson::Geometry>,
    /// Typed feature properties.
    pub properties: P,
    /// Links attached to the feature.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Any other members the API includes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl<P> Feature<P> {
    /// Returns the `[longitude, latitude]` of a point geometry.
    #[must_use]
    pub fn point(&self) -> Option<(f64, f64)> {
        match &self.geometry.as_ref()?.value {
            geojson::Value::Point(position) if position.len() >= 2 => {
                Some((position[0], position[1]))
            }
            _ => None,
        }
    }

    /// Returns the GeoJSON geometry type name (e.g. `"Point"`).
    #[must_use]
    pub fn geometry_type(&self) -> Option<&'static str> {
        self.geometry.as_ref().map(|g| match g.value {
            geojson::Value::Point(_) => "Point",
            geojson::Value::MultiPoint(_) => "MultiPoint",
            geojson::Value::LineString(_) => "LineString",
            geojson::Value::MultiLineString(_) => "MultiLineString",
            geojson::Value::Polygon(_) => "Polygon",
            geojson::Value::MultiPolygon(_) => "MultiPolygon",
            geojson::Value::GeometryCollection(_) => "GeometryCollection",
        })
    }
}

/// A GeoJSON feature collection envelope with typed features.
///
/// `number_matched` is the server-side total for the query and
/// `number_returned` the count actually present in `features`. After an
/// automatically paginated fetch `number_returned` covers all merged pages
/// while `number_matched` still carries the first page's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCollection<P> {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    /// The features in response order.
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
    /// Number of features matching the query on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<FeatureCount>,
    /// Number of features in `features`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<u64>,
    /// Legacy total reported by some collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_features: Option<FeatureCount>,
    /// Server timestamp of the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<String>,
    /// Related links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Coordinate reference system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Crs>,
    /// Any other members the API includes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl<P: DeserializeOwned> FeatureCollection<P> {
    /// Parses a decoded JSON response into a typed collection.
    ///
    /// A bare `Feature` object (as returned by some `items/{id}`
    /// endpoints) is accepted and wrapped into a one-element collection.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the JSON does not match the
    /// expected shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.get("type").and_then(serde_json::Value::as_str) == Some(FEATURE_TYPE) {
            let feature: Feature<P> = serde_json::from_value(value)?;
            return Ok(Self::single(feature));
        }
        serde_json::from_value(value)
    }
}

impl<P> FeatureCollection<P> {
    /// Wraps one feature into a collection.
    #[must_use]
    pub fn single(feature: Feature<P>) -> Self {
        Self {
            kind: feature_collection_type(),
            features: vec![feature],
            number_matched: Some(FeatureCount::Exact(1)),
            number_returned: Some(1),
            total_features: None,
            time_stamp: None,
            links: Vec::new(),
            crs: None,
            extra: BTreeMap::new(),
        }
    }

    /// Number of features in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the collection holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterates over the features.
    pub fn iter(&self) -> std::slice::Iter<'_, Feature<P>> {
        self.features.iter()
    }
}

impl<'a, P> IntoIterator for &'a FeatureCollection<P> {
    type Item = &'a Feature<P>;
    type IntoIter = std::slice::Iter<'a, Feature<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl<P> IntoIterator for FeatureCollection<P> {
    type Item = Feature<P>;
    type IntoIter = std::vec::IntoIter<Feature<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

fn feature_type() -> String {
    FEATURE_TYPE.to_owned()
}

fn feature_collection_type() -> String {
    FEATURE_COLLECTION_TYPE.to_owned()
}

/// Accepts feature ids encoded as either strings or numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::observed::StationProperties;

    fn station_feature(id: &str) -> serde_json::Value {
        json!({
            "type": "Feature",
            "id": id,
            "geometry": {"type": "Point", "coordinates": [16.123456, 58.789012]},
            "properties": {"platsbeteckning": "95_2", "obsplatsnamn": "Lagga_2"},
        })
    }

    #[test]
    fn parses_collection_envelope() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [station_feature("stationer.4086")],
            "numberMatched": 1,
            "numberReturned": 1,
            "timeStamp": "2024-09-21T10:30:00Z",
            "links": [{"href": "https://example.com", "rel": "self"}],
            "crs": {"type": "name", "properties": {"name": "EPSG:4326"}},
        });

        let collection = FeatureCollection::<StationProperties>::from_value(value).unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.number_matched, Some(FeatureCount::Exact(1)));
        assert_eq!(collection.time_stamp.as_deref(), Some("2024-09-21T10:30:00Z"));
        assert_eq!(collection.links[0].rel.as_deref(), Some("self"));
        assert_eq!(collection.crs.unwrap().crs_type, "name");
        assert_eq!(collection.features[0].point(), Some((16.123_456, 58.789_012)));
        assert_eq!(collection.features[0].geometry_type(), Some("Point"));
    }

    #[test]
    fn parses_unknown_number_matched() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [],
            "numberMatched": "unknown",
            "numberReturned": 0,
        });

        let collection = FeatureCollection::<StationProperties>::from_value(value).unwrap();

        assert_eq!(
            collection.number_matched,
            Some(FeatureCount::Unknown("unknown".to_owned()))
        );
        assert_eq!(collection.number_matched.unwrap().exact(), None);
    }

    #[test]
    fn wraps_bare_feature_into_collection() {
        let collection =
            FeatureCollection::<StationProperties>::from_value(station_feature("stationer.1"))
                .unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.features[0].id, "stationer.1");
    }

    #[test]
    fn accepts_numeric_feature_ids() {
        let mut feature = station_feature("x");
        feature["id"] = json!(42);

        let collection = FeatureCollection::<StationProperties>::from_value(feature).unwrap();

        assert_eq!(collection.features[0].id, "42");
    }

    #[test]
    fn keeps_unknown_envelope_members() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [],
            "someNewField": {"a": 1},
        });

        let collection = FeatureCollection::<StationProperties>::from_value(value).unwrap();

        assert_eq!(collection.extra.get("someNewField"), Some(&json!({"a": 1})));
    }
}
