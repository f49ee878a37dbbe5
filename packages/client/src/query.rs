//! Query parameters and CQL filter construction.
//!
//! [`ItemsQuery`] holds the logical filters an `items` endpoint accepts and
//! serialises them with [`ItemsQuery::to_params`] into the flat wire form
//! the request executor sends: bounding boxes and sort lists become
//! comma-joined strings, everything else passes through.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Query parameter carrying the page offset.
pub const START_INDEX_PARAM: &str = "startIndex";

/// Query parameter carrying the page size.
pub const LIMIT_PARAM: &str = "limit";

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Sent verbatim.
    Text(String),
    /// An integer.
    Integer(i64),
    /// A floating point number.
    Number(f64),
}

impl QueryValue {
    /// Reads the value as a non-negative integer.
    ///
    /// Numeric text (`"100"`) is accepted as well.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(n) => u64::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Ordered query parameters, as sent on the wire.
pub type QueryParams = BTreeMap<String, QueryValue>;

/// Renders parameters as `(key, value)` string pairs.
#[must_use]
pub fn to_pairs(params: &QueryParams) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

/// A WGS 84 bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bbox {
    #[must_use]
    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// A square box of `buffer` degrees on each side of a point.
    #[must_use]
    pub fn around(lat: f64, lon: f64, buffer: f64) -> Self {
        Self::new(lon - buffer, lat - buffer, lon + buffer, lat + buffer)
    }

    /// Wire form: `min_lon,min_lat,max_lon,max_lat`.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Sort order for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One `sortby` entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            direction: SortDirection::Ascending,
        }
    }

    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            direction: SortDirection::Descending,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.direction {
            SortDirection::Ascending => '+',
            SortDirection::Descending => '-',
        };
        write!(f, "{sign}{}", self.field)
    }
}

impl FromStr for SortBy {
    type Err = String;

    /// Parses `"+field"`, `"-field"` or a bare `"field"` (ascending).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (direction, field) = if let Some(field) = s.strip_prefix('-') {
            (SortDirection::Descending, field)
        } else {
            (
                SortDirection::Ascending,
                s.strip_prefix('+').unwrap_or(s),
            )
        };

        if field.is_empty() {
            return Err(format!("empty sort field in '{s}'"));
        }

        Ok(Self {
            field: field.to_owned(),
            direction,
        })
    }
}

/// Filters accepted by every `collections/{name}/items` endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsQuery {
    /// Spatial filter.
    pub bbox: Option<Bbox>,
    /// Date/time filter: an RFC 3339 instant or an interval.
    pub datetime: Option<String>,
    /// Maximum number of features to fetch in total. Larger results are
    /// paginated transparently.
    pub limit: Option<u64>,
    /// CQL filter expression.
    pub filter: Option<String>,
    /// Sort order.
    pub sortby: Vec<SortBy>,
    /// Extra parameters passed through unchanged.
    pub extra: QueryParams,
}

impl ItemsQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_bbox(mut self, bbox: Bbox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    #[must_use]
    pub fn with_datetime(mut self, datetime: &str) -> Self {
        self.datetime = Some(datetime.to_owned());
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replaces the filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_owned());
        self
    }

    /// Adds a filter expression, `AND`-ed with any existing one.
    #[must_use]
    pub fn and_filter(mut self, filter: &str) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} AND {filter}"),
            _ => filter.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sortby.push(sort);
        self
    }

    /// Adds a raw parameter.
    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.extra.insert(key.to_owned(), value.into());
        self
    }

    /// Serialises the query to wire parameters.
    ///
    /// Unset fields are omitted. Extra parameters do not override the typed
    /// fields.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = self.extra.clone();

        if let Some(bbox) = &self.bbox {
            params.insert("bbox".to_owned(), QueryValue::Text(bbox.to_wire()));
        }
        if let Some(datetime) = &self.datetime {
            params.insert("datetime".to_owned(), QueryValue::Text(datetime.clone()));
        }
        if let Some(limit) = self.limit {
            params.insert(LIMIT_PARAM.to_owned(), QueryValue::from(limit));
        }
        if let Some(filter) = &self.filter {
            params.insert("filter".to_owned(), QueryValue::Text(filter.clone()));
        }
        if !self.sortby.is_empty() {
            let joined = self
                .sortby
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.insert("sortby".to_owned(), QueryValue::Text(joined));
        }

        params
    }
}

/// A bound of a time-range filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeBound {
    /// Inserted into the filter as-is (e.g. `"2020-01-01"`).
    Text(String),
    /// Rendered as `YYYY-MM-DDTHH:MM:SS+00:00`.
    Instant(DateTime<Utc>),
}

impl fmt::Display for TimeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Instant(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S+00:00")),
        }
    }
}

impl From<&str> for TimeBound {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<DateTime<Utc>> for TimeBound {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

/// An optional time window for the `by_name` style lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive lower bound.
    pub tmin: Option<TimeBound>,
    /// Inclusive upper bound.
    pub tmax: Option<TimeBound>,
}

impl TimeRange {
    /// No time restriction.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn between(tmin: impl Into<TimeBound>, tmax: impl Into<TimeBound>) -> Self {
        Self {
            tmin: Some(tmin.into()),
            tmax: Some(tmax.into()),
        }
    }

    #[must_use]
    pub fn since(tmin: impl Into<TimeBound>) -> Self {
        Self {
            tmin: Some(tmin.into()),
            tmax: None,
        }
    }

    #[must_use]
    pub fn until(tmax: impl Into<TimeBound>) -> Self {
        Self {
            tmin: None,
            tmax: Some(tmax.into()),
        }
    }

    /// CQL comparisons on `field` for whichever bounds are set.
    #[must_use]
    pub fn filters(&self, field: &str) -> Vec<String> {
        datetime_filters(field, self.tmin.as_ref(), self.tmax.as_ref())
    }
}

/// Quotes a string literal for CQL, doubling embedded single quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `field='value'`
#[must_use]
pub fn eq_filter(field: &str, value: &str) -> String {
    format!("{field}={}", quote(value))
}

/// `field in ('a', 'b')`
#[must_use]
pub fn in_filter<S: AsRef<str>>(field: &str, values: &[S]) -> String {
    let quoted = values
        .iter()
        .map(|v| quote(v.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{field} in ({quoted})")
}

/// `field = 1`
#[must_use]
pub fn eq_filter_number(field: &str, value: i64) -> String {
    format!("{field} = {value}")
}

/// `field in (1, 2)`
#[must_use]
pub fn in_filter_numbers(field: &str, values: &[i64]) -> String {
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{field} in ({joined})")
}

/// `field >= 'tmin'` and `field <= 'tmax'` for whichever bounds are set.
#[must_use]
pub fn datetime_filters(
    field: &str,
    tmin: Option<&TimeBound>,
    tmax: Option<&TimeBound>,
) -> Vec<String> {
    let mut filters = Vec::new();
    if let Some(tmin) = tmin {
        filters.push(format!("{field} >= '{tmin}'"));
    }
    if let Some(tmax) = tmax {
        filters.push(format!("{field} <= '{tmax}'"));
    }
    filters
}

/// Joins filter expressions with ` AND `.
#[must_use]
pub fn and_all(filters: &[String]) -> String {
    filters.join(" AND ")
}
