//! Tabular and time-series views over typed feature collections.
//!
//! A [`Table`] has one row per feature. The leading columns are always
//! `id`, `geometry_type`, `longitude` and `latitude`, followed by the parsed
//! date columns each record type declares, followed by every property under
//! its wire (API) name. Rows that lack a column hold `null`.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::FeatureCollection;
use crate::dates::parse_api_datetime;

const BASE_COLUMNS: &[&str] = &["id", "geometry_type", "longitude", "latitude"];

/// Errors raised when reading columns out of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The requested column does not exist.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// The record type has no default series definition.
    #[error("No default series is defined for this collection")]
    NoDefaultSeries,
}

/// Property types that can be flattened into a [`Table`].
pub trait TableRecord: Serialize {
    /// Column used to order rows chronologically, if any.
    const PRIMARY_DATE: Option<&'static str> = None;

    /// Default `(index, data)` columns for [`FeatureCollection::to_series`].
    const DEFAULT_SERIES: Option<(&'static str, &'static str)> = None;

    /// Parsed date columns added in front of the raw properties.
    fn date_columns(&self) -> Vec<(&'static str, Option<DateTime<Utc>>)> {
        Vec::new()
    }
}

/// Rows and columns flattened from a feature collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column names in display order.
    pub columns: Vec<String>,
    /// One row per feature, aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Flattens a typed collection into a table.
    #[must_use]
    pub fn from_collection<P: TableRecord>(collection: &FeatureCollection<P>) -> Self {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
        let mut positions: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let mut records: Vec<Vec<(String, Value)>> = Vec::with_capacity(collection.len());

        for feature in collection {
            let point = feature.point();
            let mut cells: Vec<(String, Value)> = vec![
                ("id".to_owned(), Value::String(feature.id.clone())),
                (
                    "geometry_type".to_owned(),
                    feature
                        .geometry_type()
                        .map_or(Value::Null, |t| Value::String(t.to_owned())),
                ),
                (
                    "longitude".to_owned(),
                    point.map_or(Value::Null, |(lon, _)| Value::from(lon)),
                ),
                (
                    "latitude".to_owned(),
                    point.map_or(Value::Null, |(_, lat)| Value::from(lat)),
                ),
            ];

            for (name, date) in feature.properties.date_columns() {
                cells.push((
                    name.to_owned(),
                    date.map_or(Value::Null, |d| Value::String(d.to_rfc3339())),
                ));
            }

            if let Ok(Value::Object(properties)) = serde_json::to_value(&feature.properties) {
                for (key, value) in properties {
                    if !cells.iter().any(|(name, _)| *name == key) {
                        cells.push((key, value));
                    }
                }
            }

            for (name, _) in &cells {
                if !positions.contains_key(name) {
                    positions.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
            records.push(cells);
        }

        let rows = records
            .into_iter()
            .map(|cells| {
                let mut row = vec![Value::Null; columns.len()];
                for (name, value) in cells {
                    row[positions[&name]] = value;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of a column.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] if no such column exists.
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_owned()))
    }

    /// Returns every value of a column, top to bottom.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] if no such column exists.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Sorts rows ascending by a column. Nulls sort last.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] if no such column exists.
    pub fn sort_by_column(&mut self, name: &str) -> Result<(), TableError> {
        let idx = self.column_index(name)?;
        self.sort_rows(idx);
        Ok(())
    }

    fn sort_rows(&mut self, idx: usize) {
        self.rows.sort_by(|a, b| compare_values(&a[idx], &b[idx]));
    }

    /// Extracts a numeric series indexed by another column.
    ///
    /// Values that are neither numbers nor numeric strings become `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownColumn`] if either column is missing.
    pub fn series(&self, index: &str, data: &str) -> Result<Series, TableError> {
        let index_idx = self.column_index(index)?;
        let data_idx = self.column_index(data)?;

        Ok(Series {
            index_name: index.to_owned(),
            name: data.to_owned(),
            index: self.rows.iter().map(|row| row[index_idx].clone()).collect(),
            values: self.rows.iter().map(|row| as_f64(&row[data_idx])).collect(),
        })
    }

    /// Writes the table as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`csv::Error`] if writing fails.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(cell_text))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// A numeric series extracted from a [`Table`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    /// Name of the index column.
    pub index_name: String,
    /// Name of the data column.
    pub name: String,
    /// Index values, one per row.
    pub index: Vec<Value>,
    /// Data values, one per row.
    pub values: Vec<Option<f64>>,
}

impl Series {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, Option<f64>)> {
        self.index.iter().zip(self.values.iter().copied())
    }

    /// Returns the points whose index parses as a date and whose value is
    /// present.
    #[must_use]
    pub fn time_points(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.iter()
            .filter_map(|(idx, value)| {
                let at = idx.as_str().and_then(parse_api_datetime)?;
                Some((at, value?))
            })
            .collect()
    }
}

impl<P: TableRecord> FeatureCollection<P> {
    /// Flattens the collection into a [`Table`] in response order.
    #[must_use]
    pub fn to_table(&self) -> Table {
        Table::from_collection(self)
    }

    /// Flattens the collection and orders rows by the record's primary
    /// date column, when it has one.
    #[must_use]
    pub fn to_sorted_table(&self) -> Table {
        let mut table = self.to_table();
        if let Some(idx) = P::PRIMARY_DATE.and_then(|column| table.column_index(column).ok()) {
            table.sort_rows(idx);
        }
        table
    }

    /// Extracts the record type's default series, sorted by date.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NoDefaultSeries`] if the record type does not
    /// define one.
    pub fn to_series(&self) -> Result<Series, TableError> {
        let (index, data) = P::DEFAULT_SERIES.ok_or(TableError::NoDefaultSeries)?;
        self.to_sorted_table().series(index, data)
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::observed::MeasurementProperties;

    fn measurements() -> FeatureCollection<MeasurementProperties> {
        let feature = |id: &str, date: &str, level: f64| {
            json!({
                "type": "Feature",
                "id": id,
                "geometry": {"type": "Point", "coordinates": [16.1, 58.7]},
                "properties": {
                    "platsbeteckning": "95_2",
                    "obsdatum": date,
                    "grundvattenniva_m_o_h": level,
                },
            })
        };
        FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                feature("nivaer.2", "2023-02-01T00:00:00Z", 2.55),
                feature("nivaer.1", "2023-01-01T00:00:00Z", 2.45),
            ],
            "numberMatched": 2,
            "numberReturned": 2,
        }))
        .unwrap()
    }

    #[test]
    fn flattens_geometry_and_properties() {
        let table = measurements().to_table();

        assert_eq!(&table.columns[..4], BASE_COLUMNS);
        assert!(table.columns.iter().any(|c| c == "observation_date"));
        assert!(table.columns.iter().any(|c| c == "platsbeteckning"));
        assert!(table.columns.iter().any(|c| c == "grundvattenniva_m_o_h"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("longitude").unwrap()[0], &json!(16.1));
        assert_eq!(table.column("geometry_type").unwrap()[0], &json!("Point"));
    }

    #[test]
    fn sorted_table_orders_by_primary_date() {
        let table = measurements().to_sorted_table();
        let ids: Vec<&Value> = table.column("id").unwrap();
        assert_eq!(ids, vec![&json!("nivaer.1"), &json!("nivaer.2")]);
    }

    #[test]
    fn default_series_uses_date_index() {
        let series = measurements().to_series().unwrap();

        assert_eq!(series.index_name, "observation_date");
        assert_eq!(series.name, "grundvattenniva_m_o_h");
        assert_eq!(series.values, vec![Some(2.45), Some(2.55)]);
        assert_eq!(series.time_points().len(), 2);
    }

    #[test]
    fn series_rejects_unknown_columns() {
        let table = measurements().to_table();

        assert_eq!(
            table.series("invalid_column", "grundvattenniva_m_o_h"),
            Err(TableError::UnknownColumn("invalid_column".to_owned()))
        );
        assert_eq!(
            table.series("id", "invalid_column"),
            Err(TableError::UnknownColumn("invalid_column".to_owned()))
        );
    }

    #[test]
    fn writes_csv_with_header() {
        let table = measurements().to_sorted_table();
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("id,geometry_type,longitude,latitude"));
        assert!(lines.next().unwrap().starts_with("nivaer.1,Point,16.1,58.7"));
    }

    #[test]
    fn empty_collection_yields_header_only_table() {
        let empty: FeatureCollection<MeasurementProperties> =
            FeatureCollection::from_value(json!({"type": "FeatureCollection", "features": []}))
                .unwrap();

        let table = empty.to_table();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), BASE_COLUMNS.len());

        let sorted = empty.to_sorted_table();
        assert!(sorted.is_empty());
        assert_eq!(sorted, table);
    }
}
