//! Modeled groundwater levels from the SGU-HYPE model: model areas and the
//! per-area level percentiles.

use groundwater_models::Feature;
use groundwater_models::modeled::{AreaCollection, AreaProperties, LevelCollection, LevelProperties};

use crate::ClientError;
use crate::lookup::{Target, exactly_one};
use crate::query::{Bbox, ItemsQuery, QueryParams, eq_filter_number, in_filter_numbers};
use crate::request::{RequestExecutor, Service};

const AREAS: &str = "collections/omraden/items";
const LEVELS: &str = "collections/grundvattennivaer-tidigare/items";

/// Area id column on level records.
const AREA_FIELD: &str = "omrade_id";

/// Half-width in degrees of the box searched by
/// [`ModeledLevelsClient::levels_by_coords`].
pub const DEFAULT_COORDS_BUFFER: f64 = 0.01;

/// Endpoints of the `grundvattennivaer-sgu-hype-omraden` service.
#[derive(Debug, Clone, Copy)]
pub struct ModeledLevelsClient<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> ModeledLevelsClient<'a> {
    pub(crate) const fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Lists model areas.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails or the response cannot
    /// be decoded.
    pub fn areas(&self, query: &ItemsQuery) -> Result<AreaCollection, ClientError> {
        self.executor
            .get_collection(Service::ModeledLevels, AREAS, query.to_params())
    }

    /// Fetches one model area by feature id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one area comes back.
    pub fn area(&self, id: &str) -> Result<Feature<AreaProperties>, ClientError> {
        let collection = self.executor.get_collection(
            Service::ModeledLevels,
            &format!("{AREAS}/{id}"),
            QueryParams::new(),
        )?;
        exactly_one(collection, Target::Id { kind: "Area", id })
    }

    /// Lists modeled level records.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails or the response cannot
    /// be decoded.
    pub fn levels(&self, query: &ItemsQuery) -> Result<LevelCollection, ClientError> {
        self.executor
            .get_collection(Service::ModeledLevels, LEVELS, query.to_params())
    }

    /// Fetches one modeled level record by feature id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one record comes back.
    pub fn level(&self, id: &str) -> Result<Feature<LevelProperties>, ClientError> {
        let collection = self.executor.get_collection(
            Service::ModeledLevels,
            &format!("{LEVELS}/{id}"),
            QueryParams::new(),
        )?;
        exactly_one(collection, Target::Id { kind: "Level", id })
    }

    /// Level records for one model area.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails.
    pub fn levels_by_area(
        &self,
        area_id: i64,
        query: &ItemsQuery,
    ) -> Result<LevelCollection, ClientError> {
        self.levels(
            &query
                .clone()
                .and_filter(&eq_filter_number(AREA_FIELD, area_id)),
        )
    }

    /// Level records for several model areas.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] if `area_ids` is empty, or
    /// any request error.
    pub fn levels_by_areas(
        &self,
        area_ids: &[i64],
        query: &ItemsQuery,
    ) -> Result<LevelCollection, ClientError> {
        match area_ids {
            [] => Err(ClientError::InvalidArgument(
                "At least one area ID must be provided".to_owned(),
            )),
            [area_id] => self.levels_by_area(*area_id, query),
            _ => self.levels(
                &query
                    .clone()
                    .and_filter(&in_filter_numbers(AREA_FIELD, area_ids)),
            ),
        }
    }

    /// Level records for the model areas around a point.
    ///
    /// Areas are found with a bounding box `buffer` degrees (default
    /// [`DEFAULT_COORDS_BUFFER`]) around the point; levels of every area
    /// in the box are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if no area intersects the box, or
    /// any request error.
    pub fn levels_by_coords(
        &self,
        lat: f64,
        lon: f64,
        buffer: Option<f64>,
        query: &ItemsQuery,
    ) -> Result<LevelCollection, ClientError> {
        let buffer = buffer.unwrap_or(DEFAULT_COORDS_BUFFER);
        let areas = self.areas(&ItemsQuery::new().with_bbox(Bbox::around(lat, lon, buffer)))?;

        let area_ids: Vec<i64> = areas
            .iter()
            .filter_map(|area| area.properties.omrade_id)
            .collect();

        if area_ids.is_empty() {
            return Err(ClientError::NotFound(format!(
                "No modeled groundwater areas found near coordinates ({lat}, {lon})"
            )));
        }
        if area_ids.len() > 1 {
            log::warn!(
                "Found {} areas near coordinates ({lat}, {lon}); returning levels for all of them",
                area_ids.len()
            );
        }

        self.levels_by_areas(&area_ids, query)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::GroundwaterClient;
    use crate::config::ClientConfig;
    use crate::query::QueryValue;
    use crate::test_support::{ScriptedTransport, collection, feature};

    fn client(transport: &Arc<ScriptedTransport>) -> GroundwaterClient {
        GroundwaterClient::with_transport(ClientConfig::default(), transport.clone())
    }

    fn area(id: i64) -> serde_json::Value {
        feature(&format!("omraden.{id}"), json!({"omrade_id": id}))
    }

    fn level(area_id: i64) -> serde_json::Value {
        feature(
            "grundvattennivaer-tidigare.1",
            json!({
                "datum": "2024-01-15T00:00:00Z",
                "omrade_id": area_id,
                "grundvattensituation_sma": 45.5,
                "grundvattensituation_stora": 60.0,
            }),
        )
    }

    #[test]
    fn level_by_id() {
        let transport = Arc::new(ScriptedTransport::new().json(200, level(30125)));

        let level = client(&transport)
            .modeled()
            .level("grundvattennivaer-tidigare.1")
            .unwrap();

        assert_eq!(level.properties.omrade_id, Some(30125));
        assert!(
            transport.requests()[0]
                .url
                .contains("/grundvattennivaer-sgu-hype-omraden/ogc/features/v1/")
        );
    }

    #[test]
    fn missing_area_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new().json(200, collection(vec![])));

        let err = client(&transport).modeled().area("omraden.1").unwrap_err();

        assert_eq!(err.to_string(), "Area omraden.1 not found");
    }

    #[test]
    fn levels_by_area_filters_on_area_id() {
        let transport =
            Arc::new(ScriptedTransport::new().json(200, collection(vec![level(30125)])));

        let levels = client(&transport)
            .modeled()
            .levels_by_area(30125, &ItemsQuery::new().with_limit(10))
            .unwrap();

        assert_eq!(levels.len(), 1);
        assert_eq!(transport.filter(0), "omrade_id = 30125");
        assert_eq!(transport.requests()[0].params["limit"], QueryValue::Integer(10));
    }

    #[test]
    fn levels_by_areas_uses_in_filter() {
        let transport = Arc::new(ScriptedTransport::new().json(200, collection(vec![])));

        client(&transport)
            .modeled()
            .levels_by_areas(&[1, 2, 3], &ItemsQuery::new())
            .unwrap();

        assert_eq!(transport.filter(0), "omrade_id in (1, 2, 3)");
    }

    #[test]
    fn levels_by_areas_rejects_empty_list() {
        let transport = Arc::new(ScriptedTransport::new());

        let err = client(&transport)
            .modeled()
            .levels_by_areas(&[], &ItemsQuery::new())
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid argument: At least one area ID must be provided");
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn levels_by_coords_searches_areas_then_levels() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .json(200, collection(vec![area(30125)]))
                .json(200, collection(vec![level(30125)])),
        );

        let levels = client(&transport)
            .modeled()
            .levels_by_coords(57.5, 16.0, None, &ItemsQuery::new())
            .unwrap();

        assert_eq!(levels.len(), 1);
        let requests = transport.requests();
        assert!(requests[0].url.ends_with("collections/omraden/items"));
        assert_eq!(
            requests[0].params["bbox"],
            QueryValue::from(Bbox::around(57.5, 16.0, DEFAULT_COORDS_BUFFER).to_wire())
        );
        assert_eq!(transport.filter(1), "omrade_id = 30125");
    }

    #[test]
    fn levels_by_coords_covers_every_area() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .json(200, collection(vec![area(1), area(2)]))
                .json(200, collection(vec![])),
        );

        client(&transport)
            .modeled()
            .levels_by_coords(57.5, 16.0, Some(0.5), &ItemsQuery::new())
            .unwrap();

        assert_eq!(transport.filter(1), "omrade_id in (1, 2)");
    }

    #[test]
    fn levels_by_coords_without_areas_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new().json(200, collection(vec![])));

        let err = client(&transport)
            .modeled()
            .levels_by_coords(0.0, 0.0, None, &ItemsQuery::new())
            .unwrap_err();

        assert!(matches!(err, ClientError::NotFound(_)));
        assert!(
            err.to_string()
                .contains("No modeled groundwater areas found near coordinates")
        );
    }
}
