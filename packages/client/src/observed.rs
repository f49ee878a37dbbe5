//! Observed groundwater levels: monitoring stations and their level
//! measurements.

use groundwater_models::Feature;
use groundwater_models::observed::{
    MeasurementCollection, MeasurementProperties, StationCollection, StationProperties,
};

use crate::ClientError;
use crate::lookup::{Target, exactly_one};
use crate::query::{ItemsQuery, QueryParams, TimeRange, and_all};
use crate::request::{RequestExecutor, Service};
use crate::selector::{CODE_FIELD, StationName, StationNames};

const STATIONS: &str = "collections/stationer/items";
const MEASUREMENTS: &str = "collections/nivaer/items";

/// Station name column.
const NAME_FIELD: &str = "obsplatsnamn";

/// Measurement timestamp column.
const DATE_FIELD: &str = "obsdatum";

/// Endpoints of the `grundvattennivaer-observerade` service.
#[derive(Debug, Clone, Copy)]
pub struct ObservedLevelsClient<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> ObservedLevelsClient<'a> {
    pub(crate) const fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Lists monitoring stations.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails or the response cannot
    /// be decoded.
    pub fn stations(&self, query: &ItemsQuery) -> Result<StationCollection, ClientError> {
        self.executor
            .get_collection(Service::ObservedLevels, STATIONS, query.to_params())
    }

    /// Fetches one station by feature id (e.g. `"stationer.4086"`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one station comes back.
    pub fn station(&self, id: &str) -> Result<Feature<StationProperties>, ClientError> {
        let collection = self.executor.get_collection(
            Service::ObservedLevels,
            &format!("{STATIONS}/{id}"),
            QueryParams::new(),
        )?;
        exactly_one(collection, Target::Id { kind: "Station", id })
    }

    /// Fetches the station with the given code or name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one station matches.
    pub fn station_by_name(
        &self,
        name: &StationName,
    ) -> Result<Feature<StationProperties>, ClientError> {
        let filter = name.filter(NAME_FIELD);
        let collection = self.stations(&ItemsQuery::new().with_filter(&filter))?;
        exactly_one(
            collection,
            Target::Filter {
                kind: "stations",
                filter: &filter,
            },
        )
    }

    /// Fetches every station with one of the given codes or names.
    ///
    /// Filters in `query` are combined with the name filter.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] for an empty list, or any
    /// request error.
    pub fn stations_by_names(
        &self,
        names: &StationNames,
        query: &ItemsQuery,
    ) -> Result<StationCollection, ClientError> {
        let filter = names.filter(NAME_FIELD)?;
        self.stations(&query.clone().and_filter(&filter))
    }

    /// Lists level measurements.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails or the response cannot
    /// be decoded.
    pub fn measurements(&self, query: &ItemsQuery) -> Result<MeasurementCollection, ClientError> {
        self.executor
            .get_collection(Service::ObservedLevels, MEASUREMENTS, query.to_params())
    }

    /// Fetches one measurement by feature id (e.g. `"nivaer.1"`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one measurement comes back.
    pub fn measurement(&self, id: &str) -> Result<Feature<MeasurementProperties>, ClientError> {
        let collection = self.executor.get_collection(
            Service::ObservedLevels,
            &format!("{MEASUREMENTS}/{id}"),
            QueryParams::new(),
        )?;
        exactly_one(
            collection,
            Target::Id {
                kind: "Measurement",
                id,
            },
        )
    }

    /// Fetches the measurements of one station, optionally within a time
    /// range.
    ///
    /// A [`StationName::Name`] costs an extra request to resolve the
    /// station code first.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the station lookup or the measurement
    /// request fails.
    pub fn measurements_by_name(
        &self,
        name: &StationName,
        range: &TimeRange,
        limit: Option<u64>,
    ) -> Result<MeasurementCollection, ClientError> {
        let code = match name {
            StationName::Code(code) => code.clone(),
            StationName::Name(station_name) => {
                log::warn!(
                    "Looking up measurements by '{NAME_FIELD}' needs an extra request to \
                     resolve the station; pass the '{CODE_FIELD}' code directly when known"
                );
                self.station_by_name(name)?
                    .properties
                    .platsbeteckning
                    .ok_or_else(|| missing_code(station_name))?
            }
        };

        self.measurements(&measurement_query(
            StationName::Code(code).filter(NAME_FIELD),
            range,
            limit,
        ))
    }

    /// Fetches the measurements of several stations, optionally within a
    /// time range.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] for an empty list,
    /// [`ClientError::NotFound`] if no station matches the given names, or
    /// any request error.
    pub fn measurements_by_names(
        &self,
        names: &StationNames,
        range: &TimeRange,
        limit: Option<u64>,
    ) -> Result<MeasurementCollection, ClientError> {
        let codes = match names {
            StationNames::Codes(codes) => codes.clone(),
            StationNames::Names(_) => {
                log::warn!(
                    "Looking up measurements by '{NAME_FIELD}' needs an extra request to \
                     resolve the stations; pass the '{CODE_FIELD}' codes directly when known"
                );
                let stations = self.stations_by_names(names, &ItemsQuery::new())?;
                if stations.is_empty() {
                    return Err(ClientError::NotFound(format!(
                        "No stations found for {}",
                        names.filter(NAME_FIELD)?
                    )));
                }
                stations
                    .into_iter()
                    .map(|station| {
                        let name = station.properties.obsplatsnamn.unwrap_or(station.id);
                        station
                            .properties
                            .platsbeteckning
                            .ok_or_else(|| missing_code(&name))
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        self.measurements(&measurement_query(
            StationNames::Codes(codes).filter(NAME_FIELD)?,
            range,
            limit,
        ))
    }
}

fn measurement_query(station_filter: String, range: &TimeRange, limit: Option<u64>) -> ItemsQuery {
    let mut filters = vec![station_filter];
    filters.extend(range.filters(DATE_FIELD));

    let query = ItemsQuery::new().with_filter(&and_all(&filters));
    match limit {
        Some(limit) => query.with_limit(limit),
        None => query,
    }
}

fn missing_code(station_name: &str) -> ClientError {
    ClientError::InvalidArgument(format!(
        "Station '{station_name}' has no '{CODE_FIELD}' code"
    ))
}
