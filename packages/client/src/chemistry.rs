//! Groundwater chemistry: sampling sites and laboratory analysis results.

use groundwater_models::Feature;
use groundwater_models::chemistry::{
    AnalysisResultCollection, AnalysisResultProperties, SamplingSiteCollection,
    SamplingSiteProperties,
};

use crate::ClientError;
use crate::lookup::{Target, exactly_one};
use crate::query::{ItemsQuery, QueryParams, TimeRange, and_all, eq_filter, in_filter};
use crate::request::{RequestExecutor, Service};
use crate::selector::{CODE_FIELD, SiteName, SiteNames};

const SITES: &str = "collections/provplatser/items";
const RESULTS: &str = "collections/analysresultat/items";

/// Site name column.
const NAME_FIELD: &str = "provplatsnamn";

/// Sampling timestamp column.
const TIME_FIELD: &str = "provtagningsdat";

/// Parameter short-name column (e.g. `PH`, `NITRATE`).
const PARAM_FIELD: &str = "param_kort";

/// Endpoints of the `grundvattenkvalitet-analysresultat-provplatser`
/// service.
#[derive(Debug, Clone, Copy)]
pub struct ChemistryClient<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> ChemistryClient<'a> {
    pub(crate) const fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Lists sampling sites.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails or the response cannot
    /// be decoded.
    pub fn sampling_sites(&self, query: &ItemsQuery) -> Result<SamplingSiteCollection, ClientError> {
        self.executor
            .get_collection(Service::Chemistry, SITES, query.to_params())
    }

    /// Fetches one sampling site by feature id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one site comes back.
    pub fn sampling_site(&self, id: &str) -> Result<Feature<SamplingSiteProperties>, ClientError> {
        let collection = self.executor.get_collection(
            Service::Chemistry,
            &format!("{SITES}/{id}"),
            QueryParams::new(),
        )?;
        exactly_one(collection, Target::Id { kind: "Site", id })
    }

    /// Fetches the sampling site with the given code or name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one site matches.
    pub fn sampling_site_by_name(
        &self,
        name: &SiteName,
    ) -> Result<Feature<SamplingSiteProperties>, ClientError> {
        let filter = name.filter(NAME_FIELD);
        let collection = self.sampling_sites(&ItemsQuery::new().with_filter(&filter))?;
        exactly_one(
            collection,
            Target::Filter {
                kind: "sites",
                filter: &filter,
            },
        )
    }

    /// Fetches every sampling site with one of the given codes or names.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] for an empty list, or any
    /// request error.
    pub fn sampling_sites_by_names(
        &self,
        names: &SiteNames,
        query: &ItemsQuery,
    ) -> Result<SamplingSiteCollection, ClientError> {
        let filter = names.filter(NAME_FIELD)?;
        self.sampling_sites(&query.clone().and_filter(&filter))
    }

    /// Lists analysis results.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails or the response cannot
    /// be decoded.
    pub fn analysis_results(
        &self,
        query: &ItemsQuery,
    ) -> Result<AnalysisResultCollection, ClientError> {
        self.executor
            .get_collection(Service::Chemistry, RESULTS, query.to_params())
    }

    /// Fetches one analysis result by feature id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] or [`ClientError::MultipleReturned`]
    /// unless exactly one result comes back.
    pub fn analysis_result(
        &self,
        id: &str,
    ) -> Result<Feature<AnalysisResultProperties>, ClientError> {
        let collection = self.executor.get_collection(
            Service::Chemistry,
            &format!("{RESULTS}/{id}"),
            QueryParams::new(),
        )?;
        exactly_one(collection, Target::Id { kind: "Result", id })
    }

    /// Analysis results of one site, optionally within a sampling-time
    /// range.
    ///
    /// A [`SiteName::Name`] costs an extra request to resolve the site code.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the site lookup or the results request
    /// fails.
    pub fn results_by_site(
        &self,
        site: &SiteName,
        range: &TimeRange,
        limit: Option<u64>,
    ) -> Result<AnalysisResultCollection, ClientError> {
        let code = match site {
            SiteName::Code(code) => code.clone(),
            SiteName::Name(site_name) => {
                log::warn!(
                    "Using '{NAME_FIELD}' requires an additional API request to look up the \
                     site; use the '{CODE_FIELD}' code directly if available"
                );
                self.sampling_site_by_name(site)?
                    .properties
                    .station_id
                    .ok_or_else(|| {
                        ClientError::InvalidArgument(format!(
                            "Site with site_name '{site_name}' has no station_id"
                        ))
                    })?
            }
        };

        let mut filters = vec![eq_filter(CODE_FIELD, &code)];
        filters.extend(range.filters(TIME_FIELD));
        self.analysis_results(&results_query(&filters, limit))
    }

    /// Analysis results of several sites, optionally within a
    /// sampling-time range.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] for an empty list or a
    /// resolved site without a code, [`ClientError::NotFound`] if no site
    /// matches the names, or any request error.
    pub fn results_by_sites(
        &self,
        sites: &SiteNames,
        range: &TimeRange,
        limit: Option<u64>,
    ) -> Result<AnalysisResultCollection, ClientError> {
        let codes = match sites {
            SiteNames::Codes(codes) => codes.clone(),
            SiteNames::Names(_) => {
                log::warn!(
                    "Using '{NAME_FIELD}' requires an additional API request to look up the \
                     sites; use the '{CODE_FIELD}' codes directly if available"
                );
                let found = self.sampling_sites_by_names(sites, &ItemsQuery::new())?;
                if found.is_empty() {
                    return Err(ClientError::NotFound(format!(
                        "No sites found for {}",
                        sites.filter(NAME_FIELD)?
                    )));
                }
                found
                    .into_iter()
                    .map(|site| {
                        site.properties.station_id.ok_or_else(|| {
                            ClientError::InvalidArgument(format!(
                                "Site {} with site_name '{}' has no station_id",
                                site.id,
                                site.properties.site_name.as_deref().unwrap_or_default()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let mut filters = vec![SiteNames::Codes(codes).filter(NAME_FIELD)?];
        filters.extend(range.filters(TIME_FIELD));
        self.analysis_results(&results_query(&filters, limit))
    }

    /// Analysis results for one chemical parameter (by short name, e.g.
    /// `"PH"`), optionally restricted to some site codes and a
    /// sampling-time range. An empty `station_ids` means every site.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if any request fails.
    pub fn results_by_parameter<S: AsRef<str>>(
        &self,
        parameter: &str,
        station_ids: &[S],
        range: &TimeRange,
        limit: Option<u64>,
    ) -> Result<AnalysisResultCollection, ClientError> {
        let mut filters = vec![eq_filter(PARAM_FIELD, parameter)];
        match station_ids {
            [] => {}
            [station_id] => filters.push(eq_filter(CODE_FIELD, station_id.as_ref())),
            _ => filters.push(in_filter(CODE_FIELD, station_ids)),
        }
        filters.extend(range.filters(TIME_FIELD));
        self.analysis_results(&results_query(&filters, limit))
    }
}

fn results_query(filters: &[String], limit: Option<u64>) -> ItemsQuery {
    let query = ItemsQuery::new().with_filter(&and_all(filters));
    match limit {
        Some(limit) => query.with_limit(limit),
        None => query,
    }
}
