#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Blocking client for the SGU (Geological Survey of Sweden) groundwater
//! OGC Features APIs.
//!
//! [`GroundwaterClient`] owns one HTTP connection pool and hands out
//! borrowing endpoint clients for the three services:
//!
//! - [`observed`]: monitoring stations and observed levels
//! - [`modeled`]: SGU-HYPE model areas and modeled levels
//! - [`chemistry`]: sampling sites and analysis results
//!
//! Every collection read goes through the [`RequestExecutor`], which maps
//! transport failures and error statuses into [`ClientError`] and, when the
//! server returns only part of a collection, fetches the remaining pages and
//! merges them into one response (see [`pagination`]).
//!
//! The connection pool is released when the client is dropped.

pub mod chemistry;
pub mod config;
pub mod error;
pub mod lookup;
pub mod modeled;
pub mod observed;
pub mod pagination;
pub mod query;
pub mod request;
pub mod retry;
pub mod selector;
pub mod transport;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

pub use chemistry::ChemistryClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, TimeoutPhase};
pub use modeled::ModeledLevelsClient;
pub use observed::ObservedLevelsClient;
pub use pagination::DEFAULT_SAFETY_LIMIT;
pub use query::{Bbox, ItemsQuery, SortBy, SortDirection, TimeBound, TimeRange};
pub use request::{RequestExecutor, Service};
pub use retry::RetryPolicy;
pub use selector::{SiteName, SiteNames, StationName, StationNames};
pub use transport::{ReqwestTransport, Transport};

/// Entry point for all groundwater endpoints.
#[derive(Debug)]
pub struct GroundwaterClient {
    executor: RequestExecutor,
}

impl GroundwaterClient {
    /// Creates a client backed by a pooled HTTP connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the configuration is invalid, or
    /// [`ClientError::Request`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;

        log::debug!(
            "Created groundwater client for {} (timeout {:?}, {} retries)",
            config.base_url(),
            config.timeout(),
            config.max_retries
        );

        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over any [`Transport`], e.g. a recording or
    /// replaying one in tests.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            executor: RequestExecutor::new(transport, config),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// The executor behind the endpoint clients, for raw requests.
    #[must_use]
    pub const fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Observed groundwater levels.
    #[must_use]
    pub const fn observed(&self) -> ObservedLevelsClient<'_> {
        ObservedLevelsClient::new(&self.executor)
    }

    /// Modeled groundwater levels.
    #[must_use]
    pub const fn modeled(&self) -> ModeledLevelsClient<'_> {
        ModeledLevelsClient::new(&self.executor)
    }

    /// Groundwater chemistry.
    #[must_use]
    pub const fn chemistry(&self) -> ChemistryClient<'_> {
        ChemistryClient::new(&self.executor)
    }
}
