//! The request executor: one HTTP round trip with normalised errors, plus
//! the typed collection fetch that drives pagination.

use std::fmt;
use std::sync::Arc;

use groundwater_models::FeatureCollection;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::ClientError;
use crate::config::ClientConfig;
use crate::pagination;
use crate::query::QueryParams;
use crate::transport::{HttpRequest, RawResponse, Transport};

/// The SGU open-data services this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
pub enum Service {
    /// Observed groundwater levels.
    #[strum(serialize = "grundvattennivaer-observerade")]
    ObservedLevels,
    /// SGU-HYPE modeled groundwater levels.
    #[strum(serialize = "grundvattennivaer-sgu-hype-omraden")]
    ModeledLevels,
    /// Groundwater chemistry.
    #[strum(serialize = "grundvattenkvalitet-analysresultat-provplatser")]
    Chemistry,
}

/// Issues requests through a [`Transport`] and maps every failure into
/// [`ClientError`].
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL of a path under a service's OGC Features root, e.g.
    /// `{base}/grundvattennivaer-observerade/ogc/features/v1/collections/stationer/items`.
    #[must_use]
    pub fn url(&self, service: Service, path: &str) -> String {
        format!(
            "{}/{service}/ogc/features/v1/{}",
            self.config.base_url(),
            path.trim_start_matches('/')
        )
    }

    /// Sends a request and returns the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns a normalised [`ClientError`] if no response was received.
    pub fn send(&self, request: &HttpRequest) -> Result<RawResponse, ClientError> {
        if self.config.debug {
            log::debug!("Making {} request to {}", request.method, request.url);
            if !request.params.is_empty() {
                log::debug!("Query params: {:?}", request.params);
            }
            if let Some(body) = &request.body {
                log::debug!("Request data: {body}");
            }
        }

        let response = self
            .transport
            .send(request)
            .map_err(|failure| {
                ClientError::from_transport(failure, &request.url, self.config.timeout())
            })?;

        if self.config.debug {
            log::debug!("Response status: {}", response.status);
        }

        Ok(response)
    }

    /// Sends a request and decodes a successful JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] for non-2xx statuses and for bodies
    /// that are not JSON, or any transport error from [`Self::send`].
    pub fn execute(&self, request: &HttpRequest) -> Result<Value, ClientError> {
        let response = self.send(request)?;

        if !response.is_success() {
            let message = format!("HTTP {} error for {}", response.status, response.url);
            return Err(ClientError::from_response(&response, message));
        }

        response.json().map_err(|e| {
            let message = format!(
                "Invalid JSON in response from {} (status {}): {e}",
                response.url, response.status
            );
            ClientError::from_response(&response, message)
        })
    }

    /// Executes a request and, for reads that return a partial feature
    /// collection, fetches and merges the remaining pages.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any page; partial results are
    /// discarded.
    pub fn fetch(&self, request: &HttpRequest) -> Result<Value, ClientError> {
        let first = self.execute(request)?;
        if request.method.is_read() {
            pagination::paginate(self, request, first)
        } else {
            Ok(first)
        }
    }

    /// `GET`s `path` under `service` and parses the merged response into a
    /// typed collection.
    ///
    /// # Errors
    ///
    /// Returns any request error, or [`ClientError::Decode`] if the
    /// response does not match `P`.
    pub fn get_collection<P: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        params: QueryParams,
    ) -> Result<FeatureCollection<P>, ClientError> {
        let request = HttpRequest::get(&self.url(service, path), params);
        let value = self.fetch(&request)?;
        Ok(FeatureCollection::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{ScriptedTransport, page};
    use crate::transport::TransportFailure;

    fn executor(transport: &Arc<ScriptedTransport>) -> RequestExecutor {
        RequestExecutor::new(transport.clone(), ClientConfig::default())
    }

    #[test]
    fn builds_service_urls() {
        let transport = Arc::new(ScriptedTransport::new());
        let exec = RequestExecutor::new(
            transport,
            ClientConfig::default().with_base_url("https://example.com/root/"),
        );

        assert_eq!(
            exec.url(Service::ObservedLevels, "collections/stationer/items"),
            "https://example.com/root/grundvattennivaer-observerade/ogc/features/v1/collections/stationer/items"
        );
        assert_eq!(
            exec.url(Service::Chemistry, "/collections"),
            "https://example.com/root/grundvattenkvalitet-analysresultat-provplatser/ogc/features/v1/collections"
        );
    }

    #[test]
    fn service_names_round_trip() {
        use strum::IntoEnumIterator as _;

        for service in Service::iter() {
            assert_eq!(service.to_string().parse::<Service>().unwrap(), service);
        }
    }

    #[test]
    fn execute_decodes_json() {
        let transport = Arc::new(ScriptedTransport::new().json(200, json!({"hello": "world"})));
        let value = executor(&transport)
            .execute(&HttpRequest::get("https://api.example.com/x", QueryParams::new()))
            .unwrap();
        assert_eq!(value, json!({"hello": "world"}));
    }

    #[test]
    fn execute_maps_error_status() {
        let transport = Arc::new(
            ScriptedTransport::new().json(404, json!({"description": "Collection not found"})),
        );
        let err = executor(&transport)
            .execute(&HttpRequest::get("https://api.example.com/x", QueryParams::new()))
            .unwrap_err();

        let ClientError::Api {
            status, payload, ..
        } = &err
        else {
            panic!("expected Api error, got {err:?}");
        };
        assert_eq!(*status, 404);
        assert_eq!(payload["description"], "Collection not found");
    }

    #[test]
    fn execute_reports_invalid_json_as_api_error() {
        let transport = Arc::new(ScriptedTransport::new().text(200, "<html>oops</html>"));
        let err = executor(&transport)
            .execute(&HttpRequest::get("https://api.example.com/x", QueryParams::new()))
            .unwrap_err();

        let ClientError::Api {
            status, payload, ..
        } = &err
        else {
            panic!("expected Api error, got {err:?}");
        };
        assert_eq!(*status, 200);
        assert_eq!(*payload, json!({"error": "<html>oops</html>"}));
    }

    #[test]
    fn transport_failures_never_leak() {
        let transport = Arc::new(
            ScriptedTransport::new().fail(TransportFailure::Connection("Network unreachable".to_owned())),
        );
        let err = executor(&transport)
            .execute(&HttpRequest::get("https://api.example.com/x", QueryParams::new()))
            .unwrap_err();
        assert!(matches!(err, ClientError::Connection { .. }));
    }

    #[test]
    fn post_is_never_paginated() {
        let transport = Arc::new(ScriptedTransport::new().json(
            200,
            json!({
                "type": "FeatureCollection",
                "features": [{"id": "1"}],
                "numberMatched": 100,
                "numberReturned": 1,
            }),
        ));
        let value = executor(&transport)
            .fetch(&HttpRequest::post(
                "https://api.example.com/search",
                json!({"q": "x"}),
            ))
            .unwrap();

        assert_eq!(transport.request_count(), 1);
        assert_eq!(value["numberReturned"], 1);
        assert_eq!(transport.requests()[0].body, Some(json!({"q": "x"})));
    }

    #[test]
    fn extra_headers_reach_every_page() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .json(200, page(1..=2, json!(3)))
                .json(200, page(3..=3, json!(3))),
        );
        let request = HttpRequest::get("https://api.example.com/items", QueryParams::new())
            .with_header("X-Trace", "abc");

        executor(&transport).fetch(&request).unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        for sent in &requests {
            assert_eq!(sent.headers.get("X-Trace").map(String::as_str), Some("abc"));
        }
    }
}
