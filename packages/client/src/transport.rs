//! The HTTP seam.
//!
//! [`Transport`] performs exactly one logical HTTP call (retries
//! included) and reports the raw outcome. [`ReqwestTransport`] is the real
//! implementation; tests substitute a scripted one. `reqwest` errors are
//! classified into [`TransportFailure`] here and never leave this module.

use std::collections::BTreeMap;
use std::error::Error as _;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};

use crate::ClientError;
use crate::config::ClientConfig;
use crate::query::{QueryParams, to_pairs};
use crate::retry::RetryPolicy;

/// Media types the client accepts.
const ACCEPT_GEOJSON: &str = "application/geo+json, application/json";

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Returns `true` for read requests, the only ones that get paginated.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Get)
    }
}

/// One request as handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL without query string.
    pub url: String,
    pub params: QueryParams,
    /// JSON body, sent with `POST`.
    pub body: Option<Value>,
    /// Headers added on top of the client defaults.
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: &str, params: QueryParams) -> Self {
        Self {
            method: Method::Get,
            url: url.to_owned(),
            params,
            body: None,
            headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn post(url: &str, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.to_owned(),
            params: QueryParams::new(),
            body: Some(body),
            headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Same request with different query parameters.
    #[must_use]
    pub fn with_params(&self, params: QueryParams) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Final URL, including the query string.
    pub url: String,
    pub body: String,
}

impl RawResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// A call that produced no HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// Timed out while connecting.
    #[error("connect timeout: {0}")]
    ConnectTimeout(String),
    /// Timed out while waiting for data.
    #[error("read timeout: {0}")]
    ReadTimeout(String),
    /// Could not connect or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),
    /// Anything else (bad URL, TLS setup, body encoding, ...).
    #[error("{0}")]
    Other(String),
}

impl TransportFailure {
    /// Returns `true` if re-sending might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout(_) | Self::ReadTimeout(_) | Self::Connection(_)
        )
    }
}

/// Performs HTTP calls for the request executor.
pub trait Transport: Send + Sync {
    /// Sends one request, retrying as configured.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFailure`] if no response was received. Non-2xx
    /// responses are not errors at this level.
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportFailure>;
}

/// Blocking `reqwest` transport with retry.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl ReqwestTransport {
    /// Builds the HTTP client from a config.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] if the TLS backend or client cannot
    /// be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GEOJSON));

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Request {
                url: config.base_url().to_owned(),
                message: format!("failed to build HTTP client: {}", describe(&e)),
            })?;

        Ok(Self {
            client,
            retry: RetryPolicy::new(config.max_retries, config.backoff_factor()),
        })
    }

    fn send_once(&self, request: &HttpRequest) -> Result<RawResponse, TransportFailure> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if !request.params.is_empty() {
            builder = builder.query(&to_pairs(&request.params));
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| classify(&e))?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().map_err(|e| classify(&e))?;

        Ok(RawResponse { status, url, body })
    }

    /// Only reads are re-sent; a `POST` gets a single attempt.
    const fn policy_for(&self, method: Method) -> RetryPolicy {
        if method.is_read() {
            self.retry
        } else {
            RetryPolicy::new(0, self.retry.backoff_factor)
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportFailure> {
        self.policy_for(request.method)
            .run(|| self.send_once(request), std::thread::sleep)
    }
}

/// Sorts a `reqwest` error into a [`TransportFailure`].
fn classify(err: &reqwest::Error) -> TransportFailure {
    let message = describe(err);
    if err.is_timeout() {
        if err.is_connect() {
            TransportFailure::ConnectTimeout(message)
        } else {
            TransportFailure::ReadTimeout(message)
        }
    } else if err.is_connect() || err.is_body() {
        TransportFailure::Connection(message)
    } else {
        TransportFailure::Other(message)
    }
}

/// The error message followed by its source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
