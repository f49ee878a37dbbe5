//! The client's closed error taxonomy and the normaliser that maps
//! transport failures and non-success responses into it.

use std::time::Duration;

use serde_json::{Value, json};
use strum_macros::{AsRefStr, Display};

use crate::config::ConfigError;
use crate::transport::{RawResponse, TransportFailure};

/// Substrings that mark a connection error as a read timeout in disguise.
///
/// Some stacks report a stalled read as a generic connection error; the
/// message is the only thing that tells them apart.
const READ_TIMEOUT_MARKERS: &[&str] = &["Read timed out", "ReadTimeoutError"];

/// Which phase of an HTTP call timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum TimeoutPhase {
    /// Establishing the connection.
    #[strum(serialize = "Connection")]
    Connect,
    /// Waiting for response data.
    Read,
}

/// Errors returned by the groundwater client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A connect or read timeout.
    #[error("{phase} timeout after {}s: {url}", .timeout.as_secs_f64())]
    Timeout {
        /// Which phase timed out.
        phase: TimeoutPhase,
        /// The request URL.
        url: String,
        /// The configured timeout.
        timeout: Duration,
    },

    /// The network was unreachable or the connection was refused.
    #[error("Connection failed: {url}: {message}")]
    Connection {
        /// The request URL.
        url: String,
        /// The underlying error message.
        message: String,
    },

    /// The server answered with a non-success status or an unusable body.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The request URL.
        url: String,
        /// Human-readable summary.
        message: String,
        /// The server's error body, or `{"error": <text>}` if it was not
        /// JSON.
        payload: Value,
    },

    /// Any other transport failure.
    #[error("Request failed: {url}: {message}")]
    Request {
        /// The request URL.
        url: String,
        /// The underlying error message.
        message: String,
    },

    /// A lookup that should match one feature matched none.
    #[error("{0}")]
    NotFound(String),

    /// A lookup that should match one feature matched several.
    #[error("{0}")]
    MultipleReturned(String),

    /// The caller passed arguments that cannot form a request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The response did not match the expected record shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Maps a transport failure to the taxonomy.
    ///
    /// A connection failure whose message carries a read-timeout marker is
    /// reported as [`TimeoutPhase::Read`], not as a connection error.
    #[must_use]
    pub fn from_transport(failure: TransportFailure, url: &str, timeout: Duration) -> Self {
        let timeout_error = |phase| Self::Timeout {
            phase,
            url: url.to_owned(),
            timeout,
        };

        match failure {
            TransportFailure::ConnectTimeout(_) => timeout_error(TimeoutPhase::Connect),
            TransportFailure::ReadTimeout(_) => timeout_error(TimeoutPhase::Read),
            TransportFailure::Connection(message) if is_read_timeout_message(&message) => {
                timeout_error(TimeoutPhase::Read)
            }
            TransportFailure::Connection(message) => Self::Connection {
                url: url.to_owned(),
                message,
            },
            TransportFailure::Other(message) => Self::Request {
                url: url.to_owned(),
                message,
            },
        }
    }

    /// Builds an [`ClientError::Api`] from a response, extracting the
    /// server's error payload on a best-effort basis.
    #[must_use]
    pub fn from_response(response: &RawResponse, message: String) -> Self {
        Self::Api {
            status: response.status,
            url: response.url.clone(),
            message,
            payload: error_payload(response),
        }
    }

    /// HTTP status for [`ClientError::Api`] errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for timeouts.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Decodes the response body as JSON, or wraps the raw text as
/// `{"error": text}` when it is not JSON.
#[must_use]
pub fn error_payload(response: &RawResponse) -> Value {
    serde_json::from_str(&response.body).unwrap_or_else(|_| json!({ "error": response.body }))
}

fn is_read_timeout_message(message: &str) -> bool {
    READ_TIMEOUT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://api.example.com/test";
    const TIMEOUT: Duration = Duration::from_secs(30);

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            url: URL.to_owned(),
            body: body.to_owned(),
        }
    }

    #[test]
    fn connect_timeout_maps_to_connect_phase() {
        let err = ClientError::from_transport(
            TransportFailure::ConnectTimeout("Connection timeout".to_owned()),
            URL,
            TIMEOUT,
        );
        assert!(matches!(
            err,
            ClientError::Timeout {
                phase: TimeoutPhase::Connect,
                ..
            }
        ));
        assert!(err.to_string().contains("Connection timeout after"));
    }

    #[test]
    fn read_timeout_maps_to_read_phase() {
        let err = ClientError::from_transport(
            TransportFailure::ReadTimeout("Read timeout".to_owned()),
            URL,
            TIMEOUT,
        );
        assert!(err.to_string().contains("Read timeout after"));
    }

    #[test]
    fn read_timeout_marker_beats_connection_classification() {
        for message in ["Read timed out", "ReadTimeoutError in connection"] {
            let err = ClientError::from_transport(
                TransportFailure::Connection(message.to_owned()),
                URL,
                TIMEOUT,
            );
            assert!(
                matches!(
                    err,
                    ClientError::Timeout {
                        phase: TimeoutPhase::Read,
                        ..
                    }
                ),
                "{message} should be a read timeout"
            );
        }
    }

    #[test]
    fn plain_connection_error_stays_connection() {
        let err = ClientError::from_transport(
            TransportFailure::Connection("Network unreachable".to_owned()),
            URL,
            TIMEOUT,
        );
        assert!(matches!(err, ClientError::Connection { .. }));
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn other_failure_is_generic_request_error() {
        let err = ClientError::from_transport(
            TransportFailure::Other("Something went wrong".to_owned()),
            URL,
            TIMEOUT,
        );
        assert!(matches!(err, ClientError::Request { .. }));
        assert!(err.to_string().contains("Request failed"));
    }

    #[test]
    fn api_error_keeps_json_payload() {
        let err = ClientError::from_response(
            &response(404, r#"{"code": "NotFound", "description": "no such item"}"#),
            "HTTP 404".to_owned(),
        );
        assert_eq!(err.status(), Some(404));
        let ClientError::Api { payload, .. } = err else {
            panic!("expected Api error");
        };
        assert_eq!(payload["code"], "NotFound");
    }

    #[test]
    fn api_error_falls_back_to_text_payload() {
        let err = ClientError::from_response(
            &response(500, "Internal Server Error"),
            "HTTP 500".to_owned(),
        );
        let ClientError::Api { payload, .. } = err else {
            panic!("expected Api error");
        };
        assert_eq!(payload, json!({"error": "Internal Server Error"}));
    }
}
