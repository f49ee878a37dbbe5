//! Client configuration.
//!
//! A [`ClientConfig`] can be built in code with the `with_*` setters or
//! loaded from a TOML file. Every field has a default, so a config file
//! only needs the keys it overrides:
//!
//! ```toml
//! timeout_secs = 60
//! max_retries = 5
//! debug = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root of the SGU open-data APIs.
pub const DEFAULT_BASE_URL: &str = "https://api.sgu.se/oppnadata";

const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_FACTOR_SECS: f64 = 0.5;

/// Errors raised while loading a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML or has wrongly typed values.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("Invalid config value for '{field}': {message}")]
    Invalid {
        /// The offending key.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Settings shared by every request a client makes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root URL; service paths are appended to it.
    pub base_url: String,
    /// Connect and read timeout per HTTP call, in seconds.
    pub timeout_secs: f64,
    /// How many times a transient failure is re-sent.
    pub max_retries: u32,
    /// Base of the exponential backoff between retries, in seconds.
    pub backoff_factor_secs: f64,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Log every request and response status at debug level.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor_secs: DEFAULT_BACKOFF_FACTOR_SECS,
            user_agent: default_user_agent(),
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that numeric settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                message: format!("must be a positive number, got {}", self.timeout_secs),
            });
        }
        if !self.backoff_factor_secs.is_finite() || self.backoff_factor_secs < 0.0 {
            return Err(ConfigError::Invalid {
                field: "backoff_factor_secs",
                message: format!(
                    "must be zero or a positive number, got {}",
                    self.backoff_factor_secs
                ),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base_url",
                message: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }

    /// Sets the root URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        base_url.clone_into(&mut self.base_url);
        self
    }

    /// Sets the per-call timeout in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff factor in seconds.
    #[must_use]
    pub const fn with_backoff_factor_secs(mut self, secs: f64) -> Self {
        self.backoff_factor_secs = secs;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        user_agent.clone_into(&mut self.user_agent);
        self
    }

    /// Enables or disables request diagnostics.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The timeout as a [`Duration`].
    ///
    /// Invalid values fall back to the default timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// The backoff factor as a [`Duration`].
    #[must_use]
    pub fn backoff_factor(&self) -> Duration {
        Duration::try_from_secs_f64(self.backoff_factor_secs).unwrap_or(Duration::ZERO)
    }

    /// The root URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn default_user_agent() -> String {
    format!("groundwater-client/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_api() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.sgu.se/oppnadata");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_factor(), Duration::from_millis(500));
        assert!(config.user_agent.starts_with("groundwater-client/"));
        assert!(!config.debug);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str("timeout_secs = 60\ndebug = true\n").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.debug);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn rejects_non_positive_timeout() {
        let err = ClientConfig::from_toml_str("timeout_secs = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "timeout_secs", .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ClientConfig::from_toml_str("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builder_overrides_fields() {
        let config = ClientConfig::default()
            .with_base_url("http://localhost:8080/")
            .with_timeout_secs(5.0)
            .with_max_retries(0)
            .with_debug(true);

        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
        assert!(config.debug);
    }
}
