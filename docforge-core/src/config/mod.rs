//! Model connection configuration
//!
//! The host shell owns settings storage; this module only models the
//! connection parameters it hands over per exchange, keeps the credential
//! out of logs, and validates the trio before any request is built.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Environment variable names honored by [`ModelConnection::from_env`]
pub const ENV_BASE_URL: &str = "DOCFORGE_BASE_URL";
pub const ENV_API_KEY: &str = "DOCFORGE_API_KEY";
pub const ENV_MODEL: &str = "DOCFORGE_MODEL";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable '{var}' is not set")]
    EnvVarNotFound { var: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("validation failed for '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// API credential wrapper that never leaks through `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey {
    value: String,
}

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual credential (use with caution)
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Endpoint, credential and model identifier for one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConnection {
    /// Endpoint origin, e.g. `https://api.example.com`; the completions
    /// path is appended by the client
    pub base_url: String,

    pub api_key: ApiKey,

    /// Model identifier sent with every request
    pub model: String,
}

impl ModelConnection {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<ApiKey>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Read the connection from `DOCFORGE_BASE_URL`, `DOCFORGE_API_KEY` and
    /// `DOCFORGE_MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let read = |var: &str| {
            env::var(var).map_err(|_| ConfigError::EnvVarNotFound {
                var: var.to_string(),
            })
        };

        let connection = Self::new(
            read(ENV_BASE_URL)?,
            read(ENV_API_KEY)?,
            read(ENV_MODEL)?,
        );
        connection.validate()?;
        Ok(connection)
    }

    /// Check the trio is usable: an http(s) base URL, a non-empty credential
    /// and a non-empty model identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|err| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: err.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.api_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "api_key",
                message: "credential must not be empty".to_string(),
            });
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model",
                message: "model identifier must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
