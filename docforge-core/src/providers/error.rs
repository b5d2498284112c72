//! Provider error types and handling

use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when talking to the model endpoint
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or connection error before or during the request
    #[error("network error: {0}")]
    Network(String),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// The endpoint rejected the request shape
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The endpoint returned an error we have no narrower mapping for
    #[error("endpoint error {code}: {message}")]
    Endpoint { code: String, message: String },

    /// Timeout while establishing the connection
    #[error("request timed out")]
    Timeout,

    /// The connection dropped after the stream started; partial text may
    /// already have been delivered
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// Service temporarily unavailable (5xx)
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response body could not be decoded
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Local configuration problem
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Coarse cause buckets the host shell uses to word its notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Service,
    Request,
}

impl ProviderError {
    /// Which notification bucket this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderError::Authentication(_) => ErrorCategory::Authentication,
            ProviderError::RateLimit { .. } => ErrorCategory::RateLimit,
            ProviderError::Network(_)
            | ProviderError::Timeout
            | ProviderError::StreamInterrupted(_) => ErrorCategory::Network,
            ProviderError::ServiceUnavailable(_) => ErrorCategory::Service,
            ProviderError::InvalidRequest(_)
            | ProviderError::Endpoint { .. }
            | ProviderError::Parse(_)
            | ProviderError::Configuration(_) => ErrorCategory::Request,
        }
    }

    /// Whether retrying the same request can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_)
                | ProviderError::Timeout
                | ProviderError::StreamInterrupted(_)
                | ProviderError::RateLimit { .. }
                | ProviderError::ServiceUnavailable(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Network(format!("connection failed: {err}"))
        } else if err.is_status() {
            match err.status().map(|status| status.as_u16()) {
                Some(401) | Some(403) => ProviderError::Authentication(err.to_string()),
                Some(429) => ProviderError::RateLimit {
                    message: err.to_string(),
                    retry_after_secs: None,
                },
                Some(code) if (500..=599).contains(&code) => {
                    ProviderError::ServiceUnavailable(err.to_string())
                }
                Some(code) => ProviderError::Endpoint {
                    code: code.to_string(),
                    message: err.to_string(),
                },
                None => ProviderError::Network(err.to_string()),
            }
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
