//! Provider error types
//!
//! Error definitions with transient/permanent classification. Transient
//! errors abort only the affected case; the periodic sweep is the retry
//! mechanism.

use thiserror::Error;

/// Error that can occur while talking to a remote court system.
///
/// "Radicado not found" is not an error: providers return `Ok(None)` from
/// the search operation for that common, expected outcome.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Failed to reach the remote system.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote call exceeded the request timeout.
    #[error("request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The remote system answered with an unexpected HTTP status.
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// The remote system is throttling us.
    #[error("rate limited by remote system")]
    RateLimited,

    /// The response body could not be parsed.
    #[error("invalid response: {message}")]
    InvalidResponse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ProviderError {
    /// Create a connection failure without a source error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ProviderError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failure wrapping a source error.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ProviderError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-response error wrapping a source error.
    pub fn invalid_response(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ProviderError::InvalidResponse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this error is transient and the case may succeed on the
    /// next sweep without operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::ConnectionFailed { .. }
                | ProviderError::Timeout { .. }
                | ProviderError::RateLimited
                | ProviderError::UnexpectedStatus { status: 500..=599, .. }
        )
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
