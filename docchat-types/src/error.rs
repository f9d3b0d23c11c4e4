//! Error type for all docchat API operations.

use std::time::Duration;

/// Errors from the docchat HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network-level error (connection refused, reset mid-body, DNS failure).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The request exceeded the configured timeout.
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided `detail`, or the operation's fallback message.
        detail: String,
    },
    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// The text shown to a user for this error.
    ///
    /// Status errors show only the server detail; transport errors show the
    /// underlying message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Network(source) => source.to_string(),
            Self::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error is likely transient and the request can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}
