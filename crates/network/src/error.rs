// crates/network/src/error.rs
//! Network error types

use mastermind_resilience::ResilienceError;
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Endpoint is not reachable
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Request refused without being sent
    #[error("Request short-circuited: {0}")]
    Resilience(#[from] ResilienceError),
}

impl NetworkError {
    /// Returns true if retrying the request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::NetworkUnavailable(_) => true,
            Self::InvalidUrl(_) | Self::Resilience(_) => false,
        }
    }

    /// Returns true for 4xx responses
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }

    /// Returns true for 5xx responses
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}
