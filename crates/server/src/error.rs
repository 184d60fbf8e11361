//! Server error types and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mastermind_core::AppError;
use thiserror::Error;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors produced while serving a request
#[derive(Debug, Error)]
pub enum ServerError {
    /// Collection name is not a valid route segment
    #[error("Invalid collection name '{0}'")]
    InvalidCollection(String),

    /// Submitted snapshot is malformed
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A write other than a duplicate-key conflict failed
    #[error("Reconciliation of '{collection}' failed: {reason}")]
    Reconciliation { collection: String, reason: String },

    /// Document store failure
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl ServerError {
    /// HTTP status reported for this error
    ///
    /// Transient storage faults answer 503 so clients keep the snapshot and retry.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCollection(_) | Self::InvalidSnapshot(_) => StatusCode::BAD_REQUEST,
            Self::Storage(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Reconciliation { .. } | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Storage(e) if e.is_critical() => {
                log::error!("Storage needs attention ({}): {}", e.severity(), e)
            }
            Self::Storage(e) if e.is_retryable() => log::warn!("Transient storage fault: {}", e),
            _ if status.is_server_error() => log::error!("{}", self),
            _ => log::debug!("Rejected request: {}", self),
        }

        (status, self.to_string()).into_response()
    }
}
