// crates/sync-engine/src/error.rs
//! Error types for local persistence and sync operations

use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while journaling or draining
#[derive(Debug, Error)]
pub enum SyncError {
    /// A durable local write failed; fatal to the triggering call
    #[error("Failed to write '{key}' to local storage: {reason}")]
    StorageWrite { key: String, reason: String },

    /// A durable local read failed
    #[error("Failed to read '{key}' from local storage: {reason}")]
    StorageRead { key: String, reason: String },

    /// Submission to the remote endpoint failed or was not confirmed
    #[error("Submission of '{collection}' failed: {reason}")]
    Transport { collection: String, reason: String },

    /// The server refused the snapshot; resending the same payload cannot succeed
    #[error("Server rejected '{collection}': {reason}")]
    Rejected { collection: String, reason: String },

    /// Saved value is not a snapshot the server can reconcile
    #[error("Invalid snapshot for '{key}': {reason}")]
    InvalidSnapshot { key: String, reason: String },

    /// Collection key is malformed or reserved
    #[error("Invalid collection key '{key}': {reason}")]
    InvalidCollectionKey { key: String, reason: String },

    /// Value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Creates a transport error for a collection
    pub fn transport(collection: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            collection: collection.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a rejection error for a collection
    pub fn rejected(collection: impl Into<String>, reason: impl ToString) -> Self {
        Self::Rejected {
            collection: collection.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the server answered and refused the payload itself
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns true for local storage faults
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageWrite { .. } | Self::StorageRead { .. })
    }
}
