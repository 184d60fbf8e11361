// crates/sync-engine/src/types.rs
//! Core types for the write journal and the drainer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pending full-collection snapshot awaiting server confirmation
///
/// The payload is the entire value of the collection at save time, not a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Stable identity used to remove exactly this entry after confirmation
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(rename = "key")]
    pub collection_key: String,
    #[serde(rename = "data")]
    pub payload: serde_json::Value,
    #[serde(rename = "timestamp")]
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Creates an entry stamped with the current time
    pub fn new(collection_key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection_key: collection_key.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Why a flush attempt did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushSkip {
    /// Connectivity is down
    Offline,
    /// Another flush is in progress
    AlreadyRunning,
    /// Nothing is queued
    QueueEmpty,
    /// The persisted queue could not be read
    StorageUnavailable,
}

/// A queued entry whose submission failed during a flush
#[derive(Debug, Clone, PartialEq)]
pub struct FailedSubmission {
    pub entry_id: Uuid,
    pub collection_key: String,
    pub reason: String,
}

/// Outcome of one flush attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Set when the attempt was skipped before submitting anything
    pub skipped: Option<FlushSkip>,
    /// Number of submissions sent to the transport
    pub attempted: usize,
    /// Entries confirmed by the server and removed from the queue
    pub synced: Vec<Uuid>,
    /// Entries whose submission failed; they stay queued
    pub failed: Vec<FailedSubmission>,
    /// Entries left queued without being submitted
    pub deferred: usize,
}

impl FlushReport {
    pub(crate) fn skipped(reason: FlushSkip) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    /// Returns true if the attempt did not run
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Returns true if every queued entry was confirmed
    pub fn is_complete(&self) -> bool {
        self.skipped.is_none() && self.failed.is_empty() && self.deferred == 0
    }
}

/// Point-in-time view of the drainer
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub online: bool,
    pub flush_in_progress: bool,
    pub pending_entries: usize,
    pub last_sync: Option<DateTime<Utc>>,
}
