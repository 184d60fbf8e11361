// crates/sync-engine/src/transport.rs
//! Seam between the drainer and the remote endpoint

use crate::error::SyncResult;
use async_trait::async_trait;
use serde_json::Value;

/// Delivers one full-collection snapshot to the remote reconciler
///
/// `Ok(())` means the server explicitly confirmed the snapshot was applied.
/// Anything else, including timeouts and non-success statuses, is an error.
#[async_trait]
pub trait SnapshotTransport: Send + Sync {
    async fn submit(&self, collection: &str, payload: &Value) -> SyncResult<()>;
}
