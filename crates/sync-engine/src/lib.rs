// crates/sync-engine/src/lib.rs
//! Local-first persistence and sync for the Mastermind planner
//!
//! - [`LocalWriteJournal`]: durable local saves, each enqueued for sync
//! - [`SyncDrainer`]: connectivity-gated delivery of queued snapshots
//! - [`DataManager`]: both of the above behind one handle
//!
//! Storage and network are reached through the [`KeyValueStore`] and
//! [`SnapshotTransport`] traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use mastermind_sync_engine::{DataManager, MemoryStore, SnapshotTransport, SyncResult};
//! use std::sync::Arc;
//!
//! struct Discard;
//!
//! #[async_trait::async_trait]
//! impl SnapshotTransport for Discard {
//!     async fn submit(&self, _: &str, _: &serde_json::Value) -> SyncResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> SyncResult<()> {
//! let manager = DataManager::new(Arc::new(MemoryStore::new()), Arc::new(Discard));
//! manager.initialize().await?;
//!
//! manager.save("tasks", &serde_json::json!([{"id": 1, "name": "Plan"}])).await?;
//! manager.set_online_status(true);
//! # Ok(())
//! # }
//! ```

mod drainer;
mod error;
mod journal;
mod manager;
mod queue;
mod store;
mod transport;
mod types;

pub use drainer::{FlushHandle, SyncDrainer};
pub use error::{SyncError, SyncResult};
pub use journal::LocalWriteJournal;
pub use manager::DataManager;
pub use store::{keys, KeyValueStore, MemoryStore, SqliteStore};
pub use transport::SnapshotTransport;
pub use types::{FailedSubmission, FlushReport, FlushSkip, QueueEntry, SyncStatus};
