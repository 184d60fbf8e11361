// crates/sync-engine/src/queue.rs
//! In-memory mirror of the durable sync queue
//!
//! The journal and the drainer share one `SyncQueue` behind an async mutex.
//! Every read-modify-persist sequence happens while holding that lock.

use crate::error::{SyncError, SyncResult};
use crate::store::{keys, KeyValueStore};
use crate::types::QueueEntry;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Queue handle shared between the journal and the drainer
pub(crate) type SharedQueue = Arc<Mutex<SyncQueue>>;

/// Pending entries in enqueue order
#[derive(Debug, Default)]
pub(crate) struct SyncQueue {
    entries: Vec<QueueEntry>,
    loaded: bool,
}

impl SyncQueue {
    pub(crate) fn shared() -> SharedQueue {
        Arc::new(Mutex::new(Self::default()))
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub(crate) fn push(&mut self, entry: QueueEntry) {
        self.entries.push(entry);
    }

    /// Removes the most recently pushed entry if it has the given id
    pub(crate) fn pop_if(&mut self, id: Uuid) -> Option<QueueEntry> {
        match self.entries.last() {
            Some(last) if last.id == id => self.entries.pop(),
            _ => None,
        }
    }

    /// Removes every entry whose id is in `ids`, preserving the order of the rest
    pub(crate) fn remove_ids(&mut self, ids: &HashSet<Uuid>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !ids.contains(&e.id));
        before - self.entries.len()
    }

    /// Loads the persisted queue on first use
    ///
    /// An unreadable queue is copied to [`keys::CORRUPT_QUEUE`] and replaced by an
    /// empty one. A failed read leaves the queue unloaded so the next call retries.
    pub(crate) async fn ensure_loaded(&mut self, store: &dyn KeyValueStore) -> SyncResult<()> {
        if self.loaded {
            return Ok(());
        }

        let raw = store.get(keys::SYNC_QUEUE).await?;

        self.entries = match raw {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<QueueEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    log::error!("Persisted sync queue is unreadable ({}); starting empty", e);
                    if let Err(e) = store.set(keys::CORRUPT_QUEUE, &raw).await {
                        log::warn!("Could not quarantine unreadable queue: {}", e);
                    }
                    Vec::new()
                }
            },
        };

        self.loaded = true;
        log::debug!("Loaded {} pending sync entries", self.entries.len());
        Ok(())
    }

    /// Writes the current entries to the store
    pub(crate) async fn persist(&self, store: &dyn KeyValueStore) -> SyncResult<()> {
        let raw = serde_json::to_string(&self.entries).map_err(|e| SyncError::StorageWrite {
            key: keys::SYNC_QUEUE.to_string(),
            reason: e.to_string(),
        })?;
        store.set(keys::SYNC_QUEUE, &raw).await
    }
}
