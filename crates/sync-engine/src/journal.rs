// crates/sync-engine/src/journal.rs
//! Local write journal
//!
//! `save` writes the new value of a collection and then appends the same
//! value to the durable sync queue, in that order, under the queue lock.
//! If the value write fails nothing is queued.

use crate::error::{SyncError, SyncResult};
use crate::queue::SharedQueue;
use crate::store::{keys, KeyValueStore};
use crate::types::QueueEntry;
use mastermind_core::{check_snapshot, is_valid_collection_name};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Durable local persistence plus enqueueing of every save
#[derive(Clone)]
pub struct LocalWriteJournal {
    store: Arc<dyn KeyValueStore>,
    queue: SharedQueue,
}

impl LocalWriteJournal {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, queue: SharedQueue) -> Self {
        Self { store, queue }
    }

    /// Persists `value` as the new content of `collection_key` and enqueues it
    ///
    /// Every successful call appends exactly one queue entry, even when the value
    /// is unchanged. Fails with [`SyncError::StorageWrite`] if the value or the
    /// queue cannot be written; in that case no entry remains queued.
    ///
    /// Values the server could never reconcile (not an array of records with
    /// distinct ids) fail with [`SyncError::InvalidSnapshot`] before any write.
    pub async fn save<T>(&self, collection_key: &str, value: &T) -> SyncResult<()>
    where
        T: Serialize + ?Sized,
    {
        validate_collection_key(collection_key)?;

        let payload = serde_json::to_value(value)?;
        check_snapshot(&payload).map_err(|e| SyncError::InvalidSnapshot {
            key: collection_key.to_string(),
            reason: e.to_string(),
        })?;
        let raw = payload.to_string();

        let mut queue = self.queue.lock().await;
        queue
            .ensure_loaded(self.store.as_ref())
            .await
            .map_err(|e| match e {
                SyncError::StorageRead { key, reason } => SyncError::StorageWrite {
                    key,
                    reason: format!("queue unavailable: {}", reason),
                },
                other => other,
            })?;

        self.store.set(collection_key, &raw).await?;

        let entry = QueueEntry::new(collection_key, payload);
        let entry_id = entry.id;
        queue.push(entry);

        if let Err(e) = queue.persist(self.store.as_ref()).await {
            queue.pop_if(entry_id);
            log::error!("Saved '{}' but could not queue it for sync: {}", collection_key, e);
            return Err(e);
        }

        log::debug!(
            "Saved '{}' ({} bytes); {} entries pending",
            collection_key,
            raw.len(),
            queue.len()
        );
        Ok(())
    }

    /// Reads the last saved value of a collection as raw JSON
    pub async fn load_value(&self, collection_key: &str) -> SyncResult<Option<Value>> {
        validate_collection_key(collection_key)?;

        match self.store.get(collection_key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Reads the last saved value of a collection
    pub async fn load<T: DeserializeOwned>(&self, collection_key: &str) -> SyncResult<Option<T>> {
        match self.load_value(collection_key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

fn validate_collection_key(key: &str) -> SyncResult<()> {
    if keys::is_reserved(key) {
        return Err(SyncError::InvalidCollectionKey {
            key: key.to_string(),
            reason: "reserved for sync bookkeeping".to_string(),
        });
    }

    if !is_valid_collection_name(key) {
        return Err(SyncError::InvalidCollectionKey {
            key: key.to_string(),
            reason: "must be 1-64 ASCII letters, digits, '_' or '-'".to_string(),
        });
    }

    Ok(())
}
