// crates/sync-engine/src/manager.rs
//! `DataManager`: the entry point used by application code
//!
//! Bundles a journal and a drainer over the same store and queue. Saving while
//! online kicks off a flush in the background.

use crate::drainer::{FlushHandle, SyncDrainer};
use crate::error::SyncResult;
use crate::journal::LocalWriteJournal;
use crate::store::KeyValueStore;
use crate::transport::SnapshotTransport;
use crate::types::{FlushReport, SyncStatus};
use mastermind_core::Record;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Local-first persistence with background sync
#[derive(Clone)]
pub struct DataManager {
    journal: LocalWriteJournal,
    drainer: SyncDrainer,
}

impl DataManager {
    /// Creates a manager; it starts offline until told otherwise
    pub fn new(store: Arc<dyn KeyValueStore>, transport: Arc<dyn SnapshotTransport>) -> Self {
        let drainer = SyncDrainer::new(store, transport);
        let journal = drainer.journal();
        Self { journal, drainer }
    }

    /// Loads the persisted queue and starts a flush
    pub async fn initialize(&self) -> SyncResult<FlushHandle> {
        self.drainer.initialize().await
    }

    /// Saves a collection locally, then triggers a flush if online
    ///
    /// The returned handle, if any, belongs to the background flush; the save
    /// itself is complete when this returns.
    pub async fn save<T>(&self, collection_key: &str, value: &T) -> SyncResult<Option<FlushHandle>>
    where
        T: Serialize + ?Sized,
    {
        self.journal.save(collection_key, value).await?;

        if self.drainer.is_online() {
            Ok(Some(self.drainer.trigger_flush()))
        } else {
            Ok(None)
        }
    }

    /// Reads the last saved value of a collection
    pub async fn load<T: DeserializeOwned>(&self, collection_key: &str) -> SyncResult<Option<T>> {
        self.journal.load(collection_key).await
    }

    /// Reads the last saved value of a collection as raw JSON
    pub async fn load_value(&self, collection_key: &str) -> SyncResult<Option<Value>> {
        self.journal.load_value(collection_key).await
    }

    /// Saves a full list of records into their collection
    pub async fn save_records<R>(&self, records: &[R]) -> SyncResult<Option<FlushHandle>>
    where
        R: Record + Serialize,
    {
        self.save(R::COLLECTION, records).await
    }

    /// Reads the records of a collection; never-saved collections are empty
    pub async fn load_records<R>(&self) -> SyncResult<Vec<R>>
    where
        R: Record + DeserializeOwned,
    {
        Ok(self.load(R::COLLECTION).await?.unwrap_or_default())
    }

    /// Updates connectivity; going online starts a flush
    pub fn set_online_status(&self, online: bool) -> Option<FlushHandle> {
        self.drainer.set_online_status(online)
    }

    /// Runs a flush in the current task
    pub async fn flush(&self) -> FlushReport {
        self.drainer.attempt_flush().await
    }

    /// Current connectivity, queue depth and last sync time
    pub async fn status(&self) -> SyncResult<SyncStatus> {
        self.drainer.status().await
    }

    pub fn drainer(&self) -> &SyncDrainer {
        &self.drainer
    }

    pub fn journal(&self) -> &LocalWriteJournal {
        &self.journal
    }
}
