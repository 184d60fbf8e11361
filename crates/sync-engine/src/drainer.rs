// crates/sync-engine/src/drainer.rs
//! Sync drainer
//!
//! Owns the connectivity flag and delivers queued snapshots to the remote
//! reconciler. At most one flush runs at a time; a trigger that arrives while a
//! flush is running is dropped, not queued.
//!
//! The queue lock is held only to snapshot pending entries and to remove the
//! confirmed ones, never across a network call, so saves proceed while a flush
//! is in flight.

use crate::error::SyncResult;
use crate::journal::LocalWriteJournal;
use crate::queue::{SharedQueue, SyncQueue};
use crate::store::{keys, KeyValueStore};
use crate::transport::SnapshotTransport;
use crate::types::{FailedSubmission, FlushReport, FlushSkip, QueueEntry, SyncStatus};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Handle of a spawned flush; awaiting it yields the report
pub type FlushHandle = JoinHandle<FlushReport>;

struct DrainerInner {
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn SnapshotTransport>,
    queue: SharedQueue,
    online: AtomicBool,
    flushing: AtomicBool,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

/// Clears the in-progress flag when a flush ends, including on cancellation
struct FlushGuard<'a>(&'a AtomicBool);

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Delivers journaled snapshots when connectivity allows
///
/// Cloning yields another handle to the same drainer.
#[derive(Clone)]
pub struct SyncDrainer {
    inner: Arc<DrainerInner>,
}

impl SyncDrainer {
    /// Creates a drainer over `store`, starting offline
    pub fn new(store: Arc<dyn KeyValueStore>, transport: Arc<dyn SnapshotTransport>) -> Self {
        Self {
            inner: Arc::new(DrainerInner {
                store,
                transport,
                queue: SyncQueue::shared(),
                online: AtomicBool::new(false),
                flushing: AtomicBool::new(false),
                last_sync: Mutex::new(None),
            }),
        }
    }

    /// Returns a journal that appends to this drainer's queue
    pub fn journal(&self) -> LocalWriteJournal {
        LocalWriteJournal::new(self.inner.store.clone(), self.inner.queue.clone())
    }

    /// Loads persisted state and starts a flush
    ///
    /// Safe to call more than once; the queue is only read from storage the first time.
    pub async fn initialize(&self) -> SyncResult<FlushHandle> {
        {
            let mut queue = self.inner.queue.lock().await;
            queue.ensure_loaded(self.inner.store.as_ref()).await?;
        }

        if let Some(raw) = self.inner.store.get(keys::LAST_SYNC).await? {
            match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(at) => self.set_last_sync(at.with_timezone(&Utc)),
                Err(e) => log::warn!("Ignoring unreadable last sync time '{}': {}", raw, e),
            }
        }

        Ok(self.trigger_flush())
    }

    /// Updates connectivity; going online spawns a flush
    ///
    /// Never blocks on the flush. Must be called within a Tokio runtime.
    pub fn set_online_status(&self, online: bool) -> Option<FlushHandle> {
        let was_online = self.inner.online.swap(online, Ordering::AcqRel);
        if was_online != online {
            log::info!("Connectivity changed: {}", if online { "online" } else { "offline" });
        }

        online.then(|| self.trigger_flush())
    }

    /// Returns the current connectivity flag
    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::Acquire)
    }

    /// Returns true while a flush is running
    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.load(Ordering::Acquire)
    }

    /// Spawns [`attempt_flush`](Self::attempt_flush) on the runtime
    pub fn trigger_flush(&self) -> FlushHandle {
        let drainer = self.clone();
        tokio::spawn(async move { drainer.attempt_flush().await })
    }

    /// Submits every pending entry in enqueue order
    ///
    /// Confirmed entries are removed from the durable queue in one batch once the
    /// pass ends. Failed entries stay queued untouched. After a failure for a
    /// collection, later entries of the same collection are deferred so an older
    /// snapshot can never land after a newer one; other collections proceed.
    /// An entry the server rejected outright does not defer the entries behind it.
    pub async fn attempt_flush(&self) -> FlushReport {
        if !self.is_online() {
            return FlushReport::skipped(FlushSkip::Offline);
        }

        let Some(_guard) = FlushGuard::acquire(&self.inner.flushing) else {
            log::debug!("Flush already in progress; ignoring trigger");
            return FlushReport::skipped(FlushSkip::AlreadyRunning);
        };

        let pending: Vec<QueueEntry> = {
            let mut queue = self.inner.queue.lock().await;
            if let Err(e) = queue.ensure_loaded(self.inner.store.as_ref()).await {
                log::error!("Cannot flush, sync queue unavailable: {}", e);
                return FlushReport::skipped(FlushSkip::StorageUnavailable);
            }
            queue.entries().to_vec()
        };

        if pending.is_empty() {
            return FlushReport::skipped(FlushSkip::QueueEmpty);
        }

        log::info!("Flushing {} pending sync entries", pending.len());

        let mut report = FlushReport::default();
        let mut blocked: HashSet<&str> = HashSet::new();

        for entry in &pending {
            if !self.is_online() || blocked.contains(entry.collection_key.as_str()) {
                report.deferred += 1;
                continue;
            }

            report.attempted += 1;
            match self
                .inner
                .transport
                .submit(&entry.collection_key, &entry.payload)
                .await
            {
                Ok(()) => report.synced.push(entry.id),
                Err(e) => {
                    log::warn!("Sync of '{}' failed: {}", entry.collection_key, e);
                    // A refused payload is never applied, so newer snapshots may pass it.
                    if !e.is_rejection() {
                        blocked.insert(entry.collection_key.as_str());
                    }
                    report.failed.push(FailedSubmission {
                        entry_id: entry.id,
                        collection_key: entry.collection_key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.synced.is_empty() {
            self.remove_synced(&report.synced).await;
        }

        log::info!(
            "Flush finished: {} synced, {} failed, {} deferred",
            report.synced.len(),
            report.failed.len(),
            report.deferred
        );
        report
    }

    async fn remove_synced(&self, synced: &[uuid::Uuid]) {
        let ids: HashSet<_> = synced.iter().copied().collect();

        {
            let mut queue = self.inner.queue.lock().await;
            queue.remove_ids(&ids);
            // The in-memory removal stands even if this write fails.
            if let Err(e) = queue.persist(self.inner.store.as_ref()).await {
                log::error!("Could not persist queue after sync: {}", e);
            }
        }

        let now = Utc::now();
        self.set_last_sync(now);
        if let Err(e) = self.inner.store.set(keys::LAST_SYNC, &now.to_rfc3339()).await {
            log::warn!("Could not record last sync time: {}", e);
        }
    }

    fn set_last_sync(&self, at: DateTime<Utc>) {
        let mut last_sync = match self.inner.last_sync.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last_sync = Some(at);
    }

    /// Time of the last flush that confirmed at least one entry
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        match self.inner.last_sync.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Entries currently waiting for confirmation, in enqueue order
    pub async fn pending_entries(&self) -> SyncResult<Vec<QueueEntry>> {
        let mut queue = self.inner.queue.lock().await;
        queue.ensure_loaded(self.inner.store.as_ref()).await?;
        Ok(queue.entries().to_vec())
    }

    /// Snapshot of connectivity, queue depth and last sync time
    pub async fn status(&self) -> SyncResult<SyncStatus> {
        let pending_entries = {
            let mut queue = self.inner.queue.lock().await;
            queue.ensure_loaded(self.inner.store.as_ref()).await?;
            queue.len()
        };

        Ok(SyncStatus {
            online: self.is_online(),
            flush_in_progress: self.is_flushing(),
            pending_entries,
            last_sync: self.last_sync(),
        })
    }
}
