//! Integration tests for the write journal and the drainer

use async_trait::async_trait;
use mastermind_core::{Quadrant, Task};
use mastermind_database::DatabaseConfig;
use mastermind_sync_engine::{
    keys, DataManager, FlushSkip, KeyValueStore, MemoryStore, SnapshotTransport, SqliteStore,
    SyncDrainer, SyncError, SyncResult,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records every submission and fails the calls or collections it is told to
#[derive(Default)]
struct ScriptedTransport {
    submissions: Mutex<Vec<(String, Value)>>,
    failing_calls: Mutex<HashSet<usize>>,
    failing_collections: Mutex<HashSet<String>>,
    refused_calls: Mutex<HashSet<usize>>,
}

impl ScriptedTransport {
    fn fail_call(&self, n: usize) {
        self.failing_calls.lock().unwrap().insert(n);
    }

    fn fail_collection(&self, collection: &str) {
        self.failing_collections
            .lock()
            .unwrap()
            .insert(collection.to_string());
    }

    fn refuse_call(&self, n: usize) {
        self.refused_calls.lock().unwrap().insert(n);
    }

    fn heal(&self) {
        self.failing_calls.lock().unwrap().clear();
        self.failing_collections.lock().unwrap().clear();
    }

    fn submissions(&self) -> Vec<(String, Value)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotTransport for ScriptedTransport {
    async fn submit(&self, collection: &str, payload: &Value) -> SyncResult<()> {
        let call = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push((collection.to_string(), payload.clone()));
            submissions.len()
        };

        if self.refused_calls.lock().unwrap().contains(&call) {
            return Err(SyncError::rejected(collection, "HTTP 400"));
        }
        if self.failing_calls.lock().unwrap().contains(&call)
            || self.failing_collections.lock().unwrap().contains(collection)
        {
            return Err(SyncError::transport(collection, "HTTP 500"));
        }
        Ok(())
    }
}

/// Blocks each submission until the test releases it
struct GatedTransport {
    entered: Notify,
    release: Semaphore,
    submissions: Mutex<Vec<Value>>,
}

impl GatedTransport {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SnapshotTransport for GatedTransport {
    async fn submit(&self, collection: &str, payload: &Value) -> SyncResult<()> {
        self.entered.notify_one();
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|e| SyncError::transport(collection, e))?;
        permit.forget();
        self.submissions.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Drops connectivity as soon as the first submission arrives
#[derive(Default)]
struct FlakyLinkTransport {
    drainer: OnceLock<SyncDrainer>,
    calls: Mutex<usize>,
}

#[async_trait]
impl SnapshotTransport for FlakyLinkTransport {
    async fn submit(&self, _collection: &str, _payload: &Value) -> SyncResult<()> {
        *self.calls.lock().unwrap() += 1;
        if let Some(drainer) = self.drainer.get() {
            drainer.set_online_status(false);
        }
        Ok(())
    }
}

/// Memory store that can be told to fail reads or writes of chosen keys
#[derive(Default)]
struct FailingStore {
    inner: MemoryStore,
    failing_writes: Mutex<HashSet<String>>,
    fail_reads: Mutex<bool>,
}

impl FailingStore {
    fn fail_writes_to(&self, key: &str) {
        self.failing_writes.lock().unwrap().insert(key.to_string());
    }

    fn fail_all_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(SyncError::StorageRead {
                key: key.to_string(),
                reason: "I/O error".to_string(),
            });
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        if self.failing_writes.lock().unwrap().contains(key) {
            return Err(SyncError::StorageWrite {
                key: key.to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        self.inner.remove(key).await
    }
}

fn manager_with(transport: Arc<ScriptedTransport>) -> DataManager {
    init_logging();
    DataManager::new(Arc::new(MemoryStore::new()), transport)
}

#[tokio::test]
async fn test_read_your_writes() {
    let manager = manager_with(Arc::new(ScriptedTransport::default()));

    let tasks = vec![
        Task::new("Quarterly taxes").with_quadrant(Quadrant::ImportantUrgent),
        Task::new("Learn piano").with_tags(["hobby"]),
    ];
    manager.save_records(&tasks).await.unwrap();

    let loaded: Vec<Task> = manager.load_records().await.unwrap();
    assert_eq!(loaded, tasks);
}

#[tokio::test]
async fn test_load_absent_collection() {
    let manager = manager_with(Arc::new(ScriptedTransport::default()));

    assert_eq!(manager.load_value("schedule").await.unwrap(), None);
    let tasks: Vec<Task> = manager.load_records().await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_each_save_appends_one_entry() {
    let manager = manager_with(Arc::new(ScriptedTransport::default()));
    let value = json!([{"id": 1, "name": "same"}]);

    for expected in 1..=3 {
        manager.save("tasks", &value).await.unwrap();
        let pending = manager.drainer().pending_entries().await.unwrap();
        assert_eq!(pending.len(), expected);
        assert_eq!(pending.last().unwrap().payload, value);
    }
}

#[tokio::test]
async fn test_offline_flush_makes_no_calls() {
    let transport = Arc::new(ScriptedTransport::default());
    let manager = manager_with(transport.clone());

    assert!(manager.save("tasks", &json!([{"id": 1}])).await.unwrap().is_none());
    assert!(manager.set_online_status(false).is_none());

    let report = manager.flush().await;

    assert_eq!(report.skipped, Some(FlushSkip::Offline));
    assert!(transport.submissions().is_empty());
    assert_eq!(manager.status().await.unwrap().pending_entries, 1);
}

#[tokio::test]
async fn test_going_online_drains_in_order() {
    let transport = Arc::new(ScriptedTransport::default());
    let manager = manager_with(transport.clone());

    for version in 1..=3 {
        manager
            .save("tasks", &json!([{"id": 1, "name": format!("T1 v{}", version)}]))
            .await
            .unwrap();
    }

    let report = manager.set_online_status(true).unwrap().await.unwrap();

    assert_eq!(report.synced.len(), 3);
    assert!(report.is_complete());

    let names: Vec<_> = transport
        .submissions()
        .iter()
        .map(|(_, payload)| payload[0]["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("T1 v1"), json!("T1 v2"), json!("T1 v3")]);

    let status = manager.status().await.unwrap();
    assert_eq!(status.pending_entries, 0);
    assert!(status.last_sync.is_some());
}

#[tokio::test]
async fn test_failed_entry_keeps_suffix_and_retries_verbatim() {
    let transport = Arc::new(ScriptedTransport::default());
    let manager = manager_with(transport.clone());

    for version in 1..=3 {
        manager
            .save("tasks", &json!([{"id": 1, "v": version}]))
            .await
            .unwrap();
    }
    let queued = manager.drainer().pending_entries().await.unwrap();

    transport.fail_call(2);
    let report = manager.set_online_status(true).unwrap().await.unwrap();

    assert_eq!(report.synced, vec![queued[0].id]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].entry_id, queued[1].id);
    assert_eq!(report.deferred, 1);
    assert_eq!(
        manager.drainer().pending_entries().await.unwrap(),
        queued[1..].to_vec()
    );

    transport.heal();
    let report = manager.flush().await;

    assert_eq!(report.synced, vec![queued[1].id, queued[2].id]);
    let submissions = transport.submissions();
    assert_eq!(submissions.len(), 4);
    assert_eq!(submissions[2].1, queued[1].payload);
    assert_eq!(submissions[3].1, queued[2].payload);
    assert!(manager.drainer().pending_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failing_collection_does_not_block_others() {
    let transport = Arc::new(ScriptedTransport::default());
    let manager = manager_with(transport.clone());

    manager.save("tasks", &json!([{"id": "t"}])).await.unwrap();
    manager.save("schedule", &json!([{"id": "s"}])).await.unwrap();
    manager.save("tasks", &json!([{"id": "t2"}])).await.unwrap();
    manager.save("journal_entries", &json!([{"id": "j"}])).await.unwrap();

    transport.fail_collection("tasks");
    let report = manager.set_online_status(true).unwrap().await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.synced.len(), 2);
    assert_eq!(report.deferred, 1);

    let pending = manager.drainer().pending_entries().await.unwrap();
    let keys: Vec<_> = pending.iter().map(|e| e.collection_key.as_str()).collect();
    assert_eq!(keys, vec!["tasks", "tasks"]);
}

#[tokio::test]
async fn test_storage_write_failure_is_surfaced_and_nothing_queued() {
    init_logging();
    let store = Arc::new(FailingStore::default());
    let manager = DataManager::new(store.clone(), Arc::new(ScriptedTransport::default()));

    manager.save("tasks", &json!([{"id": 1}])).await.unwrap();
    store.fail_writes_to("tasks");

    let err = manager.save("tasks", &json!([{"id": 2}])).await.unwrap_err();

    assert!(matches!(err, SyncError::StorageWrite { .. }));
    assert_eq!(manager.drainer().pending_entries().await.unwrap().len(), 1);
    assert_eq!(
        manager.load_value("tasks").await.unwrap(),
        Some(json!([{"id": 1}]))
    );
}

#[tokio::test]
async fn test_queue_write_failure_leaves_no_entry() {
    init_logging();
    let store = Arc::new(FailingStore::default());
    let manager = DataManager::new(store.clone(), Arc::new(ScriptedTransport::default()));

    store.fail_writes_to(keys::SYNC_QUEUE);
    let err = manager.save("tasks", &json!([{"id": 1}])).await.unwrap_err();

    assert!(err.is_storage());
    assert!(manager.drainer().pending_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreadable_storage_skips_flush() {
    init_logging();
    let store = Arc::new(FailingStore::default());
    let transport = Arc::new(ScriptedTransport::default());
    let manager = DataManager::new(store.clone(), transport.clone());

    store.fail_all_reads();
    let report = manager.set_online_status(true).unwrap().await.unwrap();

    assert_eq!(report.skipped, Some(FlushSkip::StorageUnavailable));
    assert!(transport.submissions().is_empty());
    assert!(manager.initialize().await.is_err());
}

#[tokio::test]
async fn test_second_flush_is_ignored_while_running() {
    init_logging();
    let transport = Arc::new(GatedTransport::new());
    let manager = DataManager::new(Arc::new(MemoryStore::new()), transport.clone());

    manager.save("tasks", &json!([{"id": 1}])).await.unwrap();
    let first = manager.set_online_status(true).unwrap();
    transport.entered.notified().await;

    let second = manager.flush().await;
    assert_eq!(second.skipped, Some(FlushSkip::AlreadyRunning));
    assert!(manager.status().await.unwrap().flush_in_progress);

    // Saved mid-flush: not part of this pass and must survive it
    manager
        .journal()
        .save("tasks", &json!([{"id": 1}, {"id": 2}]))
        .await
        .unwrap();

    transport.release.add_permits(1);
    let report = first.await.unwrap();

    assert_eq!(report.synced.len(), 1);
    assert_eq!(transport.submissions.lock().unwrap().len(), 1);

    let pending = manager.drainer().pending_entries().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload, json!([{"id": 1}, {"id": 2}]));
    assert!(!manager.drainer().is_flushing());
}

#[tokio::test]
async fn test_connectivity_loss_defers_rest_of_pass() {
    init_logging();
    let transport = Arc::new(FlakyLinkTransport::default());
    let manager = DataManager::new(Arc::new(MemoryStore::new()), transport.clone());
    let _ = transport.drainer.set(manager.drainer().clone());

    for i in 0..3 {
        manager.save("schedule", &json!([{"id": i}])).await.unwrap();
    }

    let report = manager.set_online_status(true).unwrap().await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.synced.len(), 1);
    assert_eq!(report.deferred, 2);
    assert_eq!(*transport.calls.lock().unwrap(), 1);
    assert!(!manager.drainer().is_online());
    assert_eq!(manager.drainer().pending_entries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_save_while_online_flushes() {
    let transport = Arc::new(ScriptedTransport::default());
    let manager = manager_with(transport.clone());

    let idle = manager.set_online_status(true).unwrap().await.unwrap();
    assert_eq!(idle.skipped, Some(FlushSkip::QueueEmpty));

    let handle = manager
        .save("journal_entries", &json!([{"id": "j1", "text": "Rainy"}]))
        .await
        .unwrap()
        .expect("online save should trigger a flush");
    let report = handle.await.unwrap();

    assert_eq!(report.synced.len(), 1);
    assert_eq!(transport.submissions()[0].0, "journal_entries");
}

#[tokio::test]
async fn test_queue_survives_restart() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("client.db").to_str().unwrap().to_string();

    {
        let store = SqliteStore::open(DatabaseConfig::new(path.clone())).await.unwrap();
        let manager = DataManager::new(Arc::new(store), Arc::new(ScriptedTransport::default()));
        manager.save("tasks", &json!([{"id": "a"}])).await.unwrap();
        manager.save("tasks", &json!([{"id": "a"}, {"id": "b"}])).await.unwrap();
    }

    let transport = Arc::new(ScriptedTransport::default());
    let store = SqliteStore::open(DatabaseConfig::new(path)).await.unwrap();
    let manager = DataManager::new(Arc::new(store), transport.clone());

    // Offline, so the startup flush is skipped but the queue is loaded
    let startup = manager.initialize().await.unwrap().await.unwrap();
    assert_eq!(startup.skipped, Some(FlushSkip::Offline));
    assert_eq!(manager.status().await.unwrap().pending_entries, 2);

    let report = manager.set_online_status(true).unwrap().await.unwrap();
    assert_eq!(report.synced.len(), 2);
    assert_eq!(transport.submissions()[1].1, json!([{"id": "a"}, {"id": "b"}]));
}

#[tokio::test]
async fn test_initialize_is_idempotent_and_restores_last_sync() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    store
        .set(keys::LAST_SYNC, "2024-06-01T08:30:00+00:00")
        .await
        .unwrap();

    let manager = DataManager::new(store.clone(), Arc::new(ScriptedTransport::default()));
    manager.initialize().await.unwrap().await.unwrap();
    manager.save("tasks", &json!([])).await.unwrap();
    manager.initialize().await.unwrap().await.unwrap();

    let status = manager.status().await.unwrap();
    assert_eq!(status.pending_entries, 1);
    assert_eq!(
        status.last_sync.map(|t| t.to_rfc3339()),
        Some("2024-06-01T08:30:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_corrupt_queue_recovered_on_initialize() {
    init_logging();
    let store = Arc::new(MemoryStore::new());
    store.set(keys::SYNC_QUEUE, "[{\"key\": 7").await.unwrap();

    let manager = DataManager::new(store.clone(), Arc::new(ScriptedTransport::default()));
    manager.initialize().await.unwrap();

    assert_eq!(manager.status().await.unwrap().pending_entries, 0);
    assert_eq!(
        store.get(keys::CORRUPT_QUEUE).await.unwrap().as_deref(),
        Some("[{\"key\": 7")
    );

    manager.save("tasks", &json!([])).await.unwrap();
    assert_eq!(manager.status().await.unwrap().pending_entries, 1);
}

#[tokio::test]
async fn test_save_before_initialize_keeps_persisted_queue() {
    init_logging();
    let store = Arc::new(MemoryStore::new());

    {
        let manager = DataManager::new(store.clone(), Arc::new(ScriptedTransport::default()));
        manager.save("tasks", &json!([{"id": 1}])).await.unwrap();
    }

    let manager = DataManager::new(store, Arc::new(ScriptedTransport::default()));
    manager.save("tasks", &json!([{"id": 1}, {"id": 2}])).await.unwrap();

    assert_eq!(manager.drainer().pending_entries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reserved_keys_rejected() {
    let manager = manager_with(Arc::new(ScriptedTransport::default()));

    let err = manager.save(keys::SYNC_QUEUE, &json!([])).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidCollectionKey { .. }));
    assert!(manager.load_value(keys::LAST_SYNC).await.is_err());
}

#[tokio::test]
async fn test_unsyncable_save_does_not_block_collection() {
    let transport = Arc::new(ScriptedTransport::default());
    let manager = manager_with(transport.clone());

    let err = manager
        .save("tasks", &json!([{"name": "no id"}]))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidSnapshot { .. }));
    assert_eq!(manager.load_value("tasks").await.unwrap(), None);

    manager.save("tasks", &json!([{"id": 1}])).await.unwrap();
    manager.save("tasks", &json!([{"id": 2}])).await.unwrap();

    let report = manager.set_online_status(true).unwrap().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.synced.len(), 2);
    assert_eq!(
        transport.submissions(),
        vec![
            ("tasks".to_string(), json!([{"id": 1}])),
            ("tasks".to_string(), json!([{"id": 2}])),
        ]
    );
}

#[tokio::test]
async fn test_refused_entry_lets_later_entries_through() {
    let transport = Arc::new(ScriptedTransport::default());
    let manager = manager_with(transport.clone());
    transport.refuse_call(1);

    for id in 1..=3 {
        manager.save("tasks", &json!([{"id": id}])).await.unwrap();
    }

    let report = manager.set_online_status(true).unwrap().await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.synced.len(), 2);
    assert_eq!(report.deferred, 0);

    let pending = manager.drainer().pending_entries().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload, json!([{"id": 1}]));
}

#[tokio::test]
async fn test_unreadable_queue_fails_save_as_write_error() {
    init_logging();
    let store = Arc::new(FailingStore::default());
    let manager = DataManager::new(store.clone(), Arc::new(ScriptedTransport::default()));

    store.fail_all_reads();
    let err = manager.save("tasks", &json!([{"id": 1}])).await.unwrap_err();

    assert!(matches!(err, SyncError::StorageWrite { .. }), "{}", err);
    assert_eq!(store.inner.get("tasks").await.unwrap(), None);
}
