// crates/sync-engine/src/store.rs
//! Durable key/value storage behind the journal
//!
//! Every piece of client state (collection values, the sync queue, the last
//! sync timestamp) is addressed through one `KeyValueStore`.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use mastermind_database::queries::kv;
use mastermind_database::{connect, connect_in_memory, run_migrations, DatabaseConfig, DbPool, Schema};
use std::collections::HashMap;
use std::sync::RwLock;

/// Keys owned by the sync machinery; never valid collection keys
pub mod keys {
    /// Durable list of pending queue entries
    pub const SYNC_QUEUE: &str = "sync_queue";
    /// RFC 3339 time of the last flush that confirmed at least one entry
    pub const LAST_SYNC: &str = "last_sync";
    /// Quarantined copy of an unreadable queue
    pub const CORRUPT_QUEUE: &str = "sync_queue.corrupt";

    /// Returns true if `key` is reserved for internal use
    pub fn is_reserved(key: &str) -> bool {
        matches!(key, SYNC_QUEUE | LAST_SYNC | CORRUPT_QUEUE)
    }
}

/// Asynchronous string key/value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    /// Durably stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> SyncResult<()>;

    /// Removes `key` if present
    async fn remove(&self, key: &str) -> SyncResult<()>;
}

/// Volatile store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const POISONED: &str = "store lock poisoned";

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| SyncError::StorageRead {
            key: key.to_string(),
            reason: POISONED.to_string(),
        })?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        let mut entries = self.entries.write().map_err(|_| SyncError::StorageWrite {
            key: key.to_string(),
            reason: POISONED.to_string(),
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        let mut entries = self.entries.write().map_err(|_| SyncError::StorageWrite {
            key: key.to_string(),
            reason: POISONED.to_string(),
        })?;
        entries.remove(key);
        Ok(())
    }
}

/// SQLite-backed store used on devices
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Opens (creating if needed) the store file and applies migrations
    pub async fn open(config: DatabaseConfig) -> SyncResult<Self> {
        let path = config.path.clone();
        let pool = connect(config).await.map_err(|e| SyncError::StorageRead {
            key: path.clone(),
            reason: e.to_string(),
        })?;
        Self::from_pool(pool).await
    }

    /// Opens a private in-memory store
    pub async fn in_memory() -> SyncResult<Self> {
        let pool = connect_in_memory().await.map_err(|e| SyncError::StorageRead {
            key: ":memory:".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, applying client migrations
    pub async fn from_pool(pool: DbPool) -> SyncResult<Self> {
        run_migrations(&pool, Schema::Client)
            .await
            .map_err(|e| SyncError::StorageWrite {
                key: "schema_migrations".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    /// Lists every stored key
    pub async fn keys(&self) -> SyncResult<Vec<String>> {
        kv::list_keys(&self.pool)
            .await
            .map_err(|e| SyncError::StorageRead {
                key: "*".to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        kv::get(&self.pool, key)
            .await
            .map_err(|e| SyncError::StorageRead {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        kv::set(&self.pool, key, value)
            .await
            .map_err(|e| SyncError::StorageWrite {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        kv::delete(&self.pool, key)
            .await
            .map(|_| ())
            .map_err(|e| SyncError::StorageWrite {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}
