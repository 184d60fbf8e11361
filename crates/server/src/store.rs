// crates/server/src/store.rs
//! Server-side document storage seam

use crate::error::ServerResult;
use async_trait::async_trait;
use mastermind_database::queries::documents;
use mastermind_database::DbPool;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A record together with its normalized identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

/// Why a single insert failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorCategory {
    /// The identifier already exists in the collection
    DuplicateKey,
    /// Any other failure
    Other,
}

/// Failure of one document inside an unordered batch insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteError {
    /// Position of the document in the submitted batch
    pub index: usize,
    pub id: String,
    pub category: WriteErrorCategory,
    pub message: String,
}

impl WriteError {
    pub fn is_duplicate(&self) -> bool {
        self.category == WriteErrorCategory::DuplicateKey
    }
}

/// Result of an unordered batch insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub errors: Vec<WriteError>,
}

/// Persistent collections of JSON documents
///
/// `insert_many_unordered` attempts every document even when some fail; per-document
/// failures are reported in the outcome, while `Err` means the batch as a whole could
/// not be attempted.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document of a collection in insertion order
    async fn find_all(&self, collection: &str) -> ServerResult<Vec<Value>>;

    /// Deletes the given identifiers, returning how many existed
    async fn delete_many(&self, collection: &str, ids: &[String]) -> ServerResult<u64>;

    /// Inserts each document independently
    async fn insert_many_unordered(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> ServerResult<InsertOutcome>;
}

/// SQLite-backed document store
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: DbPool,
}

impl SqliteDocumentStore {
    /// Wraps a pool that already carries the server schema
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find_all(&self, collection: &str) -> ServerResult<Vec<Value>> {
        Ok(documents::list(&self.pool, collection).await?)
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> ServerResult<u64> {
        Ok(documents::delete(&self.pool, collection, ids).await?)
    }

    async fn insert_many_unordered(
        &self,
        collection: &str,
        docs: &[Document],
    ) -> ServerResult<InsertOutcome> {
        let mut outcome = InsertOutcome::default();

        for (index, doc) in docs.iter().enumerate() {
            match documents::insert(&self.pool, collection, &doc.id, &doc.body).await {
                Ok(()) => outcome.inserted += 1,
                Err(e) => {
                    let category = if e.is_duplicate() {
                        WriteErrorCategory::DuplicateKey
                    } else {
                        WriteErrorCategory::Other
                    };
                    outcome.errors.push(WriteError {
                        index,
                        id: doc.id.clone(),
                        category,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers stored in a collection, in insertion order
    pub async fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.iter().map(|d| d.id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_all(&self, collection: &str) -> ServerResult<Vec<Value>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.iter().map(|d| d.body.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> ServerResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|d| !ids.contains(&d.id));
        Ok((before - docs.len()) as u64)
    }

    async fn insert_many_unordered(
        &self,
        collection: &str,
        docs: &[Document],
    ) -> ServerResult<InsertOutcome> {
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();
        let mut outcome = InsertOutcome::default();

        for (index, doc) in docs.iter().enumerate() {
            if stored.iter().any(|d| d.id == doc.id) {
                outcome.errors.push(WriteError {
                    index,
                    id: doc.id.clone(),
                    category: WriteErrorCategory::DuplicateKey,
                    message: format!("{} already exists in {}", doc.id, collection),
                });
            } else {
                stored.push(doc.clone());
                outcome.inserted += 1;
            }
        }

        Ok(outcome)
    }
}
