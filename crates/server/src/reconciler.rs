// crates/server/src/reconciler.rs
//! Makes a stored collection match a client's snapshot

use crate::error::{ServerError, ServerResult};
use crate::store::{Document, DocumentStore};
use mastermind_core::{extract_record_id, is_valid_collection_name, snapshot_ids};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// What one reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Stored records absent from the snapshot and removed
    pub deleted: u64,
    /// Snapshot records newly inserted
    pub inserted: usize,
    /// Inserts skipped because the identifier was already stored
    pub duplicates_ignored: usize,
}

/// Reconciles stored collections against submitted snapshots
///
/// Each call reads the collection, deletes identifiers missing from the snapshot,
/// then inserts every snapshot record unordered. Duplicate-key failures mean the
/// record already exists and are ignored. The steps are not transactional: two
/// concurrent snapshots of one collection can delete each other's fresh inserts.
pub struct SnapshotReconciler {
    store: Arc<dyn DocumentStore>,
}

impl SnapshotReconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Replaces the stored view of `collection` with `records`
    pub async fn reconcile(
        &self,
        collection: &str,
        records: Vec<Value>,
    ) -> ServerResult<ReconcileReport> {
        check_collection(collection)?;
        let documents = into_documents(records)?;

        let stored = self.store.find_all(collection).await?;
        let submitted: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();

        let to_delete: Vec<String> = stored
            .iter()
            .filter_map(extract_record_id)
            .map(|id| id.as_str().to_string())
            .filter(|id| !submitted.contains(id.as_str()))
            .collect();

        let mut report = ReconcileReport {
            deleted: self.store.delete_many(collection, &to_delete).await?,
            ..ReconcileReport::default()
        };

        let outcome = self
            .store
            .insert_many_unordered(collection, &documents)
            .await?;
        report.inserted = outcome.inserted;

        let mut fatal = Vec::new();
        for error in outcome.errors {
            if error.is_duplicate() {
                log::debug!("'{}' already holds {}; skipped", collection, error.id);
                report.duplicates_ignored += 1;
            } else {
                fatal.push(format!("{}: {}", error.id, error.message));
            }
        }

        if !fatal.is_empty() {
            return Err(ServerError::Reconciliation {
                collection: collection.to_string(),
                reason: fatal.join("; "),
            });
        }

        log::info!(
            "Reconciled '{}': {} deleted, {} inserted, {} already present",
            collection,
            report.deleted,
            report.inserted,
            report.duplicates_ignored
        );

        Ok(report)
    }

    /// Returns the stored records of a collection
    pub async fn list(&self, collection: &str) -> ServerResult<Vec<Value>> {
        check_collection(collection)?;
        self.store.find_all(collection).await
    }
}

fn check_collection(collection: &str) -> ServerResult<()> {
    if is_valid_collection_name(collection) {
        Ok(())
    } else {
        Err(ServerError::InvalidCollection(collection.to_string()))
    }
}

/// Pairs each record with its identifier, rejecting missing or repeated ids
fn into_documents(records: Vec<Value>) -> ServerResult<Vec<Document>> {
    let ids = snapshot_ids(&records).map_err(|e| ServerError::InvalidSnapshot(e.to_string()))?;

    Ok(ids
        .into_iter()
        .zip(records)
        .map(|(id, body)| Document::new(id.as_str(), body))
        .collect())
}
