//! Document collection operations
//!
//! Backs the sync server. Each collection is a set of JSON documents keyed by
//! their record identifier; `(collection, id)` is unique.

use crate::DbPool;
use mastermind_core::{AppError, Timestamp};
use serde_json::Value;

/// Lists every document of a collection in insertion order
pub async fn list(pool: &DbPool, collection: &str) -> Result<Vec<Value>, AppError> {
    let bodies: Vec<String> =
        sqlx::query_scalar("SELECT body FROM documents WHERE collection = ? ORDER BY rowid")
            .bind(collection)
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::database("Failed to list documents", e))?;

    bodies
        .iter()
        .map(|body| {
            serde_json::from_str(body).map_err(|e| {
                AppError::serialization(format!("Stored document in '{}' is not JSON", collection), e)
            })
        })
        .collect()
}

/// Deletes the given identifiers from a collection in one transaction
///
/// Returns the number of rows removed.
pub async fn delete(pool: &DbPool, collection: &str, ids: &[String]) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin delete", e))?;

    let mut removed = 0;
    for id in ids {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to delete document", e))?;
        removed += result.rows_affected();
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit delete", e))?;

    Ok(removed)
}

/// Inserts a single document
///
/// Fails with [`AppError::DuplicateRecord`] if the identifier is already present.
pub async fn insert(pool: &DbPool, collection: &str, id: &str, body: &Value) -> Result<(), AppError> {
    let body = serde_json::to_string(body)
        .map_err(|e| AppError::serialization("Failed to serialize document", e))?;

    sqlx::query("INSERT INTO documents (collection, id, body, inserted_at) VALUES (?, ?, ?, ?)")
        .bind(collection)
        .bind(id)
        .bind(body)
        .bind(Timestamp::now().as_millis())
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateRecord {
                    collection: collection.to_string(),
                    id: id.to_string(),
                }
            }
            other => AppError::database("Failed to insert document", other),
        })?;

    Ok(())
}
