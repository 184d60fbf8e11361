//! Key/value store operations
//!
//! Backs the device-local journal. Values are opaque serialized text.

use crate::DbPool;
use mastermind_core::{AppError, Timestamp};

/// Gets the value stored under a key
pub async fn get(pool: &DbPool, key: &str) -> Result<Option<String>, AppError> {
    sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read key '{}'", key), e))
}

/// Stores a value under a key, replacing any previous value
pub async fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Timestamp::now().as_millis())
    .execute(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to write key '{}'", key), e))?;

    Ok(())
}

/// Deletes a key, returning true if it existed
pub async fn delete(pool: &DbPool, key: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete key '{}'", key), e))?;

    Ok(result.rows_affected() > 0)
}

/// Lists all stored keys in lexical order
pub async fn list_keys(pool: &DbPool) -> Result<Vec<String>, AppError> {
    sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database("Failed to list keys", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_in_memory;
    use crate::migrations::{run_migrations, Schema};

    async fn setup() -> DbPool {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool, Schema::Client).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let pool = setup().await;
        assert_eq!(get(&pool, "tasks").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let pool = setup().await;

        set(&pool, "tasks", "[1]").await.unwrap();
        set(&pool, "tasks", "[1,2]").await.unwrap();

        assert_eq!(get(&pool, "tasks").await.unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(list_keys(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = setup().await;

        set(&pool, "last_sync", "\"2024-01-01T00:00:00Z\"").await.unwrap();
        assert!(delete(&pool, "last_sync").await.unwrap());
        assert!(!delete(&pool, "last_sync").await.unwrap());
        assert_eq!(get(&pool, "last_sync").await.unwrap(), None);
    }
}
