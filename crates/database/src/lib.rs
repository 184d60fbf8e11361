// crates/database/src/lib.rs
//! Mastermind Database Layer
//!
//! SQLite persistence for both halves of the planner: the device-local key/value
//! store behind the write journal, and the document table behind the sync server.
//! Queries go through sqlx.

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::{connect, connect_in_memory, DatabaseConfig, DbPool};
pub use migrations::{current_version, optimize, run_migrations, verify_integrity, Schema};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{documents, kv};
    use mastermind_core::AppError;
    use serde_json::json;

    #[tokio::test]
    async fn test_database_migrations() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool, Schema::Client).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .map_err(|e| AppError::database("Failed to count migrations", e))?;

        assert!(count > 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_client_workflow() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool, Schema::Client).await?;

        kv::set(&pool, "tasks", r#"[{"id":1}]"#).await?;
        kv::set(&pool, "sync_queue", "[]").await?;

        assert_eq!(kv::get(&pool, "tasks").await?.as_deref(), Some(r#"[{"id":1}]"#));
        assert_eq!(kv::list_keys(&pool).await?, vec!["sync_queue", "tasks"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_server_workflow() -> Result<(), AppError> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool, Schema::Server).await?;

        documents::insert(&pool, "tasks", "a", &json!({"id": "a"})).await?;
        documents::insert(&pool, "tasks", "b", &json!({"id": "b"})).await?;
        let removed = documents::delete(&pool, "tasks", &["a".to_string()]).await?;

        assert_eq!(removed, 1);
        assert_eq!(documents::list(&pool, "tasks").await?, vec![json!({"id": "b"})]);
        Ok(())
    }
}
