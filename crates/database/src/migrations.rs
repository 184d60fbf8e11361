// crates/database/src/migrations.rs
//! Database migrations
//!
//! The client and the server keep different schemas in separate database files,
//! each tracked by its own `schema_migrations` table.

use crate::DbPool;
use mastermind_core::AppError;

/// Client migration 001: key/value store
const CLIENT_001: &str = include_str!("../migrations/client/001_kv_store.sql");

/// Server migration 001: document collections
const SERVER_001: &str = include_str!("../migrations/server/001_documents.sql");

/// Which schema a database file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Device-local key/value store
    Client,
    /// Server-side document collections
    Server,
}

impl Schema {
    fn migrations(self) -> &'static [(i64, &'static str)] {
        match self {
            Schema::Client => &[(1, CLIENT_001)],
            Schema::Server => &[(1, SERVER_001)],
        }
    }
}

/// Returns the latest migration version of a schema
pub fn current_version(schema: Schema) -> i64 {
    schema
        .migrations()
        .iter()
        .map(|(version, _)| *version)
        .max()
        .unwrap_or(0)
}

/// Runs all pending migrations for a schema
pub async fn run_migrations(pool: &DbPool, schema: Schema) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to create migrations table", e))?;

    for (version, sql) in schema.migrations() {
        run_migration(pool, *version, sql).await?;
    }

    Ok(())
}

/// Runs a single migration if not already applied
async fn run_migration(pool: &DbPool, version: i64, sql: &str) -> Result<(), AppError> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
            .bind(version)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::database("Failed to check migration status", e))?;

    if applied.is_some() {
        return Ok(());
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin migration", e))?;

    sqlx::query(sql)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::MigrationFailed {
            version: version.to_string(),
            reason: e.to_string(),
        })?;

    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("Failed to record migration", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit migration", e))?;

    log::info!("Applied migration {}", version);
    Ok(())
}

/// Verifies database integrity
pub async fn verify_integrity(pool: &DbPool) -> Result<(), AppError> {
    let result: String = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database("Failed to check integrity", e))?;

    if result != "ok" {
        return Err(AppError::DatabaseCorrupted { details: result });
    }

    Ok(())
}

/// Optimizes the database
pub async fn optimize(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query("PRAGMA optimize")
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to optimize database", e))?;

    Ok(())
}
