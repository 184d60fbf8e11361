// crates/database/src/connection.rs
//! SQLite pools for the device store and the server document store

use mastermind_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Shared connection pool
pub type DbPool = Pool<Sqlite>;

/// How to open a database file
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    /// Write-ahead logging lets readers proceed during a reconciliation write
    pub enable_wal: bool,
    pub create_if_missing: bool,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "mastermind.db".to_string(),
            max_connections: 10,
            enable_wal: true,
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }
}

/// Opens a pool on the configured file, creating its directory when allowed
pub async fn connect(config: DatabaseConfig) -> Result<DbPool, AppError> {
    let path = Path::new(&config.path);
    if config.create_if_missing {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
                .map_err(|e| AppError::database(format!("Cannot create {}", dir.display()), e))?,
            _ => {}
        }
    }

    let mut options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(config.create_if_missing)
        .busy_timeout(config.busy_timeout);

    if config.enable_wal {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database(format!("Cannot open {}", config.path), e))?;

    log::debug!(
        "Opened {} ({} connections, wal: {})",
        config.path,
        config.max_connections,
        config.enable_wal
    );
    Ok(pool)
}

/// Opens a private in-memory database
///
/// The pool holds exactly one connection that is never recycled, since every
/// new SQLite memory connection would see an empty database.
pub async fn connect_in_memory() -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AppError::database("Invalid in-memory database URL", e))?
        .journal_mode(SqliteJournalMode::Memory);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Cannot open in-memory database", e))
}
