//! Mastermind sync server
//!
//! Receives full-collection snapshots from client devices and reconciles the
//! stored documents to match them.
//!
//! ```rust,no_run
//! use mastermind_config::ServerConfig;
//! use mastermind_server::{build_router, MemoryDocumentStore, SnapshotReconciler};
//! use std::sync::Arc;
//!
//! # async fn run() -> std::io::Result<()> {
//! let reconciler = SnapshotReconciler::new(Arc::new(MemoryDocumentStore::new()));
//! let app = build_router(Arc::new(reconciler), &ServerConfig::default());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

mod error;
mod reconciler;
mod routes;
mod store;

pub use error::{ServerError, ServerResult};
pub use reconciler::{ReconcileReport, SnapshotReconciler};
pub use routes::build_router;
pub use store::{
    Document, DocumentStore, InsertOutcome, MemoryDocumentStore, SqliteDocumentStore, WriteError,
    WriteErrorCategory,
};
