//! Sync server configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the `mastermind-server` binary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,

    /// Document database file
    pub database_path: PathBuf,

    /// Maximum pooled database connections
    pub max_connections: u32,

    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,

    /// Browser origins allowed to call the API; empty disables CORS
    pub allowed_origins: Vec<String>,
}

/// Default request body limit (16 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            database_path: PathBuf::from("mastermind-server.db"),
            max_connections: 10,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allowed_origins: vec!["http://localhost:8081".to_string()],
        }
    }
}

impl ConfigSection for ServerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::socket_addr(&self.bind_address, "server.bind_address"),
            Validator::not_empty(&self.database_path.to_string_lossy(), "server.database_path"),
            Validator::in_range(self.max_connections, 1, 100, "server.max_connections"),
            Validator::in_range(
                self.max_body_bytes,
                1024,
                1024 * 1024 * 1024,
                "server.max_body_bytes",
            ),
        ];
        results.extend(
            self.allowed_origins
                .iter()
                .map(|origin| Validator::is_http_url(origin, "server.allowed_origins")),
        );

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.bind_address = other.bind_address;
        self.database_path = other.database_path;
        self.max_connections = other.max_connections;
        self.max_body_bytes = other.max_body_bytes;
        self.allowed_origins = other.allowed_origins;
    }

    fn section_name(&self) -> &'static str {
        "server"
    }
}
