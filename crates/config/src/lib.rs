// crates/config/src/lib.rs
//! Mastermind Configuration System
//!
//! TOML configuration shared by the `mastermind` CLI and `mastermind-server`.
//!
//! # Architecture
//!
//! - **Trait-based**: each section implements `ConfigSection`
//! - **Graceful degradation**: invalid files are reported, defaults fill missing fields
//! - **Atomic writes**: config files are never left half-written
//! - **Environment overrides**: `MASTERMIND_*` variables win over the file
//!
//! # Example
//!
//! ```rust,no_run
//! use mastermind_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Sync endpoint: {}", config.sync.endpoint);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod server_config;
mod sync_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{apply_env_overrides, ConfigManager, ENV_ENDPOINT};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use server_config::{ServerConfig, DEFAULT_MAX_BODY_BYTES};
pub use sync_config::SyncConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Client sync settings
    pub sync: SyncConfig,

    /// Sync server settings
    pub server: ServerConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.sync.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.server.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.sync.merge(other.sync);
        self.server.merge(other.server);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            sync: SyncConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
