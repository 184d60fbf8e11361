// crates/config/src/manager.rs
//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable naming the remote sync endpoint
pub const ENV_ENDPOINT: &str = "MASTERMIND_BFF_URL";

const ENV_LOG_LEVEL: &str = "MASTERMIND_APP_LOG_LEVEL";
const ENV_STORE_PATH: &str = "MASTERMIND_APP_STORE_PATH";
const ENV_SERVER_BIND: &str = "MASTERMIND_SERVER_BIND";
const ENV_SERVER_DATABASE: &str = "MASTERMIND_SERVER_DATABASE_PATH";
const ENV_SERVER_ORIGINS: &str = "MASTERMIND_SERVER_ALLOWED_ORIGINS";

/// Main configuration manager
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the platform config directory
    ///
    /// - Linux: `~/.config/mastermind/`
    /// - macOS: `~/Library/Application Support/mastermind/`
    /// - Windows: `%APPDATA%\mastermind\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let config_path = config_dir.join("config.toml");
        let persistence = ConfigPersistence::new(config_path);

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "mastermind")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> &Path {
        self.persistence.path()
    }

    /// Resolves a configured path against the config directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// Loads the configuration from file
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Saves the configuration to file
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn`, and saves the result
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Loads the config and applies `MASTERMIND_*` environment overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let config = self.load()?;
        Ok(apply_env_overrides(config, |name| std::env::var(name).ok()))
    }
}

/// Applies environment overrides read through `lookup`
///
/// Unparsable values are logged and ignored.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(ENV_ENDPOINT) {
        config.sync.endpoint = endpoint;
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        match level.parse::<LogLevel>() {
            Ok(level) => config.app.log_level = level,
            Err(e) => log::warn!("Ignoring {}: {}", ENV_LOG_LEVEL, e),
        }
    }

    if let Some(path) = lookup(ENV_STORE_PATH) {
        config.app.store_path = PathBuf::from(path);
    }

    if let Some(bind) = lookup(ENV_SERVER_BIND) {
        config.server.bind_address = bind;
    }

    if let Some(path) = lookup(ENV_SERVER_DATABASE) {
        config.server.database_path = PathBuf::from(path);
    }

    if let Some(origins) = lookup(ENV_SERVER_ORIGINS) {
        config.server.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }

    if let Err(errors) = config.validate() {
        log::warn!(
            "Config validation warnings after env overrides: {:?}",
            errors
        );
    }

    config
}
