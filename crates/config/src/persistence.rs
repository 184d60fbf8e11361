// crates/config/src/persistence.rs
//! Reading and writing `config.toml`
//!
//! Saves go through a temp file in the same directory and are renamed into
//! place, after the previous file is copied to `config.toml.backup`.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Owns the location of one config file
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Path of the copy kept from the previous save
    pub fn backup_path(&self) -> PathBuf {
        self.config_path.with_extension("toml.backup")
    }

    /// Reads the file; a missing file means defaults
    ///
    /// Out-of-range values are logged, not rejected, so a hand-edited file still
    /// loads and can be fixed with `save`.
    pub fn load(&self) -> ConfigResult<Config> {
        let contents = match fs::read_to_string(&self.config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No config at {}, using defaults",
                    self.config_path.display()
                );
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.config_path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.config_path.clone(),
            });
        }

        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })?;

        if config.version != CONFIG_VERSION {
            log::warn!(
                "{} declares version {}; reading it as version {}",
                self.config_path.display(),
                config.version,
                CONFIG_VERSION
            );
            config.version = CONFIG_VERSION;
        }

        if let Err(errors) = config.validate() {
            log::warn!(
                "{} has invalid values: {}",
                self.config_path.display(),
                crate::error::describe(&errors)
            );
        }

        Ok(config)
    }

    /// Validates and atomically replaces the file
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let encoded = toml::to_string_pretty(config)?;

        let dir = match self.config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| self.write_error(dir, source))?;

        if self.config_path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.config_path, &backup).map_err(|source| self.write_error(&backup, source))?;
            log::debug!("Previous config kept at {}", backup.display());
        }

        let mut staged = NamedTempFile::new_in(dir).map_err(|source| self.write_error(dir, source))?;
        staged
            .write_all(encoded.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|source| self.write_error(staged.path(), source))?;
        staged
            .persist(&self.config_path)
            .map_err(|e| self.write_error(&self.config_path, e.error))?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    fn write_error(&self, path: &Path, source: std::io::Error) -> ConfigError {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}
