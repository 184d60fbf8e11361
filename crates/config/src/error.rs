//! Configuration errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while locating, reading or writing `config.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but holds only whitespace
    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("Invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    /// One or more fields hold unusable values
    #[error("Invalid config: {}", describe(.0))]
    Invalid(Vec<ValidationError>),

    /// Writing the file, its directory, its backup or its temp file failed
    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The platform offers no per-user config directory
    #[error("No user config directory on this platform; pass one explicitly")]
    NoConfigDir,
}

/// Joins validation errors into one line
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A rejected config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the field, e.g. `sync.endpoint`
    pub field: String,
    pub message: String,
    /// Offending value, when it helps to show it
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::new(field, message)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} (got {})", self.field, self.message, value),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("sync.endpoint", "must not be empty");
        assert_eq!(err.to_string(), "sync.endpoint must not be empty");

        let err = ValidationError::with_value("sync.request_retries", "must be between 1 and 10", 0);
        assert_eq!(
            err.to_string(),
            "sync.request_retries must be between 1 and 10 (got 0)"
        );
    }

    #[test]
    fn test_invalid_lists_every_field() {
        let err = ConfigError::Invalid(vec![
            ValidationError::new("app.store_path", "must not be empty"),
            ValidationError::with_value("server.max_connections", "must be between 1 and 100", 0),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid config: app.store_path must not be empty; \
             server.max_connections must be between 1 and 100 (got 0)"
        );
    }
}
