//! Error types and recovery strategies for Mastermind
//!
//! Errors are grouped into three severity tiers:
//! - **Recoverable**: can be retried later (locked database, transient store failure)
//! - **Degraded**: the operation failed but the process can continue (bad data, id conflict)
//! - **Fatal**: storage is unusable and needs user intervention (corruption, failed migration)
//!
//! The server answers recoverable storage errors with 503 so clients retry them.

use std::fmt;
use thiserror::Error;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be automatically recovered from
    Recoverable,
    /// Operation failed but the process can continue
    Degraded,
    /// Critical error requiring user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for the storage layer
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Database Errors =====
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database is corrupted and needs repair
    #[error("Database corrupted: {details}")]
    DatabaseCorrupted { details: String },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: String, reason: String },

    /// Database is locked by another process
    #[error("Database locked: {operation}")]
    DatabaseLocked { operation: String },

    /// A record with the same identifier already exists
    #[error("Duplicate record: {id} already exists in {collection}")]
    DuplicateRecord { collection: String, id: String },

    // ===== Data Errors =====
    /// Value could not be serialized or deserialized
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DatabaseError { .. } | Self::DatabaseLocked { .. } => {
                ErrorSeverity::Recoverable
            }

            Self::DuplicateRecord { .. } | Self::Serialization { .. } => ErrorSeverity::Degraded,

            Self::DatabaseCorrupted { .. } | Self::MigrationFailed { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Returns true if the same operation may succeed when retried later
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Recoverable
    }

    /// Returns true if this error reports an identifier collision
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateRecord { .. })
    }

    /// Helper to create a database error from any error type
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a serialization error
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_database_error_is_retryable() {
        let err = AppError::database("insert failed", std::io::Error::other("disk"));
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert!(err.is_retryable());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_duplicate_record() {
        let err = AppError::DuplicateRecord {
            collection: "tasks".to_string(),
            id: "abc".to_string(),
        };
        assert!(err.is_duplicate());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("abc"));
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
    }

    #[test]
    fn test_corruption_is_critical() {
        let err = AppError::DatabaseCorrupted {
            details: "page 3".to_string(),
        };
        assert!(err.is_critical());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_display_impls() {
        assert_eq!(ErrorSeverity::Fatal.to_string(), "Fatal");
        let err = AppError::DatabaseLocked {
            operation: "insert".to_string(),
        };
        assert_eq!(err.to_string(), "Database locked: insert");
    }
}
