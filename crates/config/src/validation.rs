//! Validation system for configuration values
//!
//! Each config section implements the `ConfigSection` trait, which includes
//! validation and merging.

pub use crate::error::ValidationError;
use std::net::SocketAddr;

/// Trait for configuration sections that can validate themselves
pub trait ConfigSection: Default {
    /// Validates the configuration section
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another config section into this one, preferring values from `other`
    fn merge(&mut self, other: Self);

    /// Returns the section name for error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates that a string is an absolute http(s) URL with a host
    pub fn is_http_url(value: &str, field: &str) -> Result<(), ValidationError> {
        let rest = value
            .strip_prefix("http://")
            .or_else(|| value.strip_prefix("https://"));

        match rest {
            Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(()),
            _ => Err(ValidationError::with_value(
                field,
                "must be an http:// or https:// URL",
                value,
            )),
        }
    }

    /// Validates that a string parses as `host:port`
    pub fn socket_addr(value: &str, field: &str) -> Result<(), ValidationError> {
        value.parse::<SocketAddr>().map(|_| ()).map_err(|_| {
            ValidationError::with_value(field, "must be an address like 0.0.0.0:8080", value)
        })
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range() {
        assert!(Validator::in_range(50, 0, 100, "test").is_ok());
        assert!(Validator::in_range(0, 0, 100, "test").is_ok());
        assert!(Validator::in_range(101, 0, 100, "test").is_err());
    }

    #[test]
    fn test_not_empty() {
        assert!(Validator::not_empty("hello", "test").is_ok());
        assert!(Validator::not_empty("   ", "test").is_err());
    }

    #[test]
    fn test_is_http_url() {
        assert!(Validator::is_http_url("http://localhost:8080", "test").is_ok());
        assert!(Validator::is_http_url("https://bff.example.com/api", "test").is_ok());
        assert!(Validator::is_http_url("ftp://example.com", "test").is_err());
        assert!(Validator::is_http_url("http://", "test").is_err());
        assert!(Validator::is_http_url("localhost:8080", "test").is_err());
    }

    #[test]
    fn test_socket_addr() {
        assert!(Validator::socket_addr("0.0.0.0:8080", "test").is_ok());
        assert!(Validator::socket_addr("[::1]:3000", "test").is_ok());
        assert!(Validator::socket_addr("localhost", "test").is_err());
    }

    #[test]
    fn test_collect_errors_some_err() {
        let results = vec![
            Ok(()),
            Err(ValidationError::new("field1", "error1")),
            Err(ValidationError::new("field2", "error2")),
        ];
        assert_eq!(Validator::collect_errors(results).unwrap_err().len(), 2);
    }
}
