//! Client sync configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for talking to the remote sync endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the remote endpoint
    pub endpoint: String,

    /// Seconds between connectivity probes
    pub connectivity_interval_secs: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Attempts per request, including the first
    pub request_retries: u32,

    /// Consecutive failures before requests are short-circuited
    pub circuit_breaker_threshold: u32,
}

impl SyncConfig {
    /// Interval between connectivity probes
    pub fn connectivity_interval(&self) -> Duration {
        Duration::from_secs(self.connectivity_interval_secs)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            connectivity_interval_secs: 15,
            request_timeout_secs: 10,
            request_retries: 3,
            circuit_breaker_threshold: 5,
        }
    }
}

impl ConfigSection for SyncConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let results = vec![
            Validator::is_http_url(&self.endpoint, "sync.endpoint"),
            Validator::in_range(
                self.connectivity_interval_secs,
                1,
                3600,
                "sync.connectivity_interval_secs",
            ),
            Validator::in_range(self.request_timeout_secs, 1, 300, "sync.request_timeout_secs"),
            Validator::in_range(self.request_retries, 1, 10, "sync.request_retries"),
            Validator::in_range(
                self.circuit_breaker_threshold,
                1,
                100,
                "sync.circuit_breaker_threshold",
            ),
        ];

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.endpoint = other.endpoint;
        self.connectivity_interval_secs = other.connectivity_interval_secs;
        self.request_timeout_secs = other.request_timeout_secs;
        self.request_retries = other.request_retries;
        self.circuit_breaker_threshold = other.circuit_breaker_threshold;
    }

    fn section_name(&self) -> &'static str {
        "sync"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = SyncConfig {
            endpoint: "bff.local".to_string(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "sync.endpoint");
    }

    #[test]
    fn test_zero_retries_rejected() {
        let config = SyncConfig {
            request_retries: 0,
            connectivity_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_durations() {
        let config = SyncConfig::default();
        assert_eq!(config.connectivity_interval(), Duration::from_secs(15));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
