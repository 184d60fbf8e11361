//! Error types for resilience operations

use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors that can occur in resilience operations
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// Circuit breaker is open
    #[error(
        "Circuit breaker is open (failures: {failures}, last failure: {last_failure_ago:?} ago)"
    )]
    CircuitBreakerOpen {
        failures: usize,
        last_failure_ago: std::time::Duration,
    },

    /// Shared breaker state was poisoned by a panicking holder
    #[error("Circuit breaker state poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_breaker_error() {
        let err = ResilienceError::CircuitBreakerOpen {
            failures: 5,
            last_failure_ago: std::time::Duration::from_secs(10),
        };
        assert!(err.to_string().contains("Circuit breaker"));
        assert!(err.to_string().contains("5"));
    }
}
