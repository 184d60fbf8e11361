//! Resilience patterns for calls to the sync backend
//!
//! - Retry with exponential backoff
//! - Circuit breaker
//!
//! # Example
//!
//! ```rust
//! use mastermind_resilience::{RetryPolicy, CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3)
//!     .with_initial_delay(Duration::from_millis(100));
//!
//! let cb_config = CircuitBreakerConfig::new(5, Duration::from_secs(60));
//! let cb = CircuitBreaker::new(cb_config);
//! assert!(cb.can_proceed().is_ok());
//! ```

mod circuit_breaker;
mod error;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error::{ResilienceError, ResilienceResult};
pub use retry::{with_retry, RetryPolicy};
