//! Circuit breaker for the sync backend
//!
//! After `failure_threshold` consecutive failures the breaker opens and
//! rejects calls outright until `cooldown` has elapsed. The next call is then
//! let through as a probe (half-open); any failure while half-open reopens
//! the breaker immediately.

use crate::error::{ResilienceError, ResilienceResult};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Requests are rejected
    Open,
    /// Probing whether the backend recovered
    HalfOpen,
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    failure_threshold: usize,
    cooldown: Duration,
    success_threshold: usize,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration
    pub fn new(failure_threshold: usize, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            success_threshold: 1,
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: usize,
    half_open_successes: usize,
    opened_at: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            half_open_successes: 0,
            opened_at: None,
        }
    }

    fn trip(&mut self) {
        self.state = CircuitState::Open;
        self.half_open_successes = 0;
        self.opened_at = Some(Instant::now());
    }
}

/// Shared circuit breaker; clones observe the same state
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Arc<Mutex<BreakerState>>,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(BreakerState::closed())),
        }
    }

    /// Gets the current state
    pub fn state(&self) -> CircuitState {
        self.state.lock().map(|s| s.state).unwrap_or(CircuitState::Open)
    }

    /// Number of failures since the last success
    pub fn consecutive_failures(&self) -> usize {
        self.state.lock().map(|s| s.consecutive_failures).unwrap_or(0)
    }

    /// Records a successful call
    pub fn record_success(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.consecutive_failures = 0;
            match state.state {
                CircuitState::HalfOpen => {
                    state.half_open_successes += 1;
                    if state.half_open_successes >= self.config.success_threshold {
                        log::info!("Circuit breaker closed; backend recovered");
                        *state = BreakerState::closed();
                    }
                }
                CircuitState::Closed | CircuitState::Open => {}
            }
        }
    }

    /// Records a failed call
    pub fn record_failure(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.consecutive_failures += 1;

            let should_trip = match state.state {
                CircuitState::HalfOpen => true,
                CircuitState::Closed => {
                    state.consecutive_failures >= self.config.failure_threshold
                }
                CircuitState::Open => false,
            };

            if should_trip {
                log::warn!(
                    "Circuit breaker opened after {} consecutive failures",
                    state.consecutive_failures
                );
                state.trip();
            }
        }
    }

    /// Checks whether a call may proceed, moving Open to HalfOpen after the cooldown
    pub fn can_proceed(&self) -> ResilienceResult<()> {
        let mut state = self.state.lock().map_err(|_| ResilienceError::Poisoned)?;

        match state.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = state
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);

                if elapsed >= self.config.cooldown {
                    log::debug!("Circuit breaker half-open; probing backend");
                    state.state = CircuitState::HalfOpen;
                    state.half_open_successes = 0;
                    Ok(())
                } else {
                    Err(ResilienceError::CircuitBreakerOpen {
                        failures: state.consecutive_failures,
                        last_failure_ago: elapsed,
                    })
                }
            }
        }
    }

    /// Closes the breaker, e.g. once an independent probe saw the backend up
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = BreakerState::closed();
        }
    }
}
