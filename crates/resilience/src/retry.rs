//! Retry policies with exponential backoff

use std::future::Future;
use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first attempt)
    max_attempts: usize,
    /// Initial delay between retries
    initial_delay: Duration,
    /// Maximum delay between retries
    max_delay: Duration,
    /// Backoff multiplier
    multiplier: f64,
}

impl RetryPolicy {
    /// Creates a new retry policy
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Sets the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay before retry number `attempt` (1-based)
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_millis() as f64
            * self.multiplier.powi((attempt - 1) as i32);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_delay as u64)
    }

    /// Returns the maximum number of attempts
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Returns true if another attempt may follow `attempts_made`
    fn allows_retry(&self, attempts_made: usize) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Runs an async operation, retrying failures that `is_retryable` accepts
///
/// Returns the first success, or the error of the last attempt.
pub async fn with_retry<F, Fut, T, E, R>(
    policy: &RetryPolicy,
    is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if policy.allows_retry(attempt) && is_retryable(&e) => {
                let delay = policy.delay_for_attempt(attempt);
                log::debug!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    policy.max_attempts(),
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::new(5)
            .with_initial_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(60));

        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.multiplier, 2.0);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
        assert!(!RetryPolicy::no_retry().allows_retry(1));
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::new(4).with_initial_delay(Duration::from_millis(100));

        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_max_delay_capping() {
        let policy = RetryPolicy::new(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_with_retry_success_after_failures() {
        let policy = RetryPolicy::new(3).with_initial_delay(Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result = with_retry(&policy, |_: &String| true, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(format!("temporary error {}", n))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_returns_last_error() {
        let policy = RetryPolicy::new(3).with_initial_delay(Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result: Result<(), String> = with_retry(&policy, |_| true, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(format!("failure {}", n))
        })
        .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_permanent_error() {
        let policy = RetryPolicy::new(5).with_initial_delay(Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result: Result<(), String> = with_retry(
            &policy,
            |e: &String| !e.starts_with("permanent"),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("permanent: bad request".to_string())
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
