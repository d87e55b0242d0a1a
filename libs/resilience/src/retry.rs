//! Sequential retry with exponential backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry behaviour for [`with_retry`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Delay after the first failure
    pub delay: Duration,
    /// Growth factor applied after each failure
    pub backoff_multiplier: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(1000),
            backoff_multiplier: 1.5,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failure of attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or `policy.max_retries` attempts fail
///
/// Attempts never overlap. The first success short-circuits; after the last
/// failure that attempt's error is returned unchanged.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.max_retries.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Operation succeeded on attempt {}/{}", attempt, attempts);
                }
                return Ok(value);
            }
            Err(error) if attempt >= attempts => {
                warn!("Operation failed after {} attempts: {}", attempts, error);
                return Err(error);
            }
            Err(error) => {
                let delay = policy.delay_after(attempt);
                debug!(
                    "Attempt {}/{} failed: {} (retrying in {}ms)",
                    attempt,
                    attempts,
                    error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(300),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_operation_runs_exactly_max_retries_times() {
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(format!("failure {}", n)) }
            },
            &fast_policy(3),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), "failure 3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_short_circuits_remaining_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 2 {
                        Ok(n)
                    } else {
                        Err("not yet".to_string())
                    }
                }
            },
            &fast_policy(5),
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_and_is_capped() {
        let started = Instant::now();

        let _: Result<(), &str> = with_retry(|| async { Err("down") }, &fast_policy(4)).await;

        // 100 + 200 + 300 (capped from 400)
        assert_eq!(started.elapsed(), Duration::from_millis(600));
    }

    #[test]
    fn test_default_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1500));
        assert_eq!(policy.delay_after(20), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_zero_retries_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), &str> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("down") }
            },
            &fast_policy(0),
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
