//! Timeout racing for lifecycle primitives

use crate::classify::DescribeError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Raised when an operation exceeds its budget
///
/// Displays as the caller-supplied message only, so callers can match on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TimeoutError {
    /// Caller-supplied description
    pub message: String,
    /// Budget that was exceeded
    pub timeout_ms: u64,
}

impl TimeoutError {
    pub fn new(message: impl Into<String>, budget: Duration) -> Self {
        Self {
            message: message.into(),
            timeout_ms: budget.as_millis() as u64,
        }
    }
}

impl DescribeError for TimeoutError {
    fn describe(&self) -> String {
        self.message.clone()
    }
}

/// Race `operation` against a timer of `budget`
///
/// On expiry the operation future is dropped and `message` is returned as a
/// [`TimeoutError`] converted into the caller's error type.
///
/// Expiry cancels the operation; it is not left running in the background.
/// Work done before its last suspension point stays done, and nothing after
/// it runs. Callers must not count on a timed-out write completing later,
/// and primitives must tolerate being stopped between suspension points.
pub async fn with_timeout<F, T, E>(operation: F, budget: Duration, message: &str) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match timeout(budget, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!("Operation timed out after {}ms: {}", budget.as_millis(), message);
            Err(E::from(TimeoutError::new(message, budget)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_never_resolving_operation_times_out_with_message() {
        let started = Instant::now();

        let result: Result<(), TimeoutError> =
            with_timeout(pending(), Duration::from_millis(50), "X").await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "X");
        assert_eq!(err.timeout_ms, 50);
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_operation_does_not_finish_later() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let result: Result<(), TimeoutError> = with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
            Duration::from_millis(50),
            "write timed out",
        )
        .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fast_operation_passes_through() {
        let result: Result<u32, TimeoutError> =
            with_timeout(async { Ok(7) }, Duration::from_millis(50), "slow").await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_operation_error_is_preserved() {
        #[derive(Debug, PartialEq)]
        enum Failure {
            Inner,
            Timeout,
        }
        impl From<TimeoutError> for Failure {
            fn from(_: TimeoutError) -> Self {
                Failure::Timeout
            }
        }

        let result: Result<(), Failure> =
            with_timeout(async { Err(Failure::Inner) }, Duration::from_secs(1), "slow").await;
        assert_eq!(result.unwrap_err(), Failure::Inner);
    }
}
