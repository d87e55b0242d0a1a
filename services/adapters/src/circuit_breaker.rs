//! Circuit breaker guarding reconnection attempts

use crate::error::AdapterError;
use config::defaults::adapters::{RECONNECT_FAILURE_THRESHOLD, RECONNECT_RECOVERY_MS};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Attempts pass through
    Closed,
    /// Attempts are rejected until the recovery window elapses
    Open,
    /// One probing attempt decides between closing and reopening
    HalfOpen,
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// Time spent open before a probe is allowed
    pub recovery_timeout: Duration,
    /// Successes needed to close from half-open
    pub success_threshold: u32,
    /// Failures tolerated while half-open
    pub half_open_max_failures: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: RECONNECT_FAILURE_THRESHOLD,
            recovery_timeout: Duration::from_millis(RECONNECT_RECOVERY_MS),
            success_threshold: 1,
            half_open_max_failures: 1,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    circuit: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker keyed to one adapter
///
/// State transitions happen under a short synchronous lock; nothing is held
/// across the guarded operation's await points.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,

    // Metrics
    total_requests: AtomicU64,
    total_failures: AtomicU64,
    circuit_opens: AtomicU64,
}

impl CircuitBreaker {
    /// Create a closed breaker for the named adapter
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState {
                circuit: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure_time: None,
            }),
            total_requests: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            circuit_opens: AtomicU64::new(0),
        }
    }

    /// Run `operation` through the breaker
    ///
    /// An operation reporting `false` counts as a failure.
    pub async fn call<F, Fut>(&self, operation: F) -> Result<bool, AdapterError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if !self.should_attempt() {
            return Err(AdapterError::CircuitBreakerOpen(self.name.clone()));
        }

        let succeeded = operation().await;
        if succeeded {
            self.on_success();
        } else {
            self.on_failure();
            self.total_failures.fetch_add(1, Ordering::Relaxed);
        }
        Ok(succeeded)
    }

    /// Whether an attempt may go ahead, moving Open → HalfOpen once the
    /// recovery window has elapsed
    pub fn should_attempt(&self) -> bool {
        let mut state = self.state.lock();

        match state.circuit {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => match state.last_failure_time {
                Some(failed_at) if failed_at.elapsed() >= self.config.recovery_timeout => {
                    state.circuit = CircuitState::HalfOpen;
                    state.failure_count = 0;
                    state.success_count = 0;
                    tracing::info!(adapter = %self.name, "Circuit breaker transitioning to half-open");
                    true
                }
                _ => false,
            },
        }
    }

    pub fn on_success(&self) {
        let mut state = self.state.lock();

        match state.circuit {
            CircuitState::HalfOpen => {
                state.success_count += 1;
                if state.success_count >= self.config.success_threshold {
                    state.circuit = CircuitState::Closed;
                    state.failure_count = 0;
                    tracing::info!(
                        adapter = %self.name,
                        "Circuit breaker closed after {} successes",
                        state.success_count
                    );
                }
            }
            CircuitState::Closed => state.failure_count = 0,
            CircuitState::Open => {}
        }
    }

    pub fn on_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());

        let threshold = match state.circuit {
            CircuitState::Closed => self.config.failure_threshold,
            CircuitState::HalfOpen => self.config.half_open_max_failures,
            CircuitState::Open => return,
        };

        if state.failure_count >= threshold {
            state.circuit = CircuitState::Open;
            self.circuit_opens.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                adapter = %self.name,
                "Circuit breaker opened after {} failures",
                state.failure_count
            );
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().circuit
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            circuit_opens: self.circuit_opens.load(Ordering::Relaxed),
            current_failure_count: self.state.lock().failure_count,
        }
    }

    /// Return to Closed with cleared counters
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.circuit = CircuitState::Closed;
        state.failure_count = 0;
        state.success_count = 0;
        state.last_failure_time = None;
    }
}

/// Metrics for circuit breaker monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerMetrics {
    pub total_requests: u64,
    pub total_failures: u64,
    pub circuit_opens: u64,
    /// Current consecutive failure count
    pub current_failure_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            "editor",
            CircuitBreakerConfig {
                failure_threshold: 2,
                recovery_timeout: Duration::from_secs(60),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_default_config_uses_reconnect_defaults() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_then_half_opens_then_closes() {
        let breaker = breaker();

        assert_eq!(breaker.call(|| async { false }).await.unwrap(), false);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.call(|| async { false }).await.unwrap(), false);
        assert_eq!(breaker.state(), CircuitState::Open);

        let rejected = breaker.call(|| async { true }).await;
        assert!(matches!(rejected, Err(AdapterError::CircuitBreakerOpen(name)) if name == "editor"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(breaker.call(|| async { true }).await.unwrap());
        assert_eq!(breaker.state(), CircuitState::Closed);

        let metrics = breaker.metrics();
        assert_eq!(metrics.total_requests, 4);
        assert_eq!(metrics.total_failures, 2);
        assert_eq!(metrics.circuit_opens, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let breaker = breaker();
        breaker.on_failure();
        breaker.on_failure();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(breaker.should_attempt());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.should_attempt());
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let breaker = breaker();
        breaker.on_failure();
        breaker.on_success();
        breaker.on_failure();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().current_failure_count, 1);

        breaker.reset();
        assert_eq!(breaker.metrics().current_failure_count, 0);
    }
}
