//! Background health monitoring and reconnection

use crate::base::{BaseAdapter, BridgeBackend};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodic health checker for one adapter
///
/// Every tick drops the adapter's expired cache entries. While the adapter is
/// connected the tick then runs a health check; while it is disconnected it
/// attempts a reconnect through a circuit breaker.
/// The task holds only a weak reference and exits once the adapter is gone,
/// on [`HealthMonitor::shutdown`], or when the monitor is dropped.
pub struct HealthMonitor {
    breaker: Arc<CircuitBreaker>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: JoinHandle<()>,
}

impl HealthMonitor {
    /// Monitor `adapter` every `interval` with the default reconnect breaker
    pub fn spawn<B>(adapter: &Arc<BaseAdapter<B>>, interval: Duration) -> Self
    where
        B: BridgeBackend + 'static,
    {
        Self::spawn_with_breaker(adapter, interval, CircuitBreakerConfig::default())
    }

    pub fn spawn_with_breaker<B>(
        adapter: &Arc<BaseAdapter<B>>,
        interval: Duration,
        breaker_config: CircuitBreakerConfig,
    ) -> Self
    where
        B: BridgeBackend + 'static,
    {
        let name = adapter.name().to_string();
        let breaker = Arc::new(CircuitBreaker::new(name.clone(), breaker_config));
        let weak: Weak<BaseAdapter<B>> = Arc::downgrade(adapter);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let period = interval.max(Duration::from_millis(1));

        let task_breaker = Arc::clone(&breaker);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        let Some(adapter) = weak.upgrade() else {
                            break;
                        };
                        run_tick(&adapter, &task_breaker).await;
                    }
                }
            }
            debug!(adapter = %name, "Health monitor stopped");
        });

        info!(
            adapter = %adapter.name(),
            "Health monitor started ({}ms interval)",
            period.as_millis()
        );
        Self {
            breaker,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// Breaker guarding reconnects
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Stop the monitor and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        let _ = (&mut self.task).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_tick<B: BridgeBackend>(adapter: &BaseAdapter<B>, breaker: &CircuitBreaker) {
    adapter.clear_data_cache();

    if adapter.is_connected() {
        let healthy = adapter.health_check().await;
        if !healthy {
            warn!(adapter = %adapter.name(), "Adapter unhealthy");
        }
        return;
    }

    match breaker.call(|| adapter.connect()).await {
        Ok(true) => info!(adapter = %adapter.name(), "Reconnected"),
        Ok(false) => {
            if breaker.state() == CircuitState::Open {
                warn!(adapter = %adapter.name(), "Reconnect failing, backing off");
            }
        }
        Err(e) => debug!(adapter = %adapter.name(), "Reconnect skipped: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::InMemoryEditorStore;
    use config::AdapterSettings;
    use types::EditorStateSnapshot;

    fn quick_settings() -> AdapterSettings {
        AdapterSettings {
            max_retry_attempts: 1,
            timeout_ms: 10,
            ..AdapterSettings::editor()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_reconnects_when_store_returns() {
        let store = InMemoryEditorStore::new();
        store.set_available(false);
        let adapter = Arc::new(BaseAdapter::editor(Arc::new(store.clone()), quick_settings()));

        let monitor = HealthMonitor::spawn(&adapter, Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!adapter.is_connected());

        store.set_available(true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(adapter.is_connected());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(adapter.connection_state().last_health_check_time.is_some());

        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_breaker_suppresses_reconnects() {
        let store = InMemoryEditorStore::new();
        store.set_available(false);
        let adapter = Arc::new(BaseAdapter::editor(Arc::new(store.clone()), quick_settings()));

        let monitor = HealthMonitor::spawn_with_breaker(
            &adapter,
            Duration::from_millis(100),
            CircuitBreakerConfig {
                failure_threshold: 2,
                recovery_timeout: Duration::from_secs(60),
                ..Default::default()
            },
        );

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(monitor.breaker().state(), CircuitState::Open);
        let attempts = adapter.connection_state().connection_attempts;
        assert_eq!(attempts, 2);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(adapter.connection_state().connection_attempts, attempts);

        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_drops_expired_cache_entries() {
        let adapter = Arc::new(BaseAdapter::editor(
            Arc::new(InMemoryEditorStore::new()),
            AdapterSettings {
                data_cache_ttl_ms: 50,
                ..quick_settings()
            },
        ));
        adapter.set_cached_data("stale", EditorStateSnapshot::fallback(1));
        assert!(adapter.get_cached_data("stale").is_some());

        let monitor = HealthMonitor::spawn(&adapter, Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(adapter.clear_data_cache(), 0);
        assert!(adapter.get_cached_data("stale").is_none());

        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_exits_when_adapter_dropped() {
        let adapter = Arc::new(BaseAdapter::editor(
            Arc::new(InMemoryEditorStore::new()),
            quick_settings(),
        ));
        let monitor = HealthMonitor::spawn(&adapter, Duration::from_millis(50));

        drop(adapter);
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(monitor.is_finished());
    }
}
