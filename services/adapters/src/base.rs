//! # Base Adapter
//!
//! Shared lifecycle for every bridge adapter. A [`BridgeBackend`] supplies
//! the seven domain primitives; [`BaseAdapter`] wraps them with connection
//! tracking, timeouts, retries, performance metrics, a time-boxed data
//! cache and a validation-result cache.
//!
//! ## Connection state machine
//!
//! ```text
//! DISCONNECTED --connect--> CONNECTING --ok--> CONNECTED
//!                               |
//!                               +--fail--> DISCONNECTED
//! CONNECTED --health check--> CONNECTED (healthy | unhealthy)
//! any --disconnect--> DISCONNECTED
//! ```
//!
//! ## Failure boundary
//!
//! Primitives return [`crate::Result`]. Public operations never do: they log
//! the failure and return `false`, `None` or a backend-defined fallback.

use crate::cache::DataCache;
use crate::common::{
    coerce_primitive, AdapterInfo, ConnectionPhase, ConnectionState, ErrorDetails,
    PerformanceMetrics,
};
use crate::error::{AdapterError, Result};
use async_trait::async_trait;
use config::AdapterSettings;
use parking_lot::Mutex;
use resilience::{
    classify_severity, extract_message, is_recoverable, with_retry, with_timeout, DescribeError,
    RetryPolicy,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use twox_hash::xxh3::hash64;
use types::{current_millis, ValidationResult};

/// Characters of serialized payload kept in a validation cache key
const VALIDATION_KEY_PREFIX_CHARS: usize = 100;

/// Domain primitives supplied by a concrete adapter
#[async_trait]
pub trait BridgeBackend: Send + Sync {
    /// Payload extracted from and written to the store
    type Data: Clone + Serialize + Send + Sync + 'static;
    /// Point-in-time copy of a payload
    type Snapshot: Send + Sync;

    /// Establish access to the store
    async fn perform_connection(&self) -> Result<()>;

    /// Release access to the store
    async fn perform_disconnection(&self) -> Result<()>;

    /// Whether the store is still reachable
    async fn perform_health_check(&self) -> Result<bool>;

    /// Read the store into a payload
    async fn extract_data_from_system(&self) -> Result<Self::Data>;

    /// Write a payload back; `Ok(false)` means nothing could be written
    async fn update_data_to_system(&self, data: &Self::Data) -> Result<bool>;

    /// Check a payload's integrity; never fails
    fn validate_extracted_data(&self, data: &Self::Data) -> ValidationResult;

    /// Copy a payload; never fails
    fn create_data_snapshot(&self, data: &Self::Data) -> Self::Snapshot;

    /// Key under which extracted payloads are kept in the data cache
    fn cache_key(&self, _data: &Self::Data) -> Option<String> {
        None
    }
}

/// Lifecycle wrapper around a [`BridgeBackend`]
pub struct BaseAdapter<B: BridgeBackend> {
    backend: B,
    name: String,
    version: String,
    settings: AdapterSettings,
    retry_policy: RetryPolicy,
    state: Mutex<ConnectionState>,
    metrics: Mutex<PerformanceMetrics>,
    data_cache: DataCache<B::Data>,
    validation_cache: DataCache<Arc<ValidationResult>>,
}

impl<B: BridgeBackend> BaseAdapter<B> {
    /// Wrap `backend` under the given identity and settings
    pub fn new(
        backend: B,
        name: impl Into<String>,
        version: impl Into<String>,
        settings: AdapterSettings,
    ) -> Self {
        let retry_policy = RetryPolicy {
            max_retries: settings.max_retry_attempts,
            delay: settings.retry_delay(),
            backoff_multiplier: settings.backoff_multiplier,
            max_delay: settings.max_retry_delay(),
        };

        Self {
            data_cache: DataCache::new(settings.data_cache_ttl()),
            validation_cache: DataCache::new(settings.validation_cache_ttl()),
            backend,
            name: name.into(),
            version: version.into(),
            settings,
            retry_policy,
            state: Mutex::new(ConnectionState::default()),
            metrics: Mutex::new(PerformanceMetrics::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().is_connected
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Connect with timeout and retry
    ///
    /// Every attempt increments the attempt counter. Returns `false` once
    /// all attempts have failed.
    pub async fn connect(&self) -> bool {
        self.state.lock().phase = ConnectionPhase::Connecting;
        info!(adapter = %self.name, "Connecting");

        let this = self;
        let timeout = self.settings.timeout();
        let outcome = with_retry(
            move || async move {
                let attempt = {
                    let mut state = this.state.lock();
                    state.connection_attempts += 1;
                    state.connection_attempts
                };
                debug!(adapter = %this.name, attempt, "Connection attempt");
                with_timeout(
                    this.backend.perform_connection(),
                    timeout,
                    "Connection timed out",
                )
                .await
            },
            &self.retry_policy,
        )
        .await;

        let mut state = self.state.lock();
        match outcome {
            Ok(()) => {
                state.phase = ConnectionPhase::Connected;
                state.is_connected = true;
                state.last_connection_time = Some(current_millis());
                state.health_check_status = true;
                info!(
                    adapter = %self.name,
                    attempts = state.connection_attempts,
                    "Connected"
                );
                true
            }
            Err(e) => {
                state.phase = ConnectionPhase::Disconnected;
                state.is_connected = false;
                state.health_check_status = false;
                warn!(adapter = %self.name, error = %e, "Connection failed");
                false
            }
        }
    }

    /// Disconnect, clear adapter-local caches and reset connection state
    ///
    /// Never fails; a failing disconnection primitive is only logged.
    pub async fn disconnect(&self) {
        if let Err(e) = self.backend.perform_disconnection().await {
            warn!(adapter = %self.name, error = %e, "Disconnection primitive failed");
        }

        {
            let mut state = self.state.lock();
            state.phase = ConnectionPhase::Disconnected;
            state.is_connected = false;
            state.health_check_status = false;
        }
        self.data_cache.clear();
        self.validation_cache.clear();
        info!(adapter = %self.name, "Disconnected");
    }

    /// Time-boxed health probe; `false` without probing when disconnected
    pub async fn health_check(&self) -> bool {
        if !self.is_connected() {
            return false;
        }

        let healthy = match with_timeout(
            self.backend.perform_health_check(),
            self.settings.timeout(),
            "Health check timed out",
        )
        .await
        {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(adapter = %self.name, error = %e, "Health check failed");
                false
            }
        };

        let mut state = self.state.lock();
        state.last_health_check_time = Some(current_millis());
        state.health_check_status = healthy;
        debug!(adapter = %self.name, healthy, "Health check complete");
        healthy
    }

    // ========================================================================
    // DATA
    // ========================================================================

    /// Extract the store's current payload
    ///
    /// `None` when disconnected (the backend is not called) or when the
    /// extraction primitive fails.
    pub async fn extract_data(&self) -> Option<B::Data> {
        if !self.is_connected() {
            debug!(adapter = %self.name, "Extraction skipped: not connected");
            return None;
        }

        let started = Instant::now();
        match self.backend.extract_data_from_system().await {
            Ok(data) => {
                self.metrics.lock().record(true, started.elapsed());
                if let Some(key) = self.backend.cache_key(&data) {
                    self.data_cache.set(key, data.clone());
                }
                Some(data)
            }
            Err(e) => {
                self.metrics.lock().record(false, started.elapsed());
                let details = self.handle_error(&e, BTreeMap::new());
                warn!(
                    adapter = %self.name,
                    severity = %details.severity,
                    "Extraction failed: {}",
                    details.message
                );
                None
            }
        }
    }

    /// Write a payload back to the store
    pub async fn update_data(&self, data: &B::Data) -> bool {
        if !self.is_connected() {
            debug!(adapter = %self.name, "Update skipped: not connected");
            return false;
        }

        let started = Instant::now();
        let written = match self.backend.update_data_to_system(data).await {
            Ok(written) => written,
            Err(e) => {
                let details = self.handle_error(&e, BTreeMap::new());
                warn!(
                    adapter = %self.name,
                    severity = %details.severity,
                    "Update failed: {}",
                    details.message
                );
                false
            }
        };
        self.metrics.lock().record(written, started.elapsed());
        written
    }

    /// Validate a payload, reusing a cached report for identical payloads
    pub fn validate_data(&self, data: &B::Data) -> Arc<ValidationResult> {
        let key = match validation_cache_key(data) {
            Ok(key) => key,
            Err(e) => {
                warn!(adapter = %self.name, error = %e, "Payload not serializable, validating uncached");
                return Arc::new(self.backend.validate_extracted_data(data));
            }
        };

        if let Some(cached) = self.validation_cache.get(&key) {
            debug!(adapter = %self.name, "Validation cache hit");
            return cached;
        }

        let result = Arc::new(self.backend.validate_extracted_data(data));
        self.validation_cache.set(key, Arc::clone(&result));
        result
    }

    /// Point-in-time copy of a payload
    pub fn create_snapshot(&self, data: &B::Data) -> B::Snapshot {
        self.backend.create_data_snapshot(data)
    }

    // ========================================================================
    // ERRORS
    // ========================================================================

    /// Build a serializable error record
    ///
    /// `context` is merged over the adapter identity; every value is reduced
    /// to a JSON primitive.
    pub fn handle_error<E>(&self, err: &E, context: BTreeMap<String, Value>) -> ErrorDetails
    where
        E: DescribeError + ?Sized,
    {
        let mut merged = BTreeMap::new();
        merged.insert("adapterName".to_string(), Value::String(self.name.clone()));
        merged.insert("adapterVersion".to_string(), Value::String(self.version.clone()));
        merged.insert("isConnected".to_string(), Value::Bool(self.is_connected()));
        for (key, value) in context {
            merged.insert(key, coerce_primitive(value));
        }

        ErrorDetails {
            message: extract_message(err),
            severity: classify_severity(err),
            recoverable: is_recoverable(err),
            timestamp: current_millis(),
            context: merged,
        }
    }

    // ========================================================================
    // DATA CACHE
    // ========================================================================

    /// Fresh cached payload for `key`
    pub fn get_cached_data(&self, key: &str) -> Option<B::Data> {
        self.data_cache.get(key)
    }

    /// Cache a payload under `key` with the default data TTL
    pub fn set_cached_data(&self, key: impl Into<String>, data: B::Data) {
        self.data_cache.set(key, data);
    }

    /// Drop expired cache entries; fresh ones stay
    pub fn clear_data_cache(&self) -> usize {
        let removed = self.data_cache.clear_expired() + self.validation_cache.clear_expired();
        if removed > 0 {
            debug!(adapter = %self.name, removed, "Expired cache entries dropped");
        }
        removed
    }

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================

    pub fn connection_state(&self) -> ConnectionState {
        self.state.lock().clone()
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.metrics.lock().clone()
    }

    pub fn adapter_info(&self) -> AdapterInfo {
        let state = self.state.lock();
        AdapterInfo {
            name: self.name.clone(),
            version: self.version.clone(),
            phase: state.phase,
            healthy: state.health_check_status,
        }
    }

    pub fn reset_metrics(&self) {
        *self.metrics.lock() = PerformanceMetrics::default();
    }

    /// Record a metric sample for a write performed outside `update_data`
    pub(crate) fn record_operation(&self, success: bool, duration: std::time::Duration) {
        self.metrics.lock().record(success, duration);
    }
}

/// Truncated serialization plus a fingerprint of the whole serialization
fn validation_cache_key<T: Serialize>(data: &T) -> std::result::Result<String, AdapterError> {
    let serialized = serde_json::to_string(data)?;
    let prefix: String = serialized.chars().take(VALIDATION_KEY_PREFIX_CHARS).collect();
    Ok(format!("{}#{:016x}", prefix, hash64(serialized.as_bytes())))
}
