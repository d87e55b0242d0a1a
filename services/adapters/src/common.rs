//! # Common Adapter Records
//!
//! Connection state, performance metrics and diagnostic records shared by
//! every bridge adapter.

use resilience::ErrorSeverity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// ============================================================================
// CONNECTION STATE
// ============================================================================

/// Lifecycle phase of an adapter connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionPhase {
    /// Not connected
    #[default]
    Disconnected,
    /// Connection primitive in flight
    Connecting,
    /// Connected; health is tracked separately
    Connected,
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionPhase::Disconnected => write!(f, "DISCONNECTED"),
            ConnectionPhase::Connecting => write!(f, "CONNECTING"),
            ConnectionPhase::Connected => write!(f, "CONNECTED"),
        }
    }
}

/// Connection bookkeeping owned by a single adapter
///
/// A failed health check flips `health_check_status` but never leaves
/// [`ConnectionPhase::Connected`]; only `disconnect` does that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    /// Current phase
    pub phase: ConnectionPhase,
    /// Mirror of `phase == Connected`
    pub is_connected: bool,
    /// Time of the last successful connection (ms since epoch)
    pub last_connection_time: Option<i64>,
    /// Connection attempts made, successful or not
    pub connection_attempts: u32,
    /// Time of the last completed health check (ms since epoch)
    pub last_health_check_time: Option<i64>,
    /// Result of the last health check
    pub health_check_status: bool,
}

// ============================================================================
// METRICS
// ============================================================================

/// Extract/update timing statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Operations recorded
    pub total_operations: u64,
    /// Operations that succeeded
    pub successful_operations: u64,
    /// Operations that failed
    pub failed_operations: u64,
    /// Running average duration
    pub average_response_time_ms: f64,
    /// Duration of the most recent operation
    pub last_operation_duration_ms: f64,
}

impl PerformanceMetrics {
    /// Record one operation
    ///
    /// `new_avg = (old_avg * old_total + duration) / new_total`
    pub fn record(&mut self, success: bool, duration: Duration) {
        let duration_ms = duration.as_secs_f64() * 1000.0;
        let old_total = self.total_operations as f64;

        self.total_operations += 1;
        if success {
            self.successful_operations += 1;
        } else {
            self.failed_operations += 1;
        }

        self.average_response_time_ms = (self.average_response_time_ms * old_total + duration_ms)
            / self.total_operations as f64;
        self.last_operation_duration_ms = duration_ms;
    }

    /// Fraction of successful operations, 1.0 when nothing was recorded
    pub fn success_rate(&self) -> f64 {
        if self.total_operations == 0 {
            1.0
        } else {
            self.successful_operations as f64 / self.total_operations as f64
        }
    }
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Identity and phase of an adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterInfo {
    /// Adapter name
    pub name: String,
    /// Adapter version
    pub version: String,
    /// Current phase
    pub phase: ConnectionPhase,
    /// Result of the last health check
    pub healthy: bool,
}

/// Serializable error record produced by `handle_error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// Extracted message
    pub message: String,
    /// Keyword-derived severity
    pub severity: ErrorSeverity,
    /// Keyword-derived recoverability
    pub recoverable: bool,
    /// Time the error was handled (ms since epoch)
    pub timestamp: i64,
    /// Context values, all JSON primitives
    pub context: BTreeMap<String, Value>,
}

/// Reduce a JSON value to a primitive
///
/// Strings, numbers, booleans and null pass through; arrays and objects
/// become their compact JSON text.
pub fn coerce_primitive(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        primitive => primitive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_running_average() {
        let mut metrics = PerformanceMetrics::default();
        metrics.record(true, Duration::from_millis(10));
        metrics.record(false, Duration::from_millis(30));
        metrics.record(true, Duration::from_millis(20));

        assert_eq!(metrics.total_operations, 3);
        assert_eq!(metrics.successful_operations, 2);
        assert_eq!(metrics.failed_operations, 1);
        assert!((metrics.average_response_time_ms - 20.0).abs() < 1e-9);
        assert!((metrics.last_operation_duration_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_coerce_primitive() {
        assert_eq!(coerce_primitive(json!("x")), json!("x"));
        assert_eq!(coerce_primitive(json!(1.5)), json!(1.5));
        assert_eq!(coerce_primitive(Value::Null), Value::Null);
        assert_eq!(coerce_primitive(json!([1, 2])), json!("[1,2]"));
        assert_eq!(coerce_primitive(json!({"a": true})), json!(r#"{"a":true}"#));
    }
}
