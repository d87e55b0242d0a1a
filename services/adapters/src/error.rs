//! Error types for the bridge adapters

use resilience::{classify_message, is_recoverable_message, ErrorSeverity, TimeoutError};
use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors raised by adapter primitives
///
/// Public adapter operations never return these; they are logged, turned
/// into [`crate::ErrorDetails`] and converted into a fallback value.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A connection primitive reported failure
    #[error("Connection failed for {adapter}: {reason}")]
    ConnectionFailed {
        /// Adapter that failed to connect
        adapter: String,
        /// Reason for the failure
        reason: String,
    },

    /// An operation exceeded its time budget
    #[error("Operation timeout: {0}")]
    Timeout(#[from] TimeoutError),

    /// Operation requires a connected adapter
    #[error("Adapter {0} is not connected")]
    NotConnected(String),

    /// The wrapped store could not be read
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A setter the operation depends on is absent
    #[error("Missing setter: {0}")]
    MissingSetter(&'static str),

    /// The store exposes none of the capabilities the adapter needs
    #[error("Store capability missing: {0}")]
    MissingCapability(String),

    /// A setter was present but failed
    #[error("Setter {setter} failed: {reason}")]
    SetterFailed {
        /// Setter name
        setter: &'static str,
        /// Error reported by the store
        reason: String,
    },

    /// Payload rejected before it reached the store
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Snapshot could not be produced
    #[error("Snapshot creation failed: {0}")]
    SnapshotFailed(String),

    /// Reconnection suppressed by the circuit breaker
    #[error("Circuit breaker open for {0}")]
    CircuitBreakerOpen(String),

    /// JSON (de)serialization error
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdapterError {
    /// Build a store error keeping the full context chain
    pub fn store(err: anyhow::Error) -> Self {
        AdapterError::StoreUnavailable(format!("{:#}", err))
    }

    /// Whether the rendered message looks transient
    pub fn is_recoverable(&self) -> bool {
        is_recoverable_message(&self.to_string())
    }

    /// Severity of the rendered message
    pub fn severity(&self) -> ErrorSeverity {
        classify_message(&self.to_string())
    }

    /// Errors that no amount of retrying will fix
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AdapterError::MissingSetter(_)
                | AdapterError::MissingCapability(_)
                | AdapterError::InvalidPayload(_)
        )
    }
}

impl resilience::DescribeError for AdapterError {
    fn describe(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_classification_follows_rendered_message() {
        let err = AdapterError::ConnectionFailed {
            adapter: "editor".to_string(),
            reason: "store busy".to_string(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::High);

        let timeout = AdapterError::from(TimeoutError::new("health check", Duration::from_secs(1)));
        assert!(timeout.is_recoverable());
    }

    #[test]
    fn test_missing_setter_is_permanent() {
        let err = AdapterError::MissingSetter("set_completed_content");
        assert!(err.is_permanent());
        assert!(!err.is_recoverable());
    }
}
