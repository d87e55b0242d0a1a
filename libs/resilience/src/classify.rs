//! Error message extraction and keyword classification

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const CRITICAL_KEYWORDS: &[&str] = &["critical", "fatal", "crash", "corruption"];
const HIGH_KEYWORDS: &[&str] = &["error", "failed", "exception", "abort"];
const MEDIUM_KEYWORDS: &[&str] = &["warning", "deprecated", "invalid"];

const TRANSIENT_KEYWORDS: &[&str] = &[
    "network",
    "timeout",
    "connection",
    "fetch",
    "abort",
    "temporary",
    "retry",
    "busy",
    "unavailable",
];
const PERMANENT_KEYWORDS: &[&str] = &["permission", "unauthorized", "forbidden", "not found"];

const UNKNOWN_ERROR: &str = "Unknown error";

/// Severity tiers used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Anything the bridge may receive as an error payload
///
/// Implemented for plain strings, JSON values (where a `message` field wins),
/// `anyhow::Error` (full context chain) and the common error types.
pub trait DescribeError {
    /// Best-effort human-readable message
    fn describe(&self) -> String;
}

impl DescribeError for str {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl DescribeError for String {
    fn describe(&self) -> String {
        self.clone()
    }
}

impl DescribeError for Value {
    fn describe(&self) -> String {
        match self {
            Value::String(text) => text.clone(),
            Value::Object(map) => match map.get("message") {
                Some(Value::String(message)) => message.clone(),
                Some(Value::Null) | None => self.to_string(),
                Some(other) => other.to_string(),
            },
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl DescribeError for anyhow::Error {
    fn describe(&self) -> String {
        format!("{:#}", self)
    }
}

impl DescribeError for dyn std::error::Error + Send + Sync + 'static {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl DescribeError for std::io::Error {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl DescribeError for serde_json::Error {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl DescribeError for tokio::time::error::Elapsed {
    fn describe(&self) -> String {
        format!("timeout: {}", self)
    }
}

impl<T: DescribeError + ?Sized> DescribeError for &T {
    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: DescribeError + ?Sized> DescribeError for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Extract a message from an error payload, never failing
pub fn extract_message<E: DescribeError + ?Sized>(err: &E) -> String {
    let message = err.describe();
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

/// Severity of a raw message; first matching tier wins, checked from critical down
pub fn classify_message(message: &str) -> ErrorSeverity {
    let lowered = message.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if contains_any(CRITICAL_KEYWORDS) {
        ErrorSeverity::Critical
    } else if contains_any(HIGH_KEYWORDS) {
        ErrorSeverity::High
    } else if contains_any(MEDIUM_KEYWORDS) {
        ErrorSeverity::Medium
    } else {
        ErrorSeverity::Low
    }
}

/// Severity of an error payload
pub fn classify_severity<E: DescribeError + ?Sized>(err: &E) -> ErrorSeverity {
    classify_message(&extract_message(err))
}

/// Transient keyword present and no permanent keyword present
pub fn is_recoverable_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    let transient = TRANSIENT_KEYWORDS.iter().any(|k| lowered.contains(k));
    let permanent = PERMANENT_KEYWORDS.iter().any(|k| lowered.contains(k));
    transient && !permanent
}

/// Whether an error payload looks worth retrying
pub fn is_recoverable<E: DescribeError + ?Sized>(err: &E) -> bool {
    is_recoverable_message(&extract_message(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_message_from_supported_payloads() {
        assert_eq!(extract_message("plain"), "plain");
        assert_eq!(extract_message(&"owned".to_string()), "owned");
        assert_eq!(extract_message(&json!({ "message": "from object" })), "from object");
        assert_eq!(extract_message(&json!({ "code": 7 })), r#"{"code":7}"#);
        assert_eq!(extract_message(&json!(42)), "42");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert_eq!(extract_message(&io), "disk gone");
    }

    #[test]
    fn test_extract_message_keeps_anyhow_context() {
        let err = anyhow::anyhow!("socket closed").context("store read failed");
        assert_eq!(extract_message(&err), "store read failed: socket closed");
    }

    #[test]
    fn test_extract_message_never_returns_empty() {
        assert_eq!(extract_message(""), "Unknown error");
        assert_eq!(extract_message(&Value::Null), "Unknown error");
    }

    #[test]
    fn test_severity_tiers_checked_in_order() {
        assert_eq!(classify_severity("fatal error"), ErrorSeverity::Critical);
        assert_eq!(classify_severity("Request FAILED"), ErrorSeverity::High);
        assert_eq!(classify_severity("invalid payload"), ErrorSeverity::Medium);
        assert_eq!(classify_severity("something odd"), ErrorSeverity::Low);
        // "error" is high, but "corruption" wins
        assert_eq!(classify_severity("error: data corruption"), ErrorSeverity::Critical);
    }

    #[test]
    fn test_recoverability_requires_transient_without_permanent() {
        assert!(is_recoverable("Network unavailable"));
        assert!(is_recoverable("store busy, retry later"));
        assert!(!is_recoverable("unauthorized connection"));
        assert!(!is_recoverable("field not found"));
        assert!(!is_recoverable("validation failed"));
    }
}
