//! # Bridge Resilience Utilities
//!
//! Small, dependency-light helpers every bridge component leans on:
//!
//! - **Message extraction**: [`extract_message`] renders any supported error
//!   payload as text and never fails
//! - **Classification**: [`classify_severity`] and [`is_recoverable`] apply
//!   keyword heuristics to that text for diagnostics
//! - **Timeouts**: [`with_timeout`] races an operation against a timer
//! - **Retries**: [`with_retry`] re-runs an operation with exponential backoff
//! - **Fault boundaries**: [`safely_execute`] / [`safely_execute_async`] turn
//!   failures into a logged fallback value
//!
//! Classification is for telemetry only; nothing here changes control flow
//! based on severity.
//!
//! ```rust
//! use resilience::{classify_severity, is_recoverable, ErrorSeverity};
//!
//! assert_eq!(classify_severity("fatal: store corrupted"), ErrorSeverity::Critical);
//! assert!(is_recoverable("network timeout while reading store"));
//! assert!(!is_recoverable("connection refused: permission denied"));
//! ```

pub mod classify;
pub mod retry;
pub mod safe;
pub mod timeout;

pub use classify::{
    classify_message, classify_severity, extract_message, is_recoverable, is_recoverable_message,
    DescribeError, ErrorSeverity,
};
pub use retry::{with_retry, RetryPolicy};
pub use safe::{safely_execute, safely_execute_async};
pub use timeout::{with_timeout, TimeoutError};
