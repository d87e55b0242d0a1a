//! Fault boundaries that trade an error for a fallback value

use crate::classify::{classify_severity, extract_message, DescribeError};
use std::future::Future;
use std::time::Instant;
use tracing::error;

/// Run a synchronous operation, returning `fallback` if it fails
///
/// Failures are logged with the operation name, extracted message, severity
/// and elapsed time. Never propagates.
pub fn safely_execute<T, E, F>(operation: F, fallback: T, operation_name: &str) -> T
where
    F: FnOnce() -> Result<T, E>,
    E: DescribeError,
{
    let started = Instant::now();
    match operation() {
        Ok(value) => value,
        Err(err) => {
            report(operation_name, &err, started);
            fallback
        }
    }
}

/// Async counterpart of [`safely_execute`]
pub async fn safely_execute_async<T, E, Fut>(operation: Fut, fallback: T, operation_name: &str) -> T
where
    Fut: Future<Output = Result<T, E>>,
    E: DescribeError,
{
    let started = Instant::now();
    match operation.await {
        Ok(value) => value,
        Err(err) => {
            report(operation_name, &err, started);
            fallback
        }
    }
}

fn report<E: DescribeError>(operation_name: &str, err: &E, started: Instant) {
    error!(
        operation = operation_name,
        severity = %classify_severity(err),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Operation failed: {}",
        extract_message(err)
    );
}
