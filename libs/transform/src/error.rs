//! Transformation engine errors
//!
//! These never leave the engine's public entry points; they are rendered into
//! the `transformation_errors` list of a failure result.

use thiserror::Error;

/// Errors raised while converting a snapshot
#[derive(Debug, Error)]
pub enum TransformError {
    /// The input snapshot failed the shape check
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The produced result failed the shape check
    #[error("Invalid transformation result: {0}")]
    InvalidResult(String),

    /// Snapshot could not be serialized for cache keying
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TransformError>;
