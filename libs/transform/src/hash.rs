//! Non-cryptographic content fingerprints
//!
//! Cache keys and integrity checks use 64-bit xxh3. Collisions are unlikely
//! but not impossible, so every cache read re-verifies what it returns.

use crate::error::Result;
use serde::Serialize;
use twox_hash::xxh3::hash64;

/// Fingerprint of raw bytes
pub fn fingerprint(bytes: &[u8]) -> u64 {
    hash64(bytes)
}

/// Fingerprint of a value's JSON serialization
pub fn fingerprint_of<T: Serialize + ?Sized>(value: &T) -> Result<u64> {
    let bytes = serde_json::to_vec(value)?;
    Ok(hash64(&bytes))
}

/// Zero-padded lowercase hex rendering
pub fn to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

/// Fingerprint of editor content together with its completion flag
pub fn content_fingerprint(content: &str, is_completed: bool) -> u64 {
    let mut buf = Vec::with_capacity(content.len() + 2);
    buf.extend_from_slice(content.as_bytes());
    buf.push(0);
    buf.push(u8::from(is_completed));
    hash64(&buf)
}

/// Fixed-format descriptor: `len:<bytes>;completed:<bool>;fp:<16 hex digits>`
pub fn integrity_descriptor(content: &str, is_completed: bool) -> String {
    format!(
        "len:{};completed:{};fp:{}",
        content.len(),
        is_completed,
        to_hex(content_fingerprint(content, is_completed))
    )
}
