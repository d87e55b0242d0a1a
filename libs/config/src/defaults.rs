//! Default configuration values
//!
//! Constants used across the bridge for consistency.

/// Adapter lifecycle defaults
pub mod adapters {
    /// Budget for a single primitive call (milliseconds)
    pub const TIMEOUT_MS: u64 = 5_000;

    /// Connection attempts before giving up
    pub const MAX_RETRY_ATTEMPTS: u32 = 3;

    /// Delay before the second connection attempt (milliseconds)
    pub const RETRY_DELAY_MS: u64 = 1_000;

    /// Growth factor applied to the retry delay after each failure
    pub const BACKOFF_MULTIPLIER: f64 = 1.5;

    /// Upper bound for a single retry delay (milliseconds)
    pub const MAX_RETRY_DELAY_MS: u64 = 10_000;

    /// Health check cadence for the editor adapter (milliseconds)
    pub const EDITOR_HEALTH_CHECK_INTERVAL_MS: u64 = 30_000;

    /// Health check cadence for the multi-step adapter (milliseconds)
    pub const MULTI_STEP_HEALTH_CHECK_INTERVAL_MS: u64 = 15_000;

    /// TTL of the adapter's generic data cache (milliseconds)
    pub const DATA_CACHE_TTL_MS: u64 = 5 * 60 * 1_000;

    /// TTL of the adapter's validation cache (milliseconds)
    pub const VALIDATION_CACHE_TTL_MS: u64 = 60 * 1_000;

    /// Consecutive reconnect failures before the monitor's breaker opens
    pub const RECONNECT_FAILURE_THRESHOLD: u32 = 5;

    /// Time the monitor's breaker stays open (milliseconds)
    pub const RECONNECT_RECOVERY_MS: u64 = 60_000;
}

/// Transformation engine defaults
pub mod transformation {
    /// Lifetime of a cached transformation result (milliseconds)
    pub const CACHE_TTL_MS: u64 = 5 * 60 * 1_000;

    /// Interval of the background expiry sweep (milliseconds)
    pub const SWEEP_INTERVAL_MS: u64 = 60 * 1_000;

    /// Trimmed length the explicit existing-content strategy must exceed
    pub const MIN_EXISTING_CONTENT_LEN: usize = 100;
}

/// Logging defaults
pub mod logging {
    /// Fallback filter when `RUST_LOG` is unset
    pub const LEVEL: &str = "info";
}

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "BRIDGE";

/// Separator between nested keys in environment overrides
pub const ENV_SEPARATOR: &str = "__";
