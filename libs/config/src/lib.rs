//! # Form Bridge Centralized Configuration
//!
//! Default values and typed settings for every bridge component, so adapters
//! and the transformation engine never hardcode their own timeouts.
//!
//! ## Features
//!
//! - **Defaults**: adapter timeouts, retry policy, cache TTLs, engine windows
//! - **Typed settings**: [`AdapterSettings`], [`TransformationSettings`],
//!   [`LoggingSettings`] aggregated in [`BridgeSettings`]
//! - **Layered loading**: defaults, then an optional TOML file, then an
//!   optional environment override file, then `BRIDGE_*` variables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use config::{load_settings, AdapterSettings};
//!
//! let settings = load_settings(Some("config/bridge.toml".as_ref()), Some("production"))?;
//! assert!(settings.editor.timeout_ms > 0);
//!
//! let form = AdapterSettings::multi_step();
//! assert_eq!(form.health_check_interval_ms, 15_000);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod settings;

// Re-export commonly used types
pub use settings::{
    load_settings, AdapterSettings, BridgeSettings, LoggingSettings, TransformationSettings,
};
