//! Bridge Settings Module
//!
//! Typed settings for adapters, the transformation engine and logging.
//! Supports loading from TOML files with environment-specific overrides.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use types::TransformationStrategy;

/// Lifecycle settings for a single adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterSettings {
    /// Budget for each lifecycle primitive call
    pub timeout_ms: u64,
    /// Connection attempts before `connect()` gives up
    pub max_retry_attempts: u32,
    /// Delay before the second attempt
    pub retry_delay_ms: u64,
    /// Growth factor of the retry delay
    pub backoff_multiplier: f64,
    /// Upper bound for a single retry delay
    pub max_retry_delay_ms: u64,
    /// Health monitor cadence
    pub health_check_interval_ms: u64,
    /// TTL of the generic data cache
    pub data_cache_ttl_ms: u64,
    /// TTL of the validation cache
    pub validation_cache_ttl_ms: u64,
    /// Run document-structure validators during snapshot validation
    pub enable_auto_validation: bool,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::adapters::TIMEOUT_MS,
            max_retry_attempts: defaults::adapters::MAX_RETRY_ATTEMPTS,
            retry_delay_ms: defaults::adapters::RETRY_DELAY_MS,
            backoff_multiplier: defaults::adapters::BACKOFF_MULTIPLIER,
            max_retry_delay_ms: defaults::adapters::MAX_RETRY_DELAY_MS,
            health_check_interval_ms: defaults::adapters::EDITOR_HEALTH_CHECK_INTERVAL_MS,
            data_cache_ttl_ms: defaults::adapters::DATA_CACHE_TTL_MS,
            validation_cache_ttl_ms: defaults::adapters::VALIDATION_CACHE_TTL_MS,
            enable_auto_validation: true,
        }
    }
}

impl AdapterSettings {
    /// Defaults for the document editor adapter
    pub fn editor() -> Self {
        Self::default()
    }

    /// Defaults for the multi-step form adapter
    pub fn multi_step() -> Self {
        Self {
            health_check_interval_ms: defaults::adapters::MULTI_STEP_HEALTH_CHECK_INTERVAL_MS,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn data_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.data_cache_ttl_ms)
    }

    pub fn validation_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.validation_cache_ttl_ms)
    }

    /// Validate settings, naming the section in the error
    pub fn validate(&self, section: &str) -> Result<()> {
        if self.timeout_ms == 0 {
            bail!("{}.timeout_ms must be greater than 0", section);
        }
        if self.max_retry_attempts == 0 {
            bail!("{}.max_retry_attempts must be greater than 0", section);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            bail!("{}.backoff_multiplier must be at least 1.0", section);
        }
        if self.max_retry_delay_ms < self.retry_delay_ms {
            bail!(
                "{}.max_retry_delay_ms ({}) is below retry_delay_ms ({})",
                section,
                self.max_retry_delay_ms,
                self.retry_delay_ms
            );
        }
        if self.health_check_interval_ms == 0 {
            bail!("{}.health_check_interval_ms must be greater than 0", section);
        }
        Ok(())
    }
}

/// Options for the transformation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationSettings {
    pub strategy: TransformationStrategy,
    pub enable_caching: bool,
    pub validate_result: bool,
    pub include_metadata: bool,
    pub cache_ttl_ms: u64,
    pub sweep_interval_ms: u64,
    pub min_existing_content_len: usize,
}

impl Default for TransformationSettings {
    fn default() -> Self {
        Self {
            strategy: TransformationStrategy::Auto,
            enable_caching: true,
            validate_result: true,
            include_metadata: true,
            cache_ttl_ms: defaults::transformation::CACHE_TTL_MS,
            sweep_interval_ms: defaults::transformation::SWEEP_INTERVAL_MS,
            min_existing_content_len: defaults::transformation::MIN_EXISTING_CONTENT_LEN,
        }
    }
}

impl TransformationSettings {
    /// Same settings with a different strategy
    pub fn with_strategy(mut self, strategy: TransformationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            json: false,
        }
    }
}

/// Aggregate settings for a bridge session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub editor: AdapterSettings,
    pub multi_step: AdapterSettings,
    pub transformation: TransformationSettings,
    pub logging: LoggingSettings,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            editor: AdapterSettings::editor(),
            multi_step: AdapterSettings::multi_step(),
            transformation: TransformationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl BridgeSettings {
    /// Load settings from files with environment overrides
    ///
    /// Layers, lowest priority first: built-in defaults, `base_path` (if
    /// given), `<base dir>/environments/<environment>.toml` (if present),
    /// then `BRIDGE_<SECTION>__<KEY>` environment variables.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&BridgeSettings::default())
                .context("Failed to seed configuration defaults")?,
        );

        if let Some(base) = base_path {
            debug!("Loading bridge settings from {:?}", base);
            builder = builder.add_source(File::from(base).required(true));

            if let Some(env) = environment {
                let env_file = base
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("environments")
                    .join(format!("{}.toml", env));

                if env_file.exists() {
                    info!("Loading environment settings: {:?}", env_file);
                    builder = builder.add_source(File::from(env_file));
                } else {
                    warn!("Environment settings not found: {:?}", env_file);
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator(defaults::ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize bridge settings")
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.editor.validate("editor")?;
        self.multi_step.validate("multi_step")?;

        if self.transformation.cache_ttl_ms == 0 {
            bail!("transformation.cache_ttl_ms must be greater than 0");
        }
        if self.transformation.sweep_interval_ms == 0 {
            bail!("transformation.sweep_interval_ms must be greater than 0");
        }

        Ok(())
    }

    /// Render as TOML, e.g. to seed a settings file
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render settings as TOML")
    }
}

/// Convenience function to load and validate settings
pub fn load_settings(base_path: Option<&Path>, environment: Option<&str>) -> Result<BridgeSettings> {
    let settings = BridgeSettings::load(base_path, environment)?;
    settings.validate()?;
    Ok(settings)
}
