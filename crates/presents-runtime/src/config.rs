#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! With the `policy-config` feature, a [`RuntimeConfig`] can be loaded from
//! TOML or JSON. Missing keys keep their defaults:
//!
//! ```toml
//! dropped_actions = "panic"
//! max_cycles_per_tick = 256
//! poll_timeout_ms = 10
//! ```

use std::time::Duration;

#[cfg(feature = "policy-config")]
use std::path::Path;

use crate::error::ConfigError;

/// What to do with a child action addressed to an identity that cannot
/// receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum DroppedActionPolicy {
    /// Drop silently.
    Ignore,
    /// Drop and log a warning.
    #[default]
    Warn,
    /// Panic. Meant for strict test suites.
    Panic,
}

/// Configuration for the store runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Handling of child actions addressed to inactive identities.
    pub dropped_actions: DroppedActionPolicy,
    /// Bound on cycles processed by one `Store::tick`.
    pub max_cycles_per_tick: usize,
    /// How long the blocking run loop waits for scheduler deliveries.
    pub poll_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dropped_actions: DroppedActionPolicy::Warn,
            max_cycles_per_tick: 1024,
            poll_timeout: Duration::from_millis(50),
        }
    }
}

impl RuntimeConfig {
    /// Configuration for test suites: dropped actions panic.
    #[must_use]
    pub fn strict() -> Self {
        Self::default().with_dropped_actions(DroppedActionPolicy::Panic)
    }

    #[must_use]
    pub fn with_dropped_actions(mut self, policy: DroppedActionPolicy) -> Self {
        self.dropped_actions = policy;
        self
    }

    #[must_use]
    pub fn with_max_cycles_per_tick(mut self, limit: usize) -> Self {
        self.max_cycles_per_tick = limit;
        self
    }

    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Reject settings the store cannot run with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when `max_cycles_per_tick` is zero, which
    /// would fail every tick that has work queued.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cycles_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "max_cycles_per_tick must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "policy-config")]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    dropped_actions: Option<DroppedActionPolicy>,
    max_cycles_per_tick: Option<usize>,
    poll_timeout_ms: Option<u64>,
}

#[cfg(feature = "policy-config")]
impl ConfigFile {
    fn resolve(self) -> Result<RuntimeConfig, ConfigError> {
        let mut config = RuntimeConfig::default();
        if let Some(policy) = self.dropped_actions {
            config.dropped_actions = policy;
        }
        if let Some(limit) = self.max_cycles_per_tick {
            config.max_cycles_per_tick = limit;
        }
        if let Some(ms) = self.poll_timeout_ms {
            config.poll_timeout = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "policy-config")]
impl RuntimeConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str::<ConfigFile>(text)?.resolve()
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<ConfigFile>(text)?.resolve()
    }

    /// Load a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(ConfigError::UnknownFormat(path.to_path_buf())),
        }
    }
}
