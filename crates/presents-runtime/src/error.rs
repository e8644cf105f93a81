#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while running a store.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A single tick queued more cycles than the configured limit.
    ///
    /// Usually a presenter or `update` that re-sends its own action forever.
    #[error("cascade limit reached: {limit} cycles in one tick")]
    CascadeLimit { limit: usize },

    /// Returned by `Store::try_with_config` and `Store::with_config_file`.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating a [`RuntimeConfig`](crate::RuntimeConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "policy-config")]
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "policy-config")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    /// The file extension is neither `toml` nor `json`.
    #[error("unknown config format: {}", .0.display())]
    UnknownFormat(PathBuf),
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
