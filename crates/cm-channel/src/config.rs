//! Channel configuration with validation.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CM_HOST` | `localhost` | Host identifier embedded in call ids |
//! | `CM_CALL_TIMEOUT_MS` | `10000` | Default call timeout |
//! | `CM_TARGET_ORIGIN` | `*` | Default target origin for requests and responses |

use serde::{Deserialize, Serialize};
use shared_types::ANY_ORIGIN;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default call timeout in milliseconds.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// Default host identifier.
pub const DEFAULT_HOST: &str = "localhost";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("host identifier cannot be empty")]
    EmptyHost,

    #[error("default timeout cannot be 0")]
    ZeroTimeout,

    #[error("default target origin cannot be empty")]
    EmptyTargetOrigin,

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Host identifier of this execution context (e.g. `location.host`).
    pub host: String,
    /// Timeout applied when a call does not specify one.
    pub default_timeout_ms: u64,
    /// Origin requests and responses are posted to unless overridden.
    pub default_target_origin: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            default_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            default_target_origin: ANY_ORIGIN.to_string(),
        }
    }
}

impl ChannelConfig {
    /// Configuration for a context identified by `host`.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = env::var("CM_HOST") {
            config.host = host;
        }

        if let Ok(value) = env::var("CM_CALL_TIMEOUT_MS") {
            config.default_timeout_ms =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: "CM_CALL_TIMEOUT_MS",
                        value,
                    })?;
        }

        if let Ok(origin) = env::var("CM_TARGET_ORIGIN") {
            config.default_target_origin = origin;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.default_target_origin.is_empty() {
            return Err(ConfigError::EmptyTargetOrigin);
        }
        Ok(())
    }

    /// Default timeout as a `Duration`.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
