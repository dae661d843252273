//! # Channel Telemetry
//!
//! Structured logging setup for hosts embedding the cross-document RPC
//! channel. The channel crates only emit `tracing` events; this crate
//! installs the subscriber that renders them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cm_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CM_SERVICE_NAME` | `cors-msg` | Service name in the startup line |
//! | `CM_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `CM_JSON_LOGS` | `false` | JSON formatted output |
//! | `CM_LOG_ANSI` | `true` | Coloured plain output |

mod config;
mod logging;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::env_filter;

#[doc(hidden)]
pub use tracing;

use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("telemetry already initialized")]
    AlreadyInitialized,

    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

/// Install the global tracing subscriber.
///
/// Only the first call in a process installs anything; later calls return
/// [`TelemetryError::AlreadyInitialized`].
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TelemetryError::AlreadyInitialized);
    }

    if let Err(e) = logging::init_logging(&config) {
        INITIALIZED.store(false, Ordering::SeqCst);
        return Err(e);
    }

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Returns true once a subscriber has been installed by [`init_telemetry`].
#[must_use]
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}

/// Guard held for the lifetime of the host. Logs shutdown on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
