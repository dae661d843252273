//! Telemetry configuration from environment variables.

use std::env;

/// Default service name attached to the startup log line.
pub const DEFAULT_SERVICE_NAME: &str = "cors-msg";

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name reported at startup
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or an
    /// `EnvFilter` expression such as `cm_channel=debug`)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to enable ANSI colours in plain output
    pub ansi: bool,

    /// Write through the test harness capture instead of stdout
    pub test_writer: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
            test_writer: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CM_SERVICE_NAME`: Service name (default: cors-msg)
    /// - `CM_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `CM_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `CM_LOG_ANSI`: Enable colours (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            service_name: lookup("CM_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("CM_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: lookup("CM_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.json_logs),

            ansi: lookup("CM_LOG_ANSI")
                .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
                .unwrap_or(defaults.ansi),

            test_writer: defaults.test_writer,
        }
    }

    /// Debug-level plain output routed through the test harness.
    pub fn for_tests() -> Self {
        Self {
            log_level: "debug".to_string(),
            ansi: false,
            test_writer: true,
            ..Self::default()
        }
    }
}
