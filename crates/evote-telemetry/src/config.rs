//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or `EnvFilter` directives)
    pub log_level: String,

    /// Whether to write logs at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "evote".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EVOTE_SERVICE_NAME`: Service name (default: evote)
    /// - `EVOTE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `EVOTE_CONSOLE_OUTPUT`: Enable log output (default: true)
    /// - `EVOTE_JSON_LOGS`: Enable JSON logs (default: false)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            service_name: lookup("EVOTE_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("EVOTE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("EVOTE_CONSOLE_OUTPUT")
                .map_or(defaults.console_output, |v| {
                    v.to_lowercase() != "false" && v != "0"
                }),

            json_logs: lookup("EVOTE_JSON_LOGS")
                .map_or(defaults.json_logs, |v| v.to_lowercase() == "true" || v == "1"),
        }
    }
}
