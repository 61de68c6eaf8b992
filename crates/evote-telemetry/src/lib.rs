//! # E-Vote Telemetry
//!
//! Logging setup shared by the e-vote binaries and test harnesses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evote_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EVOTE_SERVICE_NAME` | `evote` | Service name in logs |
//! | `EVOTE_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `EVOTE_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `EVOTE_JSON_LOGS` | `false` | JSON instead of human-readable lines |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("Failed to install log subscriber: {0}")]
    AlreadyInitialized(String),

    /// The configuration could not be applied.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
