//! # E-Vote Test Suite
//!
//! Scenario tests that drive the contract end to end through the gateway and
//! the in-memory reference ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs         # Single-client ledger behaviour
//!     └── e2e_election.rs  # Full elections, concurrent submissions
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p evote-tests
//! cargo test -p evote-tests integration::e2e_election::
//!
//! # With contract logs
//! EVOTE_LOG_LEVEL=evote_contract=debug cargo test -p evote-tests -- --nocapture
//! ```


use std::sync::Arc;

use evote_contract::prelude::{ContractConfig, Gateway, InMemoryLedger, TxTimestamp, VotingContract};
use evote_telemetry::{init_logging, TelemetryConfig};

/// Monday, 5 February 2024, 13:03:07 UTC.
pub const START: TxTimestamp = TxTimestamp {
    seconds: 1_707_138_187,
    nanos: 0,
};

/// Install a log subscriber once per test binary. Later calls are no-ops.
pub fn init_test_logging() {
    let mut config = TelemetryConfig::from_env();
    config.log_level = std::env::var("EVOTE_LOG_LEVEL").unwrap_or_else(|_| "off".to_string());
    let _ = init_logging(&config);
}

/// Gateway over a fresh ledger whose n-th transaction is stamped
/// [`START`] + n seconds.
pub fn stepping_gateway() -> Gateway {
    init_test_logging();
    Gateway::open(
        Arc::new(InMemoryLedger::with_stepping_clock(START, 1000)),
        VotingContract::new(ContractConfig::default()),
    )
}
