//! # E-Vote Contract - Ledger Voting Subsystem
//!
//! A voting contract running on a permissioned ledger. Options are created by
//! name, votes increment a per-option counter, and the ledger's history log
//! provides an audit trail for every option key.
//!
//! ## World State Layout
//!
//! | Key | Record | Notes |
//! |-----|--------|-------|
//! | normalized option name | `OptionRecord` | `docType = "option"` |
//! | `voterMonitor` | `VoterMonitor` | singleton, may be absent |
//!
//! Option keys are derived from names by dropping whitespace and lowercasing;
//! every key argument goes through the same normalization.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Fresh options start at zero votes | `domain/invariants.rs` - `check_fresh_option_invariant()` |
//! | A vote moves one counter by exactly one | `domain/invariants.rs` - `check_vote_increment_invariant()` |
//! | Voter recording is append-only | `domain/invariants.rs` - `check_voter_append_invariant()` |
//! | Identical records encode to identical bytes | `domain/canonical.rs` - `to_canonical_vec()` |
//! | Failed invocations write nothing | `adapters/memory_ledger.rs` - `InMemoryLedger::commit()` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use evote_contract::prelude::*;
//!
//! let gateway = create_test_gateway();
//! gateway.submit("InitLedger", &[]).await?;
//! gateway.submit("CastBallot", &["alice", "Rom"]).await?;
//!
//! let options = gateway.evaluate("GetAllOptions", &[]).await?;
//! println!("{}", String::from_utf8_lossy(&options));
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod contract;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod ports;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{HistoryRecord, HistoryVotes, OptionRecord, VoterMonitor};

    // Domain services
    pub use crate::domain::canonical::{to_canonical_string, to_canonical_vec};
    pub use crate::domain::keys::{format_key, option_key, VOTER_MONITOR_KEY};
    pub use crate::domain::timestamp::{format_cet, TxTimestamp};

    // Ports
    pub use crate::ports::inbound::{ContractFunction, VotingContractApi};
    pub use crate::ports::outbound::{ChaincodeStub, KeyModification, KeyValue};

    // Errors
    pub use crate::errors::{ContractError, StoreError};

    // Adapters
    pub use crate::adapters::{
        CommitReceipt, InMemoryLedger, ReadWriteSet, TransactionDetail, TxSimulator, ValidationCode,
    };

    // Contract and gateway
    pub use crate::contract::{ContractConfig, VotingContract};
    pub use crate::gateway::{create_test_gateway, Endorsement, Gateway, GatewayStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Contract name as registered on the ledger.
pub const CONTRACT_NAME: &str = "evote";
