//! # Error Types
//!
//! All error types for contract invocations and the world-state port.
//!
//! Every error aborts the whole invocation: the write-set of a failed
//! invocation is discarded, so no error ever leaves a partial commit behind.

use thiserror::Error;

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Errors surfaced as the failure result of a contract invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A create targeted a key that is already occupied.
    #[error("option with key {key} already exists")]
    AlreadyExists {
        /// Normalized key.
        key: String,
    },

    /// A read, update or delete targeted an absent key.
    #[error("option with key {key} does not exist")]
    NotFound {
        /// Normalized key.
        key: String,
    },

    /// The voter is already recorded in the voter monitor.
    #[error("voter {voter} has already cast a vote")]
    AlreadyVoted {
        /// Voter identifier as supplied.
        voter: String,
    },

    /// A stored value did not decode into the expected record.
    #[error("malformed record at key {key}: {reason}")]
    MalformedRecord {
        /// Key the value was read from.
        key: String,
        /// Decoder message.
        reason: String,
    },

    /// Argument rejected before touching state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The invoked function name is not part of the contract.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Commit-time rejection: the read-set was invalidated by another commit.
    #[error("MVCC read conflict on key {key}: read version {read:?}, committed version {committed:?}")]
    Conflict {
        /// Key whose version moved.
        key: String,
        /// Version observed during simulation.
        read: Option<u64>,
        /// Version found at commit.
        committed: Option<u64>,
    },

    /// The gateway handle was used after `close`.
    #[error("gateway is closed")]
    GatewayClosed,

    /// World-state adapter failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ContractError {
    /// Returns true if resubmitting the same invocation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub(crate) fn malformed(key: &str, err: impl std::fmt::Display) -> Self {
        Self::MalformedRecord {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }
}

// =============================================================================
// STORE ERRORS
// =============================================================================

/// Errors from the world-state port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An internal lock was poisoned by a panicking writer.
    #[error("world state lock poisoned")]
    LockPoisoned,

    /// A transaction id was submitted for commit a second time.
    #[error("transaction {0} was already committed")]
    DuplicateTxId(String),
}
