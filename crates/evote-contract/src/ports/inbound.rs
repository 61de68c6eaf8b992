//! # Driving Ports (API - Inbound)
//!
//! The transaction functions of the voting contract and the name-based
//! routing table callers use to invoke them.
//!
//! Submit functions read-modify-write and go through commit. Query functions
//! only read and are evaluated against a snapshot.

use crate::domain::entities::{HistoryRecord, OptionRecord};
use crate::errors::ContractError;
use crate::ports::outbound::ChaincodeStub;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// VOTING CONTRACT API (Primary Driving Port)
// =============================================================================

/// Transaction functions of the voting contract.
///
/// Every method runs inside one invocation; `ctx` is that invocation's stub.
/// Key arguments are normalized before use.
#[async_trait]
pub trait VotingContractApi: Send + Sync {
    /// Seed the configured options with zero votes.
    ///
    /// Fails with `AlreadyExists` without writing anything if any seed key is
    /// already present.
    async fn init_ledger(&self, ctx: &dyn ChaincodeStub) -> Result<(), ContractError>;

    /// Create an option keyed by its normalized name.
    async fn create_option(&self, ctx: &dyn ChaincodeStub, name: &str)
        -> Result<(), ContractError>;

    /// Stored bytes of an option, exactly as written.
    async fn get_option(&self, ctx: &dyn ChaincodeStub, key: &str)
        -> Result<Vec<u8>, ContractError>;

    /// Whether an option exists under the normalized key.
    async fn option_exists(&self, ctx: &dyn ChaincodeStub, key: &str)
        -> Result<bool, ContractError>;

    /// Every option record, in store iteration order.
    async fn get_all_options(
        &self,
        ctx: &dyn ChaincodeStub,
    ) -> Result<Vec<OptionRecord>, ContractError>;

    /// Add one vote. Returns the invoking transaction id.
    async fn cast_vote(&self, ctx: &dyn ChaincodeStub, key: &str)
        -> Result<String, ContractError>;

    /// Delete one option.
    async fn delete_option(&self, ctx: &dyn ChaincodeStub, key: &str)
        -> Result<(), ContractError>;

    /// Delete every option. Returns how many were deleted.
    async fn delete_all_options(&self, ctx: &dyn ChaincodeStub) -> Result<usize, ContractError>;

    /// Chronological history of an option key.
    async fn get_history(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
    ) -> Result<Vec<HistoryRecord>, ContractError>;

    /// Append a voter to the voter monitor. No membership check.
    async fn add_to_voters(&self, ctx: &dyn ChaincodeStub, voter: &str)
        -> Result<(), ContractError>;

    /// Every recorded voter, empty if none.
    async fn get_all_voters(&self, ctx: &dyn ChaincodeStub)
        -> Result<Vec<String>, ContractError>;

    /// Whether the voter is recorded.
    async fn has_voted(&self, ctx: &dyn ChaincodeStub, voter: &str)
        -> Result<bool, ContractError>;

    /// Remove the voter monitor. No-op if absent.
    async fn delete_all_voters(&self, ctx: &dyn ChaincodeStub) -> Result<(), ContractError>;

    /// Check, vote and record the voter in one invocation.
    ///
    /// Fails with `AlreadyVoted` if the voter is recorded. Returns the
    /// invoking transaction id.
    async fn cast_ballot(
        &self,
        ctx: &dyn ChaincodeStub,
        voter: &str,
        key: &str,
    ) -> Result<String, ContractError>;

    /// Delete every option and the voter monitor.
    async fn reset_election(&self, ctx: &dyn ChaincodeStub) -> Result<(), ContractError>;
}

// =============================================================================
// FUNCTION ROUTING
// =============================================================================

/// A contract function addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractFunction {
    /// `InitLedger()`
    InitLedger,
    /// `CreateOption(name)`
    CreateOption,
    /// `GetOption(key)`
    GetOption,
    /// `OptionExists(key)`
    OptionExists,
    /// `GetAllOptions()`
    GetAllOptions,
    /// `CastVote(key)`
    CastVote,
    /// `DeleteOption(key)`
    DeleteOption,
    /// `DeleteAllOptions()`
    DeleteAllOptions,
    /// `GetHistory(key)`
    GetHistory,
    /// `AddToVoters(voterId)`
    AddToVoters,
    /// `GetAllVoters()`
    GetAllVoters,
    /// `HasVoted(voterId)`
    HasVoted,
    /// `DeleteAllVoters()`
    DeleteAllVoters,
    /// `CastBallot(voterId, key)`
    CastBallot,
    /// `ResetElection()`
    ResetElection,
}

impl ContractFunction {
    /// Every routable function.
    pub const ALL: [Self; 15] = [
        Self::InitLedger,
        Self::CreateOption,
        Self::GetOption,
        Self::OptionExists,
        Self::GetAllOptions,
        Self::CastVote,
        Self::DeleteOption,
        Self::DeleteAllOptions,
        Self::GetHistory,
        Self::AddToVoters,
        Self::GetAllVoters,
        Self::HasVoted,
        Self::DeleteAllVoters,
        Self::CastBallot,
        Self::ResetElection,
    ];

    /// Canonical function name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::InitLedger => "InitLedger",
            Self::CreateOption => "CreateOption",
            Self::GetOption => "GetOption",
            Self::OptionExists => "OptionExists",
            Self::GetAllOptions => "GetAllOptions",
            Self::CastVote => "CastVote",
            Self::DeleteOption => "DeleteOption",
            Self::DeleteAllOptions => "DeleteAllOptions",
            Self::GetHistory => "GetHistory",
            Self::AddToVoters => "AddToVoters",
            Self::GetAllVoters => "GetAllVoters",
            Self::HasVoted => "HasVoted",
            Self::DeleteAllVoters => "DeleteAllVoters",
            Self::CastBallot => "CastBallot",
            Self::ResetElection => "ResetElection",
        }
    }

    /// Number of positional string arguments.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::InitLedger
            | Self::GetAllOptions
            | Self::DeleteAllOptions
            | Self::GetAllVoters
            | Self::DeleteAllVoters
            | Self::ResetElection => 0,
            Self::CastBallot => 2,
            _ => 1,
        }
    }

    /// True for functions that write state and must go through commit.
    #[must_use]
    pub fn is_submit(self) -> bool {
        !matches!(
            self,
            Self::GetOption
                | Self::OptionExists
                | Self::GetAllOptions
                | Self::GetHistory
                | Self::GetAllVoters
                | Self::HasVoted
        )
    }

    /// Check the positional argument count.
    pub fn check_arity(self, args: &[&str]) -> Result<(), ContractError> {
        if args.len() == self.arity() {
            Ok(())
        } else {
            Err(ContractError::InvalidArgument(format!(
                "{} expects {} argument(s), got {}",
                self.name(),
                self.arity(),
                args.len()
            )))
        }
    }
}

impl FromStr for ContractFunction {
    type Err = ContractError;

    /// Case-insensitive; also accepts the older `readOption`,
    /// `getHistoryForKey` and `addToVoter` spellings.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lowered = name.trim().to_ascii_lowercase();
        let function = match lowered.as_str() {
            "readoption" => Self::GetOption,
            "gethistoryforkey" => Self::GetHistory,
            "addtovoter" => Self::AddToVoters,
            other => Self::ALL
                .into_iter()
                .find(|f| f.name().to_ascii_lowercase() == other)
                .ok_or_else(|| ContractError::UnknownFunction(name.to_string()))?,
        };
        Ok(function)
    }
}

impl fmt::Display for ContractFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
