//! # Voting Contract
//!
//! Implements every transaction function against an injected
//! [`ChaincodeStub`]. The contract holds no state of its own beyond its
//! configuration; everything it reads or writes lives in world state and is
//! scoped to a single invocation.
//!
//! ## Write Path
//!
//! Every write goes through [`to_canonical_vec`], so the same logical record
//! always produces the same bytes on every executing peer.
//!
//! ## Double Voting
//!
//! `AddToVoters`/`GetAllVoters` are independent primitives: a caller that
//! checks, votes and records in separate submissions can race another caller
//! for the same voter. `CastBallot` does all three in one invocation; two
//! concurrent ballots conflict on the voter monitor key at commit.

use crate::domain::canonical::to_canonical_vec;
use crate::domain::entities::{HistoryRecord, OptionRecord, VoterMonitor};
use crate::domain::invariants::{
    check_fresh_option_invariant, check_vote_increment_invariant, check_voter_append_invariant,
};
use crate::domain::keys::{option_key, DEFAULT_SEED_OPTIONS, VOTER_MONITOR_KEY};
use crate::errors::ContractError;
use crate::ports::inbound::{ContractFunction, VotingContractApi};
use crate::ports::outbound::ChaincodeStub;

use async_trait::async_trait;
use serde::Serialize;
use std::env;
use tracing::{debug, info, instrument};

/// Contract configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    /// Option names seeded by `InitLedger`.
    pub seed_options: Vec<String>,
    /// Key of the voter monitor singleton.
    pub voter_monitor_key: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            seed_options: DEFAULT_SEED_OPTIONS.iter().map(|s| (*s).to_string()).collect(),
            voter_monitor_key: VOTER_MONITOR_KEY.to_string(),
        }
    }
}

impl ContractConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EVOTE_SEED_OPTIONS`: comma-separated option names (default: Rom,Barcelona,Hamburg)
    /// - `EVOTE_VOTER_MONITOR_KEY`: voter monitor key (default: voterMonitor)
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let seed_options = env::var("EVOTE_SEED_OPTIONS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|names| !names.is_empty())
            .unwrap_or(defaults.seed_options);

        let voter_monitor_key = env::var("EVOTE_VOTER_MONITOR_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(defaults.voter_monitor_key);

        Self {
            seed_options,
            voter_monitor_key,
        }
    }
}

/// The e-voting ledger contract.
#[derive(Debug, Clone, Default)]
pub struct VotingContract {
    config: ContractConfig,
}

impl VotingContract {
    /// Create a contract with the given configuration.
    #[must_use]
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Route a named invocation with positional string arguments.
    ///
    /// Returns the raw result payload: empty for void functions, UTF-8 text
    /// for strings and booleans, canonical JSON for collections.
    #[instrument(skip(self, ctx, function, args), fields(tx_id = %ctx.tx_id(), function = %function))]
    pub async fn invoke(
        &self,
        ctx: &dyn ChaincodeStub,
        function: ContractFunction,
        args: &[&str],
    ) -> Result<Vec<u8>, ContractError> {
        function.check_arity(args)?;

        let payload = match function {
            ContractFunction::InitLedger => {
                self.init_ledger(ctx).await?;
                Vec::new()
            }
            ContractFunction::CreateOption => {
                self.create_option(ctx, args[0]).await?;
                Vec::new()
            }
            ContractFunction::GetOption => self.get_option(ctx, args[0]).await?,
            ContractFunction::OptionExists => {
                self.option_exists(ctx, args[0]).await?.to_string().into_bytes()
            }
            ContractFunction::GetAllOptions => encode(&self.get_all_options(ctx).await?)?,
            ContractFunction::CastVote => self.cast_vote(ctx, args[0]).await?.into_bytes(),
            ContractFunction::DeleteOption => {
                self.delete_option(ctx, args[0]).await?;
                Vec::new()
            }
            ContractFunction::DeleteAllOptions => {
                self.delete_all_options(ctx).await?;
                Vec::new()
            }
            ContractFunction::GetHistory => encode(&self.get_history(ctx, args[0]).await?)?,
            ContractFunction::AddToVoters => {
                self.add_to_voters(ctx, args[0]).await?;
                Vec::new()
            }
            ContractFunction::GetAllVoters => encode(&self.get_all_voters(ctx).await?)?,
            ContractFunction::HasVoted => {
                self.has_voted(ctx, args[0]).await?.to_string().into_bytes()
            }
            ContractFunction::DeleteAllVoters => {
                self.delete_all_voters(ctx).await?;
                Vec::new()
            }
            ContractFunction::CastBallot => {
                self.cast_ballot(ctx, args[0], args[1]).await?.into_bytes()
            }
            ContractFunction::ResetElection => {
                self.reset_election(ctx).await?;
                Vec::new()
            }
        };

        Ok(payload)
    }

    fn key(&self, raw: &str) -> Result<String, ContractError> {
        option_key(raw, &self.config.voter_monitor_key)
    }

    /// Stored bytes under an already normalized key; `NotFound` if absent or empty.
    async fn read_option_bytes(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
    ) -> Result<Vec<u8>, ContractError> {
        match ctx.get_state(key).await? {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(ContractError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    async fn load_option(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
    ) -> Result<OptionRecord, ContractError> {
        let bytes = self.read_option_bytes(ctx, key).await?;
        decode_option(key, &bytes)
    }

    async fn load_voter_monitor(
        &self,
        ctx: &dyn ChaincodeStub,
    ) -> Result<Option<VoterMonitor>, ContractError> {
        let key = &self.config.voter_monitor_key;
        match ctx.get_state(key).await? {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| ContractError::malformed(key, e)),
            _ => Ok(None),
        }
    }

    async fn write_record<T: Serialize + Sync>(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
        record: &T,
    ) -> Result<(), ContractError> {
        let bytes = to_canonical_vec(record).map_err(|e| ContractError::malformed(key, e))?;
        ctx.put_state(key, bytes).await?;
        Ok(())
    }

    /// Increment an option and queue the write. Returns the updated record.
    async fn increment(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
    ) -> Result<OptionRecord, ContractError> {
        let before = self.load_option(ctx, key).await?;
        let votes = before
            .votes
            .checked_add(1)
            .ok_or_else(|| ContractError::malformed(key, "vote counter overflow"))?;
        let after = OptionRecord {
            votes,
            ..before.clone()
        };
        debug_assert!(check_vote_increment_invariant(&before, &after));

        self.write_record(ctx, key, &after).await?;
        Ok(after)
    }

    /// Append a voter to the monitor (creating it if needed) and queue the write.
    async fn record_voter(
        &self,
        ctx: &dyn ChaincodeStub,
        existing: Option<VoterMonitor>,
        voter: &str,
    ) -> Result<usize, ContractError> {
        let key = &self.config.voter_monitor_key;
        let monitor = match existing {
            None => VoterMonitor::with_first_voter(key.clone(), voter),
            Some(mut monitor) => {
                let before = monitor.already_voted.clone();
                monitor.already_voted.push(voter.to_string());
                debug_assert!(check_voter_append_invariant(
                    &before,
                    &monitor.already_voted,
                    voter
                ));
                monitor
            }
        };
        self.write_record(ctx, key, &monitor).await?;
        Ok(monitor.already_voted.len())
    }
}

fn decode_option(key: &str, bytes: &[u8]) -> Result<OptionRecord, ContractError> {
    let option: OptionRecord =
        serde_json::from_slice(bytes).map_err(|e| ContractError::malformed(key, e))?;
    if !option.is_option() {
        return Err(ContractError::malformed(
            key,
            format!("unexpected docType {:?}", option.doc_type),
        ));
    }
    Ok(option)
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ContractError> {
    to_canonical_vec(value).map_err(|e| ContractError::InvalidArgument(e.to_string()))
}

fn require_voter(voter: &str) -> Result<(), ContractError> {
    if voter.trim().is_empty() {
        return Err(ContractError::InvalidArgument(
            "voter id must not be empty".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// VotingContractApi Implementation
// =============================================================================

#[async_trait]
impl VotingContractApi for VotingContract {
    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn init_ledger(&self, ctx: &dyn ChaincodeStub) -> Result<(), ContractError> {
        let mut seeds = Vec::with_capacity(self.config.seed_options.len());
        for name in &self.config.seed_options {
            let key = self.key(name)?;
            if ctx.state_exists(&key).await? || seeds.iter().any(|o: &OptionRecord| o.key == key) {
                return Err(ContractError::AlreadyExists { key });
            }
            seeds.push(OptionRecord::new(key, name.clone()));
        }

        for option in &seeds {
            self.write_record(ctx, &option.key, option).await?;
            info!(key = %option.key, name = %option.name, "Seed option created");
        }
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn create_option(&self, ctx: &dyn ChaincodeStub, name: &str) -> Result<(), ContractError> {
        let key = self.key(name)?;
        if ctx.state_exists(&key).await? {
            return Err(ContractError::AlreadyExists { key });
        }

        let option = OptionRecord::new(key.clone(), name);
        debug_assert!(check_fresh_option_invariant(&option));
        self.write_record(ctx, &key, &option).await?;
        info!(key = %key, "Option created");
        Ok(())
    }

    async fn get_option(&self, ctx: &dyn ChaincodeStub, key: &str) -> Result<Vec<u8>, ContractError> {
        let key = self.key(key)?;
        self.read_option_bytes(ctx, &key).await
    }

    async fn option_exists(&self, ctx: &dyn ChaincodeStub, key: &str) -> Result<bool, ContractError> {
        let key = self.key(key)?;
        Ok(ctx.state_exists(&key).await?)
    }

    async fn get_all_options(
        &self,
        ctx: &dyn ChaincodeStub,
    ) -> Result<Vec<OptionRecord>, ContractError> {
        let entries = ctx.get_state_by_range("", "").await?;
        let mut options = Vec::with_capacity(entries.len());
        for entry in entries {
            match decode_option(&entry.key, &entry.value) {
                Ok(option) => options.push(option),
                Err(e) => debug!(key = %entry.key, error = %e, "Skipping non-option record"),
            }
        }
        Ok(options)
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn cast_vote(&self, ctx: &dyn ChaincodeStub, key: &str) -> Result<String, ContractError> {
        let key = self.key(key)?;
        let option = self.increment(ctx, &key).await?;
        info!(key = %key, votes = option.votes, "Vote cast");
        Ok(ctx.tx_id().to_string())
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn delete_option(&self, ctx: &dyn ChaincodeStub, key: &str) -> Result<(), ContractError> {
        let key = self.key(key)?;
        if !ctx.state_exists(&key).await? {
            return Err(ContractError::NotFound { key });
        }
        ctx.delete_state(&key).await?;
        info!(key = %key, "Option deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn delete_all_options(&self, ctx: &dyn ChaincodeStub) -> Result<usize, ContractError> {
        let mut deleted = 0;
        for entry in ctx.get_state_by_range("", "").await? {
            if decode_option(&entry.key, &entry.value).is_ok() {
                ctx.delete_state(&entry.key).await?;
                deleted += 1;
            }
        }
        info!(deleted, "All options deleted");
        Ok(deleted)
    }

    async fn get_history(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
    ) -> Result<Vec<HistoryRecord>, ContractError> {
        let key = self.key(key)?;
        let modifications = ctx.get_history_for_key(&key).await?;

        let mut records = Vec::with_capacity(modifications.len());
        for modification in modifications {
            let millis = modification.timestamp.to_millis();
            let timestamp = modification.timestamp.to_cet_string();
            let record = if modification.is_delete {
                HistoryRecord::deleted(&key, timestamp, millis, modification.tx_id)
            } else {
                let option = decode_option(&key, &modification.value)?;
                HistoryRecord::value(option, &key, timestamp, millis, modification.tx_id)
            };
            records.push(record);
        }
        Ok(records)
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn add_to_voters(&self, ctx: &dyn ChaincodeStub, voter: &str) -> Result<(), ContractError> {
        require_voter(voter)?;
        let existing = self.load_voter_monitor(ctx).await?;
        let recorded = self.record_voter(ctx, existing, voter).await?;
        info!(recorded, "Voter recorded");
        Ok(())
    }

    async fn get_all_voters(&self, ctx: &dyn ChaincodeStub) -> Result<Vec<String>, ContractError> {
        Ok(self
            .load_voter_monitor(ctx)
            .await?
            .map(|monitor| monitor.already_voted)
            .unwrap_or_default())
    }

    async fn has_voted(&self, ctx: &dyn ChaincodeStub, voter: &str) -> Result<bool, ContractError> {
        Ok(self
            .load_voter_monitor(ctx)
            .await?
            .is_some_and(|monitor| monitor.contains(voter)))
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn delete_all_voters(&self, ctx: &dyn ChaincodeStub) -> Result<(), ContractError> {
        ctx.delete_state(&self.config.voter_monitor_key).await?;
        info!("Voter monitor cleared");
        Ok(())
    }

    #[instrument(skip(self, ctx, voter), fields(tx_id = %ctx.tx_id()))]
    async fn cast_ballot(
        &self,
        ctx: &dyn ChaincodeStub,
        voter: &str,
        key: &str,
    ) -> Result<String, ContractError> {
        require_voter(voter)?;
        let key = self.key(key)?;

        let monitor = self.load_voter_monitor(ctx).await?;
        if monitor.as_ref().is_some_and(|m| m.contains(voter)) {
            return Err(ContractError::AlreadyVoted {
                voter: voter.to_string(),
            });
        }

        let option = self.increment(ctx, &key).await?;
        self.record_voter(ctx, monitor, voter).await?;
        info!(key = %key, votes = option.votes, "Ballot cast");
        Ok(ctx.tx_id().to_string())
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn reset_election(&self, ctx: &dyn ChaincodeStub) -> Result<(), ContractError> {
        let deleted = self.delete_all_options(ctx).await?;
        ctx.delete_state(&self.config.voter_monitor_key).await?;
        info!(deleted, "Election reset");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
