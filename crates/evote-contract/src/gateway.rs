//! # Gateway
//!
//! Client-side handle that invokes contract functions by name against the
//! reference ledger.
//!
//! - `submit`: simulate, then commit the read-write set
//! - `evaluate`: simulate only, never commits
//! - `verify`: look up whether a transaction id was committed as valid
//!
//! Simulations run concurrently; commits are serialized through an async
//! mutex. `endorse` and `commit` are exposed separately so callers can
//! interleave concurrent submissions deterministically.

use crate::adapters::{CommitReceipt, InMemoryLedger, ReadWriteSet, TransactionDetail};
use crate::contract::{ContractConfig, VotingContract};
use crate::errors::ContractError;
use crate::ports::inbound::ContractFunction;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Invocation counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GatewayStats {
    /// Submissions attempted.
    pub submitted: u64,
    /// Submissions committed.
    pub committed: u64,
    /// Evaluations completed.
    pub evaluated: u64,
    /// Invocations that failed inside the contract.
    pub rejected: u64,
    /// Commits rejected by MVCC validation.
    pub conflicts: u64,
}

/// A simulated submission awaiting commit.
#[derive(Debug, Clone)]
pub struct Endorsement {
    /// Function that produced this endorsement.
    pub function: ContractFunction,
    /// Result payload returned by the contract.
    pub payload: Vec<u8>,
    rw_set: ReadWriteSet,
}

impl Endorsement {
    /// Transaction id of the simulated invocation.
    #[must_use]
    pub fn tx_id(&self) -> &str {
        self.rw_set.tx_id()
    }
}

/// Gateway bound to one ledger and one contract instance.
pub struct Gateway {
    ledger: Arc<InMemoryLedger>,
    contract: VotingContract,
    open: AtomicBool,
    commit_lock: Mutex<()>,
    stats: RwLock<GatewayStats>,
}

impl Gateway {
    /// Open a gateway.
    pub fn open(ledger: Arc<InMemoryLedger>, contract: VotingContract) -> Self {
        info!(
            seed_options = contract.config().seed_options.len(),
            "Gateway opened"
        );
        Self {
            ledger,
            contract,
            open: AtomicBool::new(true),
            commit_lock: Mutex::new(()),
            stats: RwLock::new(GatewayStats::default()),
        }
    }

    /// Close the gateway. Subsequent calls fail with `GatewayClosed`.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("Gateway closed");
        }
    }

    /// Whether the gateway still accepts calls.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Ledger this gateway commits to.
    #[must_use]
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// Current counters.
    pub async fn stats(&self) -> GatewayStats {
        self.stats.read().await.clone()
    }

    /// Simulate and commit a named function. Returns the result payload.
    #[instrument(skip(self, args))]
    pub async fn submit(&self, function: &str, args: &[&str]) -> Result<Vec<u8>, ContractError> {
        let endorsement = self.endorse(function, args).await?;
        let payload = endorsement.payload.clone();
        self.commit(endorsement).await?;
        Ok(payload)
    }

    /// Simulate a named query function without committing.
    #[instrument(skip(self, args))]
    pub async fn evaluate(&self, function: &str, args: &[&str]) -> Result<Vec<u8>, ContractError> {
        self.ensure_open()?;
        let function: ContractFunction = function.parse()?;
        if function.is_submit() {
            return Err(ContractError::InvalidArgument(format!(
                "{function} modifies state and must be submitted"
            )));
        }

        let tx = self.ledger.begin();
        let result = self.contract.invoke(&tx, function, args).await;

        let mut stats = self.stats.write().await;
        match result {
            Ok(payload) => {
                stats.evaluated += 1;
                Ok(payload)
            }
            Err(e) => {
                stats.rejected += 1;
                debug!(error = %e, "Evaluation failed");
                Err(e)
            }
        }
    }

    /// Simulate a named function and keep its read-write set for a later
    /// [`Gateway::commit`].
    pub async fn endorse(&self, function: &str, args: &[&str]) -> Result<Endorsement, ContractError> {
        self.ensure_open()?;
        let function: ContractFunction = function.parse()?;
        self.stats.write().await.submitted += 1;

        let tx = self.ledger.begin();
        let payload = match self.contract.invoke(&tx, function, args).await {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.write().await.rejected += 1;
                warn!(function = %function, error = %e, "Invocation rejected");
                return Err(e);
            }
        };

        Ok(Endorsement {
            function,
            payload,
            rw_set: tx.into_rw_set()?,
        })
    }

    /// Commit a previously endorsed submission.
    pub async fn commit(&self, endorsement: Endorsement) -> Result<CommitReceipt, ContractError> {
        self.ensure_open()?;
        let function = endorsement.function;

        let result = {
            let _guard = self.commit_lock.lock().await;
            self.ledger.commit(endorsement.rw_set)
        };

        let mut stats = self.stats.write().await;
        match result {
            Ok(receipt) => {
                stats.committed += 1;
                info!(
                    function = %function,
                    tx_id = %receipt.tx_id,
                    height = receipt.height,
                    "Transaction committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                if matches!(e, ContractError::Conflict { .. }) {
                    stats.conflicts += 1;
                }
                warn!(function = %function, error = %e, "Commit rejected");
                Err(e)
            }
        }
    }

    /// Logged outcome of a submitted transaction. `None` for ids the ledger
    /// never saw, including evaluations and endorsements not yet committed.
    #[instrument(skip(self))]
    pub async fn verify(&self, tx_id: &str) -> Result<Option<TransactionDetail>, ContractError> {
        self.ensure_open()?;
        let detail = self.ledger.transaction(tx_id.trim())?;
        debug!(found = detail.is_some(), "Transaction lookup");
        Ok(detail)
    }

    fn ensure_open(&self) -> Result<(), ContractError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ContractError::GatewayClosed)
        }
    }
}

/// Gateway over a fresh in-memory ledger with default configuration.
#[must_use]
pub fn create_test_gateway() -> Gateway {
    Gateway::open(
        Arc::new(InMemoryLedger::new()),
        VotingContract::new(ContractConfig::default()),
    )
}

// =============================================================================
// TESTS
// =============================================================================
