//! # In-Memory Reference Ledger
//!
//! Stands in for the ledger platform in tests and in the CLI. It provides the
//! guarantees the contract relies on:
//!
//! - snapshot reads through a per-invocation [`TxSimulator`]
//! - buffered write-sets, applied all-or-nothing by [`InMemoryLedger::commit`]
//! - commit-time MVCC validation of point reads and range scans
//! - an append-only per-key history log
//! - a transaction log of validated and invalidated commits
//!
//! Every commit bumps the ledger height; a key's version is the height of the
//! commit that last wrote it.

use crate::domain::timestamp::TxTimestamp;
use crate::errors::{ContractError, StoreError};
use crate::ports::outbound::{ChaincodeStub, KeyModification, KeyValue};
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

type Clock = Box<dyn Fn() -> TxTimestamp + Send + Sync>;

#[derive(Clone, Debug)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    world: BTreeMap<String, VersionedValue>,
    history: HashMap<String, Vec<KeyModification>>,
    transactions: HashMap<String, TransactionDetail>,
    height: u64,
}

/// A range scan observed during simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RangeRead {
    start: String,
    end: String,
    seen: Vec<(String, u64)>,
}

/// Result of simulating one invocation, ready for commit.
#[derive(Clone, Debug)]
pub struct ReadWriteSet {
    tx_id: String,
    timestamp: TxTimestamp,
    reads: BTreeMap<String, Option<u64>>,
    range_reads: Vec<RangeRead>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl ReadWriteSet {
    /// Transaction this read-write set belongs to.
    #[must_use]
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Timestamp the transaction was simulated with.
    #[must_use]
    pub fn timestamp(&self) -> TxTimestamp {
        self.timestamp
    }

    /// Number of queued writes and deletes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }
}

/// Outcome of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Committed transaction.
    pub tx_id: String,
    /// Ledger height after the commit.
    pub height: u64,
    /// Number of keys written or deleted.
    pub writes: usize,
}

/// Commit-time validation outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    /// Applied to world state.
    Valid,
    /// A key read during simulation changed version.
    MvccReadConflict,
    /// A scanned range gained, lost or changed a key.
    PhantomReadConflict,
}

/// Ledger record of one commit attempt, as returned by transaction lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    /// Transaction id.
    pub tx_id: String,
    /// Whether the writes were applied.
    #[serde(rename = "isValid")]
    pub valid: bool,
    /// Validation outcome.
    pub validation_code: ValidationCode,
    /// Conflict that invalidated the transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Ledger height of a valid commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    /// Transaction timestamp, German-formatted Central European time.
    pub timestamp: String,
    /// Transaction timestamp, epoch milliseconds.
    pub timestamp_millis: i64,
}

impl TransactionDetail {
    fn new(rw_set: &ReadWriteSet, validation_code: ValidationCode) -> Self {
        Self {
            tx_id: rw_set.tx_id.clone(),
            valid: validation_code == ValidationCode::Valid,
            validation_code,
            reason: None,
            height: None,
            timestamp: rw_set.timestamp.to_cet_string(),
            timestamp_millis: rw_set.timestamp.to_millis(),
        }
    }
}

/// In-memory world state with history log and MVCC validation.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    clock: Clock,
}

impl InMemoryLedger {
    /// Empty ledger stamping transactions with wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(TxTimestamp::now)
    }

    /// Empty ledger with a custom transaction clock.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> TxTimestamp + Send + Sync + 'static,
    {
        Self {
            state: RwLock::new(LedgerState::default()),
            clock: Box::new(clock),
        }
    }

    /// Empty ledger whose n-th transaction is stamped `start + n * step_millis`.
    #[must_use]
    pub fn with_stepping_clock(start: TxTimestamp, step_millis: i64) -> Self {
        let tick = AtomicI64::new(0);
        Self::with_clock(move || start.plus_millis(step_millis * tick.fetch_add(1, Ordering::SeqCst)))
    }

    /// Open a transaction simulation against the current committed state.
    pub fn begin(&self) -> TxSimulator<'_> {
        let tx_id = new_tx_id();
        let timestamp = (self.clock)();
        debug!(tx_id = %tx_id, "Transaction simulation started");
        TxSimulator {
            ledger: self,
            tx_id,
            timestamp,
            simulation: Mutex::new(Simulation::default()),
        }
    }

    /// Validate a read-write set against committed state and apply it.
    ///
    /// Fails with `Conflict` if any key read during simulation, or any key
    /// inside a scanned range, changed version since. Nothing is applied on
    /// failure, but the attempt is still logged as an invalid transaction.
    /// A tx id already in the transaction log is refused outright.
    pub fn commit(&self, rw_set: ReadWriteSet) -> Result<CommitReceipt, ContractError> {
        let mut guard = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let state = &mut *guard;

        if state.transactions.contains_key(&rw_set.tx_id) {
            return Err(StoreError::DuplicateTxId(rw_set.tx_id).into());
        }

        if let Err((code, conflict)) = validate(&state.world, &rw_set) {
            let mut detail = TransactionDetail::new(&rw_set, code);
            detail.reason = Some(conflict.to_string());
            state.transactions.insert(rw_set.tx_id, detail);
            return Err(conflict);
        }

        state.height += 1;
        let version = state.height;
        let writes = rw_set.writes.len();
        let mut detail = TransactionDetail::new(&rw_set, ValidationCode::Valid);

        for (key, write) in rw_set.writes {
            let modification = match write {
                Some(value) => {
                    state.world.insert(
                        key.clone(),
                        VersionedValue {
                            value: value.clone(),
                            version,
                        },
                    );
                    KeyModification {
                        tx_id: rw_set.tx_id.clone(),
                        timestamp: rw_set.timestamp,
                        is_delete: false,
                        value,
                    }
                }
                None => {
                    if state.world.remove(&key).is_none() {
                        continue;
                    }
                    KeyModification {
                        tx_id: rw_set.tx_id.clone(),
                        timestamp: rw_set.timestamp,
                        is_delete: true,
                        value: Vec::new(),
                    }
                }
            };
            state.history.entry(key).or_default().push(modification);
        }

        detail.height = Some(version);
        state.transactions.insert(rw_set.tx_id.clone(), detail);
        debug!(tx_id = %rw_set.tx_id, height = version, writes, "Transaction committed");

        Ok(CommitReceipt {
            tx_id: rw_set.tx_id,
            height: version,
            writes,
        })
    }

    /// Number of commits applied so far.
    pub fn height(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().map_err(|_| StoreError::LockPoisoned)?.height)
    }

    /// Committed value of a key, bypassing any transaction.
    pub fn committed_value(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.versioned(key)?.map(|v| v.value))
    }

    /// Logged outcome of a commit attempt, `None` if the id was never
    /// submitted for commit.
    pub fn transaction(&self, tx_id: &str) -> Result<Option<TransactionDetail>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.transactions.get(tx_id).cloned())
    }

    /// Number of keys in world state.
    pub fn key_count(&self) -> Result<usize, StoreError> {
        Ok(self.state.read().map_err(|_| StoreError::LockPoisoned)?.world.len())
    }

    fn versioned(&self, key: &str) -> Result<Option<VersionedValue>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.world.get(key).cloned())
    }

    fn range(&self, start: &str, end: &str) -> Result<Vec<(String, VersionedValue)>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(scan(&state.world, start, end)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn history(&self, key: &str) -> Result<Vec<KeyModification>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.history.get(key).cloned().unwrap_or_default())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// `hex(sha256(uuid_v4))`, the shape of platform transaction ids.
fn new_tx_id() -> String {
    hex::encode(Sha256::digest(Uuid::new_v4().as_bytes()))
}

/// MVCC check of point reads, then range scans, against committed state.
fn validate(
    world: &BTreeMap<String, VersionedValue>,
    rw_set: &ReadWriteSet,
) -> Result<(), (ValidationCode, ContractError)> {
    for (key, read) in &rw_set.reads {
        let committed = world.get(key).map(|v| v.version);
        if committed != *read {
            warn!(tx_id = %rw_set.tx_id, key = %key, "MVCC read conflict");
            return Err((
                ValidationCode::MvccReadConflict,
                ContractError::Conflict {
                    key: key.clone(),
                    read: *read,
                    committed,
                },
            ));
        }
    }

    for range in &rw_set.range_reads {
        let current: Vec<(String, u64)> = scan(world, &range.start, &range.end)
            .map(|(k, v)| (k.clone(), v.version))
            .collect();
        if let Some(conflict) = phantom_conflict(range, &current) {
            warn!(tx_id = %rw_set.tx_id, "Phantom read conflict");
            return Err((ValidationCode::PhantomReadConflict, conflict));
        }
    }

    Ok(())
}

/// Keys in `[start, end)`; empty bounds are open-ended.
fn scan<'a>(
    world: &'a BTreeMap<String, VersionedValue>,
    start: &str,
    end: &str,
) -> Box<dyn Iterator<Item = (&'a String, &'a VersionedValue)> + 'a> {
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start)
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end)
    };
    if !start.is_empty() && !end.is_empty() && start >= end {
        return Box::new(std::iter::empty());
    }
    Box::new(world.range::<str, _>((lower, upper)))
}

fn phantom_conflict(range: &RangeRead, current: &[(String, u64)]) -> Option<ContractError> {
    if range.seen == current {
        return None;
    }
    let seen: BTreeMap<&str, u64> = range.seen.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let now: BTreeMap<&str, u64> = current.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let key = seen
        .keys()
        .chain(now.keys())
        .find(|k| seen.get(*k) != now.get(*k))
        .copied()
        .unwrap_or(range.start.as_str());
    Some(ContractError::Conflict {
        key: key.to_string(),
        read: seen.get(key).copied(),
        committed: now.get(key).copied(),
    })
}

// =============================================================================
// TRANSACTION SIMULATOR
// =============================================================================

#[derive(Debug, Default)]
struct Simulation {
    reads: BTreeMap<String, Option<u64>>,
    range_reads: Vec<RangeRead>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

/// Per-invocation stub: reads committed state, buffers writes.
pub struct TxSimulator<'a> {
    ledger: &'a InMemoryLedger,
    tx_id: String,
    timestamp: TxTimestamp,
    simulation: Mutex<Simulation>,
}

impl TxSimulator<'_> {
    /// Finish simulation and hand over the read-write set.
    pub fn into_rw_set(self) -> Result<ReadWriteSet, StoreError> {
        let simulation = self
            .simulation
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(ReadWriteSet {
            tx_id: self.tx_id,
            timestamp: self.timestamp,
            reads: simulation.reads,
            range_reads: simulation.range_reads,
            writes: simulation.writes,
        })
    }

    fn with_simulation<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> Result<R, StoreError> {
        let mut simulation = self
            .simulation
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&mut simulation))
    }
}

#[async_trait]
impl<'a> ChaincodeStub for TxSimulator<'a> {
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let current = self.ledger.versioned(key)?;
        let version = current.as_ref().map(|v| v.version);
        self.with_simulation(|sim| {
            sim.reads.entry(key.to_string()).or_insert(version);
        })?;
        Ok(current.map(|v| v.value))
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.with_simulation(|sim| {
            sim.writes.insert(key.to_string(), Some(value));
        })
    }

    async fn delete_state(&self, key: &str) -> Result<(), StoreError> {
        self.with_simulation(|sim| {
            sim.writes.insert(key.to_string(), None);
        })
    }

    async fn get_state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<KeyValue>, StoreError> {
        let entries = self.ledger.range(start, end)?;
        let seen = entries.iter().map(|(k, v)| (k.clone(), v.version)).collect();
        self.with_simulation(|sim| {
            sim.range_reads.push(RangeRead {
                start: start.to_string(),
                end: end.to_string(),
                seen,
            });
        })?;
        Ok(entries
            .into_iter()
            .map(|(key, v)| KeyValue {
                key,
                value: v.value,
            })
            .collect())
    }

    async fn get_history_for_key(&self, key: &str) -> Result<Vec<KeyModification>, StoreError> {
        self.ledger.history(key)
    }

    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> TxTimestamp {
        self.timestamp
    }
}

// =============================================================================
// TESTS
// =============================================================================
