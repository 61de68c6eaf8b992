//! # Driven Ports (SPI - Outbound)
//!
//! The contract's only dependency: the ledger platform's per-invocation
//! world-state stub.
//!
//! ## Platform Guarantees
//!
//! - Reads observe the committed snapshot, not the invocation's own writes
//! - Writes are buffered and commit together with the invocation, or not at all
//! - Every committed write or delete is appended to the key's history log

use crate::domain::timestamp::TxTimestamp;
use crate::errors::StoreError;
use async_trait::async_trait;

/// One entry of a range scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    /// World-state key.
    pub key: String,
    /// Committed value bytes.
    pub value: Vec<u8>,
}

/// One entry of a key's history log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyModification {
    /// Transaction that wrote this entry.
    pub tx_id: String,
    /// Commit timestamp of that transaction.
    pub timestamp: TxTimestamp,
    /// True if the transaction deleted the key.
    pub is_delete: bool,
    /// Value written; empty for deletions.
    pub value: Vec<u8>,
}

/// World-state access for one contract invocation.
#[async_trait]
pub trait ChaincodeStub: Send + Sync {
    /// Read a committed value. `None` if the key is absent.
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Queue a write.
    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Queue a delete.
    async fn delete_state(&self, key: &str) -> Result<(), StoreError>;

    /// Scan `[start, end)` in key order. Empty bounds are open-ended.
    async fn get_state_by_range(&self, start: &str, end: &str)
        -> Result<Vec<KeyValue>, StoreError>;

    /// Every committed modification of `key`, oldest first.
    async fn get_history_for_key(&self, key: &str) -> Result<Vec<KeyModification>, StoreError>;

    /// Identifier of the invoking transaction.
    fn tx_id(&self) -> &str;

    /// Timestamp of the invoking transaction.
    fn tx_timestamp(&self) -> TxTimestamp;

    /// Whether `key` holds a non-empty committed value.
    async fn state_exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .get_state(key)
            .await?
            .is_some_and(|value| !value.is_empty()))
    }
}
