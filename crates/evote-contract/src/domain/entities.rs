//! # Domain Entities for the Voting Ledger
//!
//! Records persisted in world state and the read-only history view.
//!
//! ## Wire Names
//!
//! Stored records use camelCase field names (`docType`, `alreadyVoted`,
//! `txId`, ...) so existing ledgers and clients keep decoding them.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Discriminator for option records within the shared keyspace.
pub const OPTION_DOC_TYPE: &str = "option";

/// Discriminator for the voter monitor singleton.
pub const VOTER_MONITOR_DOC_TYPE: &str = "voterMonitor";

/// Sentinel replacing name and votes of a deleted history entry.
pub const DELETED_MARKER: &str = "DELETED";

// =============================================================================
// OPTION
// =============================================================================

/// A voting choice.
///
/// `votes` is unsigned: a stored negative counter fails to decode instead of
/// flowing through the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRecord {
    /// Always [`OPTION_DOC_TYPE`].
    pub doc_type: String,
    /// Normalized primary key.
    pub key: String,
    /// Display name as supplied at creation.
    pub name: String,
    /// Number of votes cast for this option.
    pub votes: u64,
}

impl OptionRecord {
    /// Create a fresh option with zero votes.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            doc_type: OPTION_DOC_TYPE.to_string(),
            key: key.into(),
            name: name.into(),
            votes: 0,
        }
    }

    /// Returns true if the discriminator marks this as an option.
    #[must_use]
    pub fn is_option(&self) -> bool {
        self.doc_type == OPTION_DOC_TYPE
    }
}

// =============================================================================
// VOTER MONITOR
// =============================================================================

fn voter_monitor_doc_type() -> String {
    VOTER_MONITOR_DOC_TYPE.to_string()
}

/// Singleton tracking every voter who already cast a vote this election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterMonitor {
    /// Ledgers written before the discriminator existed omit it.
    #[serde(default = "voter_monitor_doc_type")]
    pub doc_type: String,
    /// Key the singleton is stored under.
    pub key: String,
    /// Voter identifiers in the order they were recorded.
    pub already_voted: Vec<String>,
}

impl VoterMonitor {
    /// Create the singleton holding a first voter.
    pub fn with_first_voter(key: impl Into<String>, voter: impl Into<String>) -> Self {
        Self {
            doc_type: voter_monitor_doc_type(),
            key: key.into(),
            already_voted: vec![voter.into()],
        }
    }

    /// Whether the voter id is recorded. Exact match, no normalization.
    #[must_use]
    pub fn contains(&self, voter: &str) -> bool {
        self.already_voted.iter().any(|v| v == voter)
    }
}

// =============================================================================
// HISTORY
// =============================================================================

/// Vote count of a history entry, or the deletion sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryVotes {
    /// Counter value at that point in time.
    Count(u64),
    /// The entry records a deletion.
    Deleted,
}

impl Serialize for HistoryVotes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(n) => serializer.serialize_u64(*n),
            Self::Deleted => serializer.serialize_str(DELETED_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for HistoryVotes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u64),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Self::Count(n)),
            Raw::Marker(m) if m == DELETED_MARKER => Ok(Self::Deleted),
            Raw::Marker(m) => Err(D::Error::custom(format!("unexpected votes marker: {m}"))),
        }
    }
}

/// One reconstructed entry of an option's history. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Key the history was queried for.
    pub key: String,
    /// Option name, or [`DELETED_MARKER`].
    pub name: String,
    /// Vote count, or the deletion sentinel.
    pub votes: HistoryVotes,
    /// Commit time formatted in Central European Time.
    pub timestamp: String,
    /// Commit time in milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    /// Identifier of the transaction that wrote this entry.
    pub tx_id: String,
    /// True if the entry records a deletion.
    pub is_deleted: bool,
}

impl HistoryRecord {
    /// Entry for a committed value.
    pub fn value(option: OptionRecord, key: &str, timestamp: String, millis: i64, tx_id: String) -> Self {
        Self {
            key: key.to_string(),
            name: option.name,
            votes: HistoryVotes::Count(option.votes),
            timestamp,
            timestamp_millis: millis,
            tx_id,
            is_deleted: false,
        }
    }

    /// Entry for a committed deletion.
    pub fn deleted(key: &str, timestamp: String, millis: i64, tx_id: String) -> Self {
        Self {
            key: key.to_string(),
            name: DELETED_MARKER.to_string(),
            votes: HistoryVotes::Deleted,
            timestamp,
            timestamp_millis: millis,
            tx_id,
            is_deleted: true,
        }
    }
}
