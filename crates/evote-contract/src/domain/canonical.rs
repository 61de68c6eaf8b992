//! # Canonical JSON
//!
//! Every value written to world state goes through [`to_canonical_vec`].
//! Endorsing peers compare the bytes (and hashes) of each write-set, so two
//! executions of the same logical write must emit identical bytes:
//!
//! - object keys sorted lexicographically at every nesting level
//! - no whitespace
//! - integers in plain decimal
//!
//! Keys are re-sorted explicitly instead of relying on `serde_json`'s default
//! map type, which turns into an insertion-ordered map as soon as any crate in
//! the build enables `preserve_order`.

use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize a value into canonical JSON bytes.
pub fn to_canonical_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let tree = serde_json::to_value(value)?;
    serde_json::to_vec(&sort_keys(tree))
}

/// Serialize a value into a canonical JSON string.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let tree = serde_json::to_value(value)?;
    serde_json::to_string(&sort_keys(tree))
}

/// Keys sort by UTF-8 bytes. This matches UTF-16 code-unit order except for
/// characters outside the BMP; every key the contract writes is ASCII.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, sort_keys(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
