//! # Key Derivation
//!
//! Option keys are derived from the option name: every whitespace character
//! is removed and the rest is lowercased. The same normalization is applied
//! to the key argument of every lookup, so `"New York"`, `"new york"` and
//! `"NEWYORK"` all address `newyork`.

use crate::errors::ContractError;

/// Default key of the voter monitor singleton.
pub const VOTER_MONITOR_KEY: &str = "voterMonitor";

/// Options seeded by `InitLedger` unless configured otherwise.
pub const DEFAULT_SEED_OPTIONS: [&str; 3] = ["Rom", "Barcelona", "Hamburg"];

/// Normalize a name or key: strip all whitespace, lowercase the rest.
#[must_use]
pub fn format_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Derive an option key, rejecting keys that cannot address an option.
///
/// A key that normalizes to nothing, or collides with the voter monitor
/// singleton, is an `InvalidArgument`.
pub fn option_key(raw: &str, reserved: &str) -> Result<String, ContractError> {
    let key = format_key(raw);
    if key.is_empty() {
        return Err(ContractError::InvalidArgument(format!(
            "option key derived from {raw:?} is empty"
        )));
    }
    if key == reserved {
        return Err(ContractError::InvalidArgument(format!(
            "option key {key} is reserved"
        )));
    }
    Ok(key)
}
