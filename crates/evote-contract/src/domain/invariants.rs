//! # Domain Invariants
//!
//! Checks the contract runs against every record it is about to write.
//!
//! - Fresh options: discriminator set, zero votes
//! - Vote increments: identity unchanged, counter +1 exactly
//! - Voter recording: append-only, previous entries untouched

use crate::domain::entities::OptionRecord;

/// A newly created option carries the option discriminator and zero votes.
#[must_use]
pub fn check_fresh_option_invariant(option: &OptionRecord) -> bool {
    option.is_option() && option.votes == 0
}

/// A vote changes nothing but the counter, and moves it by exactly one.
#[must_use]
pub fn check_vote_increment_invariant(before: &OptionRecord, after: &OptionRecord) -> bool {
    before.key == after.key
        && before.name == after.name
        && before.doc_type == after.doc_type
        && before.votes.checked_add(1) == Some(after.votes)
}

/// Recording a voter appends exactly that voter and keeps the prefix intact.
#[must_use]
pub fn check_voter_append_invariant(before: &[String], after: &[String], voter: &str) -> bool {
    after.len() == before.len() + 1
        && after[..before.len()] == *before
        && after.last().map(String::as_str) == Some(voter)
}
