//! # Domain Layer (Inner Hexagon)
//!
//! Pure ledger logic: records, key derivation, canonical encoding,
//! timestamps and invariants. No I/O, no async.

pub mod canonical;
pub mod entities;
pub mod invariants;
pub mod keys;
pub mod timestamp;

pub use canonical::*;
pub use entities::*;
pub use invariants::*;
pub use keys::*;
pub use timestamp::*;
