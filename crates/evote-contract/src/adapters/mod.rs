//! # Adapters Layer (Outer Hexagon)
//!
//! Implementations of the world-state port.

pub mod memory_ledger;

pub use memory_ledger::*;
