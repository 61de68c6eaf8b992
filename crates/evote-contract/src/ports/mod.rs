//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Port (Inbound)**: `VotingContractApi`, `ContractFunction`
//! - **Driven Port (Outbound)**: `ChaincodeStub`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
