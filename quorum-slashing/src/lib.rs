// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # General description
//!
//! The slashing module watches validator liveness and misbehavior and turns
//! them into slash and jail commands for the staking module.
//!
//! * Liveness: every bonded validator has a `ValidatorSigningInfo` and a bit
//!   window of the last `signed_blocks_window` blocks. A validator that signed
//!   fewer than `min_signed_per_window` of them is slashed and jailed.
//! * Double signing: evidence younger than `max_evidence_age` slashes the
//!   validator. The fraction is capped through the slashing period open at the
//!   infraction height, so that several infractions of a same period are only
//!   slashed once at the highest fraction.
//!
//! # Bonding transitions
//!
//! The module does not hold a handle on the staking keeper. It subscribes to
//! bonding transitions through `SlashingKeeper::hooks`, and answers liveness
//! and evidence handling with `SlashingCommand` values that the caller applies
//! to the staking keeper.

#![warn(missing_docs)]

mod config;
mod error;
mod keeper;
mod signing_info;

pub use config::SlashingConfig;
pub use error::{SlashingError, SlashingResult};
pub use keeper::{SlashingCommand, SlashingKeeper};
pub use signing_info::*;

/// test exports
#[cfg(any(test, feature = "test-exports"))]
pub mod test_exports;

#[cfg(test)]
mod tests;
