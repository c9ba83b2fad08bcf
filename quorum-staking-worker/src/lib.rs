// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # General description
//!
//! The staking keeper. It moves bond-denomination tokens between accounts and
//! the staking pools, keeps delegations, unbonding and redelegation entries,
//! and decides at the end of each block which validators form the consensus
//! set.
//!
//! # Block lifecycle
//!
//! * begin block: `process_provisions` mints the hourly inflation into the bonded pool
//! * transactions: `create_validator`, `delegate`, `undelegate`, `begin_redelegation`
//! * evidence and missed blocks: `slash`, `jail`, `unjail`, driven by the slashing module
//! * end block: `end_block` returns the validator set changes for the consensus
//!   engine and the bonding events for the staking hooks, then pays out the
//!   matured unbondings
//!
//! # Queues
//!
//! Unbonding delegations, redelegations and unbonding validators are indexed
//! by completion time under big-endian time keys, so that each sweep walks
//! the queue in time order and stops at the first entry in the future.

#![warn(missing_docs)]

mod delegation;
mod inflation;
mod invariants;
mod keeper;
mod slash;
mod validator_set;

pub use inflation::HOURS_PER_YEAR;
pub use keeper::StakingKeeper;

/// test exports
#[cfg(any(test, feature = "test-exports"))]
pub mod test_exports;

#[cfg(test)]
mod tests;
