// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # General description
//!
//! Types, configuration and errors of the staking module, and the share
//! arithmetic of its pools and validators.
//!
//! Two token pools back the validators: the bonded pool for validators in the
//! consensus set, the unbonded pool for the others. Each pool issues shares;
//! a validator holds pool shares (`assets`) and issues delegator shares
//! (`liabilities`) against them. Deposits issue shares at the rate in force
//! before the deposit and withdrawals are rounded down, so that tokens are
//! never created by rounding.
//!
//! Every pool and validator operation re-checks its invariants before
//! returning. A violation is a `StakingError::InvariantViolation`, which
//! must stop block processing.

#![warn(missing_docs)]

mod config;
mod delegation;
mod error;
mod events;
pub mod keys;
mod pool;
mod validator;

pub use config::StakingConfig;
pub use delegation::*;
pub use error::{StakingError, StakingResult};
pub use events::{StakingEvent, StakingHook, StakingHooks};
pub use pool::{Pool, PoolDeserializer, PoolSerializer};
pub use validator::*;

/// test exports
#[cfg(any(test, feature = "test-exports"))]
pub mod test_exports;

#[cfg(test)]
mod tests;
