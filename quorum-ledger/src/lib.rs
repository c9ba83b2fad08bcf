// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # General description
//!
//! The account store: balances, sequence numbers and account numbers of every
//! address, plus the per-denomination supply and the fee pool.
//!
//! `AccountKeeper` holds no state of its own. Every operation reads and writes
//! through the `KVStore` it is handed, usually the `CacheView` of the block or
//! transaction being applied, so that rollbacks are handled by the caller.
//!
//! # Invariant
//!
//! For each denomination, the supply equals the sum of the account balances,
//! the fee pool, and the tokens held by other modules (the staking pools).
//! Only `mint` and `burn` move the supply.

#![warn(missing_docs)]

mod account_keeper;
mod config;
mod error;

pub use account_keeper::AccountKeeper;
pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};

/// test exports
#[cfg(any(test, feature = "test-exports"))]
pub mod test_exports;

#[cfg(test)]
mod tests;
