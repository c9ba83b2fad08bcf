// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! # Overview
//!
//! This crate provides everything needed to interact with the application
//! state machine implemented in `quorum-execution-worker`: the wire format of
//! transactions and messages, the requests and responses of the consensus
//! engine boundary, the error taxonomy and its stable codes, and the
//! `ApplicationController` trait.
//!
//! # Architecture
//!
//! ## config.rs
//! Contains configuration parameters for the execution pipeline.
//!
//! ## controller_traits.rs
//! Defines the `ApplicationController` trait driven by the consensus engine.
//!
//! ## error.rs
//! Defines `ErrorKind`, the closed set of outcome kinds, and `ExecutionError`.
//!
//! ## messages.rs
//! Defines the messages of the bank, staking and slashing modules and their routes.
//!
//! ## transaction.rs
//! Defines signed transactions, their codec and the signed hash.
//!
//! ## types.rs
//! Defines requests and responses of the consensus engine boundary.
//!
//! ## Test exports
//!
//! When the crate feature `test-exports` is enabled, tooling useful for testing purposes is exported.
//! See test_exports/mod.rs for details.

#![warn(missing_docs)]

mod config;
mod controller_traits;
mod error;
mod messages;
mod transaction;
mod types;

pub use config::ExecutionConfig;
pub use controller_traits::ApplicationController;
pub use error::{ErrorKind, ExecutionError, ExecutionResult};
pub use messages::*;
pub use transaction::*;
pub use types::*;

/// test exports
#[cfg(any(test, feature = "test-exports"))]
pub mod test_exports;

#[cfg(test)]
mod tests;
