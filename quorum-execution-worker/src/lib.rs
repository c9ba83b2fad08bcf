// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! # General description
//!
//! The application state machine driven by the consensus engine, through the
//! `ApplicationController` defined in `quorum-execution-exports`.
//!
//! # Transaction pipeline
//!
//! Every transaction goes through the same stages, each one able to stop it
//! with its own error kind:
//! 1. decode: size limit and wire codec
//! 2. authenticate: signatures, account numbers, sequences, fee payment
//! 3. route: module handler, message decoding, signer of each message
//! 4. execute: the handlers apply the messages in order
//!
//! Failures of the first three stages leave no write behind. A failure of
//! the execute stage discards the writes of the handlers but keeps the fee
//! and the sequence increment of stage 2, so that the transaction cannot be
//! replayed for free.
//!
//! `deliver_tx` runs all stages against the block view. `check_tx` runs the
//! first three against the check view, keeping the fee and sequence effects
//! until the next commit.
//!
//! # Architecture
//!
//! ## ante.rs
//! Decoding and authentication.
//!
//! ## router.rs
//! The `Handler` trait and the module routes.
//!
//! ## handlers.rs
//! Bank, staking and slashing handlers.
//!
//! ## context.rs
//! Keepers, hooks and routes, built once from the configuration.
//!
//! ## execution.rs
//! Block lifecycle and mempool checks.
//!
//! ## controller.rs
//! `ApplicationController` implementation and queries on committed versions.

#![warn(missing_docs)]

mod ante;
mod context;
mod controller;
mod execution;
mod handlers;
mod router;
mod worker;

pub use worker::start_application;

/// test exports
#[cfg(any(test, feature = "test-exports"))]
pub mod test_exports;

#[cfg(test)]
mod tests;
