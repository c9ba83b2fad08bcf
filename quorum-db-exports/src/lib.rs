// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Storage boundary of the state machine.
//!
//! Keepers only see the `KVRead`/`KVStore` traits. Block execution writes into
//! a `CacheView` layered over the last committed `DBSnapshot`; the view is then
//! handed to a `QuorumDBController` as a `DBBatch` at commit time.

mod cache_view;
mod constants;
mod controller;
mod error;
mod settings;

pub use cache_view::*;
pub use constants::*;
pub use controller::*;
pub use error::*;
pub use settings::*;

#[cfg(test)]
mod tests;
