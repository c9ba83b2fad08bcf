// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! # General description
//!
//! `QuorumDB` is the reference versioned storage engine of the state machine:
//! * an ordered in-memory map holding the state
//! * a state root, kept up to date with XOR folding (see `HashXof`)
//! * a bounded history of committed batches and read snapshots
//!
//! # State root
//!
//! Every `(key, value)` entry contributes `HashXof(key, value)` to the root.
//! Writing a key removes the contribution of its previous value and adds the
//! new one, so the root only depends on the content of the state.
//!
//! # Snapshots
//!
//! Each committed version keeps an immutable `DBSnapshot`. Queries bind to one of
//! them and never observe a partially applied block.

mod quorum_db;

pub use crate::quorum_db::*;
