// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Hashing primitives: identifiers and the state root accumulator

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]
pub use error::QuorumHashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use hash_xof::{HashXof, HashXofDeserializer, HashXofSerializer};
pub use settings::{HASH_SIZE_BYTES, HASH_XOF_SIZE_BYTES};

mod error;
mod hash;
mod hash_xof;
mod settings;
