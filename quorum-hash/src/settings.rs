// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Hash size
pub const HASH_SIZE_BYTES: usize = 32;

/// Size of the extended hash used to accumulate the state root
pub const HASH_XOF_SIZE_BYTES: usize = 32;
