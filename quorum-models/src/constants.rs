// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Number of decimal places kept by `Dec` after every multiplication and division
pub const DEC_PRECISION: u32 = 10;

/// Maximal magnitude of an `Int`, in bits
pub const INT_MAX_BIT_LEN: u64 = 255;

/// Maximal length of a serialized `Int` magnitude, in bytes
pub const INT_MAX_BYTES: u64 = 32;

/// Minimal length of a denomination
pub const DENOM_MIN_LENGTH: usize = 3;

/// Maximal length of a denomination
pub const DENOM_MAX_LENGTH: usize = 16;

/// Maximal number of distinct denominations in a serialized coin list
pub const MAX_COINS_LENGTH: u64 = 64;

/// Size of an address in bytes
pub const ADDRESS_SIZE_BYTES: usize = quorum_hash::HASH_SIZE_BYTES;

/// Prefix of the textual form of an address
pub const ADDRESS_PREFIX: char = 'Q';
