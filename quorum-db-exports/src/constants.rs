// Copyright (c) 2022 MASSA LABS <info@massa.net>

// Hash
pub const STATE_HASH_BYTES_LEN: usize = quorum_hash::HASH_XOF_SIZE_BYTES;

// Errors
pub const CRUD_ERROR: &str = "critical: database crud operation failed";

// Prefixes
pub const POOL_KEY: &[u8] = b"pool/";
pub const ACCOUNT_PREFIX: &[u8] = b"account/";
pub const NEXT_ACCOUNT_NUMBER_KEY: &[u8] = b"account_number/";
pub const SUPPLY_PREFIX: &[u8] = b"supply/";
pub const FEE_POOL_KEY: &[u8] = b"fee_pool/";
pub const VALIDATOR_PREFIX: &[u8] = b"validator/";
pub const VALIDATOR_BY_CONS_PREFIX: &[u8] = b"validator_by_cons/";
pub const POWER_INDEX_PREFIX: &[u8] = b"power_index/";
pub const LAST_POWER_PREFIX: &[u8] = b"last_power/";
pub const DELEGATION_PREFIX: &[u8] = b"delegation/";
pub const UNBONDING_PREFIX: &[u8] = b"unbonding/";
pub const UNBONDING_BY_VAL_PREFIX: &[u8] = b"unbonding_by_val/";
pub const REDELEGATION_PREFIX: &[u8] = b"redelegation/";
pub const REDELEGATION_BY_SRC_PREFIX: &[u8] = b"redelegation_by_src/";
pub const REDELEGATION_BY_DST_PREFIX: &[u8] = b"redelegation_by_dst/";
pub const UNBONDING_QUEUE_PREFIX: &[u8] = b"unbonding_queue/";
pub const REDELEGATION_QUEUE_PREFIX: &[u8] = b"redelegation_queue/";
pub const VALIDATOR_QUEUE_PREFIX: &[u8] = b"validator_queue/";
pub const SIGNING_INFO_PREFIX: &[u8] = b"signinginfo/";
pub const SLASHING_PERIOD_PREFIX: &[u8] = b"slashingperiod/";
pub const MISSED_BLOCKS_PREFIX: &[u8] = b"missedblocks/";

// Ledger
pub const ACCOUNT_DESER_ERROR: &str = "critical: account deserialization failed";
pub const ACCOUNT_SER_ERROR: &str = "critical: account serialization failed";
pub const SUPPLY_DESER_ERROR: &str = "critical: supply deserialization failed";
pub const SUPPLY_SER_ERROR: &str = "critical: supply serialization failed";
pub const FEE_POOL_DESER_ERROR: &str = "critical: fee pool deserialization failed";
pub const FEE_POOL_SER_ERROR: &str = "critical: fee pool serialization failed";

// Staking
pub const POOL_DESER_ERROR: &str = "critical: pool deserialization failed";
pub const VALIDATOR_DESER_ERROR: &str = "critical: validator deserialization failed";
pub const DELEGATION_DESER_ERROR: &str = "critical: delegation deserialization failed";
pub const UNBONDING_DESER_ERROR: &str = "critical: unbonding delegation deserialization failed";
pub const REDELEGATION_DESER_ERROR: &str = "critical: redelegation deserialization failed";
pub const KEY_DESER_ERROR: &str = "critical: key deserialization failed";
pub const STAKING_SER_ERROR: &str = "critical: staking record serialization failed";

// Slashing
pub const SIGNING_INFO_DESER_ERROR: &str = "critical: signing info deserialization failed";
pub const SLASHING_PERIOD_DESER_ERROR: &str = "critical: slashing period deserialization failed";
pub const SLASHING_SER_ERROR: &str = "critical: slashing record serialization failed";
