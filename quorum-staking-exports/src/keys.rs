// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Storage keys of the staking module. Integers are big-endian so that the
//! key order matches the numeric order.

use quorum_db_exports::{
    DELEGATION_PREFIX, LAST_POWER_PREFIX, POWER_INDEX_PREFIX, REDELEGATION_BY_DST_PREFIX,
    REDELEGATION_BY_SRC_PREFIX, REDELEGATION_PREFIX, REDELEGATION_QUEUE_PREFIX,
    UNBONDING_BY_VAL_PREFIX, UNBONDING_PREFIX, UNBONDING_QUEUE_PREFIX, VALIDATOR_BY_CONS_PREFIX,
    VALIDATOR_PREFIX, VALIDATOR_QUEUE_PREFIX,
};
use quorum_models::constants::ADDRESS_SIZE_BYTES;
use quorum_models::Address;
use quorum_time::QuorumTime;

/// `validator/<operator>`
pub fn validator_key(operator: &Address) -> Vec<u8> {
    [VALIDATOR_PREFIX, &operator.to_bytes()[..]].concat()
}

/// `validator_by_cons/<consensus address>`
pub fn validator_by_cons_key(consensus_address: &Address) -> Vec<u8> {
    [VALIDATOR_BY_CONS_PREFIX, &consensus_address.to_bytes()[..]].concat()
}

/// `power_index/<u64::MAX - power><operator>`: highest power first, then operator ascending
pub fn power_index_key(power: u64, operator: &Address) -> Vec<u8> {
    [
        POWER_INDEX_PREFIX,
        &(u64::MAX - power).to_be_bytes()[..],
        &operator.to_bytes()[..],
    ]
    .concat()
}

/// `last_power/<operator>`
pub fn last_power_key(operator: &Address) -> Vec<u8> {
    [LAST_POWER_PREFIX, &operator.to_bytes()[..]].concat()
}

/// `delegation/<delegator><validator>`
pub fn delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    [
        DELEGATION_PREFIX,
        &delegator.to_bytes()[..],
        &validator.to_bytes()[..],
    ]
    .concat()
}

/// `delegation/<delegator>`
pub fn delegation_prefix(delegator: &Address) -> Vec<u8> {
    [DELEGATION_PREFIX, &delegator.to_bytes()[..]].concat()
}

/// `unbonding/<delegator><validator>`
pub fn unbonding_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    [
        UNBONDING_PREFIX,
        &delegator.to_bytes()[..],
        &validator.to_bytes()[..],
    ]
    .concat()
}

/// `unbonding_by_val/<validator><delegator>`
pub fn unbonding_by_val_key(validator: &Address, delegator: &Address) -> Vec<u8> {
    [
        UNBONDING_BY_VAL_PREFIX,
        &validator.to_bytes()[..],
        &delegator.to_bytes()[..],
    ]
    .concat()
}

/// `unbonding_by_val/<validator>`
pub fn unbonding_by_val_prefix(validator: &Address) -> Vec<u8> {
    [UNBONDING_BY_VAL_PREFIX, &validator.to_bytes()[..]].concat()
}

/// `redelegation/<delegator><src><dst>`
pub fn redelegation_key(delegator: &Address, src: &Address, dst: &Address) -> Vec<u8> {
    [
        REDELEGATION_PREFIX,
        &delegator.to_bytes()[..],
        &src.to_bytes()[..],
        &dst.to_bytes()[..],
    ]
    .concat()
}

/// `redelegation_by_src/<src><delegator><dst>`
pub fn redelegation_by_src_key(src: &Address, delegator: &Address, dst: &Address) -> Vec<u8> {
    [
        REDELEGATION_BY_SRC_PREFIX,
        &src.to_bytes()[..],
        &delegator.to_bytes()[..],
        &dst.to_bytes()[..],
    ]
    .concat()
}

/// `redelegation_by_src/<src>`
pub fn redelegation_by_src_prefix(src: &Address) -> Vec<u8> {
    [REDELEGATION_BY_SRC_PREFIX, &src.to_bytes()[..]].concat()
}

/// `redelegation_by_dst/<dst><delegator><src>`
pub fn redelegation_by_dst_key(dst: &Address, delegator: &Address, src: &Address) -> Vec<u8> {
    [
        REDELEGATION_BY_DST_PREFIX,
        &dst.to_bytes()[..],
        &delegator.to_bytes()[..],
        &src.to_bytes()[..],
    ]
    .concat()
}

/// `redelegation_by_dst/<dst>` or `redelegation_by_dst/<dst><delegator>`
pub fn redelegation_by_dst_prefix(dst: &Address, delegator: Option<&Address>) -> Vec<u8> {
    let mut prefix = [REDELEGATION_BY_DST_PREFIX, &dst.to_bytes()[..]].concat();
    if let Some(delegator) = delegator {
        prefix.extend_from_slice(delegator.to_bytes());
    }
    prefix
}

/// `unbonding_queue/<time><delegator><validator>`
pub fn unbonding_queue_key(time: QuorumTime, delegator: &Address, validator: &Address) -> Vec<u8> {
    [
        UNBONDING_QUEUE_PREFIX,
        &time.to_millis().to_be_bytes()[..],
        &delegator.to_bytes()[..],
        &validator.to_bytes()[..],
    ]
    .concat()
}

/// `redelegation_queue/<time><delegator><src><dst>`
pub fn redelegation_queue_key(
    time: QuorumTime,
    delegator: &Address,
    src: &Address,
    dst: &Address,
) -> Vec<u8> {
    [
        REDELEGATION_QUEUE_PREFIX,
        &time.to_millis().to_be_bytes()[..],
        &delegator.to_bytes()[..],
        &src.to_bytes()[..],
        &dst.to_bytes()[..],
    ]
    .concat()
}

/// `validator_queue/<time><operator>`
pub fn validator_queue_key(time: QuorumTime, operator: &Address) -> Vec<u8> {
    [
        VALIDATOR_QUEUE_PREFIX,
        &time.to_millis().to_be_bytes()[..],
        &operator.to_bytes()[..],
    ]
    .concat()
}

/// Time encoded right after `prefix` in a queue key
pub fn queue_key_time(prefix: &[u8], key: &[u8]) -> Option<QuorumTime> {
    let bytes: [u8; 8] = key.get(prefix.len()..prefix.len() + 8)?.try_into().ok()?;
    Some(QuorumTime::from_millis(u64::from_be_bytes(bytes)))
}

/// The `count` addresses that follow the first `offset` bytes of a key
pub fn addresses_from_key(key: &[u8], offset: usize, count: usize) -> Option<Vec<Address>> {
    let mut addresses = Vec::with_capacity(count);
    for idx in 0..count {
        let start = offset + idx * ADDRESS_SIZE_BYTES;
        let bytes: [u8; ADDRESS_SIZE_BYTES] =
            key.get(start..start + ADDRESS_SIZE_BYTES)?.try_into().ok()?;
        addresses.push(Address::from_bytes(&bytes));
    }
    Some(addresses)
}
