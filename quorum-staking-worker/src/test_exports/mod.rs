// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Staking keeper `test_exports`

use crate::StakingKeeper;
use quorum_db_exports::{KVRead, KVStore};
use quorum_ledger::{test_exports::fund_account, AccountKeeper, LedgerConfig};
use quorum_models::{Address, BlockHeader, Coin, Coins, Int};
use quorum_signature::KeyPair;
use quorum_staking_exports::StakingConfig;
use quorum_time::QuorumTime;

/// Keeper with the default test configurations
pub fn default_keeper() -> StakingKeeper {
    StakingKeeper::new(
        StakingConfig::default(),
        AccountKeeper::new(LedgerConfig::default()),
    )
}

/// Header of a block of the test chain
pub fn block_header(height: u64, time: QuorumTime) -> BlockHeader {
    BlockHeader {
        chain_id: "test-chain".to_string(),
        height,
        time,
    }
}

/// Funds `operator` with `funds` and registers it as a validator bonding `self_bond`.
/// Returns the consensus key pair.
pub fn create_funded_validator<S: KVStore + ?Sized>(
    keeper: &StakingKeeper,
    store: &mut S,
    operator: &Address,
    funds: u64,
    self_bond: u64,
) -> KeyPair {
    let denom = keeper.config.bond_denom.clone();
    fund_account(
        &keeper.ledger,
        store,
        operator,
        &Coins::single(&denom, funds).expect("invalid coins"),
    );
    let consensus = KeyPair::generate();
    keeper
        .create_validator(
            store,
            operator,
            consensus.get_public_key(),
            &Coin::new(&denom, self_bond),
        )
        .expect("validator creation failed");
    consensus
}

/// Asserts that every bond-denomination token of the supply is either in an
/// account, in the fee pool, or in one of the staking pools
pub fn assert_conservation<S: KVRead + ?Sized>(keeper: &StakingKeeper, store: &S) {
    let denom = &keeper.config.bond_denom;
    let supply = keeper.ledger.get_supply(store, denom);
    let mut held = Int::from(
        keeper
            .get_pool(store)
            .total_tokens()
            .expect("pool total overflow"),
    );
    for account in keeper.ledger.get_all_accounts(store) {
        held = held
            .checked_add(&account.coins.amount_of(denom))
            .expect("balance overflow");
    }
    let fees = keeper
        .ledger
        .get_fee_pool(store)
        .amount_of(denom)
        .truncate_int()
        .expect("fee pool overflow");
    held = held.checked_add(&fees).expect("fee overflow");
    assert_eq!(held, supply, "tokens were created or destroyed");
    keeper
        .check_invariants(store)
        .expect("staking invariants violated");
}
