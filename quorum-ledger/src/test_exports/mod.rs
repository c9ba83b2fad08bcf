// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Ledger module `test_exports`

use crate::{AccountKeeper, LedgerConfig};
use quorum_db_exports::KVStore;
use quorum_models::{Address, Coin, Coins};

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            max_denoms_per_account: 16,
        }
    }
}

/// Mints `coins` and credits them to `address`, keeping the supply consistent
pub fn fund_account<S: KVStore + ?Sized>(
    keeper: &AccountKeeper,
    store: &mut S,
    address: &Address,
    coins: &Coins,
) {
    for coin in coins.iter() {
        keeper
            .mint(store, &Coin::new(&coin.denom, coin.amount.clone()))
            .expect("mint failed");
    }
    keeper
        .add_coins(store, address, coins)
        .expect("credit failed");
}
