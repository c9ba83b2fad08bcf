// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::test_exports::fund_account;
use crate::{AccountKeeper, LedgerConfig};
use quorum_db_exports::{CacheView, EmptyState};
use quorum_hash::Hash;
use quorum_models::{Address, Coins, Dec, Int};
use std::sync::Arc;

fn address(seed: &str) -> Address {
    Address(Hash::compute_from(seed.as_bytes()))
}

#[test]
fn test_fee_distribution_conserves_coins() {
    let keeper = AccountKeeper::new(LedgerConfig::default());
    let mut view = CacheView::new(Arc::new(EmptyState));
    let payer = address("payer");
    let val_a = address("validator_a");
    let val_b = address("validator_b");
    fund_account(&keeper, &mut view, &payer, &Coins::single("stake", 100u64).unwrap());

    keeper
        .collect_fee(&mut view, &payer, &Coins::single("stake", 10u64).unwrap())
        .unwrap();
    assert_eq!(keeper.get_fee_pool(&view).amount_of("stake"), Dec::from_u64(10));

    // 10 split 1:2 gives 3 and 6, one token stays in the pool
    let distributed = keeper
        .distribute_fee_pool(&mut view, &[(val_a, 1), (val_b, 2)])
        .unwrap();
    assert_eq!(distributed, Coins::single("stake", 9u64).unwrap());
    assert_eq!(keeper.get_balance(&view, &val_a, "stake"), Int::from(3u64));
    assert_eq!(keeper.get_balance(&view, &val_b, "stake"), Int::from(6u64));
    assert_eq!(keeper.get_fee_pool(&view).amount_of("stake"), Dec::one());

    let held: u64 = keeper
        .get_all_accounts(&view)
        .iter()
        .map(|account| account.coins.amount_of("stake").to_u64().unwrap())
        .sum();
    assert_eq!(held + 1, keeper.get_supply(&view, "stake").to_u64().unwrap());
}

#[test]
fn test_fee_distribution_without_recipients() {
    let keeper = AccountKeeper::new(LedgerConfig::default());
    let mut view = CacheView::new(Arc::new(EmptyState));
    let payer = address("payer");
    fund_account(&keeper, &mut view, &payer, &Coins::single("stake", 5u64).unwrap());
    keeper
        .collect_fee(&mut view, &payer, &Coins::single("stake", 5u64).unwrap())
        .unwrap();
    assert!(keeper.distribute_fee_pool(&mut view, &[]).unwrap().is_empty());
    assert_eq!(keeper.get_fee_pool(&view).amount_of("stake"), Dec::from_u64(5));
}

#[test]
fn test_fee_shares_ignore_the_denomination_cap() {
    let keeper = AccountKeeper::new(LedgerConfig {
        max_denoms_per_account: 1,
    });
    let mut view = CacheView::new(Arc::new(EmptyState));
    let payer = address("payer");
    let validator = address("validator");
    fund_account(&keeper, &mut view, &payer, &Coins::single("stake", 10u64).unwrap());
    fund_account(&keeper, &mut view, &validator, &Coins::single("atom", 1u64).unwrap());
    keeper
        .collect_fee(&mut view, &payer, &Coins::single("stake", 4u64).unwrap())
        .unwrap();

    // a plain credit cannot add a second denomination, a fee share can
    assert!(keeper
        .add_coins(&mut view, &validator, &Coins::single("stake", 1u64).unwrap())
        .is_err());
    keeper
        .distribute_fee_pool(&mut view, &[(validator, 1)])
        .unwrap();
    assert_eq!(keeper.get_balance(&view, &validator, "stake"), Int::from(4u64));
    assert_eq!(keeper.get_balance(&view, &validator, "atom"), Int::from(1u64));
}
