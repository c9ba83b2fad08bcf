// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::test_exports::fund_account;
use crate::{AccountKeeper, LedgerConfig, LedgerError};
use assert_matches::assert_matches;
use quorum_db_exports::{CacheView, EmptyState, KVRead};
use quorum_hash::Hash;
use quorum_models::{Address, Coin, Coins, Int};
use std::sync::Arc;

fn address(seed: &str) -> Address {
    Address(Hash::compute_from(seed.as_bytes()))
}

fn setup() -> (AccountKeeper, CacheView) {
    (
        AccountKeeper::new(LedgerConfig::default()),
        CacheView::new(Arc::new(EmptyState)),
    )
}

#[test]
fn test_account_numbers_are_assigned_once() {
    let (keeper, mut view) = setup();
    let alice = address("alice");
    let bob = address("bob");

    assert!(keeper.get_account(&view, &alice).is_none());
    assert_eq!(keeper.new_account(&mut view, &alice).account_number, 0);
    assert_eq!(keeper.new_account(&mut view, &bob).account_number, 1);
    // creating again keeps the number
    assert_eq!(keeper.new_account(&mut view, &alice).account_number, 0);
    assert_eq!(keeper.get_all_accounts(&view).len(), 2);
}

#[test]
fn test_send_coins() {
    let (keeper, mut view) = setup();
    let alice = address("alice");
    let bob = address("bob");
    fund_account(&keeper, &mut view, &alice, &Coins::single("stake", 100u64).unwrap());

    keeper
        .send_coins(&mut view, &alice, &bob, &Coins::single("stake", 40u64).unwrap())
        .unwrap();
    assert_eq!(keeper.get_balance(&view, &alice, "stake"), Int::from(60u64));
    assert_eq!(keeper.get_balance(&view, &bob, "stake"), Int::from(40u64));

    // the whole balance can be sent, the denomination then disappears
    keeper
        .send_coins(&mut view, &alice, &bob, &Coins::single("stake", 60u64).unwrap())
        .unwrap();
    let alice_account = keeper.get_account(&view, &alice).unwrap();
    assert!(alice_account.coins.is_empty());
    assert_eq!(keeper.get_supply(&view, "stake"), Int::from(100u64));
}

#[test]
fn test_insufficient_funds_leaves_balances_untouched() {
    let (keeper, mut view) = setup();
    let alice = address("alice");
    let bob = address("bob");
    fund_account(&keeper, &mut view, &alice, &Coins::single("stake", 10u64).unwrap());

    assert_matches!(
        keeper.send_coins(&mut view, &alice, &bob, &Coins::single("stake", 11u64).unwrap()),
        Err(LedgerError::InsufficientFunds(_))
    );
    assert_matches!(
        keeper.subtract_coins(&mut view, &bob, &Coins::single("stake", 1u64).unwrap()),
        Err(LedgerError::InsufficientFunds(_))
    );
    assert_eq!(keeper.get_balance(&view, &alice, "stake"), Int::from(10u64));
    assert!(keeper.get_account(&view, &bob).is_none());
}

#[test]
fn test_sequence_and_supply() {
    let (keeper, mut view) = setup();
    let alice = address("alice");
    assert_matches!(
        keeper.increment_sequence(&mut view, &alice),
        Err(LedgerError::InvalidRequest(_))
    );
    keeper.new_account(&mut view, &alice);
    assert_eq!(keeper.increment_sequence(&mut view, &alice).unwrap(), 1);
    assert_eq!(keeper.increment_sequence(&mut view, &alice).unwrap(), 2);

    keeper.mint(&mut view, &Coin::new("stake", 5u64)).unwrap();
    keeper.burn(&mut view, &Coin::new("stake", 5u64)).unwrap();
    assert!(view.get(b"supply/stake").is_none());
    assert_matches!(
        keeper.burn(&mut view, &Coin::new("stake", 1u64)),
        Err(LedgerError::InvariantViolation(_))
    );
}

#[test]
fn test_max_denoms_per_account() {
    let keeper = AccountKeeper::new(LedgerConfig {
        max_denoms_per_account: 2,
    });
    let mut view = CacheView::new(Arc::new(EmptyState));
    let alice = address("alice");
    let coins = Coins::new(vec![Coin::new("aaa", 1u64), Coin::new("bbb", 1u64)]).unwrap();
    keeper.add_coins(&mut view, &alice, &coins).unwrap();
    assert_matches!(
        keeper.add_coins(&mut view, &alice, &Coins::single("ccc", 1u64).unwrap()),
        Err(LedgerError::InvalidRequest(_))
    );
}
