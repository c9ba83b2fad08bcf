// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{address, at, empty_view, GENESIS_TIME};
use crate::test_exports::{
    assert_conservation, block_header, create_funded_validator, default_keeper,
};
use assert_matches::assert_matches;
use quorum_ledger::test_exports::fund_account;
use quorum_models::{Address, Coin, Coins, Dec, Int};
use quorum_staking_exports::StakingError;
use std::str::FromStr;

#[test]
fn test_slash_unbonding_entries_then_validator() {
    let keeper = default_keeper();
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let operator = address("operator");
    let delegator = address("delegator");
    let consensus = create_funded_validator(&keeper, &mut view, &operator, 100, 100);
    let cons_addr = Address::from_public_key(&consensus.get_public_key());
    fund_account(
        &keeper.ledger,
        &mut view,
        &delegator,
        &Coins::single("stake", 100u64).unwrap(),
    );
    keeper
        .delegate(&mut view, &delegator, &operator, &Coin::new("stake", 100u64))
        .unwrap();
    keeper.end_block(&mut view, &block_header(1, at(0))).unwrap();

    keeper
        .undelegate(
            &mut view,
            &block_header(5, at(50)),
            &delegator,
            &operator,
            &Dec::from_u64(50),
        )
        .unwrap();

    // infraction at height 3 with power 200: 20 tokens are slashed
    let burned = keeper
        .slash(
            &mut view,
            &block_header(10, at(100)),
            &cons_addr,
            3,
            200,
            &Dec::from_str("0.1").unwrap(),
        )
        .unwrap();
    assert_eq!(burned, 20);
    assert_eq!(
        keeper.ledger.get_supply(&view, "stake"),
        Int::from(180u64)
    );
    // the unbonding entry created after the infraction lost 10% of its initial balance
    let ubd = keeper
        .get_unbonding_delegation(&view, &delegator, &operator)
        .unwrap();
    assert_eq!(ubd.entries[0].initial_balance, 50);
    assert_eq!(ubd.entries[0].balance, 45);
    // the validator covered the rest
    let pool = keeper.get_pool(&view);
    let validator = keeper.get_validator(&view, &operator).unwrap();
    assert_eq!(validator.tokens(&pool).unwrap(), 135);
    assert_eq!(validator.liabilities, Dec::from_u64(150));
    assert_eq!(
        validator
            .shares_to_tokens(&pool, &Dec::from_u64(50))
            .unwrap(),
        45
    );
    assert_conservation(&keeper, &view);
}

#[test]
fn test_slash_at_current_height_spares_unbondings() {
    let keeper = default_keeper();
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let operator = address("operator");
    let consensus = create_funded_validator(&keeper, &mut view, &operator, 100, 100);
    keeper.end_block(&mut view, &block_header(1, at(0))).unwrap();
    keeper
        .undelegate(
            &mut view,
            &block_header(2, at(10)),
            &operator,
            &operator,
            &Dec::from_u64(50),
        )
        .unwrap();

    let burned = keeper
        .slash(
            &mut view,
            &block_header(2, at(10)),
            &Address::from_public_key(&consensus.get_public_key()),
            2,
            100,
            &Dec::from_str("0.5").unwrap(),
        )
        .unwrap();
    // capped by the 50 tokens the validator still holds
    assert_eq!(burned, 50);
    let ubd = keeper
        .get_unbonding_delegation(&view, &operator, &operator)
        .unwrap();
    assert_eq!(ubd.entries[0].balance, 50);
    assert_eq!(
        keeper
            .get_validator(&view, &operator)
            .unwrap()
            .tokens(&keeper.get_pool(&view))
            .unwrap(),
        0
    );
    assert_conservation(&keeper, &view);

    // delegators of a fully slashed validator cannot add to it anymore
    assert_matches!(
        keeper.delegate(&mut view, &operator, &operator, &Coin::new("stake", 1u64)),
        Err(StakingError::InvalidRequest(_))
    );
}

#[test]
fn test_slash_redelegation() {
    let keeper = default_keeper();
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let src = address("src");
    let dst = address("dst");
    let delegator = address("delegator");
    let src_key = create_funded_validator(&keeper, &mut view, &src, 100, 100);
    create_funded_validator(&keeper, &mut view, &dst, 100, 100);
    fund_account(
        &keeper.ledger,
        &mut view,
        &delegator,
        &Coins::single("stake", 100u64).unwrap(),
    );
    keeper
        .delegate(&mut view, &delegator, &src, &Coin::new("stake", 100u64))
        .unwrap();
    keeper.end_block(&mut view, &block_header(1, at(0))).unwrap();
    keeper
        .begin_redelegation(
            &mut view,
            &block_header(5, at(50)),
            &delegator,
            &src,
            &dst,
            &Dec::from_u64(100),
        )
        .unwrap();

    let burned = keeper
        .slash(
            &mut view,
            &block_header(10, at(100)),
            &Address::from_public_key(&src_key.get_public_key()),
            3,
            200,
            &Dec::from_str("0.1").unwrap(),
        )
        .unwrap();
    assert_eq!(burned, 20);
    // 10 tokens taken from the redelegated stake at the destination
    assert_eq!(
        keeper.get_delegation(&view, &delegator, &dst).unwrap().shares,
        Dec::from_u64(90)
    );
    let pool = keeper.get_pool(&view);
    assert_eq!(
        keeper.get_validator(&view, &dst).unwrap().tokens(&pool).unwrap(),
        190
    );
    // 10 from the source validator itself
    assert_eq!(
        keeper.get_validator(&view, &src).unwrap().tokens(&pool).unwrap(),
        90
    );
    assert_conservation(&keeper, &view);
}

#[test]
fn test_slash_edge_cases() {
    let keeper = default_keeper();
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let operator = address("operator");
    let consensus = create_funded_validator(&keeper, &mut view, &operator, 100, 100);
    let cons_addr = Address::from_public_key(&consensus.get_public_key());
    let header = block_header(5, at(50));

    assert_eq!(
        keeper
            .slash(&mut view, &header, &address("unknown"), 1, 10, &Dec::one())
            .unwrap(),
        0
    );
    assert_matches!(
        keeper.slash(&mut view, &header, &cons_addr, 1, 10, &Dec::from_u64(2)),
        Err(StakingError::InvalidRequest(_))
    );
    assert_matches!(
        keeper.slash(&mut view, &header, &cons_addr, 6, 10, &Dec::one()),
        Err(StakingError::InvalidRequest(_))
    );
    assert_conservation(&keeper, &view);
}

#[test]
fn test_jail_and_unjail() {
    let keeper = default_keeper();
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let operator = address("operator");
    let consensus = create_funded_validator(&keeper, &mut view, &operator, 100, 100);
    let cons_addr = Address::from_public_key(&consensus.get_public_key());
    keeper.end_block(&mut view, &block_header(1, at(0))).unwrap();

    keeper.jail(&mut view, &cons_addr).unwrap();
    assert!(keeper.get_validator(&view, &operator).unwrap().jailed);
    let (updates, _) = keeper.end_block(&mut view, &block_header(2, at(10))).unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].power, 0);

    keeper.unjail(&mut view, &cons_addr).unwrap();
    let (updates, _) = keeper.end_block(&mut view, &block_header(3, at(20))).unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].power, 100);
    assert_conservation(&keeper, &view);
}
