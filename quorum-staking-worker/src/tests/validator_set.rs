// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{address, at, empty_view, GENESIS_TIME};
use crate::test_exports::{assert_conservation, block_header, create_funded_validator};
use crate::StakingKeeper;
use quorum_ledger::{AccountKeeper, LedgerConfig};
use quorum_models::{Address, Coin};
use quorum_staking_exports::{StakingConfig, StakingEvent, ValidatorStatus, ValidatorUpdate};

fn keeper_with_max_validators(max_validators: u32) -> StakingKeeper {
    StakingKeeper::new(
        StakingConfig {
            max_validators,
            ..StakingConfig::default()
        },
        AccountKeeper::new(LedgerConfig::default()),
    )
}

#[test]
fn test_validator_set_ranking_and_tie_break() {
    let keeper = keeper_with_max_validators(2);
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let strong = address("strong");
    let (tie_a, tie_b) = {
        let (a, b) = (address("tie-a"), address("tie-b"));
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    };
    let strong_key = create_funded_validator(&keeper, &mut view, &strong, 30, 30);
    // created in reverse order so that creation order does not decide
    create_funded_validator(&keeper, &mut view, &tie_b, 20, 20);
    let tie_a_key = create_funded_validator(&keeper, &mut view, &tie_a, 20, 20);

    let (updates, events) = keeper.end_block(&mut view, &block_header(1, at(0))).unwrap();
    assert_eq!(
        updates,
        vec![
            ValidatorUpdate {
                consensus_pubkey: strong_key.get_public_key(),
                power: 30
            },
            ValidatorUpdate {
                consensus_pubkey: tie_a_key.get_public_key(),
                power: 20
            },
        ]
    );
    assert_eq!(events.len(), 2);
    assert_eq!(
        keeper.get_validator(&view, &tie_b).unwrap().status,
        ValidatorStatus::Unbonded
    );

    // nothing changed, nothing to report
    let (updates, events) = keeper.end_block(&mut view, &block_header(2, at(5))).unwrap();
    assert!(updates.is_empty());
    assert!(events.is_empty());
    assert_conservation(&keeper, &view);
}

#[test]
fn test_validator_set_rotation_moves_tokens_between_pools() {
    let keeper = keeper_with_max_validators(1);
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let first = address("first");
    let second = address("second");
    let first_key = create_funded_validator(&keeper, &mut view, &first, 40, 40);
    let second_key = create_funded_validator(&keeper, &mut view, &second, 100, 30);
    keeper.end_block(&mut view, &block_header(1, at(0))).unwrap();
    let pool = keeper.get_pool(&view);
    assert_eq!((pool.bonded_pool, pool.unbonded_pool), (40, 30));

    // the second validator overtakes the first one
    keeper
        .delegate(&mut view, &second, &second, &Coin::new("stake", 20u64))
        .unwrap();
    let before = keeper.get_pool(&view);
    let first_before = keeper.get_validator(&view, &first).unwrap();
    let (updates, events) = keeper.end_block(&mut view, &block_header(2, at(10))).unwrap();
    assert_eq!(
        updates,
        vec![
            ValidatorUpdate {
                consensus_pubkey: second_key.get_public_key(),
                power: 50
            },
            ValidatorUpdate {
                consensus_pubkey: first_key.get_public_key(),
                power: 0
            },
        ]
    );
    assert_eq!(
        events,
        vec![
            StakingEvent::ValidatorBonded {
                consensus_address: Address::from_public_key(&second_key.get_public_key())
            },
            StakingEvent::ValidatorBeginUnbonding {
                consensus_address: Address::from_public_key(&first_key.get_public_key())
            },
        ]
    );
    let after = keeper.get_pool(&view);
    assert_eq!(
        before.bonded_pool + before.unbonded_pool,
        after.bonded_pool + after.unbonded_pool
    );
    assert_eq!((after.bonded_pool, after.unbonded_pool), (50, 40));

    let first_after = keeper.get_validator(&view, &first).unwrap();
    assert_eq!(first_after.status, ValidatorStatus::Unbonding);
    assert_eq!(first_after.liabilities, first_before.liabilities);
    assert_eq!(first_after.tokens(&after).unwrap(), 40);
    assert_eq!(first_after.unbonding_height, 2);
    assert_eq!(
        keeper.get_last_validator_powers(&view),
        vec![(second, 50)]
    );
    assert_conservation(&keeper, &view);

    // after its unbonding time the first validator is unbonded, but kept: it still has delegators
    let unbonding_time = first_after.unbonding_time;
    keeper
        .end_block(&mut view, &block_header(3, unbonding_time))
        .unwrap();
    let first_after = keeper.get_validator(&view, &first).unwrap();
    assert_eq!(first_after.status, ValidatorStatus::Unbonded);
    assert_conservation(&keeper, &view);
}

#[test]
fn test_rebonding_cancels_validator_unbonding() {
    let keeper = keeper_with_max_validators(1);
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let first = address("first");
    let second = address("second");
    create_funded_validator(&keeper, &mut view, &first, 100, 40);
    create_funded_validator(&keeper, &mut view, &second, 100, 30);
    keeper.end_block(&mut view, &block_header(1, at(0))).unwrap();

    keeper
        .delegate(&mut view, &second, &second, &Coin::new("stake", 20u64))
        .unwrap();
    keeper.end_block(&mut view, &block_header(2, at(10))).unwrap();
    let unbonding_time = keeper.get_validator(&view, &first).unwrap().unbonding_time;

    // the first validator comes back before its unbonding time
    keeper
        .delegate(&mut view, &first, &first, &Coin::new("stake", 20u64))
        .unwrap();
    keeper.end_block(&mut view, &block_header(3, at(20))).unwrap();
    assert_eq!(
        keeper.get_validator(&view, &first).unwrap().status,
        ValidatorStatus::Bonded
    );
    // its former unbonding time passes without effect
    keeper
        .end_block(&mut view, &block_header(4, unbonding_time))
        .unwrap();
    assert_eq!(
        keeper.get_validator(&view, &first).unwrap().status,
        ValidatorStatus::Bonded
    );
    assert_conservation(&keeper, &view);
}

#[test]
fn test_jailed_and_powerless_validators_are_left_out() {
    let keeper = keeper_with_max_validators(10);
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);
    let jailed = address("jailed");
    let tiny = address("tiny");
    let jailed_key = create_funded_validator(&keeper, &mut view, &jailed, 50, 50);
    let reduced = StakingKeeper::new(
        StakingConfig {
            power_reduction: 10,
            ..keeper.config.clone()
        },
        keeper.ledger.clone(),
    );
    create_funded_validator(&reduced, &mut view, &tiny, 5, 5);
    reduced
        .jail(&mut view, &Address::from_public_key(&jailed_key.get_public_key()))
        .unwrap();

    // 5 tokens are worth no power with a reduction of 10
    let (updates, events) = reduced
        .end_block(&mut view, &block_header(1, at(0)))
        .unwrap();
    assert!(updates.is_empty());
    assert!(events.is_empty());
    assert!(reduced.get_last_validator_powers(&view).is_empty());
    assert_conservation(&reduced, &view);
}
