// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{empty_view, header};
use crate::test_exports::short_window_config;
use crate::{SlashingCommand, SlashingError, SlashingKeeper};
use assert_matches::assert_matches;
use quorum_hash::Hash;
use quorum_models::{Address, Dec};
use quorum_staking_exports::StakingEvent;
use quorum_time::QuorumTime;
use std::str::FromStr;

fn cons(seed: &str) -> Address {
    Address(Hash::compute_from(seed.as_bytes()))
}

#[test]
fn test_hooks_open_and_close_periods() {
    let keeper = SlashingKeeper::new(Default::default());
    let hooks = keeper.hooks();
    let mut view = empty_view();
    let validator = cons("val");

    hooks
        .dispatch(
            &mut view,
            &header(3),
            &StakingEvent::ValidatorBonded {
                consensus_address: validator,
            },
        )
        .unwrap();
    let info = keeper.get_signing_info(&view, &validator).unwrap();
    assert_eq!(info.start_height, 3);
    assert_eq!(info.index_offset, 0);
    assert_eq!(info.jailed_until, QuorumTime::EPOCH);
    assert_eq!(info.signed_blocks_counter, 0);

    hooks
        .dispatch(
            &mut view,
            &header(20),
            &StakingEvent::ValidatorBeginUnbonding {
                consensus_address: validator,
            },
        )
        .unwrap();
    hooks
        .dispatch(
            &mut view,
            &header(30),
            &StakingEvent::ValidatorBonded {
                consensus_address: validator,
            },
        )
        .unwrap();
    let periods = keeper.get_slashing_periods(&view, &validator);
    assert_eq!(periods.len(), 2);
    assert_eq!((periods[0].start_height, periods[0].end_height), (3, 20));
    assert_eq!((periods[1].start_height, periods[1].end_height), (30, 0));
    assert_eq!(
        keeper
            .get_slashing_period_for_height(&view, &validator, 25)
            .unwrap()
            .start_height,
        3
    );
    assert_eq!(
        keeper
            .get_slashing_period_for_height(&view, &validator, 30)
            .unwrap()
            .start_height,
        30
    );
}

#[test]
fn test_begin_unbonding_without_period_is_fatal() {
    let keeper = SlashingKeeper::new(Default::default());
    let mut view = empty_view();
    let err = keeper
        .on_validator_begin_unbonding(&mut view, &header(5), &cons("ghost"))
        .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_downtime_slashes_and_jails() {
    let keeper = SlashingKeeper::new(short_window_config(10));
    let mut view = empty_view();
    let validator = cons("val");
    keeper
        .on_validator_bonded(&mut view, &header(1), &validator)
        .unwrap();

    for height in 2..=11 {
        let commands = keeper
            .handle_validator_signature(&mut view, &header(height), &validator, 10, true, Some(false))
            .unwrap();
        assert!(commands.is_empty());
    }
    assert_eq!(
        keeper
            .get_signing_info(&view, &validator)
            .unwrap()
            .signed_blocks_counter,
        10
    );

    // each miss overwrites a signed block of the window
    for height in 12..=16 {
        let commands = keeper
            .handle_validator_signature(&mut view, &header(height), &validator, 10, false, Some(false))
            .unwrap();
        assert!(commands.is_empty());
    }
    assert_eq!(
        keeper
            .get_signing_info(&view, &validator)
            .unwrap()
            .signed_blocks_counter,
        5
    );

    let commands = keeper
        .handle_validator_signature(&mut view, &header(17), &validator, 10, false, Some(false))
        .unwrap();
    assert_eq!(
        commands,
        vec![
            SlashingCommand::Slash {
                consensus_address: validator,
                infraction_height: 16,
                power: 10,
                fraction: Dec::from_str("0.01").unwrap(),
            },
            SlashingCommand::Jail {
                consensus_address: validator,
            },
        ]
    );
    let info = keeper.get_signing_info(&view, &validator).unwrap();
    assert_eq!(info.signed_blocks_counter, 0);
    assert_eq!(info.index_offset, 0);
    assert_eq!(
        info.jailed_until,
        header(17).time.saturating_add(QuorumTime::from_secs(600))
    );

    // already jailed: recorded, not punished twice
    let commands = keeper
        .handle_validator_signature(&mut view, &header(18), &validator, 10, false, Some(true))
        .unwrap();
    assert!(commands.is_empty());
}

#[test]
fn test_no_judgement_before_a_full_window() {
    let keeper = SlashingKeeper::new(short_window_config(10));
    let mut view = empty_view();
    let validator = cons("val");
    keeper
        .on_validator_bonded(&mut view, &header(1), &validator)
        .unwrap();
    for height in 2..=11 {
        let commands = keeper
            .handle_validator_signature(&mut view, &header(height), &validator, 3, false, Some(false))
            .unwrap();
        assert!(commands.is_empty(), "judged at height {}", height);
    }
    let commands = keeper
        .handle_validator_signature(&mut view, &header(12), &validator, 3, false, Some(false))
        .unwrap();
    assert_eq!(commands.len(), 2);
}

#[test]
fn test_removed_validator_is_not_punished() {
    let keeper = SlashingKeeper::new(short_window_config(2));
    let mut view = empty_view();
    let validator = cons("val");
    keeper
        .on_validator_bonded(&mut view, &header(1), &validator)
        .unwrap();
    for height in 2..=6 {
        let commands = keeper
            .handle_validator_signature(&mut view, &header(height), &validator, 1, false, None)
            .unwrap();
        assert!(commands.is_empty());
    }
    assert_eq!(
        keeper.get_signing_info(&view, &validator).unwrap().index_offset,
        5
    );
}

#[test]
fn test_rebonding_keeps_the_signing_info() {
    let keeper = SlashingKeeper::new(short_window_config(10));
    let mut view = empty_view();
    let validator = cons("val");
    keeper
        .on_validator_bonded(&mut view, &header(3), &validator)
        .unwrap();
    for height in 4..=9 {
        keeper
            .handle_validator_signature(&mut view, &header(height), &validator, 1, false, Some(false))
            .unwrap();
    }
    keeper
        .on_validator_begin_unbonding(&mut view, &header(20), &validator)
        .unwrap();
    let before = keeper.get_signing_info(&view, &validator).unwrap();
    assert_eq!(before.start_height, 3);
    assert_eq!(before.index_offset, 6);

    keeper
        .on_validator_bonded(&mut view, &header(30), &validator)
        .unwrap();
    assert_eq!(keeper.get_signing_info(&view, &validator).unwrap(), before);
    // a new period is opened all the same
    assert_eq!(keeper.get_slashing_periods(&view, &validator).len(), 2);
}

#[test]
fn test_jailed_validator_is_not_judged_again_after_rebonding() {
    let keeper = SlashingKeeper::new(short_window_config(2));
    let mut view = empty_view();
    let validator = cons("val");
    keeper
        .on_validator_bonded(&mut view, &header(1), &validator)
        .unwrap();
    let mut commands = Vec::new();
    for height in 2..=4 {
        commands = keeper
            .handle_validator_signature(&mut view, &header(height), &validator, 1, false, Some(false))
            .unwrap();
    }
    assert_eq!(commands.len(), 2);
    keeper
        .on_validator_begin_unbonding(&mut view, &header(4), &validator)
        .unwrap();
    let jailed = keeper.get_signing_info(&view, &validator).unwrap();

    keeper
        .on_validator_bonded(&mut view, &header(50), &validator)
        .unwrap();
    assert_eq!(keeper.get_signing_info(&view, &validator).unwrap(), jailed);
    for height in 51..=54 {
        let commands = keeper
            .handle_validator_signature(&mut view, &header(height), &validator, 1, true, Some(false))
            .unwrap();
        assert!(commands.is_empty(), "judged at height {}", height);
    }
}

#[test]
fn test_signature_of_unknown_validator() {
    let keeper = SlashingKeeper::new(Default::default());
    let mut view = empty_view();
    assert_matches!(
        keeper.handle_validator_signature(&mut view, &header(2), &cons("ghost"), 1, true, None),
        Err(SlashingError::InvalidRequest(_))
    );
}
