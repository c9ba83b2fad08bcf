// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{address, at, empty_view, GENESIS_TIME};
use crate::test_exports::{
    assert_conservation, block_header, create_funded_validator, default_keeper,
};
use quorum_ledger::test_exports::fund_account;
use quorum_models::{Address, Coin, Coins, Dec};
use quorum_staking_exports::StakingResult;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Non-fatal errors are expected from random requests, fatal ones are not
fn check<T>(result: StakingResult<T>) -> StakingResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            assert!(!err.is_fatal(), "fatal error: {}", err);
            Err(err)
        }
    }
}

#[test]
fn test_random_operations_conserve_tokens() {
    let keeper = default_keeper();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let mut view = empty_view();
    keeper.init_pool(&mut view, GENESIS_TIME);

    let validators: Vec<Address> = (0..4).map(|i| address(&format!("validator-{}", i))).collect();
    let mut consensus = Vec::new();
    for operator in validators.iter() {
        let key = create_funded_validator(&keeper, &mut view, operator, 10_000, 1_000);
        consensus.push(Address::from_public_key(&key.get_public_key()));
    }
    let delegators: Vec<Address> = (0..6).map(|i| address(&format!("delegator-{}", i))).collect();
    for delegator in delegators.iter() {
        fund_account(
            &keeper.ledger,
            &mut view,
            delegator,
            &Coins::single("stake", 10_000u64).unwrap(),
        );
    }

    let mut height = 1u64;
    let mut secs = 0u64;
    for _ in 0..600 {
        let header = block_header(height, at(secs));
        let delegator = delegators[rng.gen_range(0..delegators.len())];
        let val_a = validators[rng.gen_range(0..validators.len())];
        let val_b = validators[rng.gen_range(0..validators.len())];
        let portion = Dec::from_ratio(rng.gen_range(1..=10), 10).unwrap();
        let snapshot = view.get_snapshot();
        let result = match rng.gen_range(0..6) {
            0 | 1 => check(keeper.delegate(
                &mut view,
                &delegator,
                &val_a,
                &Coin::new("stake", rng.gen_range(1..500u64)),
            )),
            2 => match keeper.get_delegation(&view, &delegator, &val_a) {
                Some(delegation) => {
                    let shares = delegation.shares.checked_mul(&portion).unwrap();
                    check(keeper.undelegate(&mut view, &header, &delegator, &val_a, &shares))
                }
                None => Ok(()),
            },
            3 => match keeper.get_delegation(&view, &delegator, &val_a) {
                Some(delegation) => {
                    let shares = delegation.shares.checked_mul(&portion).unwrap();
                    check(keeper.begin_redelegation(
                        &mut view, &header, &delegator, &val_a, &val_b, &shares,
                    ))
                }
                None => Ok(()),
            },
            4 => {
                let cons = consensus[rng.gen_range(0..consensus.len())];
                let infraction_height = rng.gen_range(1..=height);
                let fraction = Dec::from_ratio(rng.gen_range(0..=5), 100).unwrap();
                check(keeper.slash(
                    &mut view,
                    &header,
                    &cons,
                    infraction_height,
                    rng.gen_range(0..3000),
                    &fraction,
                ))
                .and_then(|_| {
                    if rng.gen_bool(0.3) {
                        keeper.jail(&mut view, &cons)
                    } else {
                        keeper.unjail(&mut view, &cons)
                    }
                })
            }
            _ => {
                keeper
                    .process_provisions(&mut view, &header)
                    .expect("provisions failed");
                keeper
                    .end_block(&mut view, &header)
                    .expect("end block failed");
                height += 1;
                secs += rng.gen_range(1..200_000);
                Ok(())
            }
        };
        // a failed request leaves no trace, as in a transaction view
        if result.is_err() {
            view.reset_to_snapshot(snapshot);
        }
        assert_conservation(&keeper, &view);
    }
}
