// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::test_exports::random_validator;
use crate::{Pool, StakingError, ValidatorStatus};
use assert_matches::assert_matches;
use quorum_models::Dec;
use quorum_time::QuorumTime;

#[test]
fn test_delegate_then_partial_removal() {
    let pool = Pool::new(Dec::zero(), QuorumTime::EPOCH);
    let validator = random_validator();
    let (validator, pool, issued) = validator.add_tokens_from_del(&pool, 10).unwrap();
    assert_eq!(issued, Dec::from_u64(10));
    assert_eq!(validator.tokens(&pool).unwrap(), 10);
    // not bonded yet
    assert_eq!(validator.bonded_tokens(&pool).unwrap(), 0);
    assert_eq!(pool.unbonded_pool, 10);

    let (validator, pool, tokens) = validator
        .remove_del_shares(&pool, &Dec::from_u64(6))
        .unwrap();
    assert_eq!(tokens, 6);
    assert_eq!(validator.liabilities, Dec::from_u64(4));
    assert_eq!(validator.tokens(&pool).unwrap(), 4);
    assert_eq!(pool.unbonded_pool, 4);
}

#[test]
fn test_pool_transition_preserves_total() {
    let pool = Pool::new(Dec::zero(), QuorumTime::EPOCH);
    let validator = random_validator();
    let (validator, pool, _) = validator.add_tokens_from_del(&pool, 25).unwrap();
    let (pool, bonded) = pool.unbonded_to_bonded(&validator).unwrap();
    assert_eq!(bonded.status, ValidatorStatus::Bonded);
    assert_eq!(pool.bonded_pool, 25);
    assert_eq!(pool.unbonded_pool, 0);
    assert_eq!(bonded.bonded_tokens(&pool).unwrap(), 25);

    // provisions double the bonded rate, another validator keeps the unbonded rate at one
    let pool = pool.add_provisions(25).unwrap();
    assert_eq!(pool.bonded_share_ex_rate().unwrap(), Dec::from_u64(2));
    let (_, pool, _) = random_validator().add_tokens_from_del(&pool, 10).unwrap();
    assert_eq!(pool.unbonded_share_ex_rate().unwrap(), Dec::one());
    assert_eq!(bonded.tokens(&pool).unwrap(), 50);

    let total = pool.bonded_pool + pool.unbonded_pool;
    let (new_pool, unbonding) = pool.bonded_to_unbonded(&bonded).unwrap();
    assert_eq!(unbonding.status, ValidatorStatus::Unbonding);
    assert_eq!(new_pool.bonded_pool + new_pool.unbonded_pool, total);
    assert_eq!(pool.bonded_pool - new_pool.bonded_pool, 50);
    assert_eq!(new_pool.unbonded_pool - pool.unbonded_pool, 50);
    // assets are re-issued at the unbonded rate, the token value is kept
    assert_eq!(unbonding.assets, Dec::from_u64(50));
    assert_eq!(unbonding.tokens(&new_pool).unwrap(), 50);
    assert_eq!(unbonding.liabilities, bonded.liabilities);
    assert_matches!(
        new_pool.bonded_to_unbonded(&unbonding),
        Err(StakingError::InvariantViolation(_))
    );

    // and back, into an empty bonded pool at rate one
    let (back_pool, rebonded) = new_pool.unbonded_to_bonded(&unbonding).unwrap();
    assert_eq!(rebonded.bonded_tokens(&back_pool).unwrap(), 50);
    assert_eq!(back_pool.bonded_pool, 50);
    assert_eq!(back_pool.unbonded_pool, 10);
    assert_eq!(back_pool.bonded_pool + back_pool.unbonded_pool, total);
}

#[test]
fn test_slashed_tokens_dilute_delegator_shares() {
    let pool = Pool::new(Dec::zero(), QuorumTime::EPOCH);
    let validator = random_validator();
    let (validator, pool, _) = validator.add_tokens_from_del(&pool, 100).unwrap();
    let (validator, pool, removed) = validator.remove_tokens(&pool, 10).unwrap();
    assert_eq!(removed, 10);
    assert_eq!(validator.tokens(&pool).unwrap(), 90);
    assert_eq!(validator.liabilities, Dec::from_u64(100));
    // 50 delegator shares are now worth 45 tokens
    assert_eq!(
        validator
            .shares_to_tokens(&pool, &Dec::from_u64(50))
            .unwrap(),
        45
    );
    // a new delegation gets shares at the diluted rate
    let (_, _, issued) = validator.add_tokens_from_del(&pool, 9).unwrap();
    assert_eq!(issued, Dec::from_u64(10));

    // removing more than held is capped
    let (validator, pool, removed) = validator.remove_tokens(&pool, 1000).unwrap();
    assert_eq!(removed, 90);
    assert!(validator.assets.is_zero());
    assert_matches!(
        validator.add_tokens_from_del(&pool, 1),
        Err(StakingError::InvalidRequest(_))
    );
}
