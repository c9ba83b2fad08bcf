// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::*;
use assert_matches::assert_matches;
use std::str::FromStr;

fn coins(s: &str) -> Coins {
    Coins::from_str(s).unwrap()
}

#[test]
fn test_plus_sorted_merge() {
    let a = coins("1atom,2stake");
    let b = coins("3btc,4stake");
    assert_eq!(a.plus(&b).unwrap(), coins("1atom,3btc,6stake"));
    assert_eq!(b.plus(&a).unwrap(), a.plus(&b).unwrap());
}

#[test]
fn test_plus_drops_zero_sums() {
    let a = coins("5atom,7stake");
    let result = a.plus(&a.negative()).unwrap();
    assert!(result.is_empty());

    let b = coins("5atom");
    let result = coins("5atom,7stake").minus(&b).unwrap();
    assert_eq!(result, coins("7stake"));
    assert!(result.iter().all(|c| !c.amount.is_zero()));
}

#[test]
fn test_minus_can_go_negative() {
    let result = coins("5atom").minus(&coins("7atom")).unwrap();
    assert!(!result.is_not_negative());
    assert_eq!(result.amount_of("atom"), Int::from(-2i64));
}

#[test]
fn test_new_canonicalizes() {
    let c = Coins::new(vec![
        Coin::new("stake", 1u64),
        Coin::new("atom", 0u64),
        Coin::new("btc", 2u64),
    ])
    .unwrap();
    assert_eq!(c.to_string(), "2btc,1stake");
    assert_matches!(
        Coins::new(vec![Coin::new("stake", 1u64), Coin::new("stake", 2u64)]),
        Err(ModelsError::InvalidCoins(_))
    );
    assert_matches!(
        Coins::new(vec![Coin::new("Stake", 1u64)]),
        Err(ModelsError::InvalidDenom(_))
    );
}

#[test]
fn test_overflow_is_reported() {
    let big = Int::from_str(&format!("4{}", "0".repeat(76))).unwrap();
    let a = Coins::new(vec![Coin {
        denom: "stake".into(),
        amount: big.clone(),
    }])
    .unwrap();
    assert_matches!(a.plus(&a), Err(ModelsError::Overflow(_)));
}

#[test]
fn test_dec_coins_plus_and_mul() {
    let a = DecCoins::from_coins(&coins("10atom,4stake")).unwrap();
    let b = DecCoins::from_coins(&coins("4stake")).unwrap();
    let sum = a.plus(&b).unwrap();
    assert_eq!(sum.amount_of("stake"), Dec::from_u64(8));

    let zeroed = a.minus(&DecCoins::from_coins(&coins("10atom")).unwrap()).unwrap();
    assert_eq!(zeroed.iter().count(), 1);
    assert!(zeroed.amount_of("atom").is_zero());

    let half = sum.mul(&Dec::from_ratio(1, 2).unwrap()).unwrap();
    assert_eq!(half.amount_of("atom"), Dec::from_u64(5));
    assert_eq!(half.amount_of("stake"), Dec::from_u64(4));
}

#[test]
fn test_truncate_decimal_conserves_value() {
    let fees = DecCoins::from_coins(&coins("7stake")).unwrap();
    let share = fees.mul(&Dec::from_ratio(1, 2).unwrap()).unwrap();
    let (whole, change) = share.truncate_decimal().unwrap();
    assert_eq!(whole, coins("3stake"));
    assert_eq!(change.amount_of("stake"), Dec::from_str("0.5").unwrap());
    let back = DecCoins::from_coins(&whole).unwrap().plus(&change).unwrap();
    assert_eq!(back, share);
}
