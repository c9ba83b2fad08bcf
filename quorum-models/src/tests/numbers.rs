// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::*;
use assert_matches::assert_matches;
use std::str::FromStr;

#[test]
fn test_int_bound() {
    let max = Int::from_bigint(num::BigInt::from(2u8).pow(255) - 1u8).unwrap();
    assert_matches!(max.checked_add(&Int::from(1u64)), Err(ModelsError::Overflow(_)));
    assert_matches!(
        Int::from_str(&format!("{}0", max)),
        Err(ModelsError::Overflow(_))
    );
    assert_matches!(Int::from(-1i64).to_u64(), Err(ModelsError::Overflow(_)));
}

#[test]
fn test_dec_rounding_half_even() {
    // 0.00000000005 is exactly half a unit of the last kept decimal
    let half_unit = Dec::from_str("0.0000000001")
        .unwrap()
        .checked_div(&Dec::from_u64(2))
        .unwrap();
    assert!(half_unit.is_zero());
    let three_halves = Dec::from_str("0.0000000003")
        .unwrap()
        .checked_div(&Dec::from_u64(2))
        .unwrap();
    assert_eq!(three_halves, Dec::from_str("0.0000000002").unwrap());
}

#[test]
fn test_dec_conversions() {
    let d = Dec::from_str("12.75").unwrap();
    assert_eq!(d.to_u64_floor().unwrap(), 12);
    assert_eq!(d.truncate_int().unwrap(), Int::from(12u64));
    assert_eq!(d.neg().truncate_int().unwrap(), Int::from(-12i64));
    assert!(d.neg().is_negative());
    assert_matches!(d.neg().to_u64_floor(), Err(ModelsError::Overflow(_)));
    assert_matches!(
        d.checked_div(&Dec::zero()),
        Err(ModelsError::DivisionByZero(_))
    );
    assert_matches!(
        Dec::from_str("0.00000000001"),
        Err(ModelsError::AmountParseError(_))
    );
    assert_eq!(Dec::from_int(&Int::from(7u64)).unwrap(), Dec::from_u64(7));
}

#[test]
fn test_dec_display_is_canonical() {
    let d = Dec::from_str("1.500").unwrap();
    assert_eq!(d.to_string(), "1.5");
    assert_eq!(Dec::from_str("-0").unwrap().to_string(), "0");
}

#[test]
fn test_mul_div_floor_never_rounds_up() {
    // 1/3 of 10 shares over 3 shares is 3.33.. tokens, paid as 3
    let shares = Dec::from_u64(1);
    assert_eq!(shares.mul_div_floor(10, &Dec::from_u64(3)).unwrap(), 3);
    // a rounded quotient would be 5.0000000000 here
    let shares = Dec::from_str("0.9999999999").unwrap();
    assert_eq!(shares.mul_div_floor(5, &Dec::one()).unwrap(), 4);
    assert_eq!(
        Dec::from_str("2.5")
            .unwrap()
            .mul_div_floor(4, &Dec::from_str("0.5").unwrap())
            .unwrap(),
        20
    );
    assert_matches!(
        shares.mul_div_floor(1, &Dec::zero()),
        Err(ModelsError::DivisionByZero(_))
    );
}
