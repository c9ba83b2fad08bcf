// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::*;
use quorum_serialization::{deserialize_exact, DeserializeError, Deserializer, Serializer};
use quorum_signature::KeyPair;
use std::str::FromStr;

#[test]
fn test_account_serialization() {
    let keypair = KeyPair::generate();
    let account = Account {
        address: Address::from_public_key(&keypair.get_public_key()),
        coins: Coins::from_str("100atom,42stake").unwrap(),
        sequence: 3,
        account_number: 17,
    };
    let mut buffer = Vec::new();
    AccountSerializer::new()
        .serialize(&account, &mut buffer)
        .unwrap();
    let deserialized = deserialize_exact(&AccountDeserializer::new(), &buffer).unwrap();
    assert_eq!(account, deserialized);
}

#[test]
fn test_coins_deserializer_rejects_non_canonical() {
    // "stake" before "atom": unsorted
    let unsorted = Coins::from_str("1stake").unwrap();
    let mut buffer = Vec::new();
    let serializer = CoinsSerializer::new();
    serializer.serialize(&unsorted, &mut buffer).unwrap();
    buffer[0] = 2;
    let mut tail = Vec::new();
    serializer
        .serialize(&Coins::from_str("1atom").unwrap(), &mut tail)
        .unwrap();
    buffer.extend_from_slice(&tail[1..]);
    assert!(CoinsDeserializer::new()
        .deserialize::<DeserializeError>(&buffer)
        .is_err());
}

#[test]
fn test_dec_deserializer_rejects_non_canonical() {
    let mut buffer = Vec::new();
    DecSerializer::new()
        .serialize(&Dec::from_str("2.50").unwrap(), &mut buffer)
        .unwrap();
    let (_, value) = DecDeserializer::new()
        .deserialize::<DeserializeError>(&buffer)
        .unwrap();
    assert_eq!(value, Dec::from_str("2.5").unwrap());
}

#[test]
fn test_negative_int_serialization() {
    let mut buffer = Vec::new();
    IntSerializer::new()
        .serialize(&Int::from(-300i64), &mut buffer)
        .unwrap();
    assert_eq!(
        deserialize_exact(&IntDeserializer::new(), &buffer).unwrap(),
        Int::from(-300i64)
    );
    // negative zero is not canonical
    assert!(deserialize_exact(&IntDeserializer::new(), &[1, 0]).is_err());
}

#[test]
fn test_coins_json_is_canonicalized() {
    let raw = vec![
        Coin::new("stake", 5u64),
        Coin::new("atom", 0u64),
        Coin::new("btc", 2u64),
    ];
    let json = serde_json::to_string(&raw).unwrap();
    let coins: Coins = serde_json::from_str(&json).unwrap();
    assert!(coins.is_valid());
    assert_eq!(coins, Coins::from_str("2btc,5stake").unwrap());

    // the canonical form survives the binary codec
    let mut buffer = Vec::new();
    CoinsSerializer::new().serialize(&coins, &mut buffer).unwrap();
    assert_eq!(deserialize_exact(&CoinsDeserializer::new(), &buffer).unwrap(), coins);
}

#[test]
fn test_coins_json_rejects_negative_and_duplicate_entries() {
    let negative = serde_json::to_string(&vec![
        Coin::new("stake", 5u64),
        Coin::new("atom", -1i64),
    ])
    .unwrap();
    assert!(serde_json::from_str::<Coins>(&negative).is_err());

    let duplicate = serde_json::to_string(&vec![
        Coin::new("stake", 5u64),
        Coin::new("stake", 1u64),
    ])
    .unwrap();
    assert!(serde_json::from_str::<Coins>(&duplicate).is_err());
}

#[test]
fn test_dec_coins_json_is_canonicalized() {
    let raw = vec![
        DecCoin::new("stake", Dec::from_str("1.5").unwrap()),
        DecCoin::new("atom", Dec::from_str("0.25").unwrap()),
        DecCoin::new("btc", Dec::zero()),
    ];
    let coins: DecCoins = serde_json::from_str(&serde_json::to_string(&raw).unwrap()).unwrap();
    assert_eq!(
        serde_json::to_value(&coins).unwrap(),
        serde_json::to_value(vec![
            DecCoin::new("atom", Dec::from_str("0.25").unwrap()),
            DecCoin::new("stake", Dec::from_str("1.5").unwrap()),
        ])
        .unwrap()
    );

    let negative = vec![DecCoin::new("stake", Dec::from_str("-1").unwrap())];
    assert!(
        serde_json::from_str::<DecCoins>(&serde_json::to_string(&negative).unwrap()).is_err()
    );
}
