// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::*;
use assert_matches::assert_matches;
use std::ops::Bound::Included;

#[test]
fn test_u64_varint_bounds() {
    let serializer = U64VarIntSerializer::new();
    let deserializer = U64VarIntDeserializer::new(Included(0), Included(300));
    let mut buffer = Vec::new();
    serializer.serialize(&300, &mut buffer).unwrap();
    assert_eq!(buffer.len(), 2);
    let (rest, value) = deserializer.deserialize::<DeserializeError>(&buffer).unwrap();
    assert!(rest.is_empty());
    assert_eq!(value, 300);

    buffer.clear();
    serializer.serialize(&301, &mut buffer).unwrap();
    assert_matches!(
        deserializer.deserialize::<DeserializeError>(&buffer),
        Err(nom::Err::Error(_))
    );
}

#[test]
fn test_string_rejects_invalid_utf8_and_truncation() {
    let deserializer = StringDeserializer::new(Included(0), Included(16));
    let invalid = vec![2u8, 0xff, 0xfe];
    assert!(deserializer.deserialize::<DeserializeError>(&invalid).is_err());
    let truncated = vec![5u8, b'a', b'b'];
    assert!(deserializer.deserialize::<DeserializeError>(&truncated).is_err());
}

#[test]
fn test_deserialize_exact_rejects_trailing_bytes() {
    let mut buffer = Vec::new();
    StringSerializer::new()
        .serialize(&"stake".to_string(), &mut buffer)
        .unwrap();
    let deserializer = StringDeserializer::new(Included(0), Included(16));
    assert_eq!(
        deserialize_exact(&deserializer, &buffer).unwrap(),
        "stake".to_string()
    );
    buffer.push(0);
    assert_eq!(
        deserialize_exact(&deserializer, &buffer).unwrap_err(),
        "1 trailing bytes"
    );
}

#[test]
fn test_error_display_lists_contexts() {
    let deserializer = BoolDeserializer::new();
    let err = deserializer.deserialize::<DeserializeError>(&[7]).unwrap_err();
    match err {
        nom::Err::Error(e) => assert_eq!(e.to_string(), "Failed bool deserialization"),
        _ => panic!("unexpected error variant"),
    }
}
