// Copyright (c) 2022 MASSA LABS <info@massa.net>

use std::ops::{BitXor, BitXorAssign};

use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use quorum_serialization::{Deserializer, SerializeError, Serializer};

/// Extended Hash, XOR-combinable so that a set of key/value entries can be
/// folded into an order-independent state root.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashXof<const SIZE: usize>(pub [u8; SIZE]);

impl<const SIZE: usize> HashXof<SIZE> {
    /// The neutral element of the XOR fold
    pub const fn zero() -> Self {
        HashXof([0u8; SIZE])
    }

    /// From bytes
    pub fn from_bytes(bytes: &[u8; SIZE]) -> Self {
        HashXof(*bytes)
    }

    /// Transform into bytes
    pub fn to_bytes(&self) -> &[u8; SIZE] {
        &self.0
    }

    /// Compute from raw data
    pub fn compute_from(data: &[u8]) -> HashXof<SIZE> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(data);
        let mut hash = [0u8; SIZE];
        let mut output_reader = hasher.finalize_xof();
        output_reader.fill(&mut hash);
        HashXof(hash)
    }

    /// Compute from key and value
    pub fn compute_from_kv(key: &[u8], value: &[u8]) -> HashXof<SIZE> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(key.len() as u64).to_be_bytes());
        hasher.update(key);
        hasher.update(value);
        let mut hash = [0u8; SIZE];
        let mut output_reader = hasher.finalize_xof();
        output_reader.fill(&mut hash);
        HashXof(hash)
    }

    /// Serialize a Hash using `bs58` encoding with checksum.
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }
}

// XOR folding is only sound if every (key, value) pair is added exactly once
// and removed with the exact value it was added with.
impl<const SIZE: usize> BitXorAssign for HashXof<SIZE> {
    fn bitxor_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a ^= b;
        }
    }
}

impl<const SIZE: usize> BitXor for HashXof<SIZE> {
    type Output = Self;

    fn bitxor(mut self, other: Self) -> Self {
        self ^= other;
        self
    }
}

impl<const SIZE: usize> std::fmt::Display for HashXof<SIZE> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl<const SIZE: usize> std::fmt::Debug for HashXof<SIZE> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

/// Serializer for `HashXof`
#[derive(Default, Clone)]
pub struct HashXofSerializer;

impl HashXofSerializer {
    /// Creates a serializer for `HashXof`
    pub const fn new() -> Self {
        Self
    }
}

impl<const SIZE: usize> Serializer<HashXof<SIZE>> for HashXofSerializer {
    fn serialize(&self, value: &HashXof<SIZE>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `HashXof`
#[derive(Default, Clone)]
pub struct HashXofDeserializer;

impl HashXofDeserializer {
    /// Creates a deserializer for `HashXof`
    pub const fn new() -> Self {
        Self
    }
}

impl<const SIZE: usize> Deserializer<HashXof<SIZE>> for HashXofDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], HashXof<SIZE>, E> {
        context("Failed hashxof deserialization", |input: &'a [u8]| {
            if input.len() < SIZE {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let bytes: &[u8; SIZE] = input[..SIZE].try_into().map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Fail,
                ))
            })?;
            Ok((&input[SIZE..], HashXof::from_bytes(bytes)))
        })(buffer)
    }
}
