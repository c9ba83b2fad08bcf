// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Binary serialization primitives shared by every crate of the workspace.
//!
//! Each value stored in the database or sent over the consensus boundary goes
//! through a dedicated `Serializer`/`Deserializer` pair built on `nom`.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

use displaydoc::Display;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;
use unsigned_varint::nom as unsigned_nom;

#[cfg(test)]
mod tests;

/// Serialization error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// Length of {0} exceeds the allowed maximum
    TooLong(String),
    /// General error {0}
    GeneralError(String),
}

/// Error accumulated while walking down the nested deserializers.
/// Contexts are pushed from the innermost to the outermost parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], DeserializeErrorKind)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DeserializeErrorKind {
    Context(&'static str),
    Nom(ErrorKind),
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        DeserializeError {
            errors: vec![(input, DeserializeErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, DeserializeErrorKind::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, DeserializeErrorKind::Context(ctx)));
        other
    }
}

impl<'a> fmt::Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contexts: Vec<&str> = self
            .errors
            .iter()
            .rev()
            .filter_map(|(_, kind)| match kind {
                DeserializeErrorKind::Context(ctx) => Some(*ctx),
                DeserializeErrorKind::Nom(_) => None,
            })
            .collect();
        if contexts.is_empty() {
            if let Some((_, DeserializeErrorKind::Nom(kind))) = self.errors.first() {
                return write!(f, "{}", kind.description());
            }
        }
        write!(f, "{}", contexts.join(" / "))
    }
}

/// Trait that define the deserialize method that must be implemented for all types have serialize form in Quorum.
pub trait Deserializer<T> {
    /// Deserialize a value `T` from a buffer of `u8`.
    /// Returns the rest of the buffer and the deserialized value.
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Trait that define the serialize method that must be implemented for all types have serialize form in Quorum.
pub trait Serializer<T> {
    /// Serialize a value `T` and append it to `buffer`.
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Deserializes a full buffer and rejects trailing bytes.
pub fn deserialize_exact<'a, T, D: Deserializer<T>>(
    deserializer: &D,
    buffer: &'a [u8],
) -> Result<T, String> {
    let (rest, value) = deserializer
        .deserialize::<DeserializeError>(buffer)
        .map_err(|err| match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e.to_string(),
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
        })?;
    if !rest.is_empty() {
        return Err(format!("{} trailing bytes", rest.len()));
    }
    Ok(value)
}

fn range_error<'a, E: ParseError<&'a [u8]>>(input: &'a [u8]) -> nom::Err<E> {
    nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Verify))
}

/// Serializer for `u64` in varint form
#[derive(Clone, Default)]
pub struct U64VarIntSerializer;

impl U64VarIntSerializer {
    /// Creates a `U64VarIntSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u64> for U64VarIntSerializer {
    fn serialize(&self, value: &u64, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(unsigned_varint::encode::u64(
            *value,
            &mut unsigned_varint::encode::u64_buffer(),
        ));
        Ok(())
    }
}

/// Deserializer for `u64` in varint form, bounded to a range
#[derive(Clone)]
pub struct U64VarIntDeserializer {
    range: (Bound<u64>, Bound<u64>),
}

impl U64VarIntDeserializer {
    /// Creates a `U64VarIntDeserializer` accepting values within `min..max`
    pub const fn new(min: Bound<u64>, max: Bound<u64>) -> Self {
        Self { range: (min, max) }
    }
}

impl Deserializer<u64> for U64VarIntDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u64, E> {
        context("Failed u64 deserialization", |input: &'a [u8]| {
            let (rest, value) = unsigned_nom::u64(input).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Fail))
            })?;
            if !self.range.contains(&value) {
                return Err(range_error(input));
            }
            Ok((rest, value))
        })(buffer)
    }
}

/// Serializer for `u32` in varint form
#[derive(Clone, Default)]
pub struct U32VarIntSerializer;

impl U32VarIntSerializer {
    /// Creates a `U32VarIntSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u32> for U32VarIntSerializer {
    fn serialize(&self, value: &u32, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(unsigned_varint::encode::u32(
            *value,
            &mut unsigned_varint::encode::u32_buffer(),
        ));
        Ok(())
    }
}

/// Deserializer for `u32` in varint form, bounded to a range
#[derive(Clone)]
pub struct U32VarIntDeserializer {
    range: (Bound<u32>, Bound<u32>),
}

impl U32VarIntDeserializer {
    /// Creates a `U32VarIntDeserializer` accepting values within `min..max`
    pub const fn new(min: Bound<u32>, max: Bound<u32>) -> Self {
        Self { range: (min, max) }
    }
}

impl Deserializer<u32> for U32VarIntDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        context("Failed u32 deserialization", |input: &'a [u8]| {
            let (rest, value) = unsigned_nom::u32(input).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Fail))
            })?;
            if !self.range.contains(&value) {
                return Err(range_error(input));
            }
            Ok((rest, value))
        })(buffer)
    }
}

/// Serializer for booleans, one byte
#[derive(Clone, Default)]
pub struct BoolSerializer;

impl BoolSerializer {
    /// Creates a `BoolSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<bool> for BoolSerializer {
    fn serialize(&self, value: &bool, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(u8::from(*value));
        Ok(())
    }
}

/// Deserializer for booleans, rejects any byte other than 0 or 1
#[derive(Clone, Default)]
pub struct BoolDeserializer;

impl BoolDeserializer {
    /// Creates a `BoolDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<bool> for BoolDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], bool, E> {
        context("Failed bool deserialization", |input: &'a [u8]| match input
            .split_first()
        {
            Some((0, rest)) => Ok((rest, false)),
            Some((1, rest)) => Ok((rest, true)),
            Some(_) => Err(range_error(input)),
            None => Err(nom::Err::Error(ParseError::from_error_kind(
                input,
                ErrorKind::Eof,
            ))),
        })(buffer)
    }
}

/// Serializer for length-prefixed byte strings
#[derive(Clone)]
pub struct VecU8Serializer {
    len_serializer: U64VarIntSerializer,
}

impl VecU8Serializer {
    /// Creates a `VecU8Serializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Default for VecU8Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Vec<u8>> for VecU8Serializer {
    fn serialize(&self, value: &Vec<u8>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u64 = value.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("byte string of length {}", value.len()))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        buffer.extend_from_slice(value);
        Ok(())
    }
}

/// Deserializer for length-prefixed byte strings
#[derive(Clone)]
pub struct VecU8Deserializer {
    len_deserializer: U64VarIntDeserializer,
}

impl VecU8Deserializer {
    /// Creates a `VecU8Deserializer` accepting a length within `min..max`
    pub const fn new(min: Bound<u64>, max: Bound<u64>) -> Self {
        Self {
            len_deserializer: U64VarIntDeserializer::new(min, max),
        }
    }
}

impl Deserializer<Vec<u8>> for VecU8Deserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<u8>, E> {
        context("Failed Vec<u8> deserialization", |input: &'a [u8]| {
            let (rest, len) = self.len_deserializer.deserialize(input)?;
            let len = usize::try_from(len).map_err(|_| range_error(input))?;
            if rest.len() < len {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    rest,
                    ErrorKind::Eof,
                )));
            }
            Ok((&rest[len..], rest[..len].to_vec()))
        })(buffer)
    }
}

/// Serializer for length-prefixed UTF-8 strings
#[derive(Clone, Default)]
pub struct StringSerializer {
    bytes_serializer: VecU8Serializer,
}

impl StringSerializer {
    /// Creates a `StringSerializer`
    pub const fn new() -> Self {
        Self {
            bytes_serializer: VecU8Serializer::new(),
        }
    }
}

impl Serializer<String> for StringSerializer {
    fn serialize(&self, value: &String, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.bytes_serializer
            .serialize(&value.as_bytes().to_vec(), buffer)
    }
}

/// Deserializer for length-prefixed UTF-8 strings
#[derive(Clone)]
pub struct StringDeserializer {
    bytes_deserializer: VecU8Deserializer,
}

impl StringDeserializer {
    /// Creates a `StringDeserializer` accepting a byte length within `min..max`
    pub const fn new(min: Bound<u64>, max: Bound<u64>) -> Self {
        Self {
            bytes_deserializer: VecU8Deserializer::new(min, max),
        }
    }
}

impl Deserializer<String> for StringDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], String, E> {
        context("Failed String deserialization", |input: &'a [u8]| {
            let (rest, bytes) = self.bytes_deserializer.deserialize(input)?;
            let value = String::from_utf8(bytes).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Char))
            })?;
            Ok((rest, value))
        })(buffer)
    }
}
