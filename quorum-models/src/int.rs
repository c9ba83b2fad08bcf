// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::constants::{INT_MAX_BIT_LEN, INT_MAX_BYTES};
use crate::error::{ModelsError, ModelsResult};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use num::bigint::{BigInt, Sign};
use num::{Signed, ToPrimitive, Zero};
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, VecU8Deserializer, VecU8Serializer,
};
use std::fmt;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Arbitrary-precision signed integer amount.
/// The magnitude is bounded to `INT_MAX_BIT_LEN` bits: every checked operation
/// returns `ModelsError::Overflow` instead of growing past it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Int(BigInt);

impl Int {
    /// Zero
    pub fn zero() -> Self {
        Int(BigInt::zero())
    }

    fn bounded(value: BigInt) -> ModelsResult<Self> {
        if value.bits() > INT_MAX_BIT_LEN {
            return Err(ModelsError::Overflow(format!(
                "integer exceeds {} bits",
                INT_MAX_BIT_LEN
            )));
        }
        Ok(Int(value))
    }

    /// Access the underlying big integer
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    /// Build from a big integer, checking the magnitude bound
    pub fn from_bigint(value: BigInt) -> ModelsResult<Self> {
        Int::bounded(value)
    }

    /// ```
    /// # use quorum_models::Int;
    /// let a = Int::from(40u64);
    /// assert_eq!(a.checked_add(&Int::from(2u64)).unwrap(), Int::from(42u64));
    /// ```
    pub fn checked_add(&self, other: &Int) -> ModelsResult<Int> {
        Int::bounded(&self.0 + &other.0)
    }

    /// subtraction, may go negative
    pub fn checked_sub(&self, other: &Int) -> ModelsResult<Int> {
        Int::bounded(&self.0 - &other.0)
    }

    /// multiplication
    pub fn checked_mul(&self, other: &Int) -> ModelsResult<Int> {
        Int::bounded(&self.0 * &other.0)
    }

    /// truncated division
    pub fn checked_div(&self, other: &Int) -> ModelsResult<Int> {
        if other.is_zero() {
            return Err(ModelsError::DivisionByZero(format!("{} / 0", self)));
        }
        Ok(Int(&self.0 / &other.0))
    }

    /// negation
    #[must_use]
    pub fn neg(&self) -> Int {
        Int(-&self.0)
    }

    /// true if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// true if strictly negative
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// true if strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Conversion to `u64`, fails with `Overflow` if negative or too big
    pub fn to_u64(&self) -> ModelsResult<u64> {
        self.0
            .to_u64()
            .ok_or_else(|| ModelsError::Overflow(format!("{} does not fit in u64", self)))
    }

    /// Conversion to `i128`, fails with `Overflow` if too big
    pub fn to_i128(&self) -> ModelsResult<i128> {
        self.0
            .to_i128()
            .ok_or_else(|| ModelsError::Overflow(format!("{} does not fit in i128", self)))
    }
}

impl From<u64> for Int {
    fn from(value: u64) -> Self {
        Int(BigInt::from(value))
    }
}

impl From<i64> for Int {
    fn from(value: i64) -> Self {
        Int(BigInt::from(value))
    }
}

impl From<i128> for Int {
    fn from(value: i128) -> Self {
        Int(BigInt::from(value))
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Int {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = BigInt::from_str(s)
            .map_err(|err| ModelsError::AmountParseError(format!("{}: {}", s, err)))?;
        Int::bounded(value)
    }
}

impl ::serde::Serialize for Int {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for Int {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Int, D::Error> {
        let s = <String as ::serde::Deserialize>::deserialize(d)?;
        Int::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

/// Serializer for `Int`: one sign byte followed by the length-prefixed big endian magnitude
#[derive(Clone, Default)]
pub struct IntSerializer {
    bytes_serializer: VecU8Serializer,
}

impl IntSerializer {
    /// Creates an `IntSerializer`
    pub const fn new() -> Self {
        Self {
            bytes_serializer: VecU8Serializer::new(),
        }
    }
}

impl Serializer<Int> for IntSerializer {
    fn serialize(&self, value: &Int, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let (sign, magnitude) = value.0.to_bytes_be();
        buffer.push(match sign {
            Sign::Minus => 1,
            Sign::NoSign | Sign::Plus => 0,
        });
        let magnitude = if value.is_zero() { Vec::new() } else { magnitude };
        self.bytes_serializer.serialize(&magnitude, buffer)
    }
}

/// Deserializer for `Int`
#[derive(Clone)]
pub struct IntDeserializer {
    bytes_deserializer: VecU8Deserializer,
}

impl IntDeserializer {
    /// Creates an `IntDeserializer`
    pub const fn new() -> Self {
        Self {
            bytes_deserializer: VecU8Deserializer::new(Included(0), Included(INT_MAX_BYTES)),
        }
    }
}

impl Default for IntDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Int> for IntDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Int, E> {
        context("Failed Int deserialization", |input: &'a [u8]| {
            let (rest, sign) = match input.split_first() {
                Some((0, rest)) => (rest, Sign::Plus),
                Some((1, rest)) => (rest, Sign::Minus),
                _ => {
                    return Err(nom::Err::Error(ParseError::from_error_kind(
                        input,
                        ErrorKind::Verify,
                    )))
                }
            };
            let (rest, magnitude) = self.bytes_deserializer.deserialize(rest)?;
            // canonical form: no leading zero byte, and zero is never negative
            if magnitude.first() == Some(&0) || (magnitude.is_empty() && sign == Sign::Minus) {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            let value = Int::bounded(BigInt::from_bytes_be(sign, &magnitude)).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::TooLarge))
            })?;
            Ok((rest, value))
        })(buffer)
    }
}
