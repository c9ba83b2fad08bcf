// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::constants::DEC_PRECISION;
use crate::error::{ModelsError, ModelsResult};
use crate::Int;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use num::{BigInt, Integer};
use quorum_serialization::{Deserializer, SerializeError, Serializer};
use rust_decimal::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Fixed-precision signed decimal used for shares and exchange rates.
///
/// Products and quotients are rounded half-to-even to `DEC_PRECISION`
/// decimal places so that every node computes bit-identical values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dec(Decimal);

impl Dec {
    /// Zero
    pub const fn zero() -> Self {
        Dec(Decimal::ZERO)
    }

    /// One
    pub const fn one() -> Self {
        Dec(Decimal::ONE)
    }

    /// Conversion from an integer number of tokens
    pub fn from_u64(value: u64) -> Self {
        Dec(Decimal::from(value))
    }

    /// Conversion from an `Int`, fails with `Overflow` if it does not fit
    pub fn from_int(value: &Int) -> ModelsResult<Self> {
        Decimal::from_i128(value.to_i128()?)
            .map(Dec)
            .ok_or_else(|| ModelsError::Overflow(format!("{} does not fit in a decimal", value)))
    }

    /// `numerator / denominator`, rounded to the decimal precision
    /// ```
    /// # use quorum_models::Dec;
    /// # use std::str::FromStr;
    /// assert_eq!(Dec::from_ratio(1, 4).unwrap(), Dec::from_str("0.25").unwrap());
    /// ```
    pub fn from_ratio(numerator: u64, denominator: u64) -> ModelsResult<Self> {
        Dec::from_u64(numerator).checked_div(&Dec::from_u64(denominator))
    }

    fn rounded(value: Decimal) -> Self {
        Dec(value.round_dp_with_strategy(DEC_PRECISION, RoundingStrategy::MidpointNearestEven))
    }

    /// addition
    pub fn checked_add(&self, other: &Dec) -> ModelsResult<Dec> {
        self.0
            .checked_add(other.0)
            .map(Dec)
            .ok_or_else(|| ModelsError::Overflow(format!("{} + {}", self, other)))
    }

    /// subtraction, may go negative
    pub fn checked_sub(&self, other: &Dec) -> ModelsResult<Dec> {
        self.0
            .checked_sub(other.0)
            .map(Dec)
            .ok_or_else(|| ModelsError::Overflow(format!("{} - {}", self, other)))
    }

    /// multiplication, rounded to the decimal precision
    /// ```
    /// # use quorum_models::Dec;
    /// # use std::str::FromStr;
    /// let a = Dec::from_str("1.5").unwrap();
    /// assert_eq!(a.checked_mul(&Dec::from_u64(3)).unwrap(), Dec::from_str("4.5").unwrap());
    /// ```
    pub fn checked_mul(&self, other: &Dec) -> ModelsResult<Dec> {
        self.0
            .checked_mul(other.0)
            .map(Dec::rounded)
            .ok_or_else(|| ModelsError::Overflow(format!("{} * {}", self, other)))
    }

    /// division, rounded to the decimal precision
    pub fn checked_div(&self, other: &Dec) -> ModelsResult<Dec> {
        if other.is_zero() {
            return Err(ModelsError::DivisionByZero(format!("{} / 0", self)));
        }
        self.0
            .checked_div(other.0)
            .map(Dec::rounded)
            .ok_or_else(|| ModelsError::Overflow(format!("{} / {}", self, other)))
    }

    /// `floor(self * numerator / denominator)`, computed exactly.
    /// Used for token payouts, which must never round in favor of the receiver.
    pub fn mul_div_floor(&self, numerator: u64, denominator: &Dec) -> ModelsResult<u64> {
        if denominator.is_zero() {
            return Err(ModelsError::DivisionByZero(format!(
                "{} * {} / 0",
                self, numerator
            )));
        }
        // a / 10^sa * n / (d / 10^sd) = a * n * 10^sd / (d * 10^sa)
        let ten = BigInt::from(10u8);
        let num = BigInt::from(self.0.mantissa())
            * BigInt::from(numerator)
            * ten.pow(denominator.0.scale());
        let den = BigInt::from(denominator.0.mantissa()) * ten.pow(self.0.scale());
        num.div_floor(&den).to_u64().ok_or_else(|| {
            ModelsError::Overflow(format!(
                "{} * {} / {} does not fit in u64",
                self, numerator, denominator
            ))
        })
    }

    /// Largest integer value lower or equal to self
    #[must_use]
    pub fn floor(&self) -> Dec {
        Dec(self.0.floor())
    }

    /// Floor toward zero as a token count, fails with `Overflow` if negative or too big
    pub fn to_u64_floor(&self) -> ModelsResult<u64> {
        self.0
            .floor()
            .to_u64()
            .ok_or_else(|| ModelsError::Overflow(format!("{} does not fit in u64", self)))
    }

    /// Integer part, truncated toward zero
    pub fn truncate_int(&self) -> ModelsResult<Int> {
        self.0
            .trunc()
            .to_i128()
            .map(Int::from)
            .ok_or_else(|| ModelsError::Overflow(format!("{} does not fit in an int", self)))
    }

    /// true if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// true if strictly negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// true if strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// negation
    #[must_use]
    pub fn neg(&self) -> Dec {
        Dec(-self.0)
    }

    /// canonical form, without trailing zeros
    fn canonical(&self) -> Decimal {
        self.0.normalize()
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl FromStr for Dec {
    type Err = ModelsError;

    /// Parses a decimal string, rejecting more than `DEC_PRECISION` decimal places
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s)
            .map_err(|err| ModelsError::AmountParseError(format!("{}: {}", s, err)))?;
        if value.normalize().scale() > DEC_PRECISION {
            return Err(ModelsError::AmountParseError(format!(
                "{} has more than {} decimal places",
                s, DEC_PRECISION
            )));
        }
        Ok(Dec(value))
    }
}

impl ::serde::Serialize for Dec {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for Dec {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Dec, D::Error> {
        let s = <String as ::serde::Deserialize>::deserialize(d)?;
        Dec::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

const DEC_SERIALIZED_SIZE: usize = 16;

/// Serializer for `Dec`, 16 bytes of the canonical decimal
#[derive(Clone, Default)]
pub struct DecSerializer;

impl DecSerializer {
    /// Creates a `DecSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Dec> for DecSerializer {
    fn serialize(&self, value: &Dec, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.canonical().serialize());
        Ok(())
    }
}

/// Deserializer for `Dec`, only accepts canonical encodings
#[derive(Clone, Default)]
pub struct DecDeserializer;

impl DecDeserializer {
    /// Creates a `DecDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Dec> for DecDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Dec, E> {
        context("Failed Dec deserialization", |input: &'a [u8]| {
            let bytes: [u8; DEC_SERIALIZED_SIZE] = input
                .get(..DEC_SERIALIZED_SIZE)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| {
                    nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Eof))
                })?;
            let value = Decimal::deserialize(bytes);
            if value.normalize().serialize() != bytes || value.scale() > DEC_PRECISION {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((&input[DEC_SERIALIZED_SIZE..], Dec(value)))
        })(buffer)
    }
}
