// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::constants::{DENOM_MAX_LENGTH, DENOM_MIN_LENGTH, MAX_COINS_LENGTH};
use crate::error::{ModelsError, ModelsResult};
use crate::int::{Int, IntDeserializer, IntSerializer};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, StringDeserializer, StringSerializer,
    U64VarIntDeserializer, U64VarIntSerializer,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Checks that a denomination is lowercase alphanumeric, starts with a letter
/// and has an allowed length
pub fn validate_denom(denom: &str) -> ModelsResult<()> {
    let valid_len = (DENOM_MIN_LENGTH..=DENOM_MAX_LENGTH).contains(&denom.len());
    let mut chars = denom.chars();
    let starts_with_letter = chars.next().map_or(false, |c| c.is_ascii_lowercase());
    if !valid_len
        || !starts_with_letter
        || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(ModelsError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

/// An amount of a single denomination
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// denomination
    pub denom: String,
    /// amount, may be negative in intermediate computations
    pub amount: Int,
}

impl Coin {
    /// Creates a coin
    pub fn new(denom: &str, amount: impl Into<Int>) -> Self {
        Coin {
            denom: denom.to_string(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = ModelsError;

    /// Parses `"10stake"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '-'))
            .ok_or_else(|| ModelsError::InvalidCoins(format!("missing denomination in {}", s)))?;
        let (amount, denom) = s.split_at(split);
        validate_denom(denom)?;
        Ok(Coin {
            denom: denom.to_string(),
            amount: Int::from_str(amount)?,
        })
    }
}

/// Canonical list of coins: denominations unique and sorted, no zero amount.
///
/// Deserialized lists are canonicalized, and refused if an amount is negative.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl TryFrom<Vec<Coin>> for Coins {
    type Error = ModelsError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        let coins = Coins::new(coins)?;
        if !coins.is_not_negative() {
            return Err(ModelsError::InvalidCoins(format!(
                "negative amount in {}",
                coins
            )));
        }
        Ok(coins)
    }
}

impl Coins {
    /// Empty list
    pub fn empty() -> Self {
        Coins(Vec::new())
    }

    /// Builds a canonical list: zero entries are dropped, entries are sorted by
    /// denomination, duplicate denominations and invalid denominations are rejected.
    pub fn new(mut coins: Vec<Coin>) -> ModelsResult<Self> {
        coins.retain(|c| !c.amount.is_zero());
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        for coin in &coins {
            validate_denom(&coin.denom)?;
        }
        if coins.windows(2).any(|w| w[0].denom == w[1].denom) {
            return Err(ModelsError::InvalidCoins("duplicate denomination".into()));
        }
        Ok(Coins(coins))
    }

    /// A list with a single coin (empty if the amount is zero)
    pub fn single(denom: &str, amount: impl Into<Int>) -> ModelsResult<Self> {
        Coins::new(vec![Coin::new(denom, amount)])
    }

    /// Sorted merge by denomination. Equal denominations are summed and the
    /// entry is dropped when the sum is exactly zero.
    ///
    /// ```
    /// # use quorum_models::{Coin, Coins};
    /// let a = Coins::new(vec![Coin::new("atom", 5i64), Coin::new("stake", 3i64)]).unwrap();
    /// let b = Coins::new(vec![Coin::new("stake", -3i64)]).unwrap();
    /// assert_eq!(a.plus(&b).unwrap(), Coins::single("atom", 5i64).unwrap());
    /// ```
    pub fn plus(&self, other: &Coins) -> ModelsResult<Coins> {
        let mut result = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (a, b) = (&self.0[i], &other.0[j]);
            match a.denom.cmp(&b.denom) {
                Ordering::Less => {
                    result.push(a.clone());
                    i += 1;
                }
                Ordering::Greater => {
                    result.push(b.clone());
                    j += 1;
                }
                Ordering::Equal => {
                    let sum = a.amount.checked_add(&b.amount)?;
                    if !sum.is_zero() {
                        result.push(Coin {
                            denom: a.denom.clone(),
                            amount: sum,
                        });
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        result.extend_from_slice(&self.0[i..]);
        result.extend_from_slice(&other.0[j..]);
        Ok(Coins(result))
    }

    /// `self - other`, entries may become negative
    pub fn minus(&self, other: &Coins) -> ModelsResult<Coins> {
        self.plus(&other.negative())
    }

    /// Every amount negated
    #[must_use]
    pub fn negative(&self) -> Coins {
        Coins(
            self.0
                .iter()
                .map(|c| Coin {
                    denom: c.denom.clone(),
                    amount: c.amount.neg(),
                })
                .collect(),
        )
    }

    /// Amount held for a denomination, zero if absent
    pub fn amount_of(&self, denom: &str) -> Int {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|idx| self.0[idx].amount.clone())
            .unwrap_or_default()
    }

    /// true if no entry is negative
    pub fn is_not_negative(&self) -> bool {
        self.0.iter().all(|c| !c.amount.is_negative())
    }

    /// true if all entries are strictly positive, sorted and unique
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|c| c.amount.is_positive())
            && self.0.windows(2).all(|w| w[0].denom < w[1].denom)
            && self.0.iter().all(|c| validate_denom(&c.denom).is_ok())
    }

    /// true if there is no entry
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of denominations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the entries in denomination order
    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for Coins {
    type Err = ModelsError;

    /// Parses `"10atom,5stake"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Coins::empty());
        }
        let coins = s
            .split(',')
            .map(|part| Coin::from_str(part.trim()))
            .collect::<ModelsResult<Vec<_>>>()?;
        Coins::new(coins)
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Serializer for `Coins`
#[derive(Clone, Default)]
pub struct CoinsSerializer {
    len_serializer: U64VarIntSerializer,
    denom_serializer: StringSerializer,
    int_serializer: IntSerializer,
}

impl CoinsSerializer {
    /// Creates a `CoinsSerializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U64VarIntSerializer::new(),
            denom_serializer: StringSerializer::new(),
            int_serializer: IntSerializer::new(),
        }
    }
}

impl Serializer<Coins> for CoinsSerializer {
    fn serialize(&self, value: &Coins, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.len_serializer.serialize(&(value.len() as u64), buffer)?;
        for coin in value.iter() {
            self.denom_serializer.serialize(&coin.denom, buffer)?;
            self.int_serializer.serialize(&coin.amount, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Coins`, only accepts valid canonical lists
#[derive(Clone)]
pub struct CoinsDeserializer {
    len_deserializer: U64VarIntDeserializer,
    denom_deserializer: StringDeserializer,
    int_deserializer: IntDeserializer,
}

impl CoinsDeserializer {
    /// Creates a `CoinsDeserializer`
    pub const fn new() -> Self {
        Self {
            len_deserializer: U64VarIntDeserializer::new(Included(0), Included(MAX_COINS_LENGTH)),
            denom_deserializer: StringDeserializer::new(
                Included(DENOM_MIN_LENGTH as u64),
                Included(DENOM_MAX_LENGTH as u64),
            ),
            int_deserializer: IntDeserializer::new(),
        }
    }
}

impl Default for CoinsDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Coins> for CoinsDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Coins, E> {
        context("Failed Coins deserialization", |input: &'a [u8]| {
            let (rest, coins) = length_count(
                context("Failed length deserialization", |input| {
                    self.len_deserializer.deserialize(input)
                }),
                tuple((
                    context("Failed denom deserialization", |input| {
                        self.denom_deserializer.deserialize(input)
                    }),
                    context("Failed amount deserialization", |input| {
                        self.int_deserializer.deserialize(input)
                    }),
                ))
                .map(|(denom, amount)| Coin { denom, amount }),
            )
            .parse(input)?;
            let coins = Coins(coins);
            if !coins.is_valid() {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((rest, coins))
        })(buffer)
    }
}

/// Serializer for a single `Coin`
#[derive(Clone, Default)]
pub struct CoinSerializer {
    denom_serializer: StringSerializer,
    int_serializer: IntSerializer,
}

impl CoinSerializer {
    /// Creates a `CoinSerializer`
    pub const fn new() -> Self {
        Self {
            denom_serializer: StringSerializer::new(),
            int_serializer: IntSerializer::new(),
        }
    }
}

impl Serializer<Coin> for CoinSerializer {
    fn serialize(&self, value: &Coin, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.denom_serializer.serialize(&value.denom, buffer)?;
        self.int_serializer.serialize(&value.amount, buffer)
    }
}

/// Deserializer for a single `Coin`, only accepts valid denominations
#[derive(Clone)]
pub struct CoinDeserializer {
    denom_deserializer: StringDeserializer,
    int_deserializer: IntDeserializer,
}

impl CoinDeserializer {
    /// Creates a `CoinDeserializer`
    pub const fn new() -> Self {
        Self {
            denom_deserializer: StringDeserializer::new(
                Included(DENOM_MIN_LENGTH as u64),
                Included(DENOM_MAX_LENGTH as u64),
            ),
            int_deserializer: IntDeserializer::new(),
        }
    }
}

impl Default for CoinDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Coin> for CoinDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Coin, E> {
        context("Failed Coin deserialization", |input: &'a [u8]| {
            let (rest, (denom, amount)) = tuple((
                context("Failed denom deserialization", |input| {
                    self.denom_deserializer.deserialize(input)
                }),
                context("Failed amount deserialization", |input| {
                    self.int_deserializer.deserialize(input)
                }),
            ))
            .parse(input)?;
            if validate_denom(&denom).is_err() {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((rest, Coin { denom, amount }))
        })(buffer)
    }
}
