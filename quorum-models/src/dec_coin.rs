// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::coin::{validate_denom, Coin, Coins};
use crate::constants::{DENOM_MAX_LENGTH, DENOM_MIN_LENGTH, MAX_COINS_LENGTH};
use crate::dec::{Dec, DecDeserializer, DecSerializer};
use crate::error::{ModelsError, ModelsResult};
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

/// A decimal amount of a single denomination
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecCoin {
    /// denomination
    pub denom: String,
    /// amount
    pub amount: Dec,
}

impl DecCoin {
    /// Creates a decimal coin
    pub fn new(denom: &str, amount: Dec) -> Self {
        DecCoin {
            denom: denom.to_string(),
            amount,
        }
    }

    /// Exact conversion from an integer coin
    pub fn from_coin(coin: &Coin) -> ModelsResult<Self> {
        Ok(DecCoin {
            denom: coin.denom.clone(),
            amount: Dec::from_int(&coin.amount)?,
        })
    }
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Canonical list of decimal coins, used for fee accumulation and
/// proportional distribution where integer coins would lose precision.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<DecCoin>")]
pub struct DecCoins(Vec<DecCoin>);

impl TryFrom<Vec<DecCoin>> for DecCoins {
    type Error = ModelsError;

    /// Drops zero entries and sorts by denomination. Invalid or duplicate
    /// denominations and negative amounts are refused.
    fn try_from(mut coins: Vec<DecCoin>) -> Result<Self, Self::Error> {
        coins.retain(|c| !c.amount.is_zero());
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        for coin in &coins {
            validate_denom(&coin.denom)?;
            if coin.amount.is_negative() {
                return Err(ModelsError::InvalidCoins(format!("negative amount {}", coin)));
            }
        }
        if coins.windows(2).any(|w| w[0].denom == w[1].denom) {
            return Err(ModelsError::InvalidCoins("duplicate denomination".into()));
        }
        Ok(DecCoins(coins))
    }
}

impl DecCoins {
    /// Empty list
    pub fn empty() -> Self {
        DecCoins(Vec::new())
    }

    /// Exact conversion from integer coins
    pub fn from_coins(coins: &Coins) -> ModelsResult<Self> {
        Ok(DecCoins(
            coins
                .iter()
                .map(DecCoin::from_coin)
                .collect::<ModelsResult<Vec<_>>>()?,
        ))
    }

    /// Sorted merge by denomination, dropping any denomination that sums to zero
    pub fn plus(&self, other: &DecCoins) -> ModelsResult<DecCoins> {
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
                        result.push(DecCoin::new(&a.denom, sum));
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        result.extend_from_slice(&self.0[i..]);
        result.extend_from_slice(&other.0[j..]);
        Ok(DecCoins(result))
    }

    /// `self - other`
    pub fn minus(&self, other: &DecCoins) -> ModelsResult<DecCoins> {
        let negated = DecCoins(
            other
                .0
                .iter()
                .map(|c| DecCoin::new(&c.denom, c.amount.neg()))
                .collect(),
        );
        self.plus(&negated)
    }

    /// Multiplies every entry by `factor`; entries rounding to zero are dropped
    pub fn mul(&self, factor: &Dec) -> ModelsResult<DecCoins> {
        let mut result = Vec::with_capacity(self.0.len());
        for coin in &self.0 {
            let amount = coin.amount.checked_mul(factor)?;
            if !amount.is_zero() {
                result.push(DecCoin::new(&coin.denom, amount));
            }
        }
        Ok(DecCoins(result))
    }

    /// Splits into whole coins (truncated toward zero) and the decimal change
    ///
    /// ```
    /// # use quorum_models::{Coins, Dec, DecCoin, DecCoins};
    /// # use std::str::FromStr;
    /// let fees = DecCoins::from_coins(&Coins::single("stake", 10u64).unwrap()).unwrap();
    /// let third = fees.mul(&Dec::from_ratio(1, 3).unwrap()).unwrap();
    /// let (whole, change) = third.truncate_decimal().unwrap();
    /// assert_eq!(whole, Coins::single("stake", 3u64).unwrap());
    /// assert_eq!(change.amount_of("stake"), Dec::from_str("0.333333333").unwrap());
    /// ```
    pub fn truncate_decimal(&self) -> ModelsResult<(Coins, DecCoins)> {
        let mut whole = Vec::new();
        let mut change = Vec::new();
        for coin in &self.0 {
            let truncated = coin.amount.truncate_int()?;
            let remainder = coin.amount.checked_sub(&Dec::from_int(&truncated)?)?;
            if !truncated.is_zero() {
                whole.push(Coin {
                    denom: coin.denom.clone(),
                    amount: truncated,
                });
            }
            if !remainder.is_zero() {
                change.push(DecCoin::new(&coin.denom, remainder));
            }
        }
        Ok((Coins::new(whole)?, DecCoins(change)))
    }

    /// Amount held for a denomination, zero if absent
    pub fn amount_of(&self, denom: &str) -> Dec {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|idx| self.0[idx].amount)
            .unwrap_or_default()
    }

    /// true if no entry
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the entries in denomination order
    pub fn iter(&self) -> std::slice::Iter<'_, DecCoin> {
        self.0.iter()
    }

    fn is_canonical(&self) -> bool {
        self.0.iter().all(|c| !c.amount.is_zero())
            && self.0.windows(2).all(|w| w[0].denom < w[1].denom)
            && self.0.iter().all(|c| validate_denom(&c.denom).is_ok())
    }
}

impl fmt::Display for DecCoins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Serializer for `DecCoins`
#[derive(Clone, Default)]
pub struct DecCoinsSerializer {
    len_serializer: U64VarIntSerializer,
    denom_serializer: StringSerializer,
    dec_serializer: DecSerializer,
}

impl DecCoinsSerializer {
    /// Creates a `DecCoinsSerializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U64VarIntSerializer::new(),
            denom_serializer: StringSerializer::new(),
            dec_serializer: DecSerializer::new(),
        }
    }
}

impl Serializer<DecCoins> for DecCoinsSerializer {
    fn serialize(&self, value: &DecCoins, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.len_serializer
            .serialize(&(value.0.len() as u64), buffer)?;
        for coin in &value.0 {
            self.denom_serializer.serialize(&coin.denom, buffer)?;
            self.dec_serializer.serialize(&coin.amount, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `DecCoins`
#[derive(Clone)]
pub struct DecCoinsDeserializer {
    len_deserializer: U64VarIntDeserializer,
    denom_deserializer: StringDeserializer,
    dec_deserializer: DecDeserializer,
}

impl DecCoinsDeserializer {
    /// Creates a `DecCoinsDeserializer`
    pub const fn new() -> Self {
        Self {
            len_deserializer: U64VarIntDeserializer::new(Included(0), Included(MAX_COINS_LENGTH)),
            denom_deserializer: StringDeserializer::new(
                Included(DENOM_MIN_LENGTH as u64),
                Included(DENOM_MAX_LENGTH as u64),
            ),
            dec_deserializer: DecDeserializer::new(),
        }
    }
}

impl Default for DecCoinsDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<DecCoins> for DecCoinsDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], DecCoins, E> {
        context("Failed DecCoins deserialization", |input: &'a [u8]| {
            let (rest, coins) = length_count(
                |input| self.len_deserializer.deserialize(input),
                tuple((
                    |input| self.denom_deserializer.deserialize(input),
                    |input| self.dec_deserializer.deserialize(input),
                ))
                .map(|(denom, amount)| DecCoin { denom, amount }),
            )
            .parse(input)?;
            let coins = DecCoins(coins);
            if !coins.is_canonical() {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    ErrorKind::Verify,
                )));
            }
            Ok((rest, coins))
        })(buffer)
    }
}
