// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{StakingError, StakingResult, ValidatorStatus};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quorum_models::{Dec, DecDeserializer, DecSerializer};
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use quorum_time::{QuorumTime, QuorumTimeDeserializer, QuorumTimeSerializer};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Chain-wide token and share tallies of the staking module.
///
/// Tokens enter the pools through delegations and inflation and leave them
/// through unbondings and slashing. Internal moves never create or destroy tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// shares issued against the bonded pool
    pub bonded_shares: Dec,
    /// shares issued against the unbonded pool
    pub unbonded_shares: Dec,
    /// tokens backing bonded validators
    pub bonded_pool: u64,
    /// tokens backing unbonding and unbonded validators
    pub unbonded_pool: u64,
    /// tokens withdrawn from validators, waiting for their unbonding entries to mature
    pub unbonding_pool: u64,
    /// yearly inflation rate
    pub inflation: Dec,
    /// block time of the last inflation update
    pub inflation_last_time: QuorumTime,
}

impl Pool {
    /// Empty pool
    pub fn new(inflation: Dec, inflation_last_time: QuorumTime) -> Self {
        Pool {
            bonded_shares: Dec::zero(),
            unbonded_shares: Dec::zero(),
            bonded_pool: 0,
            unbonded_pool: 0,
            unbonding_pool: 0,
            inflation,
            inflation_last_time,
        }
    }

    /// Tokens held by the staking module
    pub fn total_tokens(&self) -> StakingResult<u64> {
        self.bonded_pool
            .checked_add(self.unbonded_pool)
            .and_then(|t| t.checked_add(self.unbonding_pool))
            .ok_or_else(|| StakingError::Overflow("pool token total".into()))
    }

    /// `bonded_pool / supply`, zero when the supply is zero
    pub fn bonded_ratio(&self, supply: u64) -> StakingResult<Dec> {
        if supply == 0 {
            return Ok(Dec::zero());
        }
        Ok(Dec::from_ratio(self.bonded_pool, supply)?)
    }

    fn ex_rate(tokens: u64, shares: &Dec) -> StakingResult<Dec> {
        if shares.is_zero() {
            return Ok(Dec::one());
        }
        Ok(Dec::from_u64(tokens).checked_div(shares)?)
    }

    /// Tokens per bonded share, one when no share was issued
    pub fn bonded_share_ex_rate(&self) -> StakingResult<Dec> {
        Pool::ex_rate(self.bonded_pool, &self.bonded_shares)
    }

    /// Tokens per unbonded share, one when no share was issued
    pub fn unbonded_share_ex_rate(&self) -> StakingResult<Dec> {
        Pool::ex_rate(self.unbonded_pool, &self.unbonded_shares)
    }

    /// Token value of `shares` of the pool backing validators of `status`, rounded down
    pub fn shares_to_tokens(&self, status: ValidatorStatus, shares: &Dec) -> StakingResult<u64> {
        let (tokens, issued) = self.tallies(status);
        if issued.is_zero() {
            return Ok(shares.to_u64_floor()?);
        }
        Ok(shares.mul_div_floor(tokens, &issued)?)
    }

    /// Shares of the pool backing validators of `status` worth `tokens`
    pub fn tokens_to_shares(&self, status: ValidatorStatus, tokens: u64) -> StakingResult<Dec> {
        let (pool_tokens, issued) = self.tallies(status);
        if issued.is_zero() {
            return Ok(Dec::from_u64(tokens));
        }
        if tokens == 0 {
            return Ok(Dec::zero());
        }
        // slashing can leave shares without any token behind them until their holders leave
        if pool_tokens == 0 {
            return Err(StakingError::InvalidRequest(format!(
                "{:?} pool holds no token for {} shares",
                status, issued
            )));
        }
        Ok(Dec::from_u64(tokens)
            .checked_mul(&issued)?
            .checked_div(&Dec::from_u64(pool_tokens))?)
    }

    fn tallies(&self, status: ValidatorStatus) -> (u64, Dec) {
        match status {
            ValidatorStatus::Bonded => (self.bonded_pool, self.bonded_shares),
            ValidatorStatus::Unbonding | ValidatorStatus::Unbonded => {
                (self.unbonded_pool, self.unbonded_shares)
            }
        }
    }

    /// Deposits tokens in the bonded pool. Shares are issued at the pre-deposit rate.
    pub fn add_tokens_bonded(&self, tokens: u64) -> StakingResult<(Pool, Dec)> {
        self.add_tokens(ValidatorStatus::Bonded, tokens)
    }

    /// Deposits tokens in the unbonded pool. Shares are issued at the pre-deposit rate.
    pub fn add_tokens_unbonded(&self, tokens: u64) -> StakingResult<(Pool, Dec)> {
        self.add_tokens(ValidatorStatus::Unbonded, tokens)
    }

    /// Burns bonded shares and withdraws their token value, rounded down
    pub fn remove_shares_bonded(&self, shares: &Dec) -> StakingResult<(Pool, u64)> {
        self.remove_shares(ValidatorStatus::Bonded, shares)
    }

    /// Burns unbonded shares and withdraws their token value, rounded down
    pub fn remove_shares_unbonded(&self, shares: &Dec) -> StakingResult<(Pool, u64)> {
        self.remove_shares(ValidatorStatus::Unbonded, shares)
    }

    /// Deposits tokens in the pool backing validators of `status`
    pub fn add_tokens(&self, status: ValidatorStatus, tokens: u64) -> StakingResult<(Pool, Dec)> {
        let shares = self.tokens_to_shares(status, tokens)?;
        let mut pool = *self;
        let overflow = || StakingError::Overflow(format!("adding {} tokens to the pool", tokens));
        match status {
            ValidatorStatus::Bonded => {
                pool.bonded_pool = pool.bonded_pool.checked_add(tokens).ok_or_else(overflow)?;
                pool.bonded_shares = pool.bonded_shares.checked_add(&shares)?;
            }
            ValidatorStatus::Unbonding | ValidatorStatus::Unbonded => {
                pool.unbonded_pool = pool.unbonded_pool.checked_add(tokens).ok_or_else(overflow)?;
                pool.unbonded_shares = pool.unbonded_shares.checked_add(&shares)?;
            }
        }
        pool.check_invariants()?;
        Ok((pool, shares))
    }

    /// Burns shares of the pool backing validators of `status` and withdraws their token value.
    /// Burning every share withdraws every token.
    pub fn remove_shares(&self, status: ValidatorStatus, shares: &Dec) -> StakingResult<(Pool, u64)> {
        let (pool_tokens, issued) = self.tallies(status);
        if shares.is_negative() || *shares > issued {
            return Err(StakingError::InvariantViolation(format!(
                "removing {} shares from a {:?} pool of {} shares",
                shares, status, issued
            )));
        }
        let tokens = if *shares == issued {
            pool_tokens
        } else {
            self.shares_to_tokens(status, shares)?
        };
        let mut pool = *self;
        let underflow = || {
            StakingError::InvariantViolation(format!(
                "withdrawing {} tokens from a {:?} pool of {}",
                tokens, status, pool_tokens
            ))
        };
        match status {
            ValidatorStatus::Bonded => {
                pool.bonded_pool = pool.bonded_pool.checked_sub(tokens).ok_or_else(underflow)?;
                pool.bonded_shares = pool.bonded_shares.checked_sub(shares)?;
            }
            ValidatorStatus::Unbonding | ValidatorStatus::Unbonded => {
                pool.unbonded_pool = pool.unbonded_pool.checked_sub(tokens).ok_or_else(underflow)?;
                pool.unbonded_shares = pool.unbonded_shares.checked_sub(shares)?;
            }
        }
        pool.check_invariants()?;
        Ok((pool, tokens))
    }

    /// Moves tokens to the unbonding tally
    pub fn add_unbonding(&self, tokens: u64) -> StakingResult<Pool> {
        let mut pool = *self;
        pool.unbonding_pool = pool
            .unbonding_pool
            .checked_add(tokens)
            .ok_or_else(|| StakingError::Overflow("unbonding pool".into()))?;
        Ok(pool)
    }

    /// Releases tokens from the unbonding tally
    pub fn remove_unbonding(&self, tokens: u64) -> StakingResult<Pool> {
        let mut pool = *self;
        pool.unbonding_pool = pool.unbonding_pool.checked_sub(tokens).ok_or_else(|| {
            StakingError::InvariantViolation(format!(
                "releasing {} tokens from an unbonding pool of {}",
                tokens, self.unbonding_pool
            ))
        })?;
        Ok(pool)
    }

    /// Adds freshly minted tokens to the bonded pool without issuing shares
    pub fn add_provisions(&self, tokens: u64) -> StakingResult<Pool> {
        let mut pool = *self;
        pool.bonded_pool = pool
            .bonded_pool
            .checked_add(tokens)
            .ok_or_else(|| StakingError::Overflow("bonded pool provisions".into()))?;
        pool.check_invariants()?;
        Ok(pool)
    }

    /// Post-condition of every pool operation
    pub fn check_invariants(&self) -> StakingResult<()> {
        if self.bonded_shares.is_negative() || self.unbonded_shares.is_negative() {
            return Err(StakingError::InvariantViolation(format!(
                "negative pool shares: bonded {} unbonded {}",
                self.bonded_shares, self.unbonded_shares
            )));
        }
        if self.bonded_share_ex_rate()?.is_negative() || self.unbonded_share_ex_rate()?.is_negative()
        {
            return Err(StakingError::InvariantViolation(
                "negative exchange rate".into(),
            ));
        }
        Ok(())
    }
}

/// Serializer for `Pool`
#[derive(Clone, Default)]
pub struct PoolSerializer {
    dec_serializer: DecSerializer,
    u64_serializer: U64VarIntSerializer,
    time_serializer: QuorumTimeSerializer,
}

impl PoolSerializer {
    /// Creates a `PoolSerializer`
    pub const fn new() -> Self {
        Self {
            dec_serializer: DecSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: QuorumTimeSerializer::new(),
        }
    }
}

impl Serializer<Pool> for PoolSerializer {
    fn serialize(&self, value: &Pool, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.dec_serializer.serialize(&value.bonded_shares, buffer)?;
        self.dec_serializer.serialize(&value.unbonded_shares, buffer)?;
        self.u64_serializer.serialize(&value.bonded_pool, buffer)?;
        self.u64_serializer.serialize(&value.unbonded_pool, buffer)?;
        self.u64_serializer.serialize(&value.unbonding_pool, buffer)?;
        self.dec_serializer.serialize(&value.inflation, buffer)?;
        self.time_serializer
            .serialize(&value.inflation_last_time, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Pool`
#[derive(Clone)]
pub struct PoolDeserializer {
    dec_deserializer: DecDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: QuorumTimeDeserializer,
}

impl PoolDeserializer {
    /// Creates a `PoolDeserializer`
    pub const fn new() -> Self {
        Self {
            dec_deserializer: DecDeserializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: QuorumTimeDeserializer::new((
                Included(QuorumTime::EPOCH),
                Included(QuorumTime::max()),
            )),
        }
    }
}

impl Default for PoolDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Pool> for PoolDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Pool, E> {
        context(
            "Failed Pool deserialization",
            tuple((
                context("Failed bonded_shares deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
                context("Failed unbonded_shares deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
                context("Failed bonded_pool deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed unbonded_pool deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed unbonding_pool deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed inflation deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
                context("Failed inflation_last_time deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(
                bonded_shares,
                unbonded_shares,
                bonded_pool,
                unbonded_pool,
                unbonding_pool,
                inflation,
                inflation_last_time,
            )| Pool {
                bonded_shares,
                unbonded_shares,
                bonded_pool,
                unbonded_pool,
                unbonding_pool,
                inflation,
                inflation_last_time,
            },
        )
        .parse(buffer)
    }
}
