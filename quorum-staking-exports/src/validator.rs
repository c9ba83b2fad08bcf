// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{Pool, StakingError, StakingResult};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use quorum_models::{Address, AddressDeserializer, AddressSerializer, Dec, DecDeserializer, DecSerializer};
use quorum_serialization::{
    BoolDeserializer, BoolSerializer, Deserializer, SerializeError, Serializer,
    U64VarIntDeserializer, U64VarIntSerializer,
};
use quorum_signature::{PublicKey, PublicKeyDeserializer, PublicKeySerializer};
use quorum_time::{QuorumTime, QuorumTimeDeserializer, QuorumTimeSerializer};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Bonding status of a validator
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum ValidatorStatus {
    /// not in the consensus set, tokens withdrawable
    Unbonded = 0,
    /// left the consensus set, waiting for its unbonding time
    Unbonding = 1,
    /// in the consensus set
    Bonded = 2,
}

/// A validator and its share accounting.
///
/// `assets` are shares of the pool matching the status (bonded pool when
/// bonded, unbonded pool otherwise). `liabilities` are the delegator shares
/// issued against those assets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// operator address, signs the validator's transactions
    pub operator: Address,
    /// key used by the consensus engine
    pub consensus_pubkey: PublicKey,
    /// pool shares held
    pub assets: Dec,
    /// delegator shares owed
    pub liabilities: Dec,
    /// bonding status
    pub status: ValidatorStatus,
    /// jailed validators are excluded from the consensus set
    pub jailed: bool,
    /// height at which the validator started unbonding
    pub unbonding_height: u64,
    /// time at which an unbonding validator becomes unbonded
    pub unbonding_time: QuorumTime,
}

impl Validator {
    /// New unbonded validator without any stake
    pub fn new(operator: Address, consensus_pubkey: PublicKey) -> Self {
        Validator {
            operator,
            consensus_pubkey,
            assets: Dec::zero(),
            liabilities: Dec::zero(),
            status: ValidatorStatus::Unbonded,
            jailed: false,
            unbonding_height: 0,
            unbonding_time: QuorumTime::EPOCH,
        }
    }

    /// Address derived from the consensus key, used by the slashing records
    pub fn consensus_address(&self) -> Address {
        Address::from_public_key(&self.consensus_pubkey)
    }

    /// Pool shares per delegator share, one when no delegator share was issued
    pub fn delegator_share_ex_rate(&self) -> StakingResult<Dec> {
        if self.liabilities.is_zero() {
            return Ok(Dec::one());
        }
        Ok(self.assets.checked_div(&self.liabilities)?)
    }

    /// Token value of the validator's assets, rounded down
    pub fn tokens(&self, pool: &Pool) -> StakingResult<u64> {
        pool.shares_to_tokens(self.status, &self.assets)
    }

    /// Tokens backing consensus power, zero unless bonded
    pub fn bonded_tokens(&self, pool: &Pool) -> StakingResult<u64> {
        if self.status != ValidatorStatus::Bonded {
            return Ok(0);
        }
        self.tokens(pool)
    }

    /// Consensus power the validator would have if bonded
    pub fn potential_power(&self, pool: &Pool, power_reduction: u64) -> StakingResult<u64> {
        Ok(self.tokens(pool)? / power_reduction.max(1))
    }

    /// Current consensus power
    pub fn power(&self, pool: &Pool, power_reduction: u64) -> StakingResult<u64> {
        Ok(self.bonded_tokens(pool)? / power_reduction.max(1))
    }

    /// Token value of `del_shares` delegator shares, rounded down
    pub fn shares_to_tokens(&self, pool: &Pool, del_shares: &Dec) -> StakingResult<u64> {
        if *del_shares == self.liabilities {
            return self.tokens(pool);
        }
        let pool_shares = del_shares.checked_mul(&self.delegator_share_ex_rate()?)?;
        pool.shares_to_tokens(self.status, &pool_shares)
    }

    /// Deposits delegated tokens. Returns the new state and the issued delegator shares.
    pub fn add_tokens_from_del(
        &self,
        pool: &Pool,
        tokens: u64,
    ) -> StakingResult<(Validator, Pool, Dec)> {
        let ex_rate = self.delegator_share_ex_rate()?;
        if ex_rate.is_zero() {
            return Err(StakingError::InvalidRequest(format!(
                "validator {} has no assets left for its delegators",
                self.operator
            )));
        }
        let (pool, received_shares) = pool.add_tokens(self.status, tokens)?;
        let issued = received_shares.checked_div(&ex_rate)?;
        let mut validator = self.clone();
        validator.assets = validator.assets.checked_add(&received_shares)?;
        validator.liabilities = validator.liabilities.checked_add(&issued)?;
        validator.check_invariants()?;
        Ok((validator, pool, issued))
    }

    /// Burns delegator shares. Returns the new state and the withdrawn tokens.
    /// Burning every delegator share withdraws every asset.
    pub fn remove_del_shares(
        &self,
        pool: &Pool,
        del_shares: &Dec,
    ) -> StakingResult<(Validator, Pool, u64)> {
        if del_shares.is_negative() || *del_shares > self.liabilities {
            return Err(StakingError::InvariantViolation(format!(
                "removing {} delegator shares from validator {} with {}",
                del_shares, self.operator, self.liabilities
            )));
        }
        let pool_shares = if *del_shares == self.liabilities {
            self.assets
        } else {
            del_shares
                .checked_mul(&self.delegator_share_ex_rate()?)?
                .min(self.assets)
        };
        let (pool, tokens) = pool.remove_shares(self.status, &pool_shares)?;
        let mut validator = self.clone();
        validator.assets = validator.assets.checked_sub(&pool_shares)?;
        validator.liabilities = validator.liabilities.checked_sub(del_shares)?;
        validator.check_invariants()?;
        Ok((validator, pool, tokens))
    }

    /// Withdraws `tokens` from the assets without touching the liabilities,
    /// which lowers the value of every delegator share. Returns the tokens
    /// actually withdrawn, capped by the validator's tokens.
    pub fn remove_tokens(&self, pool: &Pool, tokens: u64) -> StakingResult<(Validator, Pool, u64)> {
        let held = self.tokens(pool)?;
        let pool_shares = if tokens >= held {
            self.assets
        } else {
            pool.tokens_to_shares(self.status, tokens)?.min(self.assets)
        };
        let (pool, removed) = pool.remove_shares(self.status, &pool_shares)?;
        let mut validator = self.clone();
        validator.assets = validator.assets.checked_sub(&pool_shares)?;
        validator.check_invariants()?;
        Ok((validator, pool, removed))
    }

    /// Post-condition of every validator operation
    pub fn check_invariants(&self) -> StakingResult<()> {
        if self.assets.is_negative() || self.liabilities.is_negative() {
            return Err(StakingError::InvariantViolation(format!(
                "validator {} has assets {} and liabilities {}",
                self.operator, self.assets, self.liabilities
            )));
        }
        Ok(())
    }
}

impl Pool {
    /// Moves a bonded validator's token value to the unbonded pool, the validator enters `Unbonding`.
    /// Its assets are re-issued as unbonded pool shares, its liabilities are untouched.
    pub fn bonded_to_unbonded(&self, validator: &Validator) -> StakingResult<(Pool, Validator)> {
        if validator.status != ValidatorStatus::Bonded {
            return Err(StakingError::InvariantViolation(format!(
                "validator {} is not bonded",
                validator.operator
            )));
        }
        let (pool, tokens) = self.remove_shares_bonded(&validator.assets)?;
        let (pool, shares) = pool.add_tokens_unbonded(tokens)?;
        let mut validator = validator.clone();
        validator.assets = shares;
        validator.status = ValidatorStatus::Unbonding;
        Ok((pool, validator))
    }

    /// Moves an unbonding or unbonded validator's token value to the bonded pool
    pub fn unbonded_to_bonded(&self, validator: &Validator) -> StakingResult<(Pool, Validator)> {
        if validator.status == ValidatorStatus::Bonded {
            return Err(StakingError::InvariantViolation(format!(
                "validator {} is already bonded",
                validator.operator
            )));
        }
        let (pool, tokens) = self.remove_shares_unbonded(&validator.assets)?;
        let (pool, shares) = pool.add_tokens_bonded(tokens)?;
        let mut validator = validator.clone();
        validator.assets = shares;
        validator.status = ValidatorStatus::Bonded;
        Ok((pool, validator))
    }
}

/// Change of consensus power handed to the consensus engine, zero power removes the validator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// consensus key
    pub consensus_pubkey: PublicKey,
    /// new power
    pub power: u64,
}

/// Serializer for `Validator`
#[derive(Clone, Default)]
pub struct ValidatorSerializer {
    address_serializer: AddressSerializer,
    public_key_serializer: PublicKeySerializer,
    dec_serializer: DecSerializer,
    bool_serializer: BoolSerializer,
    u64_serializer: U64VarIntSerializer,
    time_serializer: QuorumTimeSerializer,
}

impl ValidatorSerializer {
    /// Creates a `ValidatorSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            public_key_serializer: PublicKeySerializer::new(),
            dec_serializer: DecSerializer::new(),
            bool_serializer: BoolSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: QuorumTimeSerializer::new(),
        }
    }
}

impl Serializer<Validator> for ValidatorSerializer {
    fn serialize(&self, value: &Validator, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.operator, buffer)?;
        self.public_key_serializer
            .serialize(&value.consensus_pubkey, buffer)?;
        self.dec_serializer.serialize(&value.assets, buffer)?;
        self.dec_serializer.serialize(&value.liabilities, buffer)?;
        buffer.push(u8::from(value.status));
        self.bool_serializer.serialize(&value.jailed, buffer)?;
        self.u64_serializer
            .serialize(&value.unbonding_height, buffer)?;
        self.time_serializer
            .serialize(&value.unbonding_time, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Validator`
#[derive(Clone)]
pub struct ValidatorDeserializer {
    address_deserializer: AddressDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
    dec_deserializer: DecDeserializer,
    bool_deserializer: BoolDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: QuorumTimeDeserializer,
}

impl ValidatorDeserializer {
    /// Creates a `ValidatorDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            public_key_deserializer: PublicKeyDeserializer::new(),
            dec_deserializer: DecDeserializer::new(),
            bool_deserializer: BoolDeserializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: QuorumTimeDeserializer::new((
                Included(QuorumTime::EPOCH),
                Included(QuorumTime::max()),
            )),
        }
    }
}

impl Default for ValidatorDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

fn status_deserializer<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    input: &'a [u8],
) -> IResult<&'a [u8], ValidatorStatus, E> {
    let (rest, byte) = nom::number::complete::u8(input)?;
    let status = ValidatorStatus::try_from(byte)
        .map_err(|_| nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Verify)))?;
    Ok((rest, status))
}

impl Deserializer<Validator> for ValidatorDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Validator, E> {
        context(
            "Failed Validator deserialization",
            tuple((
                context("Failed operator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed consensus_pubkey deserialization", |input| {
                    self.public_key_deserializer.deserialize(input)
                }),
                context("Failed assets deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
                context("Failed liabilities deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
                context("Failed status deserialization", status_deserializer),
                context("Failed jailed deserialization", |input| {
                    self.bool_deserializer.deserialize(input)
                }),
                context("Failed unbonding_height deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed unbonding_time deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(
                operator,
                consensus_pubkey,
                assets,
                liabilities,
                status,
                jailed,
                unbonding_height,
                unbonding_time,
            )| Validator {
                operator,
                consensus_pubkey,
                assets,
                liabilities,
                status,
                jailed,
                unbonding_height,
                unbonding_time,
            },
        )
        .parse(buffer)
    }
}
