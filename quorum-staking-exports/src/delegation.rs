// Copyright (c) 2022 MASSA LABS <info@massa.net>

use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quorum_models::{Address, AddressDeserializer, AddressSerializer, Dec, DecDeserializer, DecSerializer};
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
    U64VarIntDeserializer, U64VarIntSerializer,
};
use quorum_time::{QuorumTime, QuorumTimeDeserializer, QuorumTimeSerializer};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Max number of entries accepted when deserializing an unbonding delegation or a redelegation
pub const MAX_ENTRIES_LENGTH: u32 = 1024;

/// Delegator shares held by a delegator on a validator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// delegator
    pub delegator: Address,
    /// validator operator
    pub validator: Address,
    /// delegator shares of the validator
    pub shares: Dec,
}

/// Tokens withdrawn from a validator, paid out at `completion_time`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegationEntry {
    /// height at which the unbonding started
    pub creation_height: u64,
    /// maturity
    pub completion_time: QuorumTime,
    /// tokens withdrawn at creation
    pub initial_balance: u64,
    /// tokens left to pay out, lowered by slashing
    pub balance: u64,
}

impl UnbondingDelegationEntry {
    /// true once `completion_time` is reached
    pub fn is_mature(&self, now: QuorumTime) -> bool {
        self.completion_time <= now
    }
}

/// Pending unbondings of a (delegator, validator) pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    /// delegator
    pub delegator: Address,
    /// validator operator the tokens were withdrawn from
    pub validator: Address,
    /// entries in creation order
    pub entries: Vec<UnbondingDelegationEntry>,
}

/// Stake moved between validators, the source side matures at `completion_time`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    /// height at which the redelegation started
    pub creation_height: u64,
    /// maturity
    pub completion_time: QuorumTime,
    /// tokens moved at creation
    pub initial_balance: u64,
    /// delegator shares removed from the source validator
    pub shares_src: Dec,
    /// delegator shares issued by the destination validator
    pub shares_dst: Dec,
}

impl RedelegationEntry {
    /// true once `completion_time` is reached
    pub fn is_mature(&self, now: QuorumTime) -> bool {
        self.completion_time <= now
    }
}

/// Pending redelegations of a (delegator, source, destination) triple
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redelegation {
    /// delegator
    pub delegator: Address,
    /// source validator operator
    pub validator_src: Address,
    /// destination validator operator
    pub validator_dst: Address,
    /// entries in creation order
    pub entries: Vec<RedelegationEntry>,
}

/// Serializer for `Delegation`
#[derive(Clone, Default)]
pub struct DelegationSerializer {
    address_serializer: AddressSerializer,
    dec_serializer: DecSerializer,
}

impl DelegationSerializer {
    /// Creates a `DelegationSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            dec_serializer: DecSerializer::new(),
        }
    }
}

impl Serializer<Delegation> for DelegationSerializer {
    fn serialize(&self, value: &Delegation, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.delegator, buffer)?;
        self.address_serializer.serialize(&value.validator, buffer)?;
        self.dec_serializer.serialize(&value.shares, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Delegation`
#[derive(Clone, Default)]
pub struct DelegationDeserializer {
    address_deserializer: AddressDeserializer,
    dec_deserializer: DecDeserializer,
}

impl DelegationDeserializer {
    /// Creates a `DelegationDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            dec_deserializer: DecDeserializer::new(),
        }
    }
}

impl Deserializer<Delegation> for DelegationDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Delegation, E> {
        context(
            "Failed Delegation deserialization",
            tuple((
                context("Failed delegator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed validator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed shares deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(delegator, validator, shares)| Delegation {
            delegator,
            validator,
            shares,
        })
        .parse(buffer)
    }
}

/// Serializer for `UnbondingDelegation`
#[derive(Clone, Default)]
pub struct UnbondingDelegationSerializer {
    address_serializer: AddressSerializer,
    len_serializer: U32VarIntSerializer,
    u64_serializer: U64VarIntSerializer,
    time_serializer: QuorumTimeSerializer,
}

impl UnbondingDelegationSerializer {
    /// Creates an `UnbondingDelegationSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            len_serializer: U32VarIntSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: QuorumTimeSerializer::new(),
        }
    }
}

impl Serializer<UnbondingDelegation> for UnbondingDelegationSerializer {
    fn serialize(
        &self,
        value: &UnbondingDelegation,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.delegator, buffer)?;
        self.address_serializer.serialize(&value.validator, buffer)?;
        let len: u32 = value.entries.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("{} unbonding entries", value.entries.len()))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        for entry in &value.entries {
            self.u64_serializer
                .serialize(&entry.creation_height, buffer)?;
            self.time_serializer
                .serialize(&entry.completion_time, buffer)?;
            self.u64_serializer
                .serialize(&entry.initial_balance, buffer)?;
            self.u64_serializer.serialize(&entry.balance, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `UnbondingDelegation`
#[derive(Clone)]
pub struct UnbondingDelegationDeserializer {
    address_deserializer: AddressDeserializer,
    len_deserializer: U32VarIntDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: QuorumTimeDeserializer,
}

impl UnbondingDelegationDeserializer {
    /// Creates an `UnbondingDelegationDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            len_deserializer: U32VarIntDeserializer::new(Included(1), Included(MAX_ENTRIES_LENGTH)),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: QuorumTimeDeserializer::new((
                Included(QuorumTime::EPOCH),
                Included(QuorumTime::max()),
            )),
        }
    }
}

impl Default for UnbondingDelegationDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<UnbondingDelegation> for UnbondingDelegationDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], UnbondingDelegation, E> {
        context(
            "Failed UnbondingDelegation deserialization",
            tuple((
                context("Failed delegator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed validator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context(
                    "Failed entries deserialization",
                    length_count(
                        context("Failed length deserialization", |input| {
                            self.len_deserializer.deserialize(input)
                        }),
                        tuple((
                            context("Failed creation_height deserialization", |input| {
                                self.u64_deserializer.deserialize(input)
                            }),
                            context("Failed completion_time deserialization", |input| {
                                self.time_deserializer.deserialize(input)
                            }),
                            context("Failed initial_balance deserialization", |input| {
                                self.u64_deserializer.deserialize(input)
                            }),
                            context("Failed balance deserialization", |input| {
                                self.u64_deserializer.deserialize(input)
                            }),
                        ))
                        .map(
                            |(creation_height, completion_time, initial_balance, balance)| {
                                UnbondingDelegationEntry {
                                    creation_height,
                                    completion_time,
                                    initial_balance,
                                    balance,
                                }
                            },
                        ),
                    ),
                ),
            )),
        )
        .map(|(delegator, validator, entries)| UnbondingDelegation {
            delegator,
            validator,
            entries,
        })
        .parse(buffer)
    }
}

/// Serializer for `Redelegation`
#[derive(Clone, Default)]
pub struct RedelegationSerializer {
    address_serializer: AddressSerializer,
    len_serializer: U32VarIntSerializer,
    u64_serializer: U64VarIntSerializer,
    time_serializer: QuorumTimeSerializer,
    dec_serializer: DecSerializer,
}

impl RedelegationSerializer {
    /// Creates a `RedelegationSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            len_serializer: U32VarIntSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: QuorumTimeSerializer::new(),
            dec_serializer: DecSerializer::new(),
        }
    }
}

impl Serializer<Redelegation> for RedelegationSerializer {
    fn serialize(&self, value: &Redelegation, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.delegator, buffer)?;
        self.address_serializer
            .serialize(&value.validator_src, buffer)?;
        self.address_serializer
            .serialize(&value.validator_dst, buffer)?;
        let len: u32 = value.entries.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("{} redelegation entries", value.entries.len()))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        for entry in &value.entries {
            self.u64_serializer
                .serialize(&entry.creation_height, buffer)?;
            self.time_serializer
                .serialize(&entry.completion_time, buffer)?;
            self.u64_serializer
                .serialize(&entry.initial_balance, buffer)?;
            self.dec_serializer.serialize(&entry.shares_src, buffer)?;
            self.dec_serializer.serialize(&entry.shares_dst, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Redelegation`
#[derive(Clone)]
pub struct RedelegationDeserializer {
    address_deserializer: AddressDeserializer,
    len_deserializer: U32VarIntDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: QuorumTimeDeserializer,
    dec_deserializer: DecDeserializer,
}

impl RedelegationDeserializer {
    /// Creates a `RedelegationDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            len_deserializer: U32VarIntDeserializer::new(Included(1), Included(MAX_ENTRIES_LENGTH)),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: QuorumTimeDeserializer::new((
                Included(QuorumTime::EPOCH),
                Included(QuorumTime::max()),
            )),
            dec_deserializer: DecDeserializer::new(),
        }
    }
}

impl Default for RedelegationDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Redelegation> for RedelegationDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Redelegation, E> {
        context(
            "Failed Redelegation deserialization",
            tuple((
                context("Failed delegator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed validator_src deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed validator_dst deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context(
                    "Failed entries deserialization",
                    length_count(
                        context("Failed length deserialization", |input| {
                            self.len_deserializer.deserialize(input)
                        }),
                        tuple((
                            context("Failed creation_height deserialization", |input| {
                                self.u64_deserializer.deserialize(input)
                            }),
                            context("Failed completion_time deserialization", |input| {
                                self.time_deserializer.deserialize(input)
                            }),
                            context("Failed initial_balance deserialization", |input| {
                                self.u64_deserializer.deserialize(input)
                            }),
                            context("Failed shares_src deserialization", |input| {
                                self.dec_deserializer.deserialize(input)
                            }),
                            context("Failed shares_dst deserialization", |input| {
                                self.dec_deserializer.deserialize(input)
                            }),
                        ))
                        .map(
                            |(
                                creation_height,
                                completion_time,
                                initial_balance,
                                shares_src,
                                shares_dst,
                            )| RedelegationEntry {
                                creation_height,
                                completion_time,
                                initial_balance,
                                shares_src,
                                shares_dst,
                            },
                        ),
                    ),
                ),
            )),
        )
        .map(
            |(delegator, validator_src, validator_dst, entries)| Redelegation {
                delegator,
                validator_src,
                validator_dst,
                entries,
            },
        )
        .parse(buffer)
    }
}
