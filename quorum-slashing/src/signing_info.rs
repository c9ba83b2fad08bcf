// Copyright (c) 2022 MASSA LABS <info@massa.net>

use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quorum_models::{Address, AddressDeserializer, AddressSerializer, Dec, DecDeserializer, DecSerializer};
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use quorum_time::{QuorumTime, QuorumTimeDeserializer, QuorumTimeSerializer};
use std::ops::Bound::Included;

/// Liveness record of a validator, created when it is bonded for the first time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorSigningInfo {
    /// height at which the validator was first bonded
    pub start_height: u64,
    /// number of blocks recorded since the window was last reset, the window index is `index_offset % window`
    pub index_offset: u64,
    /// the validator cannot be unjailed before this time
    pub jailed_until: QuorumTime,
    /// number of signed blocks in the window
    pub signed_blocks_counter: u64,
}

impl ValidatorSigningInfo {
    /// Fresh record for a validator bonded at `height`
    pub fn new(height: u64) -> Self {
        ValidatorSigningInfo {
            start_height: height,
            index_offset: 0,
            jailed_until: QuorumTime::EPOCH,
            signed_blocks_counter: 0,
        }
    }
}

/// Serializer for `ValidatorSigningInfo`
#[derive(Clone, Default)]
pub struct ValidatorSigningInfoSerializer {
    u64_serializer: U64VarIntSerializer,
    time_serializer: QuorumTimeSerializer,
}

impl ValidatorSigningInfoSerializer {
    /// Creates a `ValidatorSigningInfoSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
            time_serializer: QuorumTimeSerializer::new(),
        }
    }
}

impl Serializer<ValidatorSigningInfo> for ValidatorSigningInfoSerializer {
    fn serialize(
        &self,
        value: &ValidatorSigningInfo,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.start_height, buffer)?;
        self.u64_serializer.serialize(&value.index_offset, buffer)?;
        self.time_serializer.serialize(&value.jailed_until, buffer)?;
        self.u64_serializer
            .serialize(&value.signed_blocks_counter, buffer)?;
        Ok(())
    }
}

/// Deserializer for `ValidatorSigningInfo`
#[derive(Clone)]
pub struct ValidatorSigningInfoDeserializer {
    u64_deserializer: U64VarIntDeserializer,
    time_deserializer: QuorumTimeDeserializer,
}

impl ValidatorSigningInfoDeserializer {
    /// Creates a `ValidatorSigningInfoDeserializer`
    pub const fn new() -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            time_deserializer: QuorumTimeDeserializer::new((
                Included(QuorumTime::EPOCH),
                Included(QuorumTime::max()),
            )),
        }
    }
}

impl Default for ValidatorSigningInfoDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<ValidatorSigningInfo> for ValidatorSigningInfoDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], ValidatorSigningInfo, E> {
        context(
            "Failed ValidatorSigningInfo deserialization",
            tuple((
                context("Failed start_height deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed index_offset deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed jailed_until deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                context("Failed signed_blocks_counter deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(start_height, index_offset, jailed_until, signed_blocks_counter)| {
                ValidatorSigningInfo {
                    start_height,
                    index_offset,
                    jailed_until,
                    signed_blocks_counter,
                }
            },
        )
        .parse(buffer)
    }
}

/// Interval during which a validator was bonded. Infractions committed in a
/// period are slashed at most once, at the highest fraction reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorSlashingPeriod {
    /// consensus address of the validator
    pub validator: Address,
    /// height at which the validator was bonded
    pub start_height: u64,
    /// height at which the validator started unbonding, 0 while open
    pub end_height: u64,
    /// fraction of the stake already slashed for infractions of this period
    pub slashed_so_far: Dec,
}

impl ValidatorSlashingPeriod {
    /// Open period starting at `start_height`
    pub fn new(validator: Address, start_height: u64) -> Self {
        ValidatorSlashingPeriod {
            validator,
            start_height,
            end_height: 0,
            slashed_so_far: Dec::zero(),
        }
    }
}

/// Serializer for `ValidatorSlashingPeriod`
#[derive(Clone, Default)]
pub struct ValidatorSlashingPeriodSerializer {
    address_serializer: AddressSerializer,
    u64_serializer: U64VarIntSerializer,
    dec_serializer: DecSerializer,
}

impl ValidatorSlashingPeriodSerializer {
    /// Creates a `ValidatorSlashingPeriodSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            dec_serializer: DecSerializer::new(),
        }
    }
}

impl Serializer<ValidatorSlashingPeriod> for ValidatorSlashingPeriodSerializer {
    fn serialize(
        &self,
        value: &ValidatorSlashingPeriod,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.validator, buffer)?;
        self.u64_serializer.serialize(&value.start_height, buffer)?;
        self.u64_serializer.serialize(&value.end_height, buffer)?;
        self.dec_serializer.serialize(&value.slashed_so_far, buffer)?;
        Ok(())
    }
}

/// Deserializer for `ValidatorSlashingPeriod`
#[derive(Clone)]
pub struct ValidatorSlashingPeriodDeserializer {
    address_deserializer: AddressDeserializer,
    u64_deserializer: U64VarIntDeserializer,
    dec_deserializer: DecDeserializer,
}

impl ValidatorSlashingPeriodDeserializer {
    /// Creates a `ValidatorSlashingPeriodDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            dec_deserializer: DecDeserializer::new(),
        }
    }
}

impl Default for ValidatorSlashingPeriodDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<ValidatorSlashingPeriod> for ValidatorSlashingPeriodDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], ValidatorSlashingPeriod, E> {
        context(
            "Failed ValidatorSlashingPeriod deserialization",
            tuple((
                context("Failed validator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed start_height deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed end_height deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed slashed_so_far deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(validator, start_height, end_height, slashed_so_far)| ValidatorSlashingPeriod {
                validator,
                start_height,
                end_height,
                slashed_so_far,
            },
        )
        .parse(buffer)
    }
}
