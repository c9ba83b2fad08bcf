// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Messages understood by the handlers of the bank, staking and slashing modules

use crate::transaction::Msg;
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quorum_models::{
    Address, AddressDeserializer, AddressSerializer, Coin, CoinDeserializer, CoinSerializer, Coins,
    CoinsDeserializer, CoinsSerializer, Dec, DecDeserializer, DecSerializer,
};
use quorum_serialization::{Deserializer, SerializeError, Serializer};
use quorum_signature::{PublicKey, PublicKeyDeserializer, PublicKeySerializer};

/// module moving coins between accounts
pub const BANK_MODULE: &str = "bank";
/// module managing validators and delegations
pub const STAKING_MODULE: &str = "staking";
/// module managing jailed validators
pub const SLASHING_MODULE: &str = "slashing";

/// `bank/send`
pub const ROUTE_SEND: &str = "bank/send";
/// `staking/create_validator`
pub const ROUTE_CREATE_VALIDATOR: &str = "staking/create_validator";
/// `staking/delegate`
pub const ROUTE_DELEGATE: &str = "staking/delegate";
/// `staking/undelegate`
pub const ROUTE_UNDELEGATE: &str = "staking/undelegate";
/// `staking/begin_redelegate`
pub const ROUTE_BEGIN_REDELEGATE: &str = "staking/begin_redelegate";
/// `slashing/unjail`
pub const ROUTE_UNJAIL: &str = "slashing/unjail";

/// Transfer of `amount` from `from` to `to`, signed by `from`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgSend {
    /// sender
    pub from: Address,
    /// recipient
    pub to: Address,
    /// transferred coins
    pub amount: Coins,
}

/// Registration of a validator with its self bond, signed by the operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgCreateValidator {
    /// operator address
    pub operator: Address,
    /// key used by the consensus engine
    pub consensus_pubkey: PublicKey,
    /// initial self delegation
    pub self_bond: Coin,
}

/// Delegation of `amount` to `validator`, signed by the delegator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgDelegate {
    /// delegator
    pub delegator: Address,
    /// validator operator
    pub validator: Address,
    /// delegated coin
    pub amount: Coin,
}

/// Undelegation of `shares` from `validator`, signed by the delegator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgUndelegate {
    /// delegator
    pub delegator: Address,
    /// validator operator
    pub validator: Address,
    /// delegator shares to undelegate
    pub shares: Dec,
}

/// Move of `shares` from `validator_src` to `validator_dst`, signed by the delegator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgBeginRedelegate {
    /// delegator
    pub delegator: Address,
    /// source validator operator
    pub validator_src: Address,
    /// destination validator operator
    pub validator_dst: Address,
    /// delegator shares of the source validator
    pub shares: Dec,
}

/// Request to leave jail, signed by the operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgUnjail {
    /// validator operator
    pub validator: Address,
}

/// Any message, with its route
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// `bank/send`
    Send(MsgSend),
    /// `staking/create_validator`
    CreateValidator(MsgCreateValidator),
    /// `staking/delegate`
    Delegate(MsgDelegate),
    /// `staking/undelegate`
    Undelegate(MsgUndelegate),
    /// `staking/begin_redelegate`
    BeginRedelegate(MsgBeginRedelegate),
    /// `slashing/unjail`
    Unjail(MsgUnjail),
}

impl Message {
    /// handler route of the message
    pub fn route(&self) -> &'static str {
        match self {
            Message::Send(_) => ROUTE_SEND,
            Message::CreateValidator(_) => ROUTE_CREATE_VALIDATOR,
            Message::Delegate(_) => ROUTE_DELEGATE,
            Message::Undelegate(_) => ROUTE_UNDELEGATE,
            Message::BeginRedelegate(_) => ROUTE_BEGIN_REDELEGATE,
            Message::Unjail(_) => ROUTE_UNJAIL,
        }
    }

    /// address that must sign the message
    pub fn signer(&self) -> Address {
        match self {
            Message::Send(msg) => msg.from,
            Message::CreateValidator(msg) => msg.operator,
            Message::Delegate(msg) => msg.delegator,
            Message::Undelegate(msg) => msg.delegator,
            Message::BeginRedelegate(msg) => msg.delegator,
            Message::Unjail(msg) => msg.validator,
        }
    }

    /// Encodes the message for a transaction
    pub fn to_msg(&self) -> Result<Msg, SerializeError> {
        let mut payload = Vec::new();
        match self {
            Message::Send(msg) => MsgSendSerializer::new().serialize(msg, &mut payload)?,
            Message::CreateValidator(msg) => {
                MsgCreateValidatorSerializer::new().serialize(msg, &mut payload)?
            }
            Message::Delegate(msg) => MsgDelegateSerializer::new().serialize(msg, &mut payload)?,
            Message::Undelegate(msg) => {
                MsgUndelegateSerializer::new().serialize(msg, &mut payload)?
            }
            Message::BeginRedelegate(msg) => {
                MsgBeginRedelegateSerializer::new().serialize(msg, &mut payload)?
            }
            Message::Unjail(msg) => MsgUnjailSerializer::new().serialize(msg, &mut payload)?,
        }
        Ok(Msg {
            route: self.route().to_string(),
            payload,
        })
    }
}

/// Serializer for `MsgSend`
#[derive(Clone, Default)]
pub struct MsgSendSerializer {
    address_serializer: AddressSerializer,
    coins_serializer: CoinsSerializer,
}

impl MsgSendSerializer {
    /// Creates a `MsgSendSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            coins_serializer: CoinsSerializer::new(),
        }
    }
}

impl Serializer<MsgSend> for MsgSendSerializer {
    fn serialize(&self, value: &MsgSend, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.from, buffer)?;
        self.address_serializer.serialize(&value.to, buffer)?;
        self.coins_serializer.serialize(&value.amount, buffer)
    }
}

/// Deserializer for `MsgSend`
#[derive(Clone, Default)]
pub struct MsgSendDeserializer {
    address_deserializer: AddressDeserializer,
    coins_deserializer: CoinsDeserializer,
}

impl MsgSendDeserializer {
    /// Creates a `MsgSendDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            coins_deserializer: CoinsDeserializer::new(),
        }
    }
}

impl Deserializer<MsgSend> for MsgSendDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MsgSend, E> {
        context(
            "Failed MsgSend deserialization",
            tuple((
                context("Failed from deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed to deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed amount deserialization", |input| {
                    self.coins_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(from, to, amount)| MsgSend { from, to, amount })
        .parse(buffer)
    }
}

/// Serializer for `MsgCreateValidator`
#[derive(Clone, Default)]
pub struct MsgCreateValidatorSerializer {
    address_serializer: AddressSerializer,
    public_key_serializer: PublicKeySerializer,
    coin_serializer: CoinSerializer,
}

impl MsgCreateValidatorSerializer {
    /// Creates a `MsgCreateValidatorSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            public_key_serializer: PublicKeySerializer::new(),
            coin_serializer: CoinSerializer::new(),
        }
    }
}

impl Serializer<MsgCreateValidator> for MsgCreateValidatorSerializer {
    fn serialize(
        &self,
        value: &MsgCreateValidator,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.operator, buffer)?;
        self.public_key_serializer
            .serialize(&value.consensus_pubkey, buffer)?;
        self.coin_serializer.serialize(&value.self_bond, buffer)
    }
}

/// Deserializer for `MsgCreateValidator`
#[derive(Clone, Default)]
pub struct MsgCreateValidatorDeserializer {
    address_deserializer: AddressDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
    coin_deserializer: CoinDeserializer,
}

impl MsgCreateValidatorDeserializer {
    /// Creates a `MsgCreateValidatorDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            public_key_deserializer: PublicKeyDeserializer::new(),
            coin_deserializer: CoinDeserializer::new(),
        }
    }
}

impl Deserializer<MsgCreateValidator> for MsgCreateValidatorDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MsgCreateValidator, E> {
        context(
            "Failed MsgCreateValidator deserialization",
            tuple((
                context("Failed operator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed consensus_pubkey deserialization", |input| {
                    self.public_key_deserializer.deserialize(input)
                }),
                context("Failed self_bond deserialization", |input| {
                    self.coin_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(operator, consensus_pubkey, self_bond)| MsgCreateValidator {
                operator,
                consensus_pubkey,
                self_bond,
            },
        )
        .parse(buffer)
    }
}

/// Serializer for `MsgDelegate`
#[derive(Clone, Default)]
pub struct MsgDelegateSerializer {
    address_serializer: AddressSerializer,
    coin_serializer: CoinSerializer,
}

impl MsgDelegateSerializer {
    /// Creates a `MsgDelegateSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            coin_serializer: CoinSerializer::new(),
        }
    }
}

impl Serializer<MsgDelegate> for MsgDelegateSerializer {
    fn serialize(&self, value: &MsgDelegate, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.delegator, buffer)?;
        self.address_serializer.serialize(&value.validator, buffer)?;
        self.coin_serializer.serialize(&value.amount, buffer)
    }
}

/// Deserializer for `MsgDelegate`
#[derive(Clone, Default)]
pub struct MsgDelegateDeserializer {
    address_deserializer: AddressDeserializer,
    coin_deserializer: CoinDeserializer,
}

impl MsgDelegateDeserializer {
    /// Creates a `MsgDelegateDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            coin_deserializer: CoinDeserializer::new(),
        }
    }
}

impl Deserializer<MsgDelegate> for MsgDelegateDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MsgDelegate, E> {
        context(
            "Failed MsgDelegate deserialization",
            tuple((
                context("Failed delegator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed validator deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed amount deserialization", |input| {
                    self.coin_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(delegator, validator, amount)| MsgDelegate {
            delegator,
            validator,
            amount,
        })
        .parse(buffer)
    }
}

/// Serializer for `MsgUndelegate`
#[derive(Clone, Default)]
pub struct MsgUndelegateSerializer {
    address_serializer: AddressSerializer,
    dec_serializer: DecSerializer,
}

impl MsgUndelegateSerializer {
    /// Creates a `MsgUndelegateSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            dec_serializer: DecSerializer::new(),
        }
    }
}

impl Serializer<MsgUndelegate> for MsgUndelegateSerializer {
    fn serialize(&self, value: &MsgUndelegate, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.delegator, buffer)?;
        self.address_serializer.serialize(&value.validator, buffer)?;
        self.dec_serializer.serialize(&value.shares, buffer)
    }
}

/// Deserializer for `MsgUndelegate`
#[derive(Clone, Default)]
pub struct MsgUndelegateDeserializer {
    address_deserializer: AddressDeserializer,
    dec_deserializer: DecDeserializer,
}

impl MsgUndelegateDeserializer {
    /// Creates a `MsgUndelegateDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            dec_deserializer: DecDeserializer::new(),
        }
    }
}

impl Deserializer<MsgUndelegate> for MsgUndelegateDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MsgUndelegate, E> {
        context(
            "Failed MsgUndelegate deserialization",
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
        .map(|(delegator, validator, shares)| MsgUndelegate {
            delegator,
            validator,
            shares,
        })
        .parse(buffer)
    }
}

/// Serializer for `MsgBeginRedelegate`
#[derive(Clone, Default)]
pub struct MsgBeginRedelegateSerializer {
    address_serializer: AddressSerializer,
    dec_serializer: DecSerializer,
}

impl MsgBeginRedelegateSerializer {
    /// Creates a `MsgBeginRedelegateSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            dec_serializer: DecSerializer::new(),
        }
    }
}

impl Serializer<MsgBeginRedelegate> for MsgBeginRedelegateSerializer {
    fn serialize(
        &self,
        value: &MsgBeginRedelegate,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.delegator, buffer)?;
        self.address_serializer
            .serialize(&value.validator_src, buffer)?;
        self.address_serializer
            .serialize(&value.validator_dst, buffer)?;
        self.dec_serializer.serialize(&value.shares, buffer)
    }
}

/// Deserializer for `MsgBeginRedelegate`
#[derive(Clone, Default)]
pub struct MsgBeginRedelegateDeserializer {
    address_deserializer: AddressDeserializer,
    dec_deserializer: DecDeserializer,
}

impl MsgBeginRedelegateDeserializer {
    /// Creates a `MsgBeginRedelegateDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            dec_deserializer: DecDeserializer::new(),
        }
    }
}

impl Deserializer<MsgBeginRedelegate> for MsgBeginRedelegateDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MsgBeginRedelegate, E> {
        context(
            "Failed MsgBeginRedelegate deserialization",
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
                context("Failed shares deserialization", |input| {
                    self.dec_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(delegator, validator_src, validator_dst, shares)| MsgBeginRedelegate {
                delegator,
                validator_src,
                validator_dst,
                shares,
            },
        )
        .parse(buffer)
    }
}

/// Serializer for `MsgUnjail`
#[derive(Clone, Default)]
pub struct MsgUnjailSerializer {
    address_serializer: AddressSerializer,
}

impl MsgUnjailSerializer {
    /// Creates a `MsgUnjailSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
        }
    }
}

impl Serializer<MsgUnjail> for MsgUnjailSerializer {
    fn serialize(&self, value: &MsgUnjail, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.validator, buffer)
    }
}

/// Deserializer for `MsgUnjail`
#[derive(Clone, Default)]
pub struct MsgUnjailDeserializer {
    address_deserializer: AddressDeserializer,
}

impl MsgUnjailDeserializer {
    /// Creates a `MsgUnjailDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
        }
    }
}

impl Deserializer<MsgUnjail> for MsgUnjailDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MsgUnjail, E> {
        context("Failed MsgUnjail deserialization", |input| {
            self.address_deserializer.deserialize(input)
        })
        .map(|validator| MsgUnjail { validator })
        .parse(buffer)
    }
}
