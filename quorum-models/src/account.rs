// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::address::{Address, AddressDeserializer, AddressSerializer};
use crate::coin::{Coins, CoinsDeserializer, CoinsSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Funds and replay-protection counters of an address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// owner
    pub address: Address,
    /// balances, always valid (positive, sorted, unique)
    pub coins: Coins,
    /// number of transactions authenticated for this account
    pub sequence: u64,
    /// assigned once at creation
    pub account_number: u64,
}

/// Serializer for `Account`
#[derive(Default, Clone)]
pub struct AccountSerializer {
    address_serializer: AddressSerializer,
    coins_serializer: CoinsSerializer,
    u64_serializer: U64VarIntSerializer,
}

impl AccountSerializer {
    /// Creates an `AccountSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            coins_serializer: CoinsSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<Account> for AccountSerializer {
    fn serialize(&self, value: &Account, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.address, buffer)?;
        self.coins_serializer.serialize(&value.coins, buffer)?;
        self.u64_serializer.serialize(&value.sequence, buffer)?;
        self.u64_serializer.serialize(&value.account_number, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Account`
#[derive(Clone)]
pub struct AccountDeserializer {
    address_deserializer: AddressDeserializer,
    coins_deserializer: CoinsDeserializer,
    u64_deserializer: U64VarIntDeserializer,
}

impl AccountDeserializer {
    /// Creates an `AccountDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            coins_deserializer: CoinsDeserializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
        }
    }
}

impl Default for AccountDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Account> for AccountDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Account, E> {
        context(
            "Failed Account deserialization",
            tuple((
                context("Failed address deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed coins deserialization", |input| {
                    self.coins_deserializer.deserialize(input)
                }),
                context("Failed sequence deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed account_number deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(address, coins, sequence, account_number)| Account {
            address,
            coins,
            sequence,
            account_number,
        })
        .parse(buffer)
    }
}
