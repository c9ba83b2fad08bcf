// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::constants::{ADDRESS_PREFIX, ADDRESS_SIZE_BYTES};
use crate::error::ModelsError;
use nom::error::{context, ContextError, ParseError};
use nom::{IResult, Parser};
use quorum_hash::{Hash, HashDeserializer, HashSerializer};
use quorum_serialization::{Deserializer, SerializeError, Serializer};
use quorum_signature::PublicKey;
use std::str::FromStr;

/// Derived from a public key. Used both for accounts and, derived from a
/// validator's consensus key, as consensus address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub Hash);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, self.0.to_bs58_check())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Address {
    type Err = ModelsError;

    /// ## Example
    /// ```rust
    /// # use quorum_signature::KeyPair;
    /// # use std::str::FromStr;
    /// # use quorum_models::address::Address;
    /// # let keypair = KeyPair::generate();
    /// # let address = Address::from_public_key(&keypair.get_public_key());
    /// let ser = address.to_string();
    /// let res_addr = Address::from_str(&ser).unwrap();
    /// assert_eq!(address, res_addr);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match chars.next() {
            Some(prefix) if prefix == ADDRESS_PREFIX => {
                Ok(Address(Hash::from_bs58_check(chars.as_str())?))
            }
            Some(prefix) => Err(ModelsError::WrongPrefix(
                ADDRESS_PREFIX.to_string(),
                prefix.to_string(),
            )),
            None => Err(ModelsError::HashError("empty address".into())),
        }
    }
}

impl Address {
    /// Computes address associated with given public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Address(Hash::compute_from(public_key.to_bytes()))
    }

    /// Bytes of the address, used in storage keys
    pub fn to_bytes(&self) -> &[u8; ADDRESS_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Builds an address from its bytes
    pub fn from_bytes(data: &[u8; ADDRESS_SIZE_BYTES]) -> Address {
        Address(Hash::from_bytes(data))
    }
}

impl ::serde::Serialize for Address {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for Address {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let s = <String as ::serde::Deserialize>::deserialize(d)?;
        Address::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

/// Serializer for `Address`
#[derive(Default, Clone)]
pub struct AddressSerializer {
    hash_serializer: HashSerializer,
}

impl AddressSerializer {
    /// Serializes an `Address`
    pub const fn new() -> Self {
        Self {
            hash_serializer: HashSerializer::new(),
        }
    }
}

impl Serializer<Address> for AddressSerializer {
    fn serialize(&self, value: &Address, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.hash_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `Address`
#[derive(Default, Clone)]
pub struct AddressDeserializer {
    hash_deserializer: HashDeserializer,
}

impl AddressDeserializer {
    /// Creates a new deserializer for `Address`
    pub const fn new() -> Self {
        Self {
            hash_deserializer: HashDeserializer::new(),
        }
    }
}

impl Deserializer<Address> for AddressDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Address, E> {
        context("Failed Address deserialization", |input| {
            self.hash_deserializer.deserialize(input)
        })
        .map(Address)
        .parse(buffer)
    }
}
