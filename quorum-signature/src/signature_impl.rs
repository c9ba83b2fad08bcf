// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::QuorumSignatureError;
use ed25519_dalek::{Signer, Verifier};
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use quorum_hash::Hash;
use quorum_serialization::{Deserializer, SerializeError, Serializer};
use std::{convert::TryInto, str::FromStr};

/// Size of a public key
pub const PUBLIC_KEY_SIZE_BYTES: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// Size of a secret key
pub const SECRET_KEY_SIZE_BYTES: usize = ed25519_dalek::SECRET_KEY_LENGTH;
/// Size of a signature
pub const SIGNATURE_SIZE_BYTES: usize = ed25519_dalek::SIGNATURE_LENGTH;
const SECRET_PREFIX: char = 'S';
const PUBLIC_PREFIX: char = 'P';

fn split_prefix(s: &str, expected: char) -> Result<&str, QuorumSignatureError> {
    let mut chars = s.chars();
    match chars.next() {
        Some(prefix) if prefix == expected => Ok(chars.as_str()),
        Some(prefix) => Err(QuorumSignatureError::WrongPrefix(
            expected.to_string(),
            prefix.to_string(),
        )),
        None => Err(QuorumSignatureError::ParsingError("empty string".into())),
    }
}

fn decode_bs58_check<const N: usize>(data: &str) -> Result<[u8; N], QuorumSignatureError> {
    let decoded = bs58::decode(data)
        .with_check(None)
        .into_vec()
        .map_err(|err| QuorumSignatureError::ParsingError(err.to_string()))?;
    decoded.as_slice().try_into().map_err(|_| {
        QuorumSignatureError::ParsingError(format!(
            "expected {} bytes, got {}",
            N,
            decoded.len()
        ))
    })
}

/// `KeyPair` is used to sign transactions
#[derive(Clone)]
pub struct KeyPair(ed25519_dalek::SigningKey);

impl std::fmt::Display for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", SECRET_PREFIX, self.to_bs58_check())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "KeyPair({})", self.get_public_key())
    }
}

impl FromStr for KeyPair {
    type Err = QuorumSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPair::from_bs58_check(split_prefix(s, SECRET_PREFIX)?)
    }
}

impl KeyPair {
    /// Generate a new `KeyPair`
    ///
    /// # Example
    ///  ```
    /// # use quorum_signature::KeyPair;
    /// # use quorum_hash::Hash;
    /// let keypair = KeyPair::generate();
    /// let data = Hash::compute_from("Hello World!".as_bytes());
    /// let signature = keypair.sign(&data);
    /// assert!(keypair.get_public_key().verify_signature(&data, &signature).is_ok());
    /// ```
    pub fn generate() -> KeyPair {
        let mut rng = rand::rngs::OsRng;
        KeyPair(ed25519_dalek::SigningKey::generate(&mut rng))
    }

    /// Returns the Signature produced by signing a hash with the secret key.
    pub fn sign(&self, hash: &Hash) -> Signature {
        Signature(self.0.sign(hash.to_bytes()))
    }

    /// Return the bytes of the secret key
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Build a keypair from the bytes of its secret key
    pub fn from_bytes(data: &[u8; SECRET_KEY_SIZE_BYTES]) -> Self {
        KeyPair(ed25519_dalek::SigningKey::from_bytes(data))
    }

    /// Get the public key of the keypair
    pub fn get_public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Encode the secret key using `bs58` with checksum
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Decode a secret key encoded with `bs58` with checksum
    pub fn from_bs58_check(data: &str) -> Result<Self, QuorumSignatureError> {
        Ok(KeyPair::from_bytes(&decode_bs58_check(data)?))
    }
}

impl ::serde::Serialize for KeyPair {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for KeyPair {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<KeyPair, D::Error> {
        let s = <String as ::serde::Deserialize>::deserialize(d)?;
        KeyPair::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

/// Public key used to check if a signature is valid and to derive addresses
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(ed25519_dalek::VerifyingKey);

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_bytes().hash(state);
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", PUBLIC_PREFIX, self.to_bs58_check())
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for PublicKey {
    type Err = QuorumSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::from_bs58_check(split_prefix(s, PUBLIC_PREFIX)?)
    }
}

impl PublicKey {
    /// Checks if the `Signature` associated with data bytes
    /// was produced with the `KeyPair` associated to given `PublicKey`
    pub fn verify_signature(
        &self,
        hash: &Hash,
        signature: &Signature,
    ) -> Result<(), QuorumSignatureError> {
        self.0
            .verify(hash.to_bytes(), &signature.0)
            .map_err(|err| QuorumSignatureError::SignatureError(err.to_string()))
    }

    /// Encode the public key using `bs58` with checksum
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Return the bytes representing the public key
    pub fn to_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE_BYTES] {
        self.0.as_bytes()
    }

    /// Decode a public key encoded with `bs58` with checksum
    pub fn from_bs58_check(data: &str) -> Result<PublicKey, QuorumSignatureError> {
        PublicKey::from_bytes(&decode_bs58_check(data)?)
    }

    /// Build a public key from bytes, rejecting points that are not on the curve
    pub fn from_bytes(
        data: &[u8; PUBLIC_KEY_SIZE_BYTES],
    ) -> Result<PublicKey, QuorumSignatureError> {
        Ok(PublicKey(ed25519_dalek::VerifyingKey::from_bytes(data)?))
    }
}

impl ::serde::Serialize for PublicKey {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> ::serde::Deserialize<'de> for PublicKey {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<PublicKey, D::Error> {
        let s = <String as ::serde::Deserialize>::deserialize(d)?;
        PublicKey::from_str(&s).map_err(::serde::de::Error::custom)
    }
}

/// Signature generated from a hash and a `KeyPair`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Signature {
    type Err = QuorumSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::from_bs58_check(s)
    }
}

impl Signature {
    /// Encode the signature using `bs58` with checksum
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Return the bytes of the signature
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Decode a signature encoded with `bs58` with checksum
    pub fn from_bs58_check(data: &str) -> Result<Signature, QuorumSignatureError> {
        Ok(Signature::from_bytes(&decode_bs58_check(data)?))
    }

    /// Build a signature from raw bytes; validity is only checked at verification time
    pub fn from_bytes(data: &[u8; SIGNATURE_SIZE_BYTES]) -> Signature {
        Signature(ed25519_dalek::Signature::from_bytes(data))
    }
}

/// Serializer for `PublicKey`
#[derive(Default, Clone)]
pub struct PublicKeySerializer;

impl PublicKeySerializer {
    /// Creates a `PublicKeySerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<PublicKey> for PublicKeySerializer {
    fn serialize(&self, value: &PublicKey, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `PublicKey`
#[derive(Default, Clone)]
pub struct PublicKeyDeserializer;

impl PublicKeyDeserializer {
    /// Creates a `PublicKeyDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<PublicKey> for PublicKeyDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], PublicKey, E> {
        context("Failed public key deserialization", |input: &'a [u8]| {
            // Can't use try into directly because it fails if there is more data in the buffer
            if input.len() < PUBLIC_KEY_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let bytes: &[u8; PUBLIC_KEY_SIZE_BYTES] = input[..PUBLIC_KEY_SIZE_BYTES]
                .try_into()
                .map_err(|_| {
                    nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::LengthValue,
                    ))
                })?;
            let key = PublicKey::from_bytes(bytes).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Fail,
                ))
            })?;
            Ok((&input[PUBLIC_KEY_SIZE_BYTES..], key))
        })(buffer)
    }
}

/// Serializer for `Signature`
#[derive(Default, Clone)]
pub struct SignatureSerializer;

impl SignatureSerializer {
    /// Creates a `SignatureSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Signature> for SignatureSerializer {
    fn serialize(&self, value: &Signature, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend_from_slice(&value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `Signature`
#[derive(Default, Clone)]
pub struct SignatureDeserializer;

impl SignatureDeserializer {
    /// Creates a `SignatureDeserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Signature> for SignatureDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Signature, E> {
        context("Failed signature deserialization", |input: &'a [u8]| {
            if input.len() < SIGNATURE_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let bytes: &[u8; SIGNATURE_SIZE_BYTES] = input[..SIGNATURE_SIZE_BYTES]
                .try_into()
                .map_err(|_| {
                    nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::LengthValue,
                    ))
                })?;
            Ok((&input[SIGNATURE_SIZE_BYTES..], Signature::from_bytes(bytes)))
        })(buffer)
    }
}
