// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Wire format of transactions.
//!
//! A signer signs the hash of the encoded `Transaction` followed by its
//! account number and sequence, so that a signature is only valid on one
//! chain, for one account, once.

use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use quorum_hash::Hash;
use quorum_models::{Coins, CoinsDeserializer, CoinsSerializer};
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, StringDeserializer, StringSerializer,
    U32VarIntDeserializer, U32VarIntSerializer, U64VarIntDeserializer, U64VarIntSerializer,
    VecU8Deserializer, VecU8Serializer,
};
use quorum_signature::{
    KeyPair, PublicKey, PublicKeyDeserializer, PublicKeySerializer, Signature,
    SignatureDeserializer, SignatureSerializer,
};
use std::ops::Bound::Included;

/// Max number of messages accepted by the decoder
pub const MAX_MSGS_LENGTH: u32 = 256;
/// Max number of signatures accepted by the decoder
pub const MAX_SIGNATURES_LENGTH: u32 = 64;
/// Max length of a memo, in bytes
pub const MAX_MEMO_LENGTH: u64 = 256;
/// Max length of a route, in bytes
pub const MAX_ROUTE_LENGTH: u64 = 64;
/// Max length of a chain identifier, in bytes
pub const MAX_CHAIN_ID_LENGTH: u64 = 64;
/// Max length of a message payload, in bytes
pub const MAX_PAYLOAD_LENGTH: u64 = 1 << 20;

/// A message addressed to a handler: `route` is `<module>/<type>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Msg {
    /// handler route
    pub route: String,
    /// encoded message, decoded by the handler
    pub payload: Vec<u8>,
}

impl Msg {
    /// Module and type parts of the route. A route without `/` has an empty type.
    pub fn module_and_type(&self) -> (&str, &str) {
        self.route.split_once('/').unwrap_or((&self.route, ""))
    }
}

/// Signed content of a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// chain the transaction is valid on
    pub chain_id: String,
    /// fee paid by the first signer
    pub fee: Coins,
    /// free text
    pub memo: String,
    /// messages, executed in order
    pub msgs: Vec<Msg>,
}

/// Signature of a transaction by one account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// key of the signer, its address is the signing account
    pub public_key: PublicKey,
    /// signature of `compute_sign_hash`
    pub signature: Signature,
    /// account number of the signer
    pub account_number: u64,
    /// sequence of the signer
    pub sequence: u64,
}

/// A transaction and its signatures, as carried in blocks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// signed content
    pub transaction: Transaction,
    /// one signature per signer, the first signer pays the fee
    pub signatures: Vec<TxSignature>,
}

/// Hash signed by the account `account_number` at `sequence`
pub fn compute_sign_hash(
    transaction: &Transaction,
    account_number: u64,
    sequence: u64,
) -> Result<Hash, SerializeError> {
    let mut bytes = Vec::new();
    TransactionSerializer::new().serialize(transaction, &mut bytes)?;
    let u64_serializer = U64VarIntSerializer::new();
    u64_serializer.serialize(&account_number, &mut bytes)?;
    u64_serializer.serialize(&sequence, &mut bytes)?;
    Ok(Hash::compute_from(&bytes))
}

impl SignedTransaction {
    /// Signs `transaction` with each key pair, given with the account number and sequence of its account
    pub fn new_signed(
        transaction: Transaction,
        signers: &[(&KeyPair, u64, u64)],
    ) -> Result<Self, SerializeError> {
        let signatures = signers
            .iter()
            .map(|(keypair, account_number, sequence)| {
                let hash = compute_sign_hash(&transaction, *account_number, *sequence)?;
                Ok(TxSignature {
                    public_key: keypair.get_public_key(),
                    signature: keypair.sign(&hash),
                    account_number: *account_number,
                    sequence: *sequence,
                })
            })
            .collect::<Result<Vec<_>, SerializeError>>()?;
        Ok(SignedTransaction {
            transaction,
            signatures,
        })
    }

    /// Wire bytes of the transaction
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let mut bytes = Vec::new();
        SignedTransactionSerializer::new().serialize(self, &mut bytes)?;
        Ok(bytes)
    }
}

/// Serializer for `Transaction`
#[derive(Clone, Default)]
pub struct TransactionSerializer {
    string_serializer: StringSerializer,
    coins_serializer: CoinsSerializer,
    len_serializer: U32VarIntSerializer,
    bytes_serializer: VecU8Serializer,
}

impl TransactionSerializer {
    /// Creates a `TransactionSerializer`
    pub const fn new() -> Self {
        Self {
            string_serializer: StringSerializer::new(),
            coins_serializer: CoinsSerializer::new(),
            len_serializer: U32VarIntSerializer::new(),
            bytes_serializer: VecU8Serializer::new(),
        }
    }
}

impl Serializer<Transaction> for TransactionSerializer {
    fn serialize(&self, value: &Transaction, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.string_serializer.serialize(&value.chain_id, buffer)?;
        self.coins_serializer.serialize(&value.fee, buffer)?;
        self.string_serializer.serialize(&value.memo, buffer)?;
        let len: u32 = value.msgs.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("{} messages", value.msgs.len()))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        for msg in &value.msgs {
            self.string_serializer.serialize(&msg.route, buffer)?;
            self.bytes_serializer.serialize(&msg.payload, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Transaction`
#[derive(Clone)]
pub struct TransactionDeserializer {
    chain_id_deserializer: StringDeserializer,
    coins_deserializer: CoinsDeserializer,
    memo_deserializer: StringDeserializer,
    len_deserializer: U32VarIntDeserializer,
    route_deserializer: StringDeserializer,
    payload_deserializer: VecU8Deserializer,
}

impl TransactionDeserializer {
    /// Creates a `TransactionDeserializer`
    pub const fn new() -> Self {
        Self {
            chain_id_deserializer: StringDeserializer::new(
                Included(0),
                Included(MAX_CHAIN_ID_LENGTH),
            ),
            coins_deserializer: CoinsDeserializer::new(),
            memo_deserializer: StringDeserializer::new(Included(0), Included(MAX_MEMO_LENGTH)),
            len_deserializer: U32VarIntDeserializer::new(Included(0), Included(MAX_MSGS_LENGTH)),
            route_deserializer: StringDeserializer::new(Included(1), Included(MAX_ROUTE_LENGTH)),
            payload_deserializer: VecU8Deserializer::new(
                Included(0),
                Included(MAX_PAYLOAD_LENGTH),
            ),
        }
    }
}

impl Default for TransactionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Transaction> for TransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Transaction, E> {
        context(
            "Failed Transaction deserialization",
            tuple((
                context("Failed chain_id deserialization", |input| {
                    self.chain_id_deserializer.deserialize(input)
                }),
                context("Failed fee deserialization", |input| {
                    self.coins_deserializer.deserialize(input)
                }),
                context("Failed memo deserialization", |input| {
                    self.memo_deserializer.deserialize(input)
                }),
                context(
                    "Failed msgs deserialization",
                    length_count(
                        context("Failed length deserialization", |input| {
                            self.len_deserializer.deserialize(input)
                        }),
                        tuple((
                            context("Failed route deserialization", |input| {
                                self.route_deserializer.deserialize(input)
                            }),
                            context("Failed payload deserialization", |input| {
                                self.payload_deserializer.deserialize(input)
                            }),
                        ))
                        .map(|(route, payload)| Msg { route, payload }),
                    ),
                ),
            )),
        )
        .map(|(chain_id, fee, memo, msgs)| Transaction {
            chain_id,
            fee,
            memo,
            msgs,
        })
        .parse(buffer)
    }
}

/// Serializer for `SignedTransaction`
#[derive(Clone, Default)]
pub struct SignedTransactionSerializer {
    transaction_serializer: TransactionSerializer,
    len_serializer: U32VarIntSerializer,
    public_key_serializer: PublicKeySerializer,
    signature_serializer: SignatureSerializer,
    u64_serializer: U64VarIntSerializer,
}

impl SignedTransactionSerializer {
    /// Creates a `SignedTransactionSerializer`
    pub const fn new() -> Self {
        Self {
            transaction_serializer: TransactionSerializer::new(),
            len_serializer: U32VarIntSerializer::new(),
            public_key_serializer: PublicKeySerializer::new(),
            signature_serializer: SignatureSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Serializer<SignedTransaction> for SignedTransactionSerializer {
    fn serialize(
        &self,
        value: &SignedTransaction,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.transaction_serializer
            .serialize(&value.transaction, buffer)?;
        let len: u32 = value.signatures.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("{} signatures", value.signatures.len()))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        for signature in &value.signatures {
            self.public_key_serializer
                .serialize(&signature.public_key, buffer)?;
            self.signature_serializer
                .serialize(&signature.signature, buffer)?;
            self.u64_serializer
                .serialize(&signature.account_number, buffer)?;
            self.u64_serializer.serialize(&signature.sequence, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `SignedTransaction`
#[derive(Clone)]
pub struct SignedTransactionDeserializer {
    transaction_deserializer: TransactionDeserializer,
    len_deserializer: U32VarIntDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
    signature_deserializer: SignatureDeserializer,
    u64_deserializer: U64VarIntDeserializer,
}

impl SignedTransactionDeserializer {
    /// Creates a `SignedTransactionDeserializer`
    pub const fn new() -> Self {
        Self {
            transaction_deserializer: TransactionDeserializer::new(),
            len_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_SIGNATURES_LENGTH),
            ),
            public_key_deserializer: PublicKeyDeserializer::new(),
            signature_deserializer: SignatureDeserializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
        }
    }
}

impl Default for SignedTransactionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<SignedTransaction> for SignedTransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], SignedTransaction, E> {
        context(
            "Failed SignedTransaction deserialization",
            tuple((
                context("Failed transaction deserialization", |input| {
                    self.transaction_deserializer.deserialize(input)
                }),
                context(
                    "Failed signatures deserialization",
                    length_count(
                        context("Failed length deserialization", |input| {
                            self.len_deserializer.deserialize(input)
                        }),
                        tuple((
                            context("Failed public_key deserialization", |input| {
                                self.public_key_deserializer.deserialize(input)
                            }),
                            context("Failed signature deserialization", |input| {
                                self.signature_deserializer.deserialize(input)
                            }),
                            context("Failed account_number deserialization", |input| {
                                self.u64_deserializer.deserialize(input)
                            }),
                            context("Failed sequence deserialization", |input| {
                                self.u64_deserializer.deserialize(input)
                            }),
                        ))
                        .map(|(public_key, signature, account_number, sequence)| {
                            TxSignature {
                                public_key,
                                signature,
                                account_number,
                                sequence,
                            }
                        }),
                    ),
                ),
            )),
        )
        .map(|(transaction, signatures)| SignedTransaction {
            transaction,
            signatures,
        })
        .parse(buffer)
    }
}
