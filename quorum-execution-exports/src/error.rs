// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! this file defines all possible execution error categories

use displaydoc::Display;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use quorum_db_exports::QuorumDBError;
use quorum_ledger::LedgerError;
use quorum_models::{Address, ModelsError};
use quorum_slashing::SlashingError;
use quorum_staking_exports::StakingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// execution result
pub type ExecutionResult<T, E = ExecutionError> = core::result::Result<T, E>;

/// Outcome kinds reported to the consensus engine. The codes are stable.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u32)]
pub enum ErrorKind {
    /// success
    Ok = 0,
    /// invariant violation or other internal failure
    InternalError = 1,
    /// malformed wire bytes
    DecodingError = 2,
    /// bad signature, unknown signer or signer not allowed to act
    Unauthorized = 4,
    /// no signature
    MissingSignature = 5,
    /// replayed or out of order transaction
    InvalidSequence = 6,
    /// no handler for the message type
    UnknownTxType = 7,
    /// no handler for the module
    UnknownModule = 8,
    /// oversized transaction
    TooLarge = 9,
    /// unbonding or redelegation queue full
    MaxEntriesExceeded = 10,
    /// redelegation to the source validator
    SelfRedelegation = 11,
    /// arithmetic bound exceeded
    Overflow = 12,
    /// balance too low
    InsufficientFunds = 13,
    /// semantically invalid message
    InvalidRequest = 14,
}

impl ErrorKind {
    /// numeric code of the kind
    pub fn code(self) -> u32 {
        self.into()
    }
}

/// Errors of the execution pipeline
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// decoding error: {0}
    DecodingError(String),
    /// unauthorized: {0}
    Unauthorized(String),
    /// the transaction carries no signature
    MissingSignature,
    /// invalid sequence for {address}: expected {expected}, got {got}
    InvalidSequence {
        /// signer
        address: Address,
        /// sequence of the account
        expected: u64,
        /// sequence signed
        got: u64,
    },
    /// unknown message type: {0}
    UnknownTxType(String),
    /// unknown module: {0}
    UnknownModule(String),
    /// too large: {0}
    TooLarge(String),
    /// invalid request: {0}
    InvalidRequest(String),
    /// ledger error: {0}
    LedgerError(#[from] LedgerError),
    /// staking error: {0}
    StakingError(#[from] StakingError),
    /// slashing error: {0}
    SlashingError(#[from] SlashingError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// database error: {0}
    DBError(#[from] QuorumDBError),
    /// internal error: {0}
    InternalError(String),
}

fn models_kind(err: &ModelsError) -> ErrorKind {
    match err {
        ModelsError::Overflow(_) => ErrorKind::Overflow,
        ModelsError::DeserializeError(_) => ErrorKind::DecodingError,
        ModelsError::InvalidCoins(_)
        | ModelsError::InvalidDenom(_)
        | ModelsError::AmountParseError(_)
        | ModelsError::WrongPrefix(_, _) => ErrorKind::InvalidRequest,
        _ => ErrorKind::InternalError,
    }
}

fn ledger_kind(err: &LedgerError) -> ErrorKind {
    match err {
        LedgerError::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
        LedgerError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        LedgerError::ModelsError(err) => models_kind(err),
        _ => ErrorKind::InternalError,
    }
}

impl ExecutionError {
    /// kind of the error, as reported to the consensus engine
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::DecodingError(_) => ErrorKind::DecodingError,
            ExecutionError::Unauthorized(_) => ErrorKind::Unauthorized,
            ExecutionError::MissingSignature => ErrorKind::MissingSignature,
            ExecutionError::InvalidSequence { .. } => ErrorKind::InvalidSequence,
            ExecutionError::UnknownTxType(_) => ErrorKind::UnknownTxType,
            ExecutionError::UnknownModule(_) => ErrorKind::UnknownModule,
            ExecutionError::TooLarge(_) => ErrorKind::TooLarge,
            ExecutionError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ExecutionError::LedgerError(err) => ledger_kind(err),
            ExecutionError::StakingError(err) => match err {
                StakingError::InvalidRequest(_) => ErrorKind::InvalidRequest,
                StakingError::MaxEntriesExceeded(_) => ErrorKind::MaxEntriesExceeded,
                StakingError::SelfRedelegation => ErrorKind::SelfRedelegation,
                StakingError::Overflow(_) => ErrorKind::Overflow,
                StakingError::LedgerError(err) => ledger_kind(err),
                _ => ErrorKind::InternalError,
            },
            ExecutionError::SlashingError(err) => match err {
                SlashingError::InvalidRequest(_) => ErrorKind::InvalidRequest,
                SlashingError::Overflow(_) => ErrorKind::Overflow,
                SlashingError::ModelsError(err) => models_kind(err),
                _ => ErrorKind::InternalError,
            },
            ExecutionError::ModelsError(err) => models_kind(err),
            ExecutionError::DBError(_) | ExecutionError::InternalError(_) => {
                ErrorKind::InternalError
            }
        }
    }

    /// numeric code of the error, never 0
    pub fn code(&self) -> u32 {
        self.kind().code()
    }

    /// true if the state can no longer be trusted and block processing must stop
    pub fn is_fatal(&self) -> bool {
        match self {
            ExecutionError::StakingError(err) => err.is_fatal(),
            ExecutionError::SlashingError(err) => err.is_fatal(),
            ExecutionError::LedgerError(LedgerError::InvariantViolation(_)) => true,
            ExecutionError::DBError(_) | ExecutionError::InternalError(_) => true,
            _ => false,
        }
    }
}
