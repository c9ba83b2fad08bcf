// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Result alias of the models crate
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// Models error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelsError {
    /// arithmetic overflow: {0}
    Overflow(String),
    /// division by zero: {0}
    DivisionByZero(String),
    /// invalid coins: {0}
    InvalidCoins(String),
    /// invalid denomination: {0}
    InvalidDenom(String),
    /// amount parse error: {0}
    AmountParseError(String),
    /// Serialization error: {0}
    SerializeError(String),
    /// Deserialization error: {0}
    DeserializeError(String),
    /// hash error: {0}
    HashError(String),
    /// Wrong prefix: expected {0}, got {1}
    WrongPrefix(String, String),
}

impl From<quorum_hash::QuorumHashError> for ModelsError {
    fn from(err: quorum_hash::QuorumHashError) -> Self {
        ModelsError::HashError(err.to_string())
    }
}

impl From<quorum_serialization::SerializeError> for ModelsError {
    fn from(err: quorum_serialization::SerializeError) -> Self {
        ModelsError::SerializeError(err.to_string())
    }
}
