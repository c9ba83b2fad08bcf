// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Signature error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum QuorumSignatureError {
    /// parsing error: {0}
    ParsingError(String),

    /// ed25519 engine error: {0}
    EngineError(#[from] ed25519_dalek::SignatureError),

    /// Wrong prefix: expected {0}, got {1}
    WrongPrefix(String, String),

    /// invalid signature: {0}
    SignatureError(String),
}
