// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Signature management

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]
mod error;
mod signature_impl;

#[cfg(test)]
mod tests;

pub use error::QuorumSignatureError;
pub use signature_impl::{
    KeyPair, PublicKey, PublicKeyDeserializer, PublicKeySerializer, Signature,
    SignatureDeserializer, SignatureSerializer, PUBLIC_KEY_SIZE_BYTES, SECRET_KEY_SIZE_BYTES,
    SIGNATURE_SIZE_BYTES,
};
