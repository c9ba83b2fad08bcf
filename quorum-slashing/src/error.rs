// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use quorum_models::ModelsError;
use quorum_staking_exports::StakingError;
use thiserror::Error;

/// slashing result
pub type SlashingResult<T, E = SlashingError> = core::result::Result<T, E>;

/// slashing error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum SlashingError {
    /// invalid request: {0}
    InvalidRequest(String),
    /// arithmetic overflow: {0}
    Overflow(String),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /** slashing invariant violated, the state is corrupted and block
    processing must stop: {0} */
    InvariantViolation(String),
}

impl SlashingError {
    /// true if the error reveals a corrupted state rather than an invalid request
    pub fn is_fatal(&self) -> bool {
        matches!(self, SlashingError::InvariantViolation(_))
    }
}

impl From<SlashingError> for StakingError {
    fn from(err: SlashingError) -> Self {
        match err {
            SlashingError::InvariantViolation(msg) => StakingError::InvariantViolation(msg),
            SlashingError::Overflow(msg) => StakingError::Overflow(msg),
            other => StakingError::InvalidRequest(other.to_string()),
        }
    }
}
