// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use quorum_ledger::LedgerError;
use quorum_models::ModelsError;
use thiserror::Error;

/// staking result
pub type StakingResult<T, E = StakingError> = core::result::Result<T, E>;

/// staking error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum StakingError {
    /// invalid request: {0}
    InvalidRequest(String),
    /// too many unbonding or redelegation entries: {0}
    MaxEntriesExceeded(String),
    /// cannot redelegate to the same validator
    SelfRedelegation,
    /// arithmetic overflow: {0}
    Overflow(String),
    /// ledger error: {0}
    LedgerError(#[from] LedgerError),
    /** staking invariant violated, the state is corrupted and block
    processing must stop: {0} */
    InvariantViolation(String),
}

impl StakingError {
    /// true if the error reveals a corrupted state rather than an invalid request
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StakingError::InvariantViolation(_)
                | StakingError::LedgerError(LedgerError::InvariantViolation(_))
        )
    }
}

impl From<ModelsError> for StakingError {
    fn from(err: ModelsError) -> Self {
        match err {
            ModelsError::Overflow(msg) => StakingError::Overflow(msg),
            // shares and rates are never divided by zero on a consistent state
            ModelsError::DivisionByZero(msg) => StakingError::InvariantViolation(msg),
            other => StakingError::InvalidRequest(other.to_string()),
        }
    }
}
