// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use quorum_models::ModelsError;
use thiserror::Error;

/// ledger result
pub type LedgerResult<T, E = LedgerError> = core::result::Result<T, E>;

/// ledger error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// insufficient funds: {0}
    InsufficientFunds(String),
    /// invalid request: {0}
    InvalidRequest(String),
    /// supply invariant violated: {0}
    InvariantViolation(String),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
}
