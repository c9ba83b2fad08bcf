// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Database error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum QuorumDBError {
    /// invalid version: {0}
    InvalidVersion(String),
    /// version {0} is not available anymore
    VersionPruned(u64),
    /// version {0} was never committed
    UnknownVersion(u64),
}
