// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Hash error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum QuorumHashError {
    /// parsing error: {0}
    ParsingError(String),
    /// Wrong prefix for hash: expected {0}, got {1}
    WrongPrefix(String, String),
}
