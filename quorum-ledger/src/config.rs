// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This file defines a configuration structure containing all settings for the account store

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// max number of distinct denominations an account can hold
    pub max_denoms_per_account: usize,
}
