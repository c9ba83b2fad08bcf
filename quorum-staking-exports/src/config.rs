// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This file defines a configuration structure containing all settings for the staking system

use quorum_models::Dec;
use quorum_time::QuorumTime;

/// Staking configuration
#[derive(Debug, Clone)]
pub struct StakingConfig {
    /// denomination that can be bonded
    pub bond_denom: String,
    /// time between the start and the completion of an unbonding
    pub unbonding_time: QuorumTime,
    /// max number of bonded validators
    pub max_validators: u32,
    /// max number of pending entries per unbonding delegation or redelegation
    pub max_entries: u32,
    /// number of tokens for one unit of consensus power
    pub power_reduction: u64,
    /// max yearly change of the inflation rate
    pub inflation_rate_change: Dec,
    /// max inflation rate
    pub inflation_max: Dec,
    /// min inflation rate
    pub inflation_min: Dec,
    /// target ratio of bonded tokens over supply
    pub goal_bonded: Dec,
}
