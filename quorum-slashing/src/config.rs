// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This file defines a configuration structure containing all settings for the slashing system

use quorum_models::Dec;
use quorum_time::QuorumTime;

/// Slashing configuration
#[derive(Debug, Clone)]
pub struct SlashingConfig {
    /// number of blocks over which liveness is measured
    pub signed_blocks_window: u64,
    /// min fraction of the window a validator must sign
    pub min_signed_per_window: Dec,
    /// jail duration after downtime
    pub downtime_jail_duration: QuorumTime,
    /// jail duration after a double sign
    pub double_sign_jail_duration: QuorumTime,
    /// fraction of the stake slashed on double sign
    pub slash_fraction_double_sign: Dec,
    /// fraction of the stake slashed on downtime
    pub slash_fraction_downtime: Dec,
    /// evidence older than this is ignored
    pub max_evidence_age: QuorumTime,
}
