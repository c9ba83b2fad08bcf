// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Slashing module `test_exports`

use crate::SlashingConfig;
use quorum_models::Dec;
use quorum_time::QuorumTime;
use std::str::FromStr;

impl Default for SlashingConfig {
    fn default() -> Self {
        SlashingConfig {
            signed_blocks_window: 100,
            min_signed_per_window: Dec::from_str("0.5").expect("invalid decimal"),
            downtime_jail_duration: QuorumTime::from_secs(600),
            double_sign_jail_duration: QuorumTime::from_secs(5 * 7 * 24 * 3600),
            slash_fraction_double_sign: Dec::from_str("0.05").expect("invalid decimal"),
            slash_fraction_downtime: Dec::from_str("0.01").expect("invalid decimal"),
            max_evidence_age: QuorumTime::from_secs(3 * 7 * 24 * 3600),
        }
    }
}

/// A short window so that tests reach the downtime threshold quickly
pub fn short_window_config(window: u64) -> SlashingConfig {
    SlashingConfig {
        signed_blocks_window: window,
        ..Default::default()
    }
}
