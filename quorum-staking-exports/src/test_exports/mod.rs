// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Staking module `test_exports`

use crate::{StakingConfig, Validator};
use quorum_models::{Address, Dec};
use quorum_signature::KeyPair;
use quorum_time::QuorumTime;
use std::str::FromStr;

impl Default for StakingConfig {
    fn default() -> Self {
        StakingConfig {
            bond_denom: "stake".to_string(),
            unbonding_time: QuorumTime::from_secs(3 * 24 * 3600),
            max_validators: 100,
            max_entries: 7,
            power_reduction: 1,
            inflation_rate_change: Dec::from_str("0.13").expect("invalid decimal"),
            inflation_max: Dec::from_str("0.2").expect("invalid decimal"),
            inflation_min: Dec::from_str("0.07").expect("invalid decimal"),
            goal_bonded: Dec::from_str("0.67").expect("invalid decimal"),
        }
    }
}

/// A validator with a random consensus key and operator address
pub fn random_validator() -> Validator {
    let operator = Address::from_public_key(&KeyPair::generate().get_public_key());
    Validator::new(operator, KeyPair::generate().get_public_key())
}
