// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Node settings
//!
//! The settings are merged from, in order of precedence:
//! 1. the environment, variables prefixed with `QUORUM_`, sections separated
//!    by `__` (`QUORUM_EXECUTION__CHAIN_ID`)
//! 2. the override file, if it exists (`config/config.toml` by default)
//! 3. the base file (`base_config/config.toml` by default)
//!
//! Durations are in milliseconds, rates are decimal strings.

use quorum_db_exports::QuorumDBConfig;
use quorum_execution_exports::ExecutionConfig;
use quorum_ledger::LedgerConfig;
use quorum_models::Dec;
use quorum_slashing::SlashingConfig;
use quorum_staking_exports::StakingConfig;
use quorum_time::QuorumTime;
use serde::Deserialize;
use std::path::Path;

/// prefix of the environment overrides
pub const ENV_PREFIX: &str = "QUORUM";

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LoggingSettings {
    pub level: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionSettings {
    pub chain_id: String,
    pub max_tx_size: usize,
    pub max_msgs_per_tx: u32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LedgerSettings {
    pub max_denoms_per_account: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StakingSettings {
    pub bond_denom: String,
    pub unbonding_time: QuorumTime,
    pub max_validators: u32,
    pub max_entries: u32,
    pub power_reduction: u64,
    pub inflation_rate_change: Dec,
    pub inflation_max: Dec,
    pub inflation_min: Dec,
    pub goal_bonded: Dec,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlashingSettings {
    pub signed_blocks_window: u64,
    pub min_signed_per_window: Dec,
    pub downtime_jail_duration: QuorumTime,
    pub double_sign_jail_duration: QuorumTime,
    pub slash_fraction_double_sign: Dec,
    pub slash_fraction_downtime: Dec,
    pub max_evidence_age: QuorumTime,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DBSettings {
    pub max_history_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub execution: ExecutionSettings,
    pub ledger: LedgerSettings,
    pub staking: StakingSettings,
    pub slashing: SlashingSettings,
    pub db: DBSettings,
}

/// Merges the base file, the override file when it exists, and the environment
pub fn build_settings(
    base_path: &Path,
    override_path: &Path,
    env_prefix: &str,
) -> anyhow::Result<Settings> {
    let mut builder = config::Config::builder().add_source(config::File::from(base_path));
    if override_path.is_file() {
        builder = builder.add_source(config::File::from(override_path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(settings.try_deserialize()?)
}

impl Settings {
    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            chain_id: self.execution.chain_id.clone(),
            max_tx_size: self.execution.max_tx_size,
            max_msgs_per_tx: self.execution.max_msgs_per_tx,
        }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            max_denoms_per_account: self.ledger.max_denoms_per_account,
        }
    }

    pub fn staking_config(&self) -> StakingConfig {
        let staking = &self.staking;
        StakingConfig {
            bond_denom: staking.bond_denom.clone(),
            unbonding_time: staking.unbonding_time,
            max_validators: staking.max_validators,
            max_entries: staking.max_entries,
            power_reduction: staking.power_reduction,
            inflation_rate_change: staking.inflation_rate_change,
            inflation_max: staking.inflation_max,
            inflation_min: staking.inflation_min,
            goal_bonded: staking.goal_bonded,
        }
    }

    pub fn slashing_config(&self) -> SlashingConfig {
        let slashing = &self.slashing;
        SlashingConfig {
            signed_blocks_window: slashing.signed_blocks_window,
            min_signed_per_window: slashing.min_signed_per_window,
            downtime_jail_duration: slashing.downtime_jail_duration,
            double_sign_jail_duration: slashing.double_sign_jail_duration,
            slash_fraction_double_sign: slashing.slash_fraction_double_sign,
            slash_fraction_downtime: slashing.slash_fraction_downtime,
            max_evidence_age: slashing.max_evidence_age,
        }
    }

    pub fn db_config(&self) -> QuorumDBConfig {
        QuorumDBConfig {
            max_history_length: self.db.max_history_length,
        }
    }
}
