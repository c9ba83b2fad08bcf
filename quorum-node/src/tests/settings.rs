// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::settings::build_settings;
use quorum_models::Dec;
use quorum_time::QuorumTime;
use serial_test::serial;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

const BASE_CONFIG: &str = "base_config/config.toml";
const TEST_PREFIX: &str = "QUORUM_SETTINGS_TEST";

#[test]
#[serial]
fn base_config_converts_to_module_configs() {
    let settings = build_settings(
        Path::new(BASE_CONFIG),
        Path::new("does/not/exist.toml"),
        TEST_PREFIX,
    )
    .expect("invalid base config");

    let execution = settings.execution_config();
    assert_eq!(execution.chain_id, "quorum-local");
    assert_eq!(execution.max_tx_size, 65536);
    assert_eq!(execution.max_msgs_per_tx, 16);
    assert_eq!(settings.ledger_config().max_denoms_per_account, 16);

    let staking = settings.staking_config();
    assert_eq!(staking.bond_denom, "stake");
    assert_eq!(
        staking.unbonding_time,
        QuorumTime::from_secs(3 * 7 * 24 * 3600)
    );
    assert_eq!(staking.power_reduction, 1_000_000);
    assert_eq!(staking.goal_bonded, Dec::from_str("0.67").unwrap());

    let slashing = settings.slashing_config();
    assert_eq!(slashing.signed_blocks_window, 100);
    assert_eq!(slashing.min_signed_per_window, Dec::from_str("0.5").unwrap());
    assert_eq!(slashing.downtime_jail_duration, QuorumTime::from_secs(600));
    assert_eq!(settings.db_config().max_history_length, 100);
}

#[test]
#[serial]
fn override_file_replaces_given_keys_only() {
    let mut override_file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("could not create temp file");
    writeln!(
        override_file,
        "[execution]\nchain_id = \"quorum-test\"\n\n[slashing]\nsigned_blocks_window = 20"
    )
    .unwrap();

    let settings = build_settings(Path::new(BASE_CONFIG), override_file.path(), TEST_PREFIX)
        .expect("invalid settings");
    assert_eq!(settings.execution.chain_id, "quorum-test");
    assert_eq!(settings.execution.max_tx_size, 65536);
    assert_eq!(settings.slashing.signed_blocks_window, 20);
    assert_eq!(
        settings.slashing.slash_fraction_downtime,
        Dec::from_str("0.01").unwrap()
    );
}

#[test]
#[serial]
fn environment_overrides_files() {
    let chain_key = format!("{}_EXECUTION__CHAIN_ID", TEST_PREFIX);
    let window_key = format!("{}_SLASHING__SIGNED_BLOCKS_WINDOW", TEST_PREFIX);
    std::env::set_var(&chain_key, "quorum-env");
    std::env::set_var(&window_key, "42");

    let settings = build_settings(
        Path::new(BASE_CONFIG),
        Path::new("does/not/exist.toml"),
        TEST_PREFIX,
    );
    std::env::remove_var(&chain_key);
    std::env::remove_var(&window_key);

    let settings = settings.expect("invalid settings");
    assert_eq!(settings.execution.chain_id, "quorum-env");
    assert_eq!(settings.slashing.signed_blocks_window, 42);
}

#[test]
#[serial]
fn missing_section_is_an_error() {
    let mut base = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("could not create temp file");
    writeln!(base, "[logging]\nlevel = 2").unwrap();
    assert!(build_settings(base.path(), Path::new("does/not/exist.toml"), TEST_PREFIX).is_err());
}
