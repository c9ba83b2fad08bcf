// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Execution worker `test_exports`

use crate::start_application;
use parking_lot::RwLock;
use quorum_db_exports::{QuorumDBConfig, QuorumDBController};
use quorum_db_worker::QuorumDB;
use quorum_execution_exports::{
    ApplicationController, BeginBlockRequest, ExecutionConfig, GenesisAccount, GenesisState,
    GenesisValidator,
};
use quorum_ledger::LedgerConfig;
use quorum_models::{Address, BlockHeader, Coin, Coins};
use quorum_signature::KeyPair;
use quorum_slashing::SlashingConfig;
use quorum_staking_exports::StakingConfig;
use quorum_time::QuorumTime;
use std::sync::Arc;

/// Genesis time of the test chains
pub const TEST_GENESIS_TIME: QuorumTime = QuorumTime::from_secs(1_600_000_000);

/// An account controlled by the tests
pub struct TestAccount {
    /// signing key
    pub keypair: KeyPair,
    /// account address
    pub address: Address,
}

impl TestAccount {
    /// Account with a random key
    pub fn random() -> Self {
        let keypair = KeyPair::generate();
        let address = Address::from_public_key(&keypair.get_public_key());
        TestAccount { keypair, address }
    }
}

/// In-memory database keeping `max_history_length` versions
pub fn new_test_db(max_history_length: usize) -> Arc<RwLock<Box<dyn QuorumDBController>>> {
    Arc::new(RwLock::new(Box::new(QuorumDB::new(QuorumDBConfig {
        max_history_length,
    })) as Box<dyn QuorumDBController>))
}

/// Application over a fresh in-memory database with the given module parameters
pub fn start_test_application(
    staking_config: StakingConfig,
    slashing_config: SlashingConfig,
) -> (
    Box<dyn ApplicationController>,
    Arc<RwLock<Box<dyn QuorumDBController>>>,
) {
    let db = new_test_db(16);
    let app = start_application(
        ExecutionConfig::default(),
        LedgerConfig::default(),
        staking_config,
        slashing_config,
        db.clone(),
    )
    .expect("application start failed");
    (app, db)
}

/// Genesis funding each account with `funds` of `denom`, where each validator
/// operator self-bonds `self_bond` with a fresh consensus key.
/// Returns the genesis and the consensus key pairs in validator order.
pub fn funded_genesis(
    denom: &str,
    accounts: &[&TestAccount],
    funds: u64,
    operators: &[&TestAccount],
    self_bond: u64,
) -> (GenesisState, Vec<KeyPair>) {
    let mut consensus_keys = Vec::with_capacity(operators.len());
    let validators = operators
        .iter()
        .map(|operator| {
            let consensus = KeyPair::generate();
            let validator = GenesisValidator {
                operator: operator.address,
                consensus_pubkey: consensus.get_public_key(),
                self_bond: Coin::new(denom, self_bond),
            };
            consensus_keys.push(consensus);
            validator
        })
        .collect();
    let genesis = GenesisState {
        genesis_time: TEST_GENESIS_TIME,
        accounts: accounts
            .iter()
            .map(|account| GenesisAccount {
                address: account.address,
                coins: Coins::single(denom, funds).expect("invalid coins"),
            })
            .collect(),
        validators,
    };
    (genesis, consensus_keys)
}

/// Request starting block `height` of the test chain, `secs_per_block` seconds after the previous one
pub fn begin_block_request(height: u64, secs_per_block: u64) -> BeginBlockRequest {
    BeginBlockRequest {
        header: BlockHeader {
            chain_id: ExecutionConfig::default().chain_id,
            height,
            time: TEST_GENESIS_TIME
                .saturating_add(QuorumTime::from_secs(height.saturating_mul(secs_per_block))),
        },
        votes: Vec::new(),
        evidence: Vec::new(),
    }
}
