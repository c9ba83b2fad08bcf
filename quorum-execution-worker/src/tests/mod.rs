// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::test_exports::{begin_block_request, start_test_application, TestAccount};
use parking_lot::RwLock;
use quorum_db_exports::QuorumDBController;
use quorum_execution_exports::{
    test_exports::signed_tx_bytes, ApplicationController, CommitResponse, Evidence,
    ExecutionConfig, GenesisState, Message, TxResponse, VoteInfo,
};
use quorum_models::{Account, Address, Coins, Int};
use quorum_slashing::SlashingConfig;
use quorum_staking_exports::{StakingConfig, ValidatorUpdate};
use quorum_staking_worker::test_exports::{assert_conservation, default_keeper};
use std::sync::Arc;

mod blocks;
mod slashing;

pub(crate) const DENOM: &str = "stake";

/// Outcome of one block
pub(crate) struct BlockOutcome {
    pub responses: Vec<TxResponse>,
    pub updates: Vec<ValidatorUpdate>,
    pub commit: CommitResponse,
}

/// A chain driven block by block, one second of block time per block unless told otherwise
pub(crate) struct TestChain {
    pub app: Box<dyn ApplicationController>,
    pub db: Arc<RwLock<Box<dyn QuorumDBController>>>,
    pub genesis_updates: Vec<ValidatorUpdate>,
    pub height: u64,
    pub elapsed_secs: u64,
}

impl TestChain {
    pub fn start(genesis: GenesisState) -> Self {
        Self::start_with(genesis, StakingConfig::default(), SlashingConfig::default())
    }

    pub fn start_with(
        genesis: GenesisState,
        staking_config: StakingConfig,
        slashing_config: SlashingConfig,
    ) -> Self {
        let (app, db) = start_test_application(staking_config, slashing_config);
        let genesis_updates = app.init_chain(genesis).expect("genesis failed");
        TestChain {
            app,
            db,
            genesis_updates,
            height: 0,
            elapsed_secs: 0,
        }
    }

    /// Applies and commits the next block, `secs` seconds after the previous one
    pub fn block_after(
        &mut self,
        secs: u64,
        votes: Vec<VoteInfo>,
        evidence: Vec<Evidence>,
        txs: &[Vec<u8>],
    ) -> BlockOutcome {
        self.height += 1;
        self.elapsed_secs += secs;
        let mut request = begin_block_request(self.height, 0);
        request.header.time = request
            .header
            .time
            .saturating_add(quorum_time::QuorumTime::from_secs(self.elapsed_secs));
        request.votes = votes;
        request.evidence = evidence;
        self.app.begin_block(request).expect("begin_block failed");
        let responses = txs
            .iter()
            .map(|tx| self.app.deliver_tx(tx).expect("deliver_tx failed"))
            .collect();
        let updates = self.app.end_block().expect("end_block failed");
        let commit = self.app.commit().expect("commit failed");
        assert_eq!(commit.version, self.height);
        BlockOutcome {
            responses,
            updates,
            commit,
        }
    }

    /// Applies and commits the next block with the given transactions
    pub fn block(&mut self, txs: &[Vec<u8>]) -> BlockOutcome {
        self.block_after(1, Vec::new(), Vec::new(), txs)
    }

    pub fn account(&self, address: &Address) -> Account {
        self.app
            .query_account(address, None)
            .expect("query failed")
            .expect("unknown account")
    }

    pub fn balance(&self, address: &Address) -> Int {
        self.app
            .query_account(address, None)
            .expect("query failed")
            .map(|account| account.coins.amount_of(DENOM))
            .unwrap_or_default()
    }

    /// Transaction of `signer` at its committed sequence plus `offset`
    pub fn sign(&self, signer: &TestAccount, fee: u64, messages: &[Message], offset: u64) -> Vec<u8> {
        let account = self.account(&signer.address);
        signed_tx_bytes(
            &ExecutionConfig::default().chain_id,
            fee_coins(fee),
            messages,
            &[(
                &signer.keypair,
                account.account_number,
                account.sequence + offset,
            )],
        )
    }

    /// Checks the conservation of tokens and the staking invariants on the last committed state
    pub fn assert_consistent(&self) {
        let snapshot = self.db.read().get_snapshot(None).expect("no snapshot");
        assert_conservation(&default_keeper(), snapshot.as_ref());
    }
}

pub(crate) fn fee_coins(fee: u64) -> Coins {
    if fee == 0 {
        return Coins::empty();
    }
    Coins::single(DENOM, fee).expect("invalid fee")
}

pub(crate) fn coins(amount: u64) -> Coins {
    Coins::single(DENOM, amount).expect("invalid coins")
}

pub(crate) fn tag_value<'a>(response: &'a TxResponse, key: &str) -> Option<&'a str> {
    response
        .tags
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
