// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{TestChain, DENOM};
use crate::test_exports::{funded_genesis, TestAccount, TEST_GENESIS_TIME};
use quorum_execution_exports::{ErrorKind, Evidence, Message, MsgUnjail, VoteInfo};
use quorum_models::{Address, Coin};
use quorum_signature::KeyPair;
use quorum_slashing::test_exports::short_window_config;
use quorum_staking_exports::{StakingConfig, ValidatorStatus};
use quorum_time::QuorumTime;

const WINDOW: u64 = 10;

/// alice bonds 100 and dave 300, bob only holds funds
struct Validators {
    chain: TestChain,
    alice: TestAccount,
    bob: TestAccount,
    dave: TestAccount,
    alice_consensus: KeyPair,
    dave_consensus: KeyPair,
}

fn start_validators() -> Validators {
    let alice = TestAccount::random();
    let bob = TestAccount::random();
    let dave = TestAccount::random();
    let (mut genesis, mut consensus_keys) = funded_genesis(
        DENOM,
        &[&alice, &bob, &dave],
        1000,
        &[&alice, &dave],
        100,
    );
    genesis.validators[1].self_bond = Coin::new(DENOM, 300u64);
    let chain = TestChain::start_with(
        genesis,
        StakingConfig::default(),
        short_window_config(WINDOW),
    );
    let dave_consensus = consensus_keys.remove(1);
    let alice_consensus = consensus_keys.remove(0);
    Validators {
        chain,
        alice,
        bob,
        dave,
        alice_consensus,
        dave_consensus,
    }
}

fn consensus_address(keypair: &KeyPair) -> Address {
    Address::from_public_key(&keypair.get_public_key())
}

fn vote(keypair: &KeyPair, power: u64, signed: bool) -> VoteInfo {
    VoteInfo {
        consensus_address: consensus_address(keypair),
        power,
        signed,
    }
}

fn unjail(operator: &TestAccount) -> Message {
    Message::Unjail(MsgUnjail {
        validator: operator.address,
    })
}

#[test]
fn downtime_slashes_jails_and_unjails_after_the_jail_period() {
    let Validators {
        mut chain,
        alice,
        bob,
        alice_consensus,
        dave_consensus,
        ..
    } = start_validators();

    let votes = || {
        vec![
            vote(&alice_consensus, 100, false),
            vote(&dave_consensus, 300, true),
        ]
    };
    for _ in 0..WINDOW {
        let outcome = chain.block_after(1, votes(), Vec::new(), &[]);
        assert!(outcome.updates.is_empty());
    }
    let alice_validator = chain
        .app
        .query_validator(&alice.address, None)
        .expect("query failed")
        .expect("unknown validator");
    assert!(!alice_validator.jailed);

    // the window is complete, alice signed none of it
    let outcome = chain.block_after(1, votes(), Vec::new(), &[]);
    assert_eq!(outcome.updates.len(), 1);
    assert_eq!(
        outcome.updates[0].consensus_pubkey,
        alice_consensus.get_public_key()
    );
    assert_eq!(outcome.updates[0].power, 0);
    let alice_validator = chain
        .app
        .query_validator(&alice.address, None)
        .expect("query failed")
        .expect("unknown validator");
    assert!(alice_validator.jailed);
    assert_eq!(alice_validator.status, ValidatorStatus::Unbonding);
    let pool = chain.app.query_pool(None).expect("query failed");
    assert_eq!(pool.total_tokens().expect("overflow"), 399);
    chain.assert_consistent();

    let dave_votes = || vec![vote(&dave_consensus, 300, true)];
    let early = chain.sign(&alice, 0, &[unjail(&alice)], 0);
    let not_a_validator = chain.sign(&bob, 0, &[unjail(&bob)], 0);
    let outcome = chain.block_after(1, dave_votes(), Vec::new(), &[early, not_a_validator]);
    assert_eq!(
        outcome.responses[0].code,
        ErrorKind::InvalidRequest.code()
    );
    assert_eq!(
        outcome.responses[1].code,
        ErrorKind::InvalidRequest.code()
    );

    let jail_secs = short_window_config(WINDOW).downtime_jail_duration.to_millis() / 1000;
    let tx = chain.sign(&alice, 0, &[unjail(&alice)], 0);
    let outcome = chain.block_after(jail_secs, dave_votes(), Vec::new(), &[tx]);
    assert!(outcome.responses[0].is_ok(), "{}", outcome.responses[0].log);
    assert_eq!(outcome.updates.len(), 1);
    assert_eq!(
        outcome.updates[0].consensus_pubkey,
        alice_consensus.get_public_key()
    );
    assert_eq!(outcome.updates[0].power, 99);

    // the jail reset the window, a full window of signatures passes judgement
    for _ in 0..=WINDOW {
        let outcome = chain.block_after(
            1,
            vec![
                vote(&alice_consensus, 99, true),
                vote(&dave_consensus, 300, true),
            ],
            Vec::new(),
            &[],
        );
        assert!(outcome.updates.is_empty());
    }
    chain.assert_consistent();
}

#[test]
fn double_sign_is_slashed_once_per_period() {
    let Validators {
        mut chain,
        alice,
        dave,
        dave_consensus,
        ..
    } = start_validators();
    chain.block(&[]);
    chain.block(&[]);

    let evidence = Evidence {
        consensus_address: consensus_address(&dave_consensus),
        height: 2,
        time: TEST_GENESIS_TIME.saturating_add(QuorumTime::from_secs(2)),
        power: 300,
    };
    let outcome = chain.block_after(1, Vec::new(), vec![evidence.clone()], &[]);
    assert_eq!(outcome.updates.len(), 1);
    assert_eq!(
        outcome.updates[0].consensus_pubkey,
        dave_consensus.get_public_key()
    );
    assert_eq!(outcome.updates[0].power, 0);
    let pool = chain.app.query_pool(None).expect("query failed");
    assert_eq!(pool.total_tokens().expect("overflow"), 385);
    let dave_validator = chain
        .app
        .query_validator(&dave.address, None)
        .expect("query failed")
        .expect("unknown validator");
    assert!(dave_validator.jailed);
    let alice_validator = chain
        .app
        .query_validator(&alice.address, None)
        .expect("query failed")
        .expect("unknown validator");
    assert!(!alice_validator.jailed);
    chain.assert_consistent();

    // the same period was already slashed at the full fraction
    let outcome = chain.block_after(1, Vec::new(), vec![evidence], &[]);
    assert!(outcome.updates.is_empty());
    let pool = chain.app.query_pool(None).expect("query failed");
    assert_eq!(pool.total_tokens().expect("overflow"), 385);
    chain.assert_consistent();
}

#[test]
fn invalid_evidence_and_votes_are_skipped() {
    let Validators {
        mut chain,
        alice_consensus,
        dave_consensus,
        ..
    } = start_validators();

    let future = Evidence {
        consensus_address: consensus_address(&dave_consensus),
        height: 50,
        time: TEST_GENESIS_TIME,
        power: 300,
    };
    let stranger = KeyPair::generate();
    let outcome = chain.block_after(
        1,
        vec![
            vote(&stranger, 10, false),
            vote(&alice_consensus, 100, true),
        ],
        vec![future],
        &[],
    );
    assert_eq!(outcome.commit.version, 1);
    assert!(outcome.updates.is_empty());
    let pool = chain.app.query_pool(None).expect("query failed");
    assert_eq!(pool.total_tokens().expect("overflow"), 400);
    chain.assert_consistent();
}

#[test]
fn stale_evidence_is_ignored() {
    let Validators {
        mut chain,
        dave,
        dave_consensus,
        ..
    } = start_validators();
    chain.block(&[]);

    let max_age_secs = short_window_config(WINDOW).max_evidence_age.to_millis() / 1000;
    let evidence = Evidence {
        consensus_address: consensus_address(&dave_consensus),
        height: 1,
        time: TEST_GENESIS_TIME.saturating_add(QuorumTime::from_secs(1)),
        power: 300,
    };
    let outcome = chain.block_after(max_age_secs + 1, Vec::new(), vec![evidence], &[]);
    // provisions raise the powers, nobody leaves the set
    assert!(outcome.updates.iter().all(|update| update.power > 0));
    let dave_validator = chain
        .app
        .query_validator(&dave.address, None)
        .expect("query failed")
        .expect("unknown validator");
    assert!(!dave_validator.jailed);
    assert_eq!(dave_validator.status, ValidatorStatus::Bonded);
    chain.assert_consistent();
}
