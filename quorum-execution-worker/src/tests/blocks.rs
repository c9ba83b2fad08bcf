// Copyright (c) 2022 MASSA LABS <info@massa.net>

use super::{coins, tag_value, TestChain, DENOM};
use crate::test_exports::{begin_block_request, funded_genesis, TestAccount};
use assert_matches::assert_matches;
use quorum_db_exports::QuorumDBError;
use quorum_execution_exports::{
    ErrorKind, ExecutionError, Message, MsgBeginRedelegate, MsgCreateValidator,
    MsgDelegate, MsgSend, MsgUndelegate,
};
use quorum_models::{Coin, Dec, Int};
use quorum_signature::KeyPair;
use quorum_staking_exports::{StakingConfig, ValidatorStatus};

fn delegate(delegator: &TestAccount, validator: &TestAccount, amount: u64) -> Message {
    Message::Delegate(MsgDelegate {
        delegator: delegator.address,
        validator: validator.address,
        amount: Coin::new(DENOM, amount),
    })
}

fn undelegate(delegator: &TestAccount, validator: &TestAccount, shares: u64) -> Message {
    Message::Undelegate(MsgUndelegate {
        delegator: delegator.address,
        validator: validator.address,
        shares: Dec::from_u64(shares),
    })
}

fn redelegate(
    delegator: &TestAccount,
    src: &TestAccount,
    dst: &TestAccount,
    shares: u64,
) -> Message {
    Message::BeginRedelegate(MsgBeginRedelegate {
        delegator: delegator.address,
        validator_src: src.address,
        validator_dst: dst.address,
        shares: Dec::from_u64(shares),
    })
}

/// alice runs a validator with a self bond of 100, bob only holds funds
fn delegation_chain() -> (TestChain, TestAccount, TestAccount) {
    let alice = TestAccount::random();
    let bob = TestAccount::random();
    let (genesis, _) = funded_genesis(DENOM, &[&alice, &bob], 1000, &[&alice], 100);
    (TestChain::start(genesis), alice, bob)
}

#[test]
fn genesis_validators_are_bonded() {
    let alice = TestAccount::random();
    let (genesis, consensus_keys) = funded_genesis(DENOM, &[&alice], 1000, &[&alice], 100);
    let mut chain = TestChain::start(genesis);

    assert_eq!(chain.genesis_updates.len(), 1);
    assert_eq!(
        chain.genesis_updates[0].consensus_pubkey,
        consensus_keys[0].get_public_key()
    );
    assert_eq!(chain.genesis_updates[0].power, 100);

    // genesis is persisted by the first commit
    let outcome = chain.block(&[]);
    assert!(outcome.updates.is_empty());
    let validator = chain
        .app
        .query_validator(&alice.address, None)
        .expect("query failed")
        .expect("unknown validator");
    assert_eq!(validator.status, ValidatorStatus::Bonded);
    assert!(!validator.jailed);
    let pool = chain.app.query_pool(None).expect("query failed");
    assert_eq!(pool.bonded_pool, 100);
    chain.assert_consistent();
}

#[test]
fn undelegated_tokens_are_paid_back_after_unbonding_time() {
    let (mut chain, alice, bob) = delegation_chain();

    let tx = chain.sign(&bob, 0, &[delegate(&bob, &alice, 10)], 0);
    let outcome = chain.block(&[tx]);
    let response = &outcome.responses[0];
    assert!(response.is_ok(), "{}", response.log);
    assert_eq!(tag_value(response, "shares"), Some("10"));
    assert_eq!(outcome.updates.len(), 1);
    assert_eq!(outcome.updates[0].power, 110);
    assert_eq!(chain.balance(&bob.address), Int::from(990u64));

    let tx = chain.sign(&bob, 0, &[undelegate(&bob, &alice, 6)], 0);
    let outcome = chain.block(&[tx]);
    let response = &outcome.responses[0];
    assert!(response.is_ok(), "{}", response.log);
    assert_eq!(tag_value(response, "tokens"), Some("6"));
    assert!(tag_value(response, "completion_time").is_some());

    let delegation = chain
        .app
        .query_delegation(&bob.address, &alice.address, None)
        .expect("query failed")
        .expect("no delegation");
    assert_eq!(delegation.shares, Dec::from_u64(4));
    let unbonding = chain
        .app
        .query_unbonding_delegation(&bob.address, &alice.address, None)
        .expect("query failed")
        .expect("no unbonding");
    assert_eq!(unbonding.entries.len(), 1);
    assert_eq!(unbonding.entries[0].balance, 6);
    assert_eq!(chain.balance(&bob.address), Int::from(990u64));
    chain.assert_consistent();

    let unbonding_secs = StakingConfig::default().unbonding_time.to_millis() / 1000;
    chain.block_after(unbonding_secs, Vec::new(), Vec::new(), &[]);
    assert_eq!(chain.balance(&bob.address), Int::from(996u64));
    assert!(chain
        .app
        .query_unbonding_delegation(&bob.address, &alice.address, None)
        .expect("query failed")
        .is_none());
    chain.assert_consistent();
}

#[test]
fn unbonding_entries_are_bounded() {
    let (mut chain, alice, bob) = delegation_chain();
    let tx = chain.sign(&bob, 0, &[delegate(&bob, &alice, 10)], 0);
    chain.block(&[tx]);

    let max_entries = StakingConfig::default().max_entries as u64;
    let txs: Vec<Vec<u8>> = (0..=max_entries)
        .map(|offset| chain.sign(&bob, 0, &[undelegate(&bob, &alice, 1)], offset))
        .collect();
    let outcome = chain.block(&txs);
    for response in &outcome.responses[..max_entries as usize] {
        assert!(response.is_ok(), "{}", response.log);
    }
    assert_eq!(
        outcome.responses[max_entries as usize].code,
        ErrorKind::MaxEntriesExceeded.code()
    );
    let unbonding = chain
        .app
        .query_unbonding_delegation(&bob.address, &alice.address, None)
        .expect("query failed")
        .expect("no unbonding");
    assert_eq!(unbonding.entries.len(), max_entries as usize);
    chain.assert_consistent();
}

#[test]
fn created_validator_joins_the_set_and_receives_redelegations() {
    let (mut chain, alice, bob) = delegation_chain();
    let carol = TestAccount::random();
    let consensus = KeyPair::generate();

    let fund = chain.sign(
        &bob,
        0,
        &[Message::Send(MsgSend {
            from: bob.address,
            to: carol.address,
            amount: coins(200),
        })],
        0,
    );
    let bond = chain.sign(&bob, 0, &[delegate(&bob, &alice, 10)], 1);
    chain.block(&[fund, bond]);

    let create = chain.sign(
        &carol,
        0,
        &[Message::CreateValidator(MsgCreateValidator {
            operator: carol.address,
            consensus_pubkey: consensus.get_public_key(),
            self_bond: Coin::new(DENOM, 50u64),
        })],
        0,
    );
    let outcome = chain.block(&[create]);
    let response = &outcome.responses[0];
    assert!(response.is_ok(), "{}", response.log);
    assert_eq!(tag_value(response, "amount"), Some("50stake"));
    assert_eq!(outcome.updates.len(), 1);
    assert_eq!(
        outcome.updates[0].consensus_pubkey,
        consensus.get_public_key()
    );
    assert_eq!(outcome.updates[0].power, 50);

    let self_redelegation = chain.sign(&bob, 0, &[redelegate(&bob, &alice, &alice, 4)], 0);
    let redelegation = chain.sign(&bob, 0, &[redelegate(&bob, &alice, &carol, 4)], 1);
    let outcome = chain.block(&[self_redelegation, redelegation]);
    assert_eq!(
        outcome.responses[0].code,
        ErrorKind::SelfRedelegation.code()
    );
    let response = &outcome.responses[1];
    assert!(response.is_ok(), "{}", response.log);
    assert_eq!(tag_value(response, "shares"), Some("4"));
    assert!(tag_value(response, "completion_time").is_some());

    let moved = chain
        .app
        .query_delegation(&bob.address, &carol.address, None)
        .expect("query failed")
        .expect("no delegation");
    assert_eq!(moved.shares, Dec::from_u64(4));
    let red = chain
        .app
        .query_redelegation(&bob.address, &alice.address, &carol.address, None)
        .expect("query failed")
        .expect("no redelegation");
    assert_eq!(red.entries.len(), 1);
    assert_eq!(red.entries[0].initial_balance, 4);
    chain.assert_consistent();
}

#[test]
fn fees_are_shared_by_power() {
    let alice = TestAccount::random();
    let bob = TestAccount::random();
    let dave = TestAccount::random();
    let (mut genesis, _) = funded_genesis(
        DENOM,
        &[&alice, &bob, &dave],
        1000,
        &[&alice, &dave],
        100,
    );
    genesis.validators[1].self_bond = Coin::new(DENOM, 300u64);
    let mut chain = TestChain::start(genesis);

    let tx = chain.sign(
        &bob,
        8,
        &[Message::Send(MsgSend {
            from: bob.address,
            to: TestAccount::random().address,
            amount: coins(1),
        })],
        0,
    );
    let outcome = chain.block(&[tx]);
    assert!(outcome.responses[0].is_ok());
    assert_eq!(chain.balance(&bob.address), Int::from(991u64));
    assert_eq!(chain.balance(&alice.address), Int::from(902u64));
    assert_eq!(chain.balance(&dave.address), Int::from(706u64));
    chain.assert_consistent();
}

#[test]
fn identical_blocks_give_identical_state_hashes() {
    let alice = TestAccount::random();
    let bob = TestAccount::random();
    let (genesis, _) = funded_genesis(DENOM, &[&alice, &bob], 1000, &[&alice], 100);
    let mut first = TestChain::start(genesis.clone());
    let mut second = TestChain::start(genesis.clone());
    let mut diverging = TestChain::start(genesis);

    let send = Message::Send(MsgSend {
        from: bob.address,
        to: alice.address,
        amount: coins(7),
    });
    let tx = first.sign(&bob, 1, &[send], 0);
    let delegation = first.sign(&bob, 0, &[delegate(&bob, &alice, 3)], 1);
    let txs = [tx.clone(), delegation];

    let a = first.block(&txs);
    let b = second.block(&txs);
    let c = diverging.block(&[tx]);
    assert_eq!(a.commit, b.commit);
    assert_ne!(a.commit.state_hash, c.commit.state_hash);

    let a = first.block(&[]);
    let b = second.block(&[]);
    assert_eq!(a.commit.state_hash, b.commit.state_hash);
}

#[test]
fn queries_read_committed_versions() {
    let (mut chain, alice, bob) = delegation_chain();
    let send = |offset: u64| {
        Message::Send(MsgSend {
            from: bob.address,
            to: alice.address,
            amount: coins(10 + offset),
        })
    };
    let tx = chain.sign(&bob, 0, &[send(0)], 0);
    chain.block(&[tx]);
    let tx = chain.sign(&bob, 0, &[send(1)], 0);
    chain.block(&[tx]);

    let balance_at = |version: Option<u64>| {
        chain
            .app
            .query_account(&bob.address, version)
            .expect("query failed")
            .expect("unknown account")
            .coins
            .amount_of(DENOM)
    };
    assert_eq!(balance_at(Some(1)), Int::from(990u64));
    assert_eq!(balance_at(Some(2)), Int::from(979u64));
    assert_eq!(balance_at(None), Int::from(979u64));
    // genesis is written by the first block
    assert_eq!(
        chain.app.query_account(&bob.address, Some(0)),
        Ok(None)
    );
    assert_matches!(
        chain.app.query_account(&bob.address, Some(3)),
        Err(ExecutionError::DBError(QuorumDBError::UnknownVersion(3)))
    );

    // a block in progress is not visible
    let tx = chain.sign(&bob, 0, &[send(2)], 0);
    chain
        .app
        .begin_block(begin_block_request(3, 1))
        .expect("begin_block failed");
    assert!(chain.app.deliver_tx(&tx).expect("deliver_tx failed").is_ok());
    assert_eq!(
        chain
            .app
            .query_account(&bob.address, None)
            .expect("query failed")
            .expect("unknown account")
            .coins
            .amount_of(DENOM),
        Int::from(979u64)
    );
    chain.app.end_block().expect("end_block failed");
    chain.app.commit().expect("commit failed");
    assert_eq!(chain.balance(&bob.address), Int::from(967u64));
}

#[test]
fn lifecycle_misuse_is_fatal() {
    let alice = TestAccount::random();
    let (genesis, _) = funded_genesis(DENOM, &[&alice], 1000, &[&alice], 100);
    let chain = TestChain::start(genesis.clone());
    let app = &chain.app;

    assert_matches!(app.deliver_tx(&[0x00]), Err(ExecutionError::InternalError(_)));
    assert_matches!(app.end_block(), Err(ExecutionError::InternalError(_)));
    assert_matches!(app.commit(), Err(ExecutionError::InternalError(_)));
    assert_matches!(
        app.begin_block(begin_block_request(2, 1)),
        Err(ExecutionError::InternalError(_))
    );
    let mut foreign = begin_block_request(1, 1);
    foreign.header.chain_id = "other-chain".to_string();
    assert_matches!(
        app.begin_block(foreign),
        Err(ExecutionError::InternalError(_))
    );
    assert_matches!(
        app.init_chain(genesis.clone()),
        Err(ExecutionError::InternalError(_))
    );

    // the rejected calls changed nothing
    app.begin_block(begin_block_request(1, 1))
        .expect("begin_block failed");
    assert_matches!(
        app.begin_block(begin_block_request(1, 1)),
        Err(ExecutionError::InternalError(_))
    );
    assert_matches!(app.commit(), Err(ExecutionError::InternalError(_)));
    app.end_block().expect("end_block failed");
    assert_matches!(app.deliver_tx(&[0x00]), Err(ExecutionError::InternalError(_)));
    let commit = app.commit().expect("commit failed");
    assert_eq!(commit.version, 1);
    assert_matches!(
        app.init_chain(genesis),
        Err(ExecutionError::InternalError(_))
    );
}
