// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Execution module `test_exports`

use crate::{ExecutionConfig, Message, SignedTransaction, Transaction};
use quorum_models::Coins;
use quorum_signature::KeyPair;

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            chain_id: "test-chain".to_string(),
            max_tx_size: 64 * 1024,
            max_msgs_per_tx: 16,
        }
    }
}

/// Wire bytes of a transaction of `messages` on `chain_id`, signed by
/// `signers` given as `(key pair, account number, sequence)`
pub fn signed_tx_bytes(
    chain_id: &str,
    fee: Coins,
    messages: &[Message],
    signers: &[(&KeyPair, u64, u64)],
) -> Vec<u8> {
    let transaction = Transaction {
        chain_id: chain_id.to_string(),
        fee,
        memo: String::new(),
        msgs: messages
            .iter()
            .map(|message| message.to_msg().expect("message encoding failed"))
            .collect(),
    };
    SignedTransaction::new_signed(transaction, signers)
        .and_then(|tx| tx.to_bytes())
        .expect("transaction encoding failed")
}
