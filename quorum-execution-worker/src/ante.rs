// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Decoding and authentication of transactions, the stages that run before
//! any handler.

use quorum_db_exports::KVStore;
use quorum_execution_exports::{
    compute_sign_hash, ExecutionConfig, ExecutionError, ExecutionResult, SignedTransaction,
    SignedTransactionDeserializer,
};
use quorum_ledger::AccountKeeper;
use quorum_logging::quorum_trace;
use quorum_models::Address;
use quorum_serialization::deserialize_exact;
use std::collections::BTreeSet;

/// Checks signatures, sequences and fees, then charges the fee and
/// increments the sequence of every signer
#[derive(Clone)]
pub(crate) struct AnteHandler {
    config: ExecutionConfig,
    ledger: AccountKeeper,
    tx_deserializer: SignedTransactionDeserializer,
}

impl AnteHandler {
    pub fn new(config: ExecutionConfig, ledger: AccountKeeper) -> Self {
        AnteHandler {
            config,
            ledger,
            tx_deserializer: SignedTransactionDeserializer::new(),
        }
    }

    /// Decodes wire bytes. Oversized input is refused before decoding.
    pub fn decode(&self, tx_bytes: &[u8]) -> ExecutionResult<SignedTransaction> {
        if tx_bytes.len() > self.config.max_tx_size {
            return Err(ExecutionError::TooLarge(format!(
                "transaction of {} bytes, the limit is {}",
                tx_bytes.len(),
                self.config.max_tx_size
            )));
        }
        deserialize_exact(&self.tx_deserializer, tx_bytes).map_err(ExecutionError::DecodingError)
    }

    /// Authenticates `tx` and applies its fee and sequence effects to `store`.
    /// Returns the signer addresses, the fee payer first.
    ///
    /// Nothing is written unless every check passed, except when charging the
    /// fee itself fails, in which case the caller discards the writes.
    pub fn authenticate<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        tx: &SignedTransaction,
    ) -> ExecutionResult<Vec<Address>> {
        let msg_count = tx.transaction.msgs.len();
        if msg_count > self.config.max_msgs_per_tx as usize {
            return Err(ExecutionError::TooLarge(format!(
                "{} messages, the limit is {}",
                msg_count, self.config.max_msgs_per_tx
            )));
        }
        if msg_count == 0 {
            return Err(ExecutionError::InvalidRequest(
                "transaction without message".into(),
            ));
        }
        if tx.signatures.is_empty() {
            return Err(ExecutionError::MissingSignature);
        }
        if tx.transaction.chain_id != self.config.chain_id {
            return Err(ExecutionError::Unauthorized(format!(
                "signed for chain {}, this is {}",
                tx.transaction.chain_id, self.config.chain_id
            )));
        }

        let mut signers = Vec::with_capacity(tx.signatures.len());
        let mut seen = BTreeSet::new();
        for tx_signature in &tx.signatures {
            let address = Address::from_public_key(&tx_signature.public_key);
            if !seen.insert(address) {
                return Err(ExecutionError::Unauthorized(format!(
                    "{} signed twice",
                    address
                )));
            }
            let Some(account) = self.ledger.get_account(store, &address) else {
                return Err(ExecutionError::Unauthorized(format!(
                    "unknown account {}",
                    address
                )));
            };
            if account.account_number != tx_signature.account_number {
                return Err(ExecutionError::Unauthorized(format!(
                    "{} has account number {}, signed {}",
                    address, account.account_number, tx_signature.account_number
                )));
            }
            let hash = compute_sign_hash(
                &tx.transaction,
                tx_signature.account_number,
                tx_signature.sequence,
            )
            .map_err(|err| ExecutionError::DecodingError(err.to_string()))?;
            tx_signature
                .public_key
                .verify_signature(&hash, &tx_signature.signature)
                .map_err(|err| {
                    ExecutionError::Unauthorized(format!("bad signature of {}: {}", address, err))
                })?;
            if account.sequence != tx_signature.sequence {
                return Err(ExecutionError::InvalidSequence {
                    address,
                    expected: account.sequence,
                    got: tx_signature.sequence,
                });
            }
            signers.push(address);
        }

        let payer = signers[0];
        self.ledger
            .collect_fee(store, &payer, &tx.transaction.fee)?;
        for signer in &signers {
            self.ledger.increment_sequence(store, signer)?;
        }
        quorum_trace!("execution.authenticate", {
            "payer": payer.to_string(),
            "fee": tx.transaction.fee.to_string(),
            "signers": signers.len()
        });
        Ok(signers)
    }
}
