// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This module applies blocks and checks mempool transactions.
//!
//! Block application happens in the following way:
//! * `begin_block` mints the provisions and handles votes and evidence
//! * `deliver_tx` runs each transaction in order against the block view;
//!   a failed handler only discards its own writes
//! * `end_block` updates the validator set, notifies the slashing module of
//!   the bonding transitions and distributes the collected fees
//! * `commit` writes the block view to the database as version `height`
//!
//! The check view is an independent view over the last committed state,
//! replaced at every commit.

use crate::context::ExecutionContext;
use parking_lot::{Mutex, RwLock};
use quorum_db_exports::{CacheView, QuorumDBController};
use quorum_execution_exports::{
    BeginBlockRequest, CommitResponse, ExecutionError, ExecutionResult, GenesisState,
    TxResponse,
};
use quorum_logging::quorum_trace;
use quorum_models::{BlockHeader, Coin};
use quorum_staking_exports::ValidatorUpdate;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where the application stands in the block lifecycle
#[derive(Debug, Clone)]
enum BlockPhase {
    /// between two blocks
    Idle,
    /// after `begin_block`
    Delivering(BlockHeader),
    /// after `end_block`
    Ended(BlockHeader),
}

/// Turns a transaction failure into its response. Fatal errors are returned as such.
fn failure_response(err: ExecutionError) -> ExecutionResult<TxResponse> {
    if err.is_fatal() {
        return Err(err);
    }
    Ok(TxResponse {
        code: err.code(),
        log: err.to_string(),
        tags: Vec::new(),
    })
}

/// State of the block pipeline
pub(crate) struct ExecutionState {
    context: Arc<ExecutionContext>,
    db: Arc<RwLock<Box<dyn QuorumDBController>>>,
    // writes of the genesis and of the current block, over the last committed state
    block_view: CacheView,
    phase: BlockPhase,
    check_state: Arc<Mutex<CheckState>>,
}

impl ExecutionState {
    pub fn new(
        context: Arc<ExecutionContext>,
        db: Arc<RwLock<Box<dyn QuorumDBController>>>,
        check_state: Arc<Mutex<CheckState>>,
    ) -> ExecutionResult<Self> {
        let snapshot = db.read().get_snapshot(None)?;
        Ok(ExecutionState {
            context,
            db,
            block_view: CacheView::new(snapshot),
            phase: BlockPhase::Idle,
            check_state,
        })
    }

    fn expect_idle(&self, what: &str) -> ExecutionResult<()> {
        match &self.phase {
            BlockPhase::Idle => Ok(()),
            phase => Err(ExecutionError::InternalError(format!(
                "{} called in phase {:?}",
                what, phase
            ))),
        }
    }

    fn delivering_header(&self, what: &str) -> ExecutionResult<BlockHeader> {
        match &self.phase {
            BlockPhase::Delivering(header) => Ok(header.clone()),
            phase => Err(ExecutionError::InternalError(format!(
                "{} called in phase {:?}",
                what, phase
            ))),
        }
    }

    /// Runs `step` on the block view. A non-fatal failure discards the writes
    /// of the step and is logged; a fatal one is returned.
    fn apply_or_skip(
        &mut self,
        what: &str,
        step: impl FnOnce(&ExecutionContext, &mut CacheView) -> ExecutionResult<()>,
    ) -> ExecutionResult<()> {
        let snapshot = self.block_view.get_snapshot();
        match step(self.context.as_ref(), &mut self.block_view) {
            Ok(()) => Ok(()),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                self.block_view.reset_to_snapshot(snapshot);
                warn!("execution: skipped {}: {}", what, err);
                Ok(())
            }
        }
    }

    /// Writes the genesis state. It is persisted by the first commit.
    pub fn init_chain(&mut self, genesis: GenesisState) -> ExecutionResult<Vec<ValidatorUpdate>> {
        self.expect_idle("init_chain")?;
        let version = self.db.read().get_version();
        if version != 0 || !self.block_view.changes().is_empty() {
            return Err(ExecutionError::InternalError(format!(
                "chain already initialized (version {})",
                version
            )));
        }
        let context = self.context.clone();
        let view = &mut self.block_view;
        let header = BlockHeader {
            chain_id: context.config.chain_id.clone(),
            height: 0,
            time: genesis.genesis_time,
        };

        context.staking.init_pool(view, genesis.genesis_time);
        for account in &genesis.accounts {
            for coin in account.coins.iter() {
                context
                    .ledger
                    .mint(view, &Coin::new(&coin.denom, coin.amount.clone()))?;
            }
            context.ledger.add_coins(view, &account.address, &account.coins)?;
        }
        for validator in &genesis.validators {
            context.staking.create_validator(
                view,
                &validator.operator,
                validator.consensus_pubkey,
                &validator.self_bond,
            )?;
        }
        let (updates, events) = context.staking.end_block(view, &header)?;
        for event in &events {
            context.hooks.dispatch(view, &header, event)?;
        }

        // mempool transactions can spend genesis funds before the first commit
        let mut check_state = self.check_state.lock();
        check_state.view = CacheView::new(self.db.read().get_snapshot(None)?);
        check_state.view.reset_to_snapshot(self.block_view.get_snapshot());

        info!(
            "execution: genesis with {} accounts and {} validators",
            genesis.accounts.len(),
            genesis.validators.len()
        );
        Ok(updates)
    }

    /// Starts a block: provisions, then liveness of the last commit, then evidence
    pub fn begin_block(&mut self, request: BeginBlockRequest) -> ExecutionResult<()> {
        self.expect_idle("begin_block")?;
        let header = request.header;
        let expected_height = self.db.read().get_version() + 1;
        if header.height != expected_height {
            return Err(ExecutionError::InternalError(format!(
                "expected block {}, got {}",
                expected_height, header.height
            )));
        }
        if header.chain_id != self.context.config.chain_id {
            return Err(ExecutionError::InternalError(format!(
                "block of chain {} on chain {}",
                header.chain_id, self.context.config.chain_id
            )));
        }

        self.apply_or_skip("provisions", |context, view| {
            let minted = context.staking.process_provisions(view, &header)?;
            if minted > 0 {
                debug!("execution: minted {} provisions", minted);
            }
            Ok(())
        })?;

        for vote in &request.votes {
            self.apply_or_skip("vote", |context, view| {
                let jailed = context
                    .staking
                    .get_validator_by_cons(view, &vote.consensus_address)
                    .map(|validator| validator.jailed);
                let commands = context.slashing.handle_validator_signature(
                    view,
                    &header,
                    &vote.consensus_address,
                    vote.power,
                    vote.signed,
                    jailed,
                )?;
                context.apply_slashing_commands(view, &header, commands)
            })?;
        }

        for evidence in &request.evidence {
            self.apply_or_skip("evidence", |context, view| {
                let validator = context
                    .staking
                    .get_validator_by_cons(view, &evidence.consensus_address);
                let commands = context.slashing.handle_double_sign(
                    view,
                    &header,
                    &evidence.consensus_address,
                    validator.as_ref(),
                    evidence.height,
                    evidence.time,
                    evidence.power,
                )?;
                context.apply_slashing_commands(view, &header, commands)
            })?;
        }

        quorum_trace!("execution.begin_block", {
            "height": header.height,
            "votes": request.votes.len(),
            "evidence": request.evidence.len()
        });
        self.phase = BlockPhase::Delivering(header);
        Ok(())
    }

    /// Applies a transaction of the current block
    pub fn deliver_tx(&mut self, tx_bytes: &[u8]) -> ExecutionResult<TxResponse> {
        let header = self.delivering_header("deliver_tx")?;
        let context = self.context.clone();
        let view = &mut self.block_view;

        let before = view.get_snapshot();
        let validated = match context.validate_tx(view, tx_bytes) {
            Ok(validated) => validated,
            Err(err) => {
                view.reset_to_snapshot(before);
                debug!("execution: rejected transaction: {}", err);
                return failure_response(err);
            }
        };

        // fee and sequence effects survive a handler failure
        let authenticated = view.get_snapshot();
        let mut tags = Vec::new();
        for (handler, message) in &validated.messages {
            match handler.execute(view, &header, message) {
                Ok(message_tags) => tags.extend(message_tags),
                Err(err) => {
                    view.reset_to_snapshot(authenticated);
                    debug!(
                        "execution: {} failed in block {}: {}",
                        message.route(),
                        header.height,
                        err
                    );
                    return failure_response(err);
                }
            }
        }
        quorum_trace!("execution.deliver_tx", {
            "height": header.height,
            "signer": validated.signers[0].to_string(),
            "messages": validated.messages.len()
        });
        Ok(TxResponse::ok(tags))
    }

    /// Ends the current block and returns the validator set changes
    pub fn end_block(&mut self) -> ExecutionResult<Vec<ValidatorUpdate>> {
        let header = self.delivering_header("end_block")?;
        let context = self.context.clone();
        let view = &mut self.block_view;

        let (updates, events) = context.staking.end_block(view, &header)?;
        for event in &events {
            context.hooks.dispatch(view, &header, event)?;
        }
        let recipients = context.staking.get_last_validator_powers(view);
        let distributed = context.ledger.distribute_fee_pool(view, &recipients)?;
        if !distributed.is_empty() {
            debug!(
                "execution: distributed {} of fees to {} validators",
                distributed,
                recipients.len()
            );
        }
        quorum_trace!("execution.end_block", {
            "height": header.height,
            "updates": updates.len(),
            "events": events.len()
        });
        self.phase = BlockPhase::Ended(header);
        Ok(updates)
    }

    /// Writes the block to the database and resets the views
    pub fn commit(&mut self) -> ExecutionResult<CommitResponse> {
        let header = match &self.phase {
            BlockPhase::Ended(header) => header.clone(),
            phase => {
                return Err(ExecutionError::InternalError(format!(
                    "commit called in phase {:?}",
                    phase
                )))
            }
        };
        let batch = self.block_view.take();
        let changes = batch.len();
        let state_hash = self.db.write().write_batch(batch, header.height)?;
        let snapshot = self.db.read().get_snapshot(Some(header.height))?;
        self.block_view = CacheView::new(snapshot.clone());
        self.check_state.lock().view = CacheView::new(snapshot);
        self.phase = BlockPhase::Idle;
        info!(
            "execution: committed block {} with {} changes, state hash {}",
            header.height, changes, state_hash
        );
        Ok(CommitResponse {
            version: header.height,
            state_hash,
        })
    }
}

/// State of the mempool admission pipeline
pub(crate) struct CheckState {
    context: Arc<ExecutionContext>,
    view: CacheView,
}

impl CheckState {
    pub fn new(
        context: Arc<ExecutionContext>,
        db: &RwLock<Box<dyn QuorumDBController>>,
    ) -> ExecutionResult<Self> {
        let snapshot = db.read().get_snapshot(None)?;
        Ok(CheckState {
            context,
            view: CacheView::new(snapshot),
        })
    }

    /// Decodes, authenticates and routes a transaction without running its
    /// handlers. Only the fee and sequence effects are kept, so that the next
    /// transaction of the same account is checked against the next sequence.
    pub fn check_tx(&mut self, tx_bytes: &[u8]) -> TxResponse {
        let before = self.view.get_snapshot();
        match self.context.validate_tx(&mut self.view, tx_bytes) {
            Ok(_) => TxResponse::ok(Vec::new()),
            Err(err) => {
                self.view.reset_to_snapshot(before);
                if err.is_fatal() {
                    error!("execution: check_tx hit a fatal error: {}", err);
                }
                TxResponse {
                    code: err.code(),
                    log: err.to_string(),
                    tags: Vec::new(),
                }
            }
        }
    }
}
