// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This module implements an application controller.
//! See `quorum-execution-exports/controller_traits.rs` for functional details.

use crate::context::ExecutionContext;
use crate::execution::{CheckState, ExecutionState};
use parking_lot::{Mutex, RwLock};
use quorum_db_exports::{DBSnapshot, QuorumDBController};
use quorum_execution_exports::{
    ApplicationController, BeginBlockRequest, CommitResponse, ExecutionResult, GenesisState,
    TxResponse,
};
use quorum_models::{Account, Address};
use quorum_staking_exports::{
    Delegation, Pool, Redelegation, UnbondingDelegation, Validator, ValidatorUpdate,
};
use std::sync::Arc;

#[derive(Clone)]
/// implementation of the application controller
pub struct ApplicationControllerImpl {
    /// block pipeline, one block method at a time
    pub(crate) execution_state: Arc<Mutex<ExecutionState>>,
    /// mempool pipeline, runs concurrently with the block pipeline
    pub(crate) check_state: Arc<Mutex<CheckState>>,
    /// keepers used by the queries
    pub(crate) context: Arc<ExecutionContext>,
    /// committed state
    pub(crate) db: Arc<RwLock<Box<dyn QuorumDBController>>>,
}

impl ApplicationControllerImpl {
    fn snapshot(&self, version: Option<u64>) -> ExecutionResult<Arc<DBSnapshot>> {
        Ok(self.db.read().get_snapshot(version)?)
    }
}

impl ApplicationController for ApplicationControllerImpl {
    fn init_chain(&self, genesis: GenesisState) -> ExecutionResult<Vec<ValidatorUpdate>> {
        self.execution_state.lock().init_chain(genesis)
    }

    fn check_tx(&self, tx_bytes: &[u8]) -> TxResponse {
        self.check_state.lock().check_tx(tx_bytes)
    }

    fn begin_block(&self, request: BeginBlockRequest) -> ExecutionResult<()> {
        self.execution_state.lock().begin_block(request)
    }

    fn deliver_tx(&self, tx_bytes: &[u8]) -> ExecutionResult<TxResponse> {
        self.execution_state.lock().deliver_tx(tx_bytes)
    }

    fn end_block(&self) -> ExecutionResult<Vec<ValidatorUpdate>> {
        self.execution_state.lock().end_block()
    }

    fn commit(&self) -> ExecutionResult<CommitResponse> {
        self.execution_state.lock().commit()
    }

    fn query_account(
        &self,
        address: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<Account>> {
        let snapshot = self.snapshot(version)?;
        Ok(self.context.ledger.get_account(snapshot.as_ref(), address))
    }

    fn query_validator(
        &self,
        operator: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<Validator>> {
        let snapshot = self.snapshot(version)?;
        Ok(self.context.staking.get_validator(snapshot.as_ref(), operator))
    }

    fn query_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<Delegation>> {
        let snapshot = self.snapshot(version)?;
        Ok(self
            .context
            .staking
            .get_delegation(snapshot.as_ref(), delegator, validator))
    }

    fn query_unbonding_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<UnbondingDelegation>> {
        let snapshot = self.snapshot(version)?;
        Ok(self
            .context
            .staking
            .get_unbonding_delegation(snapshot.as_ref(), delegator, validator))
    }

    fn query_redelegation(
        &self,
        delegator: &Address,
        src: &Address,
        dst: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<Redelegation>> {
        let snapshot = self.snapshot(version)?;
        Ok(self
            .context
            .staking
            .get_redelegation(snapshot.as_ref(), delegator, src, dst))
    }

    fn query_pool(&self, version: Option<u64>) -> ExecutionResult<Pool> {
        let snapshot = self.snapshot(version)?;
        Ok(self.context.staking.get_pool(snapshot.as_ref()))
    }

    /// Returns a boxed clone of self.
    /// Allows cloning `Box<dyn ApplicationController>`,
    /// see `quorum-execution-exports/controller_traits.rs`
    fn clone_box(&self) -> Box<dyn ApplicationController> {
        Box::new(self.clone())
    }
}
