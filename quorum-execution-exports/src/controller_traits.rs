// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This module exports the interface of the application towards the consensus engine

use crate::types::{BeginBlockRequest, CommitResponse, GenesisState, TxResponse};
use crate::ExecutionResult;
use quorum_models::{Account, Address};
use quorum_staking_exports::{
    Delegation, Pool, Redelegation, UnbondingDelegation, Validator, ValidatorUpdate,
};

/// Interface of the application state machine.
///
/// Blocks are applied through `begin_block`, `deliver_tx` for each
/// transaction in order, `end_block` and `commit`. `check_tx` can be called
/// at any time, it validates against a separate view that is reset at every
/// commit. An `Err` returned by a block method is fatal: the state can no
/// longer be trusted and the node must stop.
///
/// Queries read a committed version, the last one when `version` is `None`,
/// and never observe a block being applied. Absent records are `Ok(None)`.
pub trait ApplicationController: Send + Sync {
    /// Writes the genesis state and returns the initial validator set
    fn init_chain(&self, genesis: GenesisState) -> ExecutionResult<Vec<ValidatorUpdate>>;

    /// Validates a transaction for mempool admission
    fn check_tx(&self, tx_bytes: &[u8]) -> TxResponse;

    /// Starts a block: provisions, liveness and double sign evidence
    fn begin_block(&self, request: BeginBlockRequest) -> ExecutionResult<()>;

    /// Applies a transaction of the current block
    fn deliver_tx(&self, tx_bytes: &[u8]) -> ExecutionResult<TxResponse>;

    /// Ends the current block and returns the validator set changes
    fn end_block(&self) -> ExecutionResult<Vec<ValidatorUpdate>>;

    /// Persists the current block
    fn commit(&self) -> ExecutionResult<CommitResponse>;

    /// Account of `address`
    fn query_account(&self, address: &Address, version: Option<u64>)
        -> ExecutionResult<Option<Account>>;

    /// Validator operated by `operator`
    fn query_validator(
        &self,
        operator: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<Validator>>;

    /// Delegation of `delegator` to `validator`
    fn query_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<Delegation>>;

    /// Pending unbonding of `delegator` from `validator`
    fn query_unbonding_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<UnbondingDelegation>>;

    /// Pending redelegation of `delegator` from `src` to `dst`
    fn query_redelegation(
        &self,
        delegator: &Address,
        src: &Address,
        dst: &Address,
        version: Option<u64>,
    ) -> ExecutionResult<Option<Redelegation>>;

    /// Staking pool
    fn query_pool(&self, version: Option<u64>) -> ExecutionResult<Pool>;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn ApplicationController>`.
    fn clone_box(&self) -> Box<dyn ApplicationController>;
}

/// Allow cloning `Box<dyn ApplicationController>`
/// Uses `ApplicationController::clone_box` internally
impl Clone for Box<dyn ApplicationController> {
    fn clone(&self) -> Box<dyn ApplicationController> {
        self.clone_box()
    }
}
