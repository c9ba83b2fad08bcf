// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::context::ExecutionContext;
use crate::controller::ApplicationControllerImpl;
use crate::execution::{CheckState, ExecutionState};
use parking_lot::{Mutex, RwLock};
use quorum_db_exports::QuorumDBController;
use quorum_execution_exports::{ApplicationController, ExecutionConfig, ExecutionResult};
use quorum_ledger::LedgerConfig;
use quorum_slashing::SlashingConfig;
use quorum_staking_exports::StakingConfig;
use std::sync::Arc;
use tracing::info;

/// Builds the application over `db` and returns its controller.
///
/// # parameters
/// * `config`: pipeline configuration, including the chain identifier
/// * `ledger_config`, `staking_config`, `slashing_config`: module parameters
/// * `db`: versioned store. If it already holds committed blocks, the
///   application resumes after the last one.
///
/// # Returns
/// A controller driven by the consensus engine. Clones share the same state.
pub fn start_application(
    config: ExecutionConfig,
    ledger_config: LedgerConfig,
    staking_config: StakingConfig,
    slashing_config: SlashingConfig,
    db: Arc<RwLock<Box<dyn QuorumDBController>>>,
) -> ExecutionResult<Box<dyn ApplicationController>> {
    let context = Arc::new(ExecutionContext::new(
        config,
        ledger_config,
        staking_config,
        slashing_config,
    )?);
    let check_state = Arc::new(Mutex::new(CheckState::new(context.clone(), &db)?));
    let execution_state = Arc::new(Mutex::new(ExecutionState::new(
        context.clone(),
        db.clone(),
        check_state.clone(),
    )?));
    info!(
        "execution: application of chain {} started at version {}",
        context.config.chain_id,
        db.read().get_version()
    );
    Ok(Box::new(ApplicationControllerImpl {
        execution_state,
        check_state,
        context,
        db,
    }))
}
