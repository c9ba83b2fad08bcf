// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! The application context: configuration, keepers, hooks and routes.
//! It is built once and shared by the block and check pipelines, so that no
//! stage reads process-wide state.

use crate::ante::AnteHandler;
use crate::handlers::{BankHandler, SlashingHandler, StakingHandler};
use crate::router::{Handler, Router};
use quorum_db_exports::CacheView;
use quorum_execution_exports::{
    ExecutionConfig, ExecutionError, ExecutionResult, Message, BANK_MODULE, SLASHING_MODULE,
    STAKING_MODULE,
};
use quorum_ledger::{AccountKeeper, LedgerConfig};
use quorum_models::{Address, BlockHeader};
use quorum_slashing::{SlashingCommand, SlashingConfig, SlashingKeeper};
use quorum_staking_exports::{StakingConfig, StakingHooks};
use quorum_staking_worker::StakingKeeper;

/// A transaction that passed decoding, authentication and routing
pub(crate) struct ValidatedTx<'a> {
    pub signers: Vec<Address>,
    pub messages: Vec<(&'a dyn Handler, Message)>,
}

pub(crate) struct ExecutionContext {
    pub config: ExecutionConfig,
    pub ledger: AccountKeeper,
    pub staking: StakingKeeper,
    pub slashing: SlashingKeeper,
    pub hooks: StakingHooks,
    ante: AnteHandler,
    router: Router,
}

impl ExecutionContext {
    pub fn new(
        config: ExecutionConfig,
        ledger_config: LedgerConfig,
        staking_config: StakingConfig,
        slashing_config: SlashingConfig,
    ) -> ExecutionResult<Self> {
        if staking_config.power_reduction == 0 {
            return Err(ExecutionError::InvalidRequest(
                "power_reduction must be positive".into(),
            ));
        }
        if slashing_config.signed_blocks_window == 0 {
            return Err(ExecutionError::InvalidRequest(
                "signed_blocks_window must be positive".into(),
            ));
        }
        let ledger = AccountKeeper::new(ledger_config);
        let staking = StakingKeeper::new(staking_config, ledger.clone());
        let slashing = SlashingKeeper::new(slashing_config);
        let router = Router::new()
            .add_route(BANK_MODULE, Box::new(BankHandler::new(ledger.clone())))
            .add_route(STAKING_MODULE, Box::new(StakingHandler::new(staking.clone())))
            .add_route(
                SLASHING_MODULE,
                Box::new(SlashingHandler::new(staking.clone(), slashing.clone())),
            );
        Ok(ExecutionContext {
            ante: AnteHandler::new(config.clone(), ledger.clone()),
            hooks: slashing.hooks(),
            config,
            ledger,
            staking,
            slashing,
            router,
        })
    }

    /// Decode, authenticate and route stages, shared by check and deliver.
    /// On error the caller discards whatever was written to `view`.
    pub fn validate_tx(
        &self,
        view: &mut CacheView,
        tx_bytes: &[u8],
    ) -> ExecutionResult<ValidatedTx<'_>> {
        let tx = self.ante.decode(tx_bytes)?;
        let signers = self.ante.authenticate(view, &tx)?;
        let messages = self.router.route(&tx.transaction.msgs, &signers)?;
        Ok(ValidatedTx { signers, messages })
    }

    /// Applies the commands returned by the slashing keeper to the staking keeper
    pub fn apply_slashing_commands(
        &self,
        view: &mut CacheView,
        header: &BlockHeader,
        commands: Vec<SlashingCommand>,
    ) -> ExecutionResult<()> {
        for command in commands {
            match command {
                SlashingCommand::Slash {
                    consensus_address,
                    infraction_height,
                    power,
                    fraction,
                } => {
                    self.staking.slash(
                        view,
                        header,
                        &consensus_address,
                        infraction_height,
                        power,
                        &fraction,
                    )?;
                }
                SlashingCommand::Jail { consensus_address } => {
                    self.staking.jail(view, &consensus_address)?;
                }
            }
        }
        Ok(())
    }
}
