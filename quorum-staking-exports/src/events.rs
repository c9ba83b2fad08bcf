// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::StakingResult;
use quorum_db_exports::KVStore;
use quorum_models::{Address, BlockHeader};

/// Bonding transitions emitted by the staking keeper
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StakingEvent {
    /// the validator entered the consensus set
    ValidatorBonded {
        /// consensus address of the validator
        consensus_address: Address,
    },
    /// the validator left the consensus set and started unbonding
    ValidatorBeginUnbonding {
        /// consensus address of the validator
        consensus_address: Address,
    },
}

/// Callback invoked with the block state, the current header and the consensus address
pub type StakingHook =
    Box<dyn Fn(&mut dyn KVStore, &BlockHeader, &Address) -> StakingResult<()> + Send + Sync>;

/// Subscribers to bonding transitions. Only the callbacks a module needs are set.
#[derive(Default)]
pub struct StakingHooks {
    /// called on `StakingEvent::ValidatorBonded`
    pub on_validator_bonded: Option<StakingHook>,
    /// called on `StakingEvent::ValidatorBeginUnbonding`
    pub on_validator_begin_unbonding: Option<StakingHook>,
}

impl std::fmt::Debug for StakingHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StakingHooks")
            .field("on_validator_bonded", &self.on_validator_bonded.is_some())
            .field(
                "on_validator_begin_unbonding",
                &self.on_validator_begin_unbonding.is_some(),
            )
            .finish()
    }
}

impl StakingHooks {
    /// Calls the subscriber of `event`, if any
    pub fn dispatch(
        &self,
        store: &mut dyn KVStore,
        header: &BlockHeader,
        event: &StakingEvent,
    ) -> StakingResult<()> {
        let (hook, consensus_address) = match event {
            StakingEvent::ValidatorBonded { consensus_address } => {
                (&self.on_validator_bonded, consensus_address)
            }
            StakingEvent::ValidatorBeginUnbonding { consensus_address } => {
                (&self.on_validator_begin_unbonding, consensus_address)
            }
        };
        match hook {
            Some(hook) => hook(store, header, consensus_address),
            None => Ok(()),
        }
    }
}
