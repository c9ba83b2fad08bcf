// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::StakingKeeper;
use quorum_db_exports::KVRead;
use quorum_models::{Address, Dec};
use quorum_staking_exports::{StakingError, StakingResult, ValidatorStatus};
use std::collections::BTreeMap;

impl StakingKeeper {
    /// Cross-checks the pool against the records it tallies:
    /// * validator assets per pool add up to the shares issued by that pool
    /// * delegator shares per validator add up to its liabilities
    /// * unbonding entry balances add up to the unbonding pool
    ///
    /// A mismatch is an `InvariantViolation`.
    pub fn check_invariants<S: KVRead + ?Sized>(&self, store: &S) -> StakingResult<()> {
        let pool = self.get_pool(store);
        pool.check_invariants()?;

        let mut bonded_assets = Dec::zero();
        let mut unbonded_assets = Dec::zero();
        let mut liabilities: BTreeMap<Address, Dec> = BTreeMap::new();
        for validator in self.get_validators(store) {
            validator.check_invariants()?;
            match validator.status {
                ValidatorStatus::Bonded => {
                    bonded_assets = bonded_assets.checked_add(&validator.assets)?
                }
                ValidatorStatus::Unbonding | ValidatorStatus::Unbonded => {
                    unbonded_assets = unbonded_assets.checked_add(&validator.assets)?
                }
            }
            liabilities.insert(validator.operator, validator.liabilities);
        }
        if bonded_assets != pool.bonded_shares || unbonded_assets != pool.unbonded_shares {
            return Err(StakingError::InvariantViolation(format!(
                "validator assets {} bonded / {} unbonded do not match pool shares {} / {}",
                bonded_assets, unbonded_assets, pool.bonded_shares, pool.unbonded_shares
            )));
        }

        let mut delegated: BTreeMap<Address, Dec> = BTreeMap::new();
        for delegation in self.get_all_delegations(store) {
            let total = delegated.entry(delegation.validator).or_insert_with(Dec::zero);
            *total = total.checked_add(&delegation.shares)?;
        }
        for (operator, owed) in liabilities.iter() {
            let held = delegated.remove(operator).unwrap_or_default();
            if held != *owed {
                return Err(StakingError::InvariantViolation(format!(
                    "validator {} owes {} shares, delegators hold {}",
                    operator, owed, held
                )));
            }
        }
        if let Some((operator, _)) = delegated.into_iter().next() {
            return Err(StakingError::InvariantViolation(format!(
                "delegation to unknown validator {}",
                operator
            )));
        }

        let mut unbonding = 0u64;
        for ubd in self.get_all_unbonding_delegations(store) {
            for entry in ubd.entries {
                unbonding = unbonding.checked_add(entry.balance).ok_or_else(|| {
                    StakingError::Overflow("unbonding balances".into())
                })?;
            }
        }
        if unbonding != pool.unbonding_pool {
            return Err(StakingError::InvariantViolation(format!(
                "unbonding entries hold {} tokens, the unbonding pool {}",
                unbonding, pool.unbonding_pool
            )));
        }
        Ok(())
    }
}
