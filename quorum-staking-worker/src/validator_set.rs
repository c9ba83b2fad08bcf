// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::StakingKeeper;
use itertools::Itertools;
use quorum_db_exports::{
    KVStore, KEY_DESER_ERROR, POWER_INDEX_PREFIX, REDELEGATION_QUEUE_PREFIX,
    UNBONDING_QUEUE_PREFIX, VALIDATOR_QUEUE_PREFIX,
};
use quorum_logging::quorum_trace;
use quorum_models::{Address, BlockHeader};
use quorum_staking_exports::{
    keys::{addresses_from_key, power_index_key, queue_key_time, validator_queue_key},
    StakingError, StakingEvent, StakingResult, ValidatorStatus, ValidatorUpdate,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

impl StakingKeeper {
    /// End of block processing of the staking module:
    /// * recomputes the consensus set and returns its power changes
    /// * unbonds the validators whose unbonding time has passed
    /// * pays back the matured unbonding entries and drops the matured redelegation entries
    ///
    /// The returned events must be dispatched to the staking hooks in order.
    pub fn end_block<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
    ) -> StakingResult<(Vec<ValidatorUpdate>, Vec<StakingEvent>)> {
        let (updates, events) = self.apply_and_return_validator_set_updates(store, header)?;
        self.unbond_mature_validators(store, header)?;
        self.complete_unbondings(store, header)?;
        self.complete_redelegations(store, header)?;
        self.check_invariants(store)?;
        Ok((updates, events))
    }

    /// Rewrites the power index so that it matches the current validator tokens.
    /// Jailed validators are left out.
    fn refresh_power_index<S: KVStore + ?Sized>(&self, store: &mut S) -> StakingResult<()> {
        let pool = self.get_pool(store);
        let mut expected = BTreeSet::new();
        for validator in self.get_validators(store) {
            if validator.jailed {
                continue;
            }
            let power = validator.potential_power(&pool, self.config.power_reduction)?;
            expected.insert(power_index_key(power, &validator.operator));
        }
        for (key, _) in store.prefix_iterator(POWER_INDEX_PREFIX) {
            if !expected.remove(&key) {
                store.delete(&key);
            }
        }
        for key in expected {
            store.set(key, Vec::new());
        }
        Ok(())
    }

    /// Selects the `max_validators` most powerful validators, moves the
    /// validators entering or leaving the set between the pools, and returns
    /// the power changes in the order the new set was built, followed by the
    /// removals by operator address.
    pub fn apply_and_return_validator_set_updates<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
    ) -> StakingResult<(Vec<ValidatorUpdate>, Vec<StakingEvent>)> {
        self.refresh_power_index(store)?;
        let last: BTreeMap<Address, u64> =
            self.get_last_validator_powers(store).into_iter().collect();
        let mut bonded = BTreeSet::new();
        let mut updates = Vec::new();
        let mut events = Vec::new();

        let ranking = store.prefix_iterator(POWER_INDEX_PREFIX);
        for (key, _) in ranking {
            if bonded.len() >= self.config.max_validators as usize {
                break;
            }
            let operator = addresses_from_key(&key, POWER_INDEX_PREFIX.len() + 8, 1)
                .and_then(|mut addresses| addresses.pop())
                .expect(KEY_DESER_ERROR);
            let mut validator = self.get_validator(store, &operator).ok_or_else(|| {
                StakingError::InvariantViolation(format!(
                    "power index refers to unknown validator {}",
                    operator
                ))
            })?;
            let pool = self.get_pool(store);
            if validator.potential_power(&pool, self.config.power_reduction)? == 0 {
                break;
            }
            if validator.status != ValidatorStatus::Bonded {
                if validator.status == ValidatorStatus::Unbonding {
                    store.delete(&validator_queue_key(validator.unbonding_time, &operator));
                }
                let (pool, bonded_validator) = pool.unbonded_to_bonded(&validator)?;
                validator = bonded_validator;
                self.set_pool(store, &pool);
                self.set_validator(store, &validator);
                events.push(StakingEvent::ValidatorBonded {
                    consensus_address: validator.consensus_address(),
                });
                quorum_trace!("staking.validator_bonded", {
                    "operator": operator.to_string(),
                    "height": header.height
                });
            }
            let power = validator.power(&self.get_pool(store), self.config.power_reduction)?;
            if last.get(&operator) != Some(&power) {
                updates.push(ValidatorUpdate {
                    consensus_pubkey: validator.consensus_pubkey,
                    power,
                });
                self.set_last_power(store, &operator, Some(power));
            }
            bonded.insert(operator);
        }

        let leaving = last
            .keys()
            .filter(|operator| !bonded.contains(*operator))
            .copied()
            .collect_vec();
        for operator in leaving {
            let validator = self.get_validator(store, &operator).ok_or_else(|| {
                StakingError::InvariantViolation(format!(
                    "bonded validator {} is missing",
                    operator
                ))
            })?;
            let (pool, mut validator) = self.get_pool(store).bonded_to_unbonded(&validator)?;
            validator.unbonding_height = header.height;
            validator.unbonding_time = header
                .time
                .checked_add(self.config.unbonding_time)
                .map_err(|err| StakingError::Overflow(err.to_string()))?;
            self.set_pool(store, &pool);
            self.set_validator(store, &validator);
            store.set(
                validator_queue_key(validator.unbonding_time, &operator),
                Vec::new(),
            );
            self.set_last_power(store, &operator, None);
            updates.push(ValidatorUpdate {
                consensus_pubkey: validator.consensus_pubkey,
                power: 0,
            });
            events.push(StakingEvent::ValidatorBeginUnbonding {
                consensus_address: validator.consensus_address(),
            });
            quorum_trace!("staking.validator_begin_unbonding", {
                "operator": operator.to_string(),
                "height": header.height,
                "unbonding_time": validator.unbonding_time.to_millis()
            });
        }
        Ok((updates, events))
    }

    /// Unbonding validators whose unbonding time has passed become unbonded
    fn unbond_mature_validators<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
    ) -> StakingResult<()> {
        for (key, _) in store.prefix_iterator(VALIDATOR_QUEUE_PREFIX) {
            let time = queue_key_time(VALIDATOR_QUEUE_PREFIX, &key).expect(KEY_DESER_ERROR);
            if time > header.time {
                break;
            }
            store.delete(&key);
            let operator = addresses_from_key(&key, VALIDATOR_QUEUE_PREFIX.len() + 8, 1)
                .and_then(|mut addresses| addresses.pop())
                .expect(KEY_DESER_ERROR);
            let Some(mut validator) = self.get_validator(store, &operator) else {
                continue;
            };
            if validator.status == ValidatorStatus::Unbonding {
                validator.status = ValidatorStatus::Unbonded;
                self.set_validator(store, &validator);
                debug!("staking: validator {} is unbonded", operator);
            }
            self.try_remove_validator(store, &operator)?;
        }
        Ok(())
    }

    /// Pays back the unbonding entries that matured
    fn complete_unbondings<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
    ) -> StakingResult<()> {
        for (key, _) in store.prefix_iterator(UNBONDING_QUEUE_PREFIX) {
            let time = queue_key_time(UNBONDING_QUEUE_PREFIX, &key).expect(KEY_DESER_ERROR);
            if time > header.time {
                break;
            }
            store.delete(&key);
            let addresses = addresses_from_key(&key, UNBONDING_QUEUE_PREFIX.len() + 8, 2)
                .expect(KEY_DESER_ERROR);
            let (delegator, operator) = (addresses[0], addresses[1]);
            let Some(mut ubd) = self.get_unbonding_delegation(store, &delegator, &operator) else {
                continue;
            };
            let (matured, pending): (Vec<_>, Vec<_>) = ubd
                .entries
                .into_iter()
                .partition(|entry| entry.is_mature(header.time));
            ubd.entries = pending;
            for entry in matured {
                if entry.balance > 0 {
                    let pool = self.get_pool(store).remove_unbonding(entry.balance)?;
                    self.set_pool(store, &pool);
                    self.ledger
                        .credit_coins(store, &delegator, &self.bond_coins(entry.balance)?)?;
                }
                quorum_trace!("staking.unbonding_completed", {
                    "delegator": delegator.to_string(),
                    "validator": operator.to_string(),
                    "balance": entry.balance
                });
            }
            self.set_unbonding_delegation(store, &ubd);
            self.try_remove_validator(store, &operator)?;
        }
        Ok(())
    }

    /// Drops the redelegation entries that matured
    fn complete_redelegations<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
    ) -> StakingResult<()> {
        for (key, _) in store.prefix_iterator(REDELEGATION_QUEUE_PREFIX) {
            let time = queue_key_time(REDELEGATION_QUEUE_PREFIX, &key).expect(KEY_DESER_ERROR);
            if time > header.time {
                break;
            }
            store.delete(&key);
            let addresses = addresses_from_key(&key, REDELEGATION_QUEUE_PREFIX.len() + 8, 3)
                .expect(KEY_DESER_ERROR);
            let (delegator, src, dst) = (addresses[0], addresses[1], addresses[2]);
            let Some(mut red) = self.get_redelegation(store, &delegator, &src, &dst) else {
                continue;
            };
            red.entries.retain(|entry| !entry.is_mature(header.time));
            self.set_redelegation(store, &red);
            self.try_remove_validator(store, &src)?;
            self.try_remove_validator(store, &dst)?;
        }
        Ok(())
    }
}
