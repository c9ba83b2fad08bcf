// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::StakingKeeper;
use quorum_db_exports::{KVStore, KEY_DESER_ERROR};
use quorum_logging::quorum_trace;
use quorum_models::{Address, BlockHeader, Coin, Dec};
use quorum_staking_exports::{
    keys::{addresses_from_key, redelegation_by_src_prefix, unbonding_by_val_prefix},
    StakingError, StakingResult,
};
use tracing::warn;

impl StakingKeeper {
    /// Slashes `fraction` of the stake the validator with consensus address
    /// `consensus_address` had at `infraction_height`, when its power was
    /// `power`. Stake that left the validator after the infraction is slashed
    /// first, from its unbonding and redelegation entries; the remainder is
    /// taken from the validator's tokens. Returns the burned tokens.
    pub fn slash<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        consensus_address: &Address,
        infraction_height: u64,
        power: u64,
        fraction: &Dec,
    ) -> StakingResult<u64> {
        if fraction.is_negative() || *fraction > Dec::one() {
            return Err(StakingError::InvalidRequest(format!(
                "slash fraction {} is not within [0, 1]",
                fraction
            )));
        }
        if infraction_height > header.height {
            return Err(StakingError::InvalidRequest(format!(
                "cannot slash infraction at future height {} (current {})",
                infraction_height, header.height
            )));
        }
        let Some(validator) = self.get_validator_by_cons(store, consensus_address) else {
            // the validator may have been removed after unbonding
            warn!(
                "staking: ignored slash of unknown validator {}",
                consensus_address
            );
            return Ok(0);
        };
        let operator = validator.operator;
        let stake = power
            .checked_mul(self.config.power_reduction)
            .ok_or_else(|| StakingError::Overflow("slashed stake".into()))?;
        let slash_amount = fraction.mul_div_floor(stake, &Dec::one())?;

        let mut remaining = slash_amount;
        let mut burned = 0u64;
        if infraction_height < header.height {
            let from_unbondings = self.slash_unbonding_delegations(
                store,
                header,
                &operator,
                infraction_height,
                fraction,
            )?;
            let (from_redelegations, dst_burned) =
                self.slash_redelegations(store, header, &operator, infraction_height, fraction)?;
            remaining = remaining
                .saturating_sub(from_unbondings)
                .saturating_sub(from_redelegations);
            burned = from_unbondings
                .checked_add(dst_burned)
                .ok_or_else(|| StakingError::Overflow("burned tokens".into()))?;
        }

        if remaining > 0 {
            let validator = self.require_validator(store, &operator)?;
            let pool = self.get_pool(store);
            let (validator, pool, removed) = validator.remove_tokens(&pool, remaining)?;
            self.set_pool(store, &pool);
            self.set_validator(store, &validator);
            burned = burned
                .checked_add(removed)
                .ok_or_else(|| StakingError::Overflow("burned tokens".into()))?;
        }
        if burned > 0 {
            self.ledger
                .burn(store, &Coin::new(&self.config.bond_denom, burned))?;
        }
        quorum_trace!("staking.slash", {
            "operator": operator.to_string(),
            "infraction_height": infraction_height,
            "power": power,
            "fraction": fraction.to_string(),
            "slash_amount": slash_amount,
            "burned": burned
        });
        Ok(burned)
    }

    /// Slashes the immature unbonding entries created at or after
    /// `infraction_height`. Returns the tokens taken, which left circulation.
    fn slash_unbonding_delegations<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        operator: &Address,
        infraction_height: u64,
        fraction: &Dec,
    ) -> StakingResult<u64> {
        let prefix = unbonding_by_val_prefix(operator);
        let mut total = 0u64;
        for (key, _) in store.prefix_iterator(&prefix) {
            let delegator = addresses_from_key(&key, prefix.len(), 1)
                .and_then(|mut addresses| addresses.pop())
                .expect(KEY_DESER_ERROR);
            let Some(mut ubd) = self.get_unbonding_delegation(store, &delegator, operator) else {
                continue;
            };
            let mut taken = 0u64;
            for entry in ubd.entries.iter_mut() {
                if entry.creation_height < infraction_height || entry.is_mature(header.time) {
                    continue;
                }
                let amount = fraction
                    .mul_div_floor(entry.initial_balance, &Dec::one())?
                    .min(entry.balance);
                entry.balance -= amount;
                taken += amount;
            }
            if taken == 0 {
                continue;
            }
            let pool = self.get_pool(store).remove_unbonding(taken)?;
            self.set_pool(store, &pool);
            self.set_unbonding_delegation(store, &ubd);
            total = total
                .checked_add(taken)
                .ok_or_else(|| StakingError::Overflow("slashed unbondings".into()))?;
        }
        Ok(total)
    }

    /// Slashes the immature redelegation entries out of `operator` created at
    /// or after `infraction_height`, by unbonding the matching part of their
    /// destination shares. Returns the slash amount accounted for and the
    /// tokens actually withdrawn from the destination validators.
    fn slash_redelegations<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        operator: &Address,
        infraction_height: u64,
        fraction: &Dec,
    ) -> StakingResult<(u64, u64)> {
        let prefix = redelegation_by_src_prefix(operator);
        let mut accounted = 0u64;
        let mut withdrawn = 0u64;
        for (key, _) in store.prefix_iterator(&prefix) {
            let addresses = addresses_from_key(&key, prefix.len(), 2).expect(KEY_DESER_ERROR);
            let (delegator, dst) = (addresses[0], addresses[1]);
            let Some(red) = self.get_redelegation(store, &delegator, operator, &dst) else {
                continue;
            };
            for entry in red.entries.iter() {
                if entry.creation_height < infraction_height || entry.is_mature(header.time) {
                    continue;
                }
                accounted = accounted.saturating_add(
                    fraction.mul_div_floor(entry.initial_balance, &Dec::one())?,
                );
                let Some(delegation) = self.get_delegation(store, &delegator, &dst) else {
                    continue;
                };
                let shares = entry.shares_dst.checked_mul(fraction)?.min(delegation.shares);
                if !shares.is_positive() {
                    continue;
                }
                let dst_validator = self.require_validator(store, &dst)?;
                let pool = self.get_pool(store);
                let (dst_validator, pool, tokens) = dst_validator.remove_del_shares(&pool, &shares)?;
                let mut delegation = delegation;
                delegation.shares = delegation.shares.checked_sub(&shares)?;
                self.set_pool(store, &pool);
                self.set_validator(store, &dst_validator);
                self.set_delegation(store, &delegation);
                withdrawn = withdrawn
                    .checked_add(tokens)
                    .ok_or_else(|| StakingError::Overflow("slashed redelegations".into()))?;
            }
        }
        Ok((accounted, withdrawn))
    }

    /// Excludes the validator with consensus address `consensus_address` from the consensus set
    pub fn jail<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        consensus_address: &Address,
    ) -> StakingResult<()> {
        self.set_jailed(store, consensus_address, true)
    }

    /// Lets a jailed validator compete for the consensus set again
    pub fn unjail<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        consensus_address: &Address,
    ) -> StakingResult<()> {
        self.set_jailed(store, consensus_address, false)
    }

    fn set_jailed<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        consensus_address: &Address,
        jailed: bool,
    ) -> StakingResult<()> {
        let Some(mut validator) = self.get_validator_by_cons(store, consensus_address) else {
            warn!(
                "staking: ignored jail update of unknown validator {}",
                consensus_address
            );
            return Ok(());
        };
        if validator.jailed == jailed {
            return Ok(());
        }
        validator.jailed = jailed;
        self.set_validator(store, &validator);
        quorum_trace!("staking.jail", {
            "operator": validator.operator.to_string(),
            "jailed": jailed
        });
        Ok(())
    }
}
