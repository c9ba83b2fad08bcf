// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::StakingKeeper;
use quorum_db_exports::{KVRead, KVStore};
use quorum_logging::quorum_trace;
use quorum_models::{Address, BlockHeader, Coin, Dec};
use quorum_signature::PublicKey;
use quorum_staking_exports::{
    keys::{
        addresses_from_key, redelegation_by_dst_prefix, redelegation_by_src_prefix,
        redelegation_queue_key, unbonding_by_val_prefix, unbonding_queue_key,
    },
    Delegation, Redelegation, RedelegationEntry, StakingError, StakingResult, UnbondingDelegation,
    UnbondingDelegationEntry, Validator, ValidatorStatus,
};
use quorum_time::QuorumTime;
use tracing::debug;

impl StakingKeeper {
    /// Registers a new validator and bonds `self_bond` from its operator
    pub fn create_validator<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        operator: &Address,
        consensus_pubkey: PublicKey,
        self_bond: &Coin,
    ) -> StakingResult<Validator> {
        if self.get_validator(store, operator).is_some() {
            return Err(StakingError::InvalidRequest(format!(
                "validator {} already exists",
                operator
            )));
        }
        let validator = Validator::new(*operator, consensus_pubkey);
        if self
            .get_validator_by_cons(store, &validator.consensus_address())
            .is_some()
        {
            return Err(StakingError::InvalidRequest(format!(
                "consensus key {} is already used",
                validator.consensus_pubkey
            )));
        }
        self.set_validator(store, &validator);
        quorum_trace!("staking.create_validator", {
            "operator": operator.to_string(),
            "consensus_address": validator.consensus_address().to_string()
        });
        self.delegate(store, operator, operator, self_bond)?;
        self.require_validator(store, operator)
    }

    /// Bonds `amount` from `delegator` to `operator`. Returns the issued delegator shares.
    pub fn delegate<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        delegator: &Address,
        operator: &Address,
        amount: &Coin,
    ) -> StakingResult<Dec> {
        if amount.denom != self.config.bond_denom {
            return Err(StakingError::InvalidRequest(format!(
                "only {} can be delegated, got {}",
                self.config.bond_denom, amount
            )));
        }
        if !amount.amount.is_positive() {
            return Err(StakingError::InvalidRequest(format!(
                "delegated amount must be positive, got {}",
                amount
            )));
        }
        let tokens = amount.amount.to_u64()?;
        let validator = self.require_validator(store, operator)?;
        self.ledger
            .subtract_coins(store, delegator, &self.bond_coins(tokens)?)?;
        let (_, shares) = self.delegate_tokens(store, delegator, &validator, tokens)?;
        quorum_trace!("staking.delegate", {
            "delegator": delegator.to_string(),
            "validator": operator.to_string(),
            "tokens": tokens,
            "shares": shares.to_string()
        });
        Ok(shares)
    }

    /// Deposits tokens already taken out of circulation into `validator` on behalf of `delegator`
    fn delegate_tokens<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        delegator: &Address,
        validator: &Validator,
        tokens: u64,
    ) -> StakingResult<(Validator, Dec)> {
        let pool = self.get_pool(store);
        let (validator, pool, issued) = validator.add_tokens_from_del(&pool, tokens)?;
        let mut delegation = self
            .get_delegation(store, delegator, &validator.operator)
            .unwrap_or_else(|| Delegation {
                delegator: *delegator,
                validator: validator.operator,
                shares: Dec::zero(),
            });
        delegation.shares = delegation.shares.checked_add(&issued)?;
        self.set_pool(store, &pool);
        self.set_validator(store, &validator);
        self.set_delegation(store, &delegation);
        Ok((validator, issued))
    }

    /// Burns `shares` of the delegation of `delegator` to `validator`. Returns the withdrawn tokens.
    fn unbond<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        delegator: &Address,
        validator: &Validator,
        shares: &Dec,
    ) -> StakingResult<(Validator, u64)> {
        let mut delegation = self
            .get_delegation(store, delegator, &validator.operator)
            .ok_or_else(|| {
                StakingError::InvalidRequest(format!(
                    "{} has no delegation to {}",
                    delegator, validator.operator
                ))
            })?;
        if *shares > delegation.shares {
            return Err(StakingError::InvalidRequest(format!(
                "{} holds {} shares of {}, cannot unbond {}",
                delegator, delegation.shares, validator.operator, shares
            )));
        }
        let pool = self.get_pool(store);
        let (validator, pool, tokens) = validator.remove_del_shares(&pool, shares)?;
        delegation.shares = delegation.shares.checked_sub(shares)?;
        self.set_pool(store, &pool);
        self.set_validator(store, &validator);
        self.set_delegation(store, &delegation);
        Ok((validator, tokens))
    }

    /// Checks an unbond request before any write and returns the token value of `shares`
    fn validate_unbond<S: KVRead + ?Sized>(
        &self,
        store: &S,
        delegator: &Address,
        validator: &Validator,
        shares: &Dec,
    ) -> StakingResult<u64> {
        if !shares.is_positive() {
            return Err(StakingError::InvalidRequest(format!(
                "unbonded shares must be positive, got {}",
                shares
            )));
        }
        let delegation = self
            .get_delegation(store, delegator, &validator.operator)
            .ok_or_else(|| {
                StakingError::InvalidRequest(format!(
                    "{} has no delegation to {}",
                    delegator, validator.operator
                ))
            })?;
        if *shares > delegation.shares {
            return Err(StakingError::InvalidRequest(format!(
                "{} holds {} shares of {}, cannot unbond {}",
                delegator, delegation.shares, validator.operator, shares
            )));
        }
        validator.shares_to_tokens(&self.get_pool(store), shares)
    }

    /// Completion time of tokens leaving `validator` now, `None` if they are free immediately
    pub(crate) fn unbonding_completion(
        &self,
        validator: &Validator,
        header: &BlockHeader,
    ) -> StakingResult<Option<QuorumTime>> {
        match validator.status {
            ValidatorStatus::Bonded => Ok(Some(
                header
                    .time
                    .checked_add(self.config.unbonding_time)
                    .map_err(|err| StakingError::Overflow(err.to_string()))?,
            )),
            ValidatorStatus::Unbonding if validator.unbonding_time > header.time => {
                Ok(Some(validator.unbonding_time))
            }
            _ => Ok(None),
        }
    }

    /// Withdraws `shares` of the delegation of `delegator` to `operator`.
    /// The tokens are paid back at the returned completion time, or right away
    /// when the validator is not bonded anymore.
    pub fn undelegate<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        delegator: &Address,
        operator: &Address,
        shares: &Dec,
    ) -> StakingResult<(u64, Option<QuorumTime>)> {
        let validator = self.require_validator(store, operator)?;
        let value = self.validate_unbond(store, delegator, &validator, shares)?;
        if value == 0 {
            return Err(StakingError::InvalidRequest(format!(
                "{} shares of {} are worth no token",
                shares, operator
            )));
        }
        let completion = self.unbonding_completion(&validator, header)?;
        let mut ubd = self
            .get_unbonding_delegation(store, delegator, operator)
            .unwrap_or_else(|| UnbondingDelegation {
                delegator: *delegator,
                validator: *operator,
                entries: Vec::new(),
            });
        if completion.is_some() && ubd.entries.len() >= self.config.max_entries as usize {
            return Err(StakingError::MaxEntriesExceeded(format!(
                "{} already has {} unbonding entries from {}",
                delegator,
                ubd.entries.len(),
                operator
            )));
        }

        let (_, tokens) = self.unbond(store, delegator, &validator, shares)?;
        match completion {
            Some(completion_time) => {
                let pool = self.get_pool(store).add_unbonding(tokens)?;
                self.set_pool(store, &pool);
                ubd.entries.push(UnbondingDelegationEntry {
                    creation_height: header.height,
                    completion_time,
                    initial_balance: tokens,
                    balance: tokens,
                });
                self.set_unbonding_delegation(store, &ubd);
                store.set(
                    unbonding_queue_key(completion_time, delegator, operator),
                    Vec::new(),
                );
            }
            None => {
                self.ledger
                    .credit_coins(store, delegator, &self.bond_coins(tokens)?)?;
            }
        }
        self.try_remove_validator(store, operator)?;
        quorum_trace!("staking.undelegate", {
            "delegator": delegator.to_string(),
            "validator": operator.to_string(),
            "shares": shares.to_string(),
            "tokens": tokens,
            "completion_time": completion.map(|t| t.to_millis())
        });
        Ok((tokens, completion))
    }

    /// Moves `shares` of the delegation of `delegator` from `src` to `dst`.
    /// The tokens are bonded to `dst` right away; the returned entry keeps them
    /// slashable for `src` infractions until its completion time.
    pub fn begin_redelegation<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        delegator: &Address,
        src: &Address,
        dst: &Address,
        shares: &Dec,
    ) -> StakingResult<(Dec, Option<QuorumTime>)> {
        if src == dst {
            return Err(StakingError::SelfRedelegation);
        }
        let src_validator = self.require_validator(store, src)?;
        let dst_validator = self.require_validator(store, dst)?;
        if self.has_receiving_redelegation(store, header, delegator, src) {
            return Err(StakingError::InvalidRequest(format!(
                "{} redelegated to {} recently, the tokens cannot move again before maturity",
                delegator, src
            )));
        }
        let value = self.validate_unbond(store, delegator, &src_validator, shares)?;
        if value == 0 {
            return Err(StakingError::InvalidRequest(format!(
                "{} shares of {} are worth no token",
                shares, src
            )));
        }
        let completion = self.unbonding_completion(&src_validator, header)?;
        let mut red = self
            .get_redelegation(store, delegator, src, dst)
            .unwrap_or_else(|| Redelegation {
                delegator: *delegator,
                validator_src: *src,
                validator_dst: *dst,
                entries: Vec::new(),
            });
        if completion.is_some() && red.entries.len() >= self.config.max_entries as usize {
            return Err(StakingError::MaxEntriesExceeded(format!(
                "{} already has {} redelegation entries from {} to {}",
                delegator,
                red.entries.len(),
                src,
                dst
            )));
        }

        let (_, tokens) = self.unbond(store, delegator, &src_validator, shares)?;
        let dst_validator = self.require_validator(store, &dst_validator.operator)?;
        let (_, shares_dst) = self.delegate_tokens(store, delegator, &dst_validator, tokens)?;
        if let Some(completion_time) = completion {
            red.entries.push(RedelegationEntry {
                creation_height: header.height,
                completion_time,
                initial_balance: tokens,
                shares_src: *shares,
                shares_dst,
            });
            self.set_redelegation(store, &red);
            store.set(
                redelegation_queue_key(completion_time, delegator, src, dst),
                Vec::new(),
            );
        }
        self.try_remove_validator(store, src)?;
        quorum_trace!("staking.begin_redelegation", {
            "delegator": delegator.to_string(),
            "src": src.to_string(),
            "dst": dst.to_string(),
            "shares_src": shares.to_string(),
            "shares_dst": shares_dst.to_string(),
            "tokens": tokens,
            "completion_time": completion.map(|t| t.to_millis())
        });
        Ok((shares_dst, completion))
    }

    /// true if `delegator` has an immature redelegation into `validator`
    fn has_receiving_redelegation<S: KVRead + ?Sized>(
        &self,
        store: &S,
        header: &BlockHeader,
        delegator: &Address,
        validator: &Address,
    ) -> bool {
        let prefix = redelegation_by_dst_prefix(validator, Some(delegator));
        store.prefix_iterator(&prefix).into_iter().any(|(key, _)| {
            addresses_from_key(&key, prefix.len(), 1)
                .and_then(|mut src| src.pop())
                .and_then(|src| self.get_redelegation(store, delegator, &src, validator))
                .map(|red| red.entries.iter().any(|e| !e.is_mature(header.time)))
                .unwrap_or(false)
        })
    }

    /// Deletes `operator` once it is unbonded and nothing refers to it anymore.
    /// Returns true if it was deleted.
    pub(crate) fn try_remove_validator<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        operator: &Address,
    ) -> StakingResult<bool> {
        let Some(validator) = self.get_validator(store, operator) else {
            return Ok(false);
        };
        if validator.status != ValidatorStatus::Unbonded
            || !validator.liabilities.is_zero()
            || !validator.assets.is_zero()
        {
            return Ok(false);
        }
        if !store.prefix_iterator(&unbonding_by_val_prefix(operator)).is_empty()
            || !store.prefix_iterator(&redelegation_by_src_prefix(operator)).is_empty()
            || !store
                .prefix_iterator(&redelegation_by_dst_prefix(operator, None))
                .is_empty()
        {
            return Ok(false);
        }
        self.delete_validator(store, &validator);
        debug!("staking: removed empty validator {}", operator);
        Ok(true)
    }
}
