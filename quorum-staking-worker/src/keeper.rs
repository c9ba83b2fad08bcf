// Copyright (c) 2022 MASSA LABS <info@massa.net>

use quorum_db_exports::{
    KVRead, KVStore, DELEGATION_DESER_ERROR, DELEGATION_PREFIX, KEY_DESER_ERROR,
    LAST_POWER_PREFIX, POOL_DESER_ERROR, POOL_KEY, REDELEGATION_DESER_ERROR, STAKING_SER_ERROR,
    UNBONDING_DESER_ERROR, UNBONDING_PREFIX, VALIDATOR_DESER_ERROR, VALIDATOR_PREFIX,
};
use quorum_ledger::AccountKeeper;
use quorum_models::{constants::ADDRESS_SIZE_BYTES, Address, Coins};
use quorum_serialization::{deserialize_exact, Serializer};
use quorum_staking_exports::{
    keys::{
        addresses_from_key, delegation_key, delegation_prefix, last_power_key,
        redelegation_by_dst_key, redelegation_by_src_key, redelegation_key, unbonding_by_val_key,
        unbonding_key, validator_by_cons_key, validator_key,
    },
    Delegation, DelegationDeserializer, DelegationSerializer, Pool, PoolDeserializer,
    PoolSerializer, Redelegation, RedelegationDeserializer, RedelegationSerializer,
    StakingConfig, StakingError, StakingResult, UnbondingDelegation,
    UnbondingDelegationDeserializer, UnbondingDelegationSerializer, Validator,
    ValidatorDeserializer, ValidatorSerializer,
};
use quorum_time::QuorumTime;

/// Staking state machine: validators, delegations, unbonding and redelegation
/// queues, inflation and slashing of stake.
///
/// The keeper holds no state of its own. Every operation reads and writes the
/// key-value store it is given, so that the caller decides whether the
/// changes are kept.
#[derive(Clone)]
pub struct StakingKeeper {
    /// staking configuration
    pub config: StakingConfig,
    /// account store, source and destination of bonded tokens
    pub ledger: AccountKeeper,
    pool_serializer: PoolSerializer,
    pool_deserializer: PoolDeserializer,
    validator_serializer: ValidatorSerializer,
    validator_deserializer: ValidatorDeserializer,
    delegation_serializer: DelegationSerializer,
    delegation_deserializer: DelegationDeserializer,
    unbonding_serializer: UnbondingDelegationSerializer,
    unbonding_deserializer: UnbondingDelegationDeserializer,
    redelegation_serializer: RedelegationSerializer,
    redelegation_deserializer: RedelegationDeserializer,
}

impl StakingKeeper {
    /// Creates a `StakingKeeper` moving tokens through `ledger`
    pub fn new(config: StakingConfig, ledger: AccountKeeper) -> Self {
        StakingKeeper {
            config,
            ledger,
            pool_serializer: PoolSerializer::new(),
            pool_deserializer: PoolDeserializer::new(),
            validator_serializer: ValidatorSerializer::new(),
            validator_deserializer: ValidatorDeserializer::new(),
            delegation_serializer: DelegationSerializer::new(),
            delegation_deserializer: DelegationDeserializer::new(),
            unbonding_serializer: UnbondingDelegationSerializer::new(),
            unbonding_deserializer: UnbondingDelegationDeserializer::new(),
            redelegation_serializer: RedelegationSerializer::new(),
            redelegation_deserializer: RedelegationDeserializer::new(),
        }
    }

    /// Writes the genesis pool. Inflation starts at its minimum.
    pub fn init_pool<S: KVStore + ?Sized>(&self, store: &mut S, genesis_time: QuorumTime) {
        self.set_pool(store, &Pool::new(self.config.inflation_min, genesis_time));
    }

    /// Current pool, an empty one before genesis
    pub fn get_pool<S: KVRead + ?Sized>(&self, store: &S) -> Pool {
        store
            .get(POOL_KEY)
            .map(|bytes| deserialize_exact(&self.pool_deserializer, &bytes).expect(POOL_DESER_ERROR))
            .unwrap_or_else(|| Pool::new(self.config.inflation_min, QuorumTime::EPOCH))
    }

    pub(crate) fn set_pool<S: KVStore + ?Sized>(&self, store: &mut S, pool: &Pool) {
        let mut bytes = Vec::new();
        self.pool_serializer
            .serialize(pool, &mut bytes)
            .expect(STAKING_SER_ERROR);
        store.set(POOL_KEY.to_vec(), bytes);
    }

    /// Validator operated by `operator`
    pub fn get_validator<S: KVRead + ?Sized>(&self, store: &S, operator: &Address) -> Option<Validator> {
        store.get(&validator_key(operator)).map(|bytes| {
            deserialize_exact(&self.validator_deserializer, &bytes).expect(VALIDATOR_DESER_ERROR)
        })
    }

    /// Validator whose consensus key hashes to `consensus_address`
    pub fn get_validator_by_cons<S: KVRead + ?Sized>(
        &self,
        store: &S,
        consensus_address: &Address,
    ) -> Option<Validator> {
        let bytes = store.get(&validator_by_cons_key(consensus_address))?;
        let operator: [u8; ADDRESS_SIZE_BYTES] = bytes.as_slice().try_into().expect(KEY_DESER_ERROR);
        self.get_validator(store, &Address::from_bytes(&operator))
    }

    /// Every validator, by operator address
    pub fn get_validators<S: KVRead + ?Sized>(&self, store: &S) -> Vec<Validator> {
        store
            .prefix_iterator(VALIDATOR_PREFIX)
            .into_iter()
            .map(|(_, bytes)| {
                deserialize_exact(&self.validator_deserializer, &bytes).expect(VALIDATOR_DESER_ERROR)
            })
            .collect()
    }

    pub(crate) fn set_validator<S: KVStore + ?Sized>(&self, store: &mut S, validator: &Validator) {
        let mut bytes = Vec::new();
        self.validator_serializer
            .serialize(validator, &mut bytes)
            .expect(STAKING_SER_ERROR);
        store.set(validator_key(&validator.operator), bytes);
        store.set(
            validator_by_cons_key(&validator.consensus_address()),
            validator.operator.to_bytes().to_vec(),
        );
    }

    pub(crate) fn delete_validator<S: KVStore + ?Sized>(&self, store: &mut S, validator: &Validator) {
        store.delete(&validator_key(&validator.operator));
        store.delete(&validator_by_cons_key(&validator.consensus_address()));
    }

    /// Delegation of `delegator` to `validator`
    pub fn get_delegation<S: KVRead + ?Sized>(
        &self,
        store: &S,
        delegator: &Address,
        validator: &Address,
    ) -> Option<Delegation> {
        store.get(&delegation_key(delegator, validator)).map(|bytes| {
            deserialize_exact(&self.delegation_deserializer, &bytes).expect(DELEGATION_DESER_ERROR)
        })
    }

    /// Every delegation of `delegator`
    pub fn get_delegator_delegations<S: KVRead + ?Sized>(
        &self,
        store: &S,
        delegator: &Address,
    ) -> Vec<Delegation> {
        store
            .prefix_iterator(&delegation_prefix(delegator))
            .into_iter()
            .map(|(_, bytes)| {
                deserialize_exact(&self.delegation_deserializer, &bytes)
                    .expect(DELEGATION_DESER_ERROR)
            })
            .collect()
    }

    /// Every delegation of the chain
    pub fn get_all_delegations<S: KVRead + ?Sized>(&self, store: &S) -> Vec<Delegation> {
        store
            .prefix_iterator(DELEGATION_PREFIX)
            .into_iter()
            .map(|(_, bytes)| {
                deserialize_exact(&self.delegation_deserializer, &bytes)
                    .expect(DELEGATION_DESER_ERROR)
            })
            .collect()
    }

    /// Writes a delegation, removing it once it holds no share
    pub(crate) fn set_delegation<S: KVStore + ?Sized>(&self, store: &mut S, delegation: &Delegation) {
        let key = delegation_key(&delegation.delegator, &delegation.validator);
        if delegation.shares.is_zero() {
            store.delete(&key);
            return;
        }
        let mut bytes = Vec::new();
        self.delegation_serializer
            .serialize(delegation, &mut bytes)
            .expect(STAKING_SER_ERROR);
        store.set(key, bytes);
    }

    /// Pending unbondings of `delegator` from `validator`
    pub fn get_unbonding_delegation<S: KVRead + ?Sized>(
        &self,
        store: &S,
        delegator: &Address,
        validator: &Address,
    ) -> Option<UnbondingDelegation> {
        store.get(&unbonding_key(delegator, validator)).map(|bytes| {
            deserialize_exact(&self.unbonding_deserializer, &bytes).expect(UNBONDING_DESER_ERROR)
        })
    }

    /// Every pending unbonding of the chain
    pub fn get_all_unbonding_delegations<S: KVRead + ?Sized>(
        &self,
        store: &S,
    ) -> Vec<UnbondingDelegation> {
        store
            .prefix_iterator(UNBONDING_PREFIX)
            .into_iter()
            .map(|(_, bytes)| {
                deserialize_exact(&self.unbonding_deserializer, &bytes)
                    .expect(UNBONDING_DESER_ERROR)
            })
            .collect()
    }

    /// Writes an unbonding delegation and its by-validator index, removing both once empty
    pub(crate) fn set_unbonding_delegation<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        ubd: &UnbondingDelegation,
    ) {
        let key = unbonding_key(&ubd.delegator, &ubd.validator);
        let index_key = unbonding_by_val_key(&ubd.validator, &ubd.delegator);
        if ubd.entries.is_empty() {
            store.delete(&key);
            store.delete(&index_key);
            return;
        }
        let mut bytes = Vec::new();
        self.unbonding_serializer
            .serialize(ubd, &mut bytes)
            .expect(STAKING_SER_ERROR);
        store.set(key, bytes);
        store.set(index_key, Vec::new());
    }

    /// Pending redelegations of `delegator` from `src` to `dst`
    pub fn get_redelegation<S: KVRead + ?Sized>(
        &self,
        store: &S,
        delegator: &Address,
        src: &Address,
        dst: &Address,
    ) -> Option<Redelegation> {
        store.get(&redelegation_key(delegator, src, dst)).map(|bytes| {
            deserialize_exact(&self.redelegation_deserializer, &bytes)
                .expect(REDELEGATION_DESER_ERROR)
        })
    }

    /// Writes a redelegation and its two indexes, removing them once empty
    pub(crate) fn set_redelegation<S: KVStore + ?Sized>(&self, store: &mut S, red: &Redelegation) {
        let key = redelegation_key(&red.delegator, &red.validator_src, &red.validator_dst);
        let src_key = redelegation_by_src_key(&red.validator_src, &red.delegator, &red.validator_dst);
        let dst_key = redelegation_by_dst_key(&red.validator_dst, &red.delegator, &red.validator_src);
        if red.entries.is_empty() {
            store.delete(&key);
            store.delete(&src_key);
            store.delete(&dst_key);
            return;
        }
        let mut bytes = Vec::new();
        self.redelegation_serializer
            .serialize(red, &mut bytes)
            .expect(STAKING_SER_ERROR);
        store.set(key, bytes);
        store.set(src_key, Vec::new());
        store.set(dst_key, Vec::new());
    }

    /// Power of each validator of the current consensus set, by operator address
    pub fn get_last_validator_powers<S: KVRead + ?Sized>(&self, store: &S) -> Vec<(Address, u64)> {
        store
            .prefix_iterator(LAST_POWER_PREFIX)
            .into_iter()
            .map(|(key, value)| {
                let operator = addresses_from_key(&key, LAST_POWER_PREFIX.len(), 1)
                    .and_then(|mut addresses| addresses.pop())
                    .expect(KEY_DESER_ERROR);
                let power: [u8; 8] = value.as_slice().try_into().expect(KEY_DESER_ERROR);
                (operator, u64::from_be_bytes(power))
            })
            .collect()
    }

    pub(crate) fn set_last_power<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        operator: &Address,
        power: Option<u64>,
    ) {
        match power {
            Some(power) => store.set(last_power_key(operator), power.to_be_bytes().to_vec()),
            None => store.delete(&last_power_key(operator)),
        }
    }

    /// `amount` of the bond denomination
    pub(crate) fn bond_coins(&self, amount: u64) -> StakingResult<Coins> {
        Ok(Coins::single(&self.config.bond_denom, amount)?)
    }

    /// Fails with `InvalidRequest` if `operator` is not a validator
    pub(crate) fn require_validator<S: KVRead + ?Sized>(
        &self,
        store: &S,
        operator: &Address,
    ) -> StakingResult<Validator> {
        self.get_validator(store, operator)
            .ok_or_else(|| StakingError::InvalidRequest(format!("unknown validator {}", operator)))
    }
}
