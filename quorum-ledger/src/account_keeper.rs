// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{LedgerConfig, LedgerError, LedgerResult};
use quorum_db_exports::{
    KVRead, KVStore, ACCOUNT_DESER_ERROR, ACCOUNT_PREFIX, ACCOUNT_SER_ERROR,
    FEE_POOL_DESER_ERROR, FEE_POOL_KEY, FEE_POOL_SER_ERROR, NEXT_ACCOUNT_NUMBER_KEY,
    SUPPLY_DESER_ERROR, SUPPLY_PREFIX, SUPPLY_SER_ERROR,
};
use quorum_logging::quorum_trace;
use quorum_models::{
    Account, AccountDeserializer, AccountSerializer, Address, Coin, Coins, DecCoins,
    DecCoinsDeserializer, DecCoinsSerializer, Int, IntDeserializer, IntSerializer,
};
use quorum_serialization::{deserialize_exact, Serializer};
use tracing::debug;

/// Account store operations over a key-value state
#[derive(Clone)]
pub struct AccountKeeper {
    /// ledger configuration
    pub config: LedgerConfig,
    account_serializer: AccountSerializer,
    account_deserializer: AccountDeserializer,
    int_serializer: IntSerializer,
    int_deserializer: IntDeserializer,
    dec_coins_serializer: DecCoinsSerializer,
    dec_coins_deserializer: DecCoinsDeserializer,
}

fn account_key(address: &Address) -> Vec<u8> {
    [ACCOUNT_PREFIX, &address.to_bytes()[..]].concat()
}

fn supply_key(denom: &str) -> Vec<u8> {
    [SUPPLY_PREFIX, denom.as_bytes()].concat()
}

impl AccountKeeper {
    /// Creates an `AccountKeeper`
    pub fn new(config: LedgerConfig) -> Self {
        AccountKeeper {
            config,
            account_serializer: AccountSerializer::new(),
            account_deserializer: AccountDeserializer::new(),
            int_serializer: IntSerializer::new(),
            int_deserializer: IntDeserializer::new(),
            dec_coins_serializer: DecCoinsSerializer::new(),
            dec_coins_deserializer: DecCoinsDeserializer::new(),
        }
    }

    /// Account of `address`, `None` if it was never created
    pub fn get_account<S: KVRead + ?Sized>(&self, store: &S, address: &Address) -> Option<Account> {
        store.get(&account_key(address)).map(|bytes| {
            deserialize_exact(&self.account_deserializer, &bytes).expect(ACCOUNT_DESER_ERROR)
        })
    }

    /// Writes an account record
    pub fn set_account<S: KVStore + ?Sized>(&self, store: &mut S, account: &Account) {
        let mut bytes = Vec::new();
        self.account_serializer
            .serialize(account, &mut bytes)
            .expect(ACCOUNT_SER_ERROR);
        store.set(account_key(&account.address), bytes);
    }

    /// Every account, in address order
    pub fn get_all_accounts<S: KVRead + ?Sized>(&self, store: &S) -> Vec<Account> {
        store
            .prefix_iterator(ACCOUNT_PREFIX)
            .into_iter()
            .map(|(_, bytes)| {
                deserialize_exact(&self.account_deserializer, &bytes).expect(ACCOUNT_DESER_ERROR)
            })
            .collect()
    }

    /// Creates an empty account with the next account number.
    /// The account number of an existing account is never reassigned.
    pub fn new_account<S: KVStore + ?Sized>(&self, store: &mut S, address: &Address) -> Account {
        if let Some(account) = self.get_account(store, address) {
            return account;
        }
        let account_number = store
            .get(NEXT_ACCOUNT_NUMBER_KEY)
            .and_then(|bytes| bytes.try_into().ok())
            .map(u64::from_be_bytes)
            .unwrap_or(0);
        store.set(
            NEXT_ACCOUNT_NUMBER_KEY.to_vec(),
            account_number.saturating_add(1).to_be_bytes().to_vec(),
        );
        let account = Account {
            address: *address,
            coins: Coins::empty(),
            sequence: 0,
            account_number,
        };
        self.set_account(store, &account);
        debug!("ledger: new account {} number {}", address, account_number);
        account
    }

    /// Balance of `address` in `denom`, zero for unknown accounts
    pub fn get_balance<S: KVRead + ?Sized>(&self, store: &S, address: &Address, denom: &str) -> Int {
        self.get_account(store, address)
            .map(|account| account.coins.amount_of(denom))
            .unwrap_or_default()
    }

    /// Credits `amount` to `address`, creating the account if needed.
    /// Refused if the account would hold more denominations than allowed.
    pub fn add_coins<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
        amount: &Coins,
    ) -> LedgerResult<Coins> {
        self.credit(store, address, amount, true)
    }

    /// Credits tokens the chain owes to `address`: matured unbondings, fee shares.
    /// Not subject to the denomination cap, a payout is never refused.
    pub fn credit_coins<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
        amount: &Coins,
    ) -> LedgerResult<Coins> {
        self.credit(store, address, amount, false)
    }

    fn credit<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
        amount: &Coins,
        capped: bool,
    ) -> LedgerResult<Coins> {
        let mut account = self.new_account(store, address);
        let coins = account.coins.plus(amount)?;
        if !coins.is_not_negative() {
            return Err(LedgerError::InsufficientFunds(format!(
                "{} has {}, cannot add {}",
                address, account.coins, amount
            )));
        }
        if capped && coins.len() > self.config.max_denoms_per_account {
            return Err(LedgerError::InvalidRequest(format!(
                "{} would hold more than {} denominations",
                address, self.config.max_denoms_per_account
            )));
        }
        account.coins = coins.clone();
        self.set_account(store, &account);
        Ok(coins)
    }

    /// Debits `amount` from `address`, which must hold enough of every denomination
    pub fn subtract_coins<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
        amount: &Coins,
    ) -> LedgerResult<Coins> {
        let Some(mut account) = self.get_account(store, address) else {
            return Err(LedgerError::InsufficientFunds(format!(
                "unknown account {}",
                address
            )));
        };
        let coins = account.coins.minus(amount)?;
        if !coins.is_not_negative() {
            return Err(LedgerError::InsufficientFunds(format!(
                "{} has {}, needs {}",
                address, account.coins, amount
            )));
        }
        account.coins = coins.clone();
        self.set_account(store, &account);
        Ok(coins)
    }

    /// Moves `amount` from `from` to `to`
    pub fn send_coins<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> LedgerResult<()> {
        self.subtract_coins(store, from, amount)?;
        self.add_coins(store, to, amount)?;
        quorum_trace!("ledger.send", {
            "from": from.to_string(),
            "to": to.to_string(),
            "amount": amount.to_string()
        });
        Ok(())
    }

    /// Increments the sequence of an existing account and returns the new value
    pub fn increment_sequence<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
    ) -> LedgerResult<u64> {
        let mut account = self
            .get_account(store, address)
            .ok_or_else(|| LedgerError::InvalidRequest(format!("unknown account {}", address)))?;
        account.sequence = account.sequence.checked_add(1).ok_or_else(|| {
            LedgerError::InvalidRequest(format!("sequence overflow for {}", address))
        })?;
        self.set_account(store, &account);
        Ok(account.sequence)
    }

    /// Total supply of a denomination
    pub fn get_supply<S: KVRead + ?Sized>(&self, store: &S, denom: &str) -> Int {
        store
            .get(&supply_key(denom))
            .map(|bytes| deserialize_exact(&self.int_deserializer, &bytes).expect(SUPPLY_DESER_ERROR))
            .unwrap_or_default()
    }

    fn set_supply<S: KVStore + ?Sized>(&self, store: &mut S, denom: &str, supply: &Int) {
        if supply.is_zero() {
            store.delete(&supply_key(denom));
            return;
        }
        let mut bytes = Vec::new();
        self.int_serializer
            .serialize(supply, &mut bytes)
            .expect(SUPPLY_SER_ERROR);
        store.set(supply_key(denom), bytes);
    }

    /// Increases the supply of `coin.denom`. The caller credits the minted tokens somewhere.
    pub fn mint<S: KVStore + ?Sized>(&self, store: &mut S, coin: &Coin) -> LedgerResult<Int> {
        if coin.amount.is_negative() {
            return Err(LedgerError::InvalidRequest(format!("cannot mint {}", coin)));
        }
        let supply = self.get_supply(store, &coin.denom).checked_add(&coin.amount)?;
        self.set_supply(store, &coin.denom, &supply);
        quorum_trace!("ledger.mint", { "coin": coin.to_string(), "supply": supply.to_string() });
        Ok(supply)
    }

    /// Decreases the supply of `coin.denom`. The caller removed the burned tokens from circulation.
    pub fn burn<S: KVStore + ?Sized>(&self, store: &mut S, coin: &Coin) -> LedgerResult<Int> {
        if coin.amount.is_negative() {
            return Err(LedgerError::InvalidRequest(format!("cannot burn {}", coin)));
        }
        let supply = self.get_supply(store, &coin.denom).checked_sub(&coin.amount)?;
        if supply.is_negative() {
            return Err(LedgerError::InvariantViolation(format!(
                "burning {} leaves a negative supply",
                coin
            )));
        }
        self.set_supply(store, &coin.denom, &supply);
        quorum_trace!("ledger.burn", { "coin": coin.to_string(), "supply": supply.to_string() });
        Ok(supply)
    }

    /// Fees collected and not distributed yet
    pub fn get_fee_pool<S: KVRead + ?Sized>(&self, store: &S) -> DecCoins {
        store
            .get(FEE_POOL_KEY)
            .map(|bytes| {
                deserialize_exact(&self.dec_coins_deserializer, &bytes).expect(FEE_POOL_DESER_ERROR)
            })
            .unwrap_or_else(DecCoins::empty)
    }

    fn set_fee_pool<S: KVStore + ?Sized>(&self, store: &mut S, fee_pool: &DecCoins) {
        if fee_pool.is_empty() {
            store.delete(FEE_POOL_KEY);
            return;
        }
        let mut bytes = Vec::new();
        self.dec_coins_serializer
            .serialize(fee_pool, &mut bytes)
            .expect(FEE_POOL_SER_ERROR);
        store.set(FEE_POOL_KEY.to_vec(), bytes);
    }

    /// Debits `fee` from `payer` into the fee pool
    pub fn collect_fee<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        payer: &Address,
        fee: &Coins,
    ) -> LedgerResult<()> {
        if fee.is_empty() {
            return Ok(());
        }
        self.subtract_coins(store, payer, fee)?;
        let fee_pool = self.get_fee_pool(store).plus(&DecCoins::from_coins(fee)?)?;
        self.set_fee_pool(store, &fee_pool);
        Ok(())
    }

    /// Pays the whole part of the fee pool to `recipients`, pro rata to their weight.
    /// Whatever cannot be split into whole coins stays in the pool.
    /// Returns the distributed coins.
    pub fn distribute_fee_pool<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        recipients: &[(Address, u64)],
    ) -> LedgerResult<Coins> {
        let total_weight: u64 = recipients
            .iter()
            .try_fold(0u64, |acc, (_, weight)| acc.checked_add(*weight))
            .ok_or_else(|| LedgerError::InvalidRequest("total weight overflow".into()))?;
        let fee_pool = self.get_fee_pool(store);
        if total_weight == 0 || fee_pool.is_empty() {
            return Ok(Coins::empty());
        }
        let (whole, _) = fee_pool.truncate_decimal()?;
        let total_weight = Int::from(total_weight);
        let mut distributed = Coins::empty();
        for (recipient, weight) in recipients {
            let mut share = Vec::with_capacity(whole.len());
            for coin in whole.iter() {
                let amount = coin
                    .amount
                    .checked_mul(&Int::from(*weight))?
                    .checked_div(&total_weight)?;
                share.push(Coin {
                    denom: coin.denom.clone(),
                    amount,
                });
            }
            let share = Coins::new(share)?;
            if share.is_empty() {
                continue;
            }
            self.credit_coins(store, recipient, &share)?;
            distributed = distributed.plus(&share)?;
        }
        let remaining = fee_pool.minus(&DecCoins::from_coins(&distributed)?)?;
        self.set_fee_pool(store, &remaining);
        debug!("ledger: distributed fees {} remaining {}", distributed, remaining);
        Ok(distributed)
    }
}
