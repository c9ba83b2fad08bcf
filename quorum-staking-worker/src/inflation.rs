// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::StakingKeeper;
use quorum_db_exports::KVStore;
use quorum_logging::quorum_trace;
use quorum_models::{BlockHeader, Coin, Dec};
use quorum_staking_exports::{Pool, StakingResult};
use quorum_time::QuorumTime;

/// Inflation is applied once per hour of block time
pub const HOURS_PER_YEAR: u64 = 8766;

impl StakingKeeper {
    /// Yearly inflation rate for the next hour.
    /// It moves toward `inflation_max` while the bonded ratio is below
    /// `goal_bonded` and toward `inflation_min` above it.
    pub fn next_inflation(&self, pool: &Pool, supply: u64) -> StakingResult<Dec> {
        let hours = Dec::from_u64(HOURS_PER_YEAR);
        let yearly_change = Dec::one()
            .checked_sub(&pool.bonded_ratio(supply)?.checked_div(&self.config.goal_bonded)?)?
            .checked_mul(&self.config.inflation_rate_change)?;
        let inflation = pool
            .inflation
            .checked_add(&yearly_change.checked_div(&hours)?)?;
        Ok(inflation
            .max(self.config.inflation_min)
            .min(self.config.inflation_max))
    }

    /// Mints the hourly provisions into the bonded pool if an hour of block
    /// time passed since the last update. Returns the minted tokens.
    pub fn process_provisions<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
    ) -> StakingResult<u64> {
        let mut pool = self.get_pool(store);
        let due = pool.inflation_last_time.saturating_add(QuorumTime::HOUR);
        if header.time < due {
            return Ok(0);
        }
        let supply = self
            .ledger
            .get_supply(store, &self.config.bond_denom)
            .to_u64()?;
        pool.inflation = self.next_inflation(&pool, supply)?;
        pool.inflation_last_time = header.time;
        // nobody would own the provisions of an empty bonded pool
        let provisions = if pool.bonded_shares.is_zero() {
            0
        } else {
            pool.inflation
                .mul_div_floor(supply, &Dec::from_u64(HOURS_PER_YEAR))?
        };
        if provisions > 0 {
            pool = pool.add_provisions(provisions)?;
            self.ledger
                .mint(store, &Coin::new(&self.config.bond_denom, provisions))?;
        }
        self.set_pool(store, &pool);
        quorum_trace!("staking.provisions", {
            "height": header.height,
            "inflation": pool.inflation.to_string(),
            "provisions": provisions
        });
        Ok(provisions)
    }
}
