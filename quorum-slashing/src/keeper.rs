// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{
    SlashingConfig, SlashingError, SlashingResult, ValidatorSigningInfo,
    ValidatorSigningInfoDeserializer, ValidatorSigningInfoSerializer, ValidatorSlashingPeriod,
    ValidatorSlashingPeriodDeserializer, ValidatorSlashingPeriodSerializer,
};
use quorum_db_exports::{
    KVRead, KVStore, MISSED_BLOCKS_PREFIX, SIGNING_INFO_DESER_ERROR, SIGNING_INFO_PREFIX,
    SLASHING_PERIOD_DESER_ERROR, SLASHING_PERIOD_PREFIX, SLASHING_SER_ERROR,
};
use quorum_logging::quorum_trace;
use quorum_models::{Address, BlockHeader, Dec};
use quorum_serialization::{deserialize_exact, Serializer};
use quorum_staking_exports::{StakingHooks, Validator, ValidatorStatus};
use quorum_time::QuorumTime;
use tracing::{debug, info, warn};

/// `signinginfo/<consensus address>`
fn signing_info_key(consensus_address: &Address) -> Vec<u8> {
    [SIGNING_INFO_PREFIX, &consensus_address.to_bytes()[..]].concat()
}

/// `slashingperiod/<consensus address>`
fn slashing_period_prefix(consensus_address: &Address) -> Vec<u8> {
    [SLASHING_PERIOD_PREFIX, &consensus_address.to_bytes()[..]].concat()
}

/// `slashingperiod/<consensus address><start height>`
fn slashing_period_key(consensus_address: &Address, start_height: u64) -> Vec<u8> {
    [
        &slashing_period_prefix(consensus_address)[..],
        &start_height.to_be_bytes()[..],
    ]
    .concat()
}

/// `missedblocks/<consensus address>`
fn missed_blocks_prefix(consensus_address: &Address) -> Vec<u8> {
    [MISSED_BLOCKS_PREFIX, &consensus_address.to_bytes()[..]].concat()
}

/// `missedblocks/<consensus address><index>`
fn missed_block_key(consensus_address: &Address, index: u64) -> Vec<u8> {
    [
        &missed_blocks_prefix(consensus_address)[..],
        &index.to_be_bytes()[..],
    ]
    .concat()
}

/// Action the staking keeper must apply on behalf of the slashing module
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlashingCommand {
    /// slash `fraction` of the stake the validator had at `infraction_height`
    Slash {
        /// consensus address of the validator
        consensus_address: Address,
        /// height of the infraction
        infraction_height: u64,
        /// consensus power of the validator at the infraction
        power: u64,
        /// fraction of the stake to slash
        fraction: Dec,
    },
    /// exclude the validator from the consensus set
    Jail {
        /// consensus address of the validator
        consensus_address: Address,
    },
}

/// Liveness and double-sign tracking. Like the staking keeper, it holds no
/// state and works on the store it is given.
#[derive(Clone)]
pub struct SlashingKeeper {
    /// slashing configuration
    pub config: SlashingConfig,
    signing_info_serializer: ValidatorSigningInfoSerializer,
    signing_info_deserializer: ValidatorSigningInfoDeserializer,
    period_serializer: ValidatorSlashingPeriodSerializer,
    period_deserializer: ValidatorSlashingPeriodDeserializer,
}

impl SlashingKeeper {
    /// Creates a `SlashingKeeper`
    pub fn new(config: SlashingConfig) -> Self {
        SlashingKeeper {
            config,
            signing_info_serializer: ValidatorSigningInfoSerializer::new(),
            signing_info_deserializer: ValidatorSigningInfoDeserializer::new(),
            period_serializer: ValidatorSlashingPeriodSerializer::new(),
            period_deserializer: ValidatorSlashingPeriodDeserializer::new(),
        }
    }

    /// Subscriptions of the slashing module to the bonding transitions of the staking module
    pub fn hooks(&self) -> StakingHooks {
        let bonded = self.clone();
        let unbonding = self.clone();
        StakingHooks {
            on_validator_bonded: Some(Box::new(
                move |store: &mut dyn KVStore, header: &BlockHeader, consensus_address: &Address| {
                    bonded
                        .on_validator_bonded(store, header, consensus_address)
                        .map_err(Into::into)
                },
            )),
            on_validator_begin_unbonding: Some(Box::new(
                move |store: &mut dyn KVStore, header: &BlockHeader, consensus_address: &Address| {
                    unbonding
                        .on_validator_begin_unbonding(store, header, consensus_address)
                        .map_err(Into::into)
                },
            )),
        }
    }

    /// Liveness record of the validator with consensus address `consensus_address`
    pub fn get_signing_info<S: KVRead + ?Sized>(
        &self,
        store: &S,
        consensus_address: &Address,
    ) -> Option<ValidatorSigningInfo> {
        store.get(&signing_info_key(consensus_address)).map(|bytes| {
            deserialize_exact(&self.signing_info_deserializer, &bytes)
                .expect(SIGNING_INFO_DESER_ERROR)
        })
    }

    fn set_signing_info<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        consensus_address: &Address,
        info: &ValidatorSigningInfo,
    ) {
        let mut bytes = Vec::new();
        self.signing_info_serializer
            .serialize(info, &mut bytes)
            .expect(SLASHING_SER_ERROR);
        store.set(signing_info_key(consensus_address), bytes);
    }

    /// Every slashing period of a validator, by start height
    pub fn get_slashing_periods<S: KVRead + ?Sized>(
        &self,
        store: &S,
        consensus_address: &Address,
    ) -> Vec<ValidatorSlashingPeriod> {
        store
            .prefix_iterator(&slashing_period_prefix(consensus_address))
            .into_iter()
            .map(|(_, bytes)| {
                deserialize_exact(&self.period_deserializer, &bytes)
                    .expect(SLASHING_PERIOD_DESER_ERROR)
            })
            .collect()
    }

    /// The slashing period that was open at `height`: the last one started at or before it
    pub fn get_slashing_period_for_height<S: KVRead + ?Sized>(
        &self,
        store: &S,
        consensus_address: &Address,
        height: u64,
    ) -> SlashingResult<ValidatorSlashingPeriod> {
        let periods = self.get_slashing_periods(store, consensus_address);
        if periods.is_empty() {
            return Err(SlashingError::InvariantViolation(format!(
                "validator {} has no slashing period",
                consensus_address
            )));
        }
        periods
            .into_iter()
            .rev()
            .find(|period| period.start_height <= height)
            .ok_or_else(|| {
                SlashingError::InvalidRequest(format!(
                    "validator {} was not bonded at height {}",
                    consensus_address, height
                ))
            })
    }

    fn set_slashing_period<S: KVStore + ?Sized>(&self, store: &mut S, period: &ValidatorSlashingPeriod) {
        let mut bytes = Vec::new();
        self.period_serializer
            .serialize(period, &mut bytes)
            .expect(SLASHING_SER_ERROR);
        store.set(
            slashing_period_key(&period.validator, period.start_height),
            bytes,
        );
    }

    /// Whether the block at `index` of the window was signed
    fn get_window_bit<S: KVRead + ?Sized>(
        &self,
        store: &S,
        consensus_address: &Address,
        index: u64,
    ) -> bool {
        store
            .get(&missed_block_key(consensus_address, index))
            .map(|bytes| bytes.first() == Some(&1))
            .unwrap_or(false)
    }

    fn set_window_bit<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        consensus_address: &Address,
        index: u64,
        signed: bool,
    ) {
        store.set(
            missed_block_key(consensus_address, index),
            vec![u8::from(signed)],
        );
    }

    fn clear_window<S: KVStore + ?Sized>(&self, store: &mut S, consensus_address: &Address) {
        for (key, _) in store.prefix_iterator(&missed_blocks_prefix(consensus_address)) {
            store.delete(&key);
        }
    }

    /// Bonding hook: creates the signing info of a validator bonded for the
    /// first time and opens a slashing period at the current height.
    /// The signing info of a rebonded validator is left as is.
    pub fn on_validator_bonded<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        consensus_address: &Address,
    ) -> SlashingResult<()> {
        if self.get_signing_info(store, consensus_address).is_none() {
            self.set_signing_info(
                store,
                consensus_address,
                &ValidatorSigningInfo::new(header.height),
            );
        }
        self.set_slashing_period(
            store,
            &ValidatorSlashingPeriod::new(*consensus_address, header.height),
        );
        quorum_trace!("slashing.period_opened", {
            "validator": consensus_address.to_string(),
            "height": header.height
        });
        Ok(())
    }

    /// Unbonding hook: closes the slashing period open at the current height
    pub fn on_validator_begin_unbonding<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        consensus_address: &Address,
    ) -> SlashingResult<()> {
        let mut period = self
            .get_slashing_period_for_height(store, consensus_address, header.height)
            .map_err(|err| match err {
                SlashingError::InvalidRequest(msg) => SlashingError::InvariantViolation(msg),
                other => other,
            })?;
        period.end_height = header.height;
        self.set_slashing_period(store, &period);
        quorum_trace!("slashing.period_closed", {
            "validator": consensus_address.to_string(),
            "start_height": period.start_height,
            "end_height": period.end_height
        });
        Ok(())
    }

    /// Records whether the validator signed the previous block. Once a full
    /// window has been recorded, a validator that signed fewer blocks than
    /// required is slashed and jailed, and its window starts over.
    ///
    /// `jailed` is the jail status of the validator, `None` if it no longer exists.
    pub fn handle_validator_signature<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        consensus_address: &Address,
        power: u64,
        signed: bool,
        jailed: Option<bool>,
    ) -> SlashingResult<Vec<SlashingCommand>> {
        let window = self.config.signed_blocks_window;
        if window == 0 {
            return Err(SlashingError::InvalidRequest(
                "signed blocks window is empty".into(),
            ));
        }
        let mut info = self
            .get_signing_info(store, consensus_address)
            .ok_or_else(|| {
                SlashingError::InvalidRequest(format!(
                    "no signing info for validator {}",
                    consensus_address
                ))
            })?;
        let index = info.index_offset % window;
        info.index_offset = info
            .index_offset
            .checked_add(1)
            .ok_or_else(|| SlashingError::Overflow("signing index offset".into()))?;

        let previous = self.get_window_bit(store, consensus_address, index);
        if previous != signed {
            self.set_window_bit(store, consensus_address, index, signed);
            if signed {
                info.signed_blocks_counter += 1;
            } else {
                info.signed_blocks_counter = info.signed_blocks_counter.saturating_sub(1);
            }
        }

        let min_signed = self
            .config
            .min_signed_per_window
            .mul_div_floor(window, &Dec::one())?;
        if !signed {
            debug!(
                "slashing: validator {} missed block {}, {} signed, threshold {}",
                consensus_address, header.height, info.signed_blocks_counter, min_signed
            );
        }

        let mut commands = Vec::new();
        // judged once a full window has been recorded
        if info.index_offset > window && info.signed_blocks_counter < min_signed {
            match jailed {
                Some(false) => {
                    info!(
                        "slashing: validator {} is down at height {}, slashing and jailing",
                        consensus_address, header.height
                    );
                    // the missed vote belongs to the previous block
                    commands.push(SlashingCommand::Slash {
                        consensus_address: *consensus_address,
                        infraction_height: header.height.saturating_sub(1),
                        power,
                        fraction: self.config.slash_fraction_downtime,
                    });
                    commands.push(SlashingCommand::Jail {
                        consensus_address: *consensus_address,
                    });
                    info.jailed_until = header
                        .time
                        .checked_add(self.config.downtime_jail_duration)
                        .map_err(|err| SlashingError::Overflow(err.to_string()))?;
                    info.signed_blocks_counter = 0;
                    info.index_offset = 0;
                    self.clear_window(store, consensus_address);
                    quorum_trace!("slashing.downtime", {
                        "validator": consensus_address.to_string(),
                        "height": header.height,
                        "jailed_until": info.jailed_until.to_millis()
                    });
                }
                Some(true) => {}
                None => debug!(
                    "slashing: downtime of removed validator {} ignored",
                    consensus_address
                ),
            }
        }
        self.set_signing_info(store, consensus_address, &info);
        Ok(commands)
    }

    /// Handles evidence that the validator `validator` signed two blocks at
    /// `infraction_height`. Returns the slash and jail to apply, if any.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_double_sign<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        header: &BlockHeader,
        consensus_address: &Address,
        validator: Option<&Validator>,
        infraction_height: u64,
        infraction_time: QuorumTime,
        power: u64,
    ) -> SlashingResult<Vec<SlashingCommand>> {
        if infraction_height > header.height {
            return Err(SlashingError::InvalidRequest(format!(
                "evidence at future height {} (current {})",
                infraction_height, header.height
            )));
        }
        let age = header.time.saturating_sub(infraction_time);
        if age > self.config.max_evidence_age {
            info!(
                "slashing: ignored double sign of {} at height {}, evidence is {} ms old",
                consensus_address,
                infraction_height,
                age.to_millis()
            );
            return Ok(Vec::new());
        }
        let validator = match validator {
            Some(validator) if validator.status != ValidatorStatus::Unbonded => validator,
            _ => {
                warn!(
                    "slashing: ignored double sign of unbonded or unknown validator {}",
                    consensus_address
                );
                return Ok(Vec::new());
            }
        };

        let fraction = self.cap_by_slashing_period(
            store,
            consensus_address,
            &self.config.slash_fraction_double_sign,
            infraction_height,
        )?;
        let mut commands = Vec::new();
        if fraction.is_positive() {
            commands.push(SlashingCommand::Slash {
                consensus_address: *consensus_address,
                infraction_height,
                power,
                fraction,
            });
        }
        if !validator.jailed {
            commands.push(SlashingCommand::Jail {
                consensus_address: *consensus_address,
            });
        }

        let mut info = self
            .get_signing_info(store, consensus_address)
            .ok_or_else(|| {
                SlashingError::InvariantViolation(format!(
                    "bonded validator {} has no signing info",
                    consensus_address
                ))
            })?;
        let jailed_until = header
            .time
            .checked_add(self.config.double_sign_jail_duration)
            .map_err(|err| SlashingError::Overflow(err.to_string()))?;
        info.jailed_until = info.jailed_until.max(jailed_until);
        self.set_signing_info(store, consensus_address, &info);
        quorum_trace!("slashing.double_sign", {
            "validator": consensus_address.to_string(),
            "infraction_height": infraction_height,
            "fraction": fraction.to_string(),
            "jailed_until": info.jailed_until.to_millis()
        });
        Ok(commands)
    }

    /// Raises the fraction slashed in the period open at `height` to
    /// `fraction` and returns the part that was not slashed yet
    fn cap_by_slashing_period<S: KVStore + ?Sized>(
        &self,
        store: &mut S,
        consensus_address: &Address,
        fraction: &Dec,
        height: u64,
    ) -> SlashingResult<Dec> {
        let mut period = self.get_slashing_period_for_height(store, consensus_address, height)?;
        let current = period.slashed_so_far;
        let new = current.max(*fraction);
        period.slashed_so_far = new;
        self.set_slashing_period(store, &period);
        Ok(new.checked_sub(&current)?)
    }

    /// Checks that `validator` may leave jail at the current block time
    pub fn check_unjail<S: KVRead + ?Sized>(
        &self,
        store: &S,
        header: &BlockHeader,
        validator: &Validator,
    ) -> SlashingResult<()> {
        if !validator.jailed {
            return Err(SlashingError::InvalidRequest(format!(
                "validator {} is not jailed",
                validator.operator
            )));
        }
        let consensus_address = validator.consensus_address();
        let info = self
            .get_signing_info(store, &consensus_address)
            .ok_or_else(|| {
                SlashingError::InvalidRequest(format!(
                    "validator {} has no signing info",
                    validator.operator
                ))
            })?;
        if header.time < info.jailed_until {
            return Err(SlashingError::InvalidRequest(format!(
                "validator {} is jailed until {} ms",
                validator.operator,
                info.jailed_until.to_millis()
            )));
        }
        Ok(())
    }
}
