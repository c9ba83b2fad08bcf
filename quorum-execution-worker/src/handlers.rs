// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Message handlers of the bank, staking and slashing modules

use crate::router::{decode_payload, tag, Handler, Tags};
use quorum_db_exports::CacheView;
use quorum_execution_exports::{
    ExecutionError, ExecutionResult, Message, Msg, MsgBeginRedelegateDeserializer,
    MsgCreateValidatorDeserializer, MsgDelegateDeserializer, MsgSendDeserializer,
    MsgUndelegateDeserializer, MsgUnjailDeserializer, ROUTE_BEGIN_REDELEGATE,
    ROUTE_CREATE_VALIDATOR, ROUTE_DELEGATE, ROUTE_SEND, ROUTE_UNDELEGATE, ROUTE_UNJAIL,
};
use quorum_ledger::AccountKeeper;
use quorum_models::BlockHeader;
use quorum_slashing::SlashingKeeper;
use quorum_staking_worker::StakingKeeper;

fn unexpected(module: &str, message: &Message) -> ExecutionError {
    ExecutionError::InternalError(format!(
        "{} handler cannot apply {}",
        module,
        message.route()
    ))
}

/// `bank/*`
pub(crate) struct BankHandler {
    ledger: AccountKeeper,
    send_deserializer: MsgSendDeserializer,
}

impl BankHandler {
    pub fn new(ledger: AccountKeeper) -> Self {
        BankHandler {
            ledger,
            send_deserializer: MsgSendDeserializer::new(),
        }
    }
}

impl Handler for BankHandler {
    fn decode(&self, msg: &Msg) -> ExecutionResult<Message> {
        match msg.route.as_str() {
            ROUTE_SEND => Ok(Message::Send(decode_payload(&self.send_deserializer, msg)?)),
            other => Err(ExecutionError::UnknownTxType(other.to_string())),
        }
    }

    fn execute(
        &self,
        store: &mut CacheView,
        _header: &BlockHeader,
        message: &Message,
    ) -> ExecutionResult<Tags> {
        let Message::Send(send) = message else {
            return Err(unexpected("bank", message));
        };
        if send.amount.is_empty() {
            return Err(ExecutionError::InvalidRequest("nothing to send".into()));
        }
        self.ledger
            .send_coins(store, &send.from, &send.to, &send.amount)?;
        Ok(vec![
            tag("action", ROUTE_SEND),
            tag("sender", send.from),
            tag("recipient", send.to),
            tag("amount", &send.amount),
        ])
    }
}

/// `staking/*`
pub(crate) struct StakingHandler {
    staking: StakingKeeper,
    create_validator_deserializer: MsgCreateValidatorDeserializer,
    delegate_deserializer: MsgDelegateDeserializer,
    undelegate_deserializer: MsgUndelegateDeserializer,
    redelegate_deserializer: MsgBeginRedelegateDeserializer,
}

impl StakingHandler {
    pub fn new(staking: StakingKeeper) -> Self {
        StakingHandler {
            staking,
            create_validator_deserializer: MsgCreateValidatorDeserializer::new(),
            delegate_deserializer: MsgDelegateDeserializer::new(),
            undelegate_deserializer: MsgUndelegateDeserializer::new(),
            redelegate_deserializer: MsgBeginRedelegateDeserializer::new(),
        }
    }
}

impl Handler for StakingHandler {
    fn decode(&self, msg: &Msg) -> ExecutionResult<Message> {
        Ok(match msg.route.as_str() {
            ROUTE_CREATE_VALIDATOR => Message::CreateValidator(decode_payload(
                &self.create_validator_deserializer,
                msg,
            )?),
            ROUTE_DELEGATE => Message::Delegate(decode_payload(&self.delegate_deserializer, msg)?),
            ROUTE_UNDELEGATE => {
                Message::Undelegate(decode_payload(&self.undelegate_deserializer, msg)?)
            }
            ROUTE_BEGIN_REDELEGATE => {
                Message::BeginRedelegate(decode_payload(&self.redelegate_deserializer, msg)?)
            }
            other => return Err(ExecutionError::UnknownTxType(other.to_string())),
        })
    }

    fn execute(
        &self,
        store: &mut CacheView,
        header: &BlockHeader,
        message: &Message,
    ) -> ExecutionResult<Tags> {
        match message {
            Message::CreateValidator(msg) => {
                let validator = self.staking.create_validator(
                    store,
                    &msg.operator,
                    msg.consensus_pubkey,
                    &msg.self_bond,
                )?;
                Ok(vec![
                    tag("action", ROUTE_CREATE_VALIDATOR),
                    tag("operator", msg.operator),
                    tag("consensus_address", validator.consensus_address()),
                    tag("amount", &msg.self_bond),
                ])
            }
            Message::Delegate(msg) => {
                let shares = self
                    .staking
                    .delegate(store, &msg.delegator, &msg.validator, &msg.amount)?;
                Ok(vec![
                    tag("action", ROUTE_DELEGATE),
                    tag("delegator", msg.delegator),
                    tag("validator", msg.validator),
                    tag("amount", &msg.amount),
                    tag("shares", shares),
                ])
            }
            Message::Undelegate(msg) => {
                let (tokens, completion) = self.staking.undelegate(
                    store,
                    header,
                    &msg.delegator,
                    &msg.validator,
                    &msg.shares,
                )?;
                let mut tags = vec![
                    tag("action", ROUTE_UNDELEGATE),
                    tag("delegator", msg.delegator),
                    tag("validator", msg.validator),
                    tag("tokens", tokens),
                ];
                if let Some(completion_time) = completion {
                    tags.push(tag("completion_time", completion_time.to_millis()));
                }
                Ok(tags)
            }
            Message::BeginRedelegate(msg) => {
                let (shares_dst, completion) = self.staking.begin_redelegation(
                    store,
                    header,
                    &msg.delegator,
                    &msg.validator_src,
                    &msg.validator_dst,
                    &msg.shares,
                )?;
                let mut tags = vec![
                    tag("action", ROUTE_BEGIN_REDELEGATE),
                    tag("delegator", msg.delegator),
                    tag("source_validator", msg.validator_src),
                    tag("destination_validator", msg.validator_dst),
                    tag("shares", shares_dst),
                ];
                if let Some(completion_time) = completion {
                    tags.push(tag("completion_time", completion_time.to_millis()));
                }
                Ok(tags)
            }
            other => Err(unexpected("staking", other)),
        }
    }
}

/// `slashing/*`
pub(crate) struct SlashingHandler {
    staking: StakingKeeper,
    slashing: SlashingKeeper,
    unjail_deserializer: MsgUnjailDeserializer,
}

impl SlashingHandler {
    pub fn new(staking: StakingKeeper, slashing: SlashingKeeper) -> Self {
        SlashingHandler {
            staking,
            slashing,
            unjail_deserializer: MsgUnjailDeserializer::new(),
        }
    }
}

impl Handler for SlashingHandler {
    fn decode(&self, msg: &Msg) -> ExecutionResult<Message> {
        match msg.route.as_str() {
            ROUTE_UNJAIL => Ok(Message::Unjail(decode_payload(&self.unjail_deserializer, msg)?)),
            other => Err(ExecutionError::UnknownTxType(other.to_string())),
        }
    }

    fn execute(
        &self,
        store: &mut CacheView,
        header: &BlockHeader,
        message: &Message,
    ) -> ExecutionResult<Tags> {
        let Message::Unjail(unjail) = message else {
            return Err(unexpected("slashing", message));
        };
        let operator = unjail.validator;
        let validator = self.staking.get_validator(store, &operator).ok_or_else(|| {
            ExecutionError::InvalidRequest(format!("unknown validator {}", operator))
        })?;
        // an operator that withdrew its whole self bond stays jailed
        if self
            .staking
            .get_delegation(store, &operator, &operator)
            .is_none()
        {
            return Err(ExecutionError::InvalidRequest(format!(
                "validator {} has no self delegation",
                operator
            )));
        }
        self.slashing.check_unjail(store, header, &validator)?;
        self.staking
            .unjail(store, &validator.consensus_address())?;
        Ok(vec![tag("action", ROUTE_UNJAIL), tag("validator", operator)])
    }
}
