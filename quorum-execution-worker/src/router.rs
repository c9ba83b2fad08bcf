// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Selection of the module handler of each message

use quorum_db_exports::CacheView;
use quorum_execution_exports::{ExecutionError, ExecutionResult, Message, Msg};
use quorum_models::{Address, BlockHeader};
use quorum_serialization::{deserialize_exact, Deserializer};
use std::collections::BTreeMap;

/// Ordered `(key, value)` result tags of a message
pub(crate) type Tags = Vec<(String, String)>;

/// Handler of the messages of one module
pub(crate) trait Handler: Send + Sync {
    /// Decodes the payload of `msg`, whose module is the one of the handler.
    /// Fails with `UnknownTxType` if the module has no such message.
    fn decode(&self, msg: &Msg) -> ExecutionResult<Message>;

    /// Applies a message decoded by `decode`
    fn execute(
        &self,
        store: &mut CacheView,
        header: &BlockHeader,
        message: &Message,
    ) -> ExecutionResult<Tags>;
}

/// Decodes a payload, rejecting trailing bytes
pub(crate) fn decode_payload<T, D: Deserializer<T>>(
    deserializer: &D,
    msg: &Msg,
) -> ExecutionResult<T> {
    deserialize_exact(deserializer, &msg.payload)
        .map_err(|err| ExecutionError::DecodingError(format!("{}: {}", msg.route, err)))
}

pub(crate) fn tag(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

/// Module name to handler
#[derive(Default)]
pub(crate) struct Router {
    handlers: BTreeMap<&'static str, Box<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    /// Registers the handler of `module`
    pub fn add_route(mut self, module: &'static str, handler: Box<dyn Handler>) -> Self {
        self.handlers.insert(module, handler);
        self
    }

    /// Resolves and decodes every message of a transaction, and checks that
    /// each one acts on behalf of one of the `signers`
    pub fn route(
        &self,
        msgs: &[Msg],
        signers: &[Address],
    ) -> ExecutionResult<Vec<(&dyn Handler, Message)>> {
        msgs.iter()
            .map(|msg| {
                let (module, _) = msg.module_and_type();
                let handler = self
                    .handlers
                    .get(module)
                    .ok_or_else(|| ExecutionError::UnknownModule(module.to_string()))?;
                let message = handler.decode(msg)?;
                let signer = message.signer();
                if !signers.contains(&signer) {
                    return Err(ExecutionError::Unauthorized(format!(
                        "{} must be signed by {}",
                        msg.route, signer
                    )));
                }
                Ok((handler.as_ref(), message))
            })
            .collect()
    }
}
