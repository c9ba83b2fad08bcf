// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This module provides the structures used to provide configuration parameters to the execution pipeline

/// Execution pipeline configuration
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// identifier of the chain, part of every signed payload
    pub chain_id: String,
    /// max size of an encoded transaction, in bytes
    pub max_tx_size: usize,
    /// max number of messages in a transaction
    pub max_msgs_per_tx: u32,
}
