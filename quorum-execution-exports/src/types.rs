// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Requests and responses exchanged with the consensus engine

use crate::ErrorKind;
use quorum_db_exports::StateHash;
use quorum_models::{Address, BlockHeader, Coin, Coins};
use quorum_signature::PublicKey;
use quorum_time::QuorumTime;
use serde::{Deserialize, Serialize};

/// Vote of a validator of the last commit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    /// consensus address of the validator
    pub consensus_address: Address,
    /// consensus power of the validator
    pub power: u64,
    /// whether the validator signed the last block
    pub signed: bool,
}

/// Evidence of a double sign
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// consensus address of the validator
    pub consensus_address: Address,
    /// height of the infraction
    pub height: u64,
    /// time of the infraction
    pub time: QuorumTime,
    /// consensus power of the validator at the infraction
    pub power: u64,
}

/// Start of a block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginBlockRequest {
    /// header of the block
    pub header: BlockHeader,
    /// votes of the last commit
    #[serde(default)]
    pub votes: Vec<VoteInfo>,
    /// double sign evidence included in the block
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Account funded at genesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// owner
    pub address: Address,
    /// initial balances, minted
    pub coins: Coins,
}

/// Validator registered at genesis, self-bonded from its operator account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    /// operator address, must be a genesis account
    pub operator: Address,
    /// key used by the consensus engine
    pub consensus_pubkey: PublicKey,
    /// self delegation
    pub self_bond: Coin,
}

/// Initial state of the chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    /// genesis time, start of the inflation clock
    pub genesis_time: QuorumTime,
    /// funded accounts
    pub accounts: Vec<GenesisAccount>,
    /// initial validators
    pub validators: Vec<GenesisValidator>,
}

/// Outcome of a transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    /// 0 on success, the code of the error kind otherwise
    pub code: u32,
    /// human readable outcome
    pub log: String,
    /// ordered `(key, value)` pairs for indexing
    pub tags: Vec<(String, String)>,
}

impl TxResponse {
    /// Successful outcome
    pub fn ok(tags: Vec<(String, String)>) -> Self {
        TxResponse {
            code: ErrorKind::Ok.code(),
            log: String::new(),
            tags,
        }
    }

    /// true if the transaction was applied
    pub fn is_ok(&self) -> bool {
        self.code == ErrorKind::Ok.code()
    }
}

/// Outcome of a commit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitResponse {
    /// committed version, the block height
    pub version: u64,
    /// root hash of the committed state
    pub state_hash: StateHash,
}
