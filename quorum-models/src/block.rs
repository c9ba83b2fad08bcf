// Copyright (c) 2022 MASSA LABS <info@massa.net>

use quorum_time::QuorumTime;
use serde::{Deserialize, Serialize};

/// Header of the block being applied, as handed over by the consensus engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// chain identifier
    pub chain_id: String,
    /// block height, the first block has height 1
    pub height: u64,
    /// block time
    pub time: QuorumTime,
}
