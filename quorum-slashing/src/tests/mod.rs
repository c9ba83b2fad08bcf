// Copyright (c) 2022 MASSA LABS <info@massa.net>

use quorum_db_exports::{CacheView, EmptyState};
use quorum_models::BlockHeader;
use quorum_time::QuorumTime;
use std::sync::Arc;

mod liveness;

pub(crate) const GENESIS_TIME: QuorumTime = QuorumTime::from_secs(1_600_000_000);

pub(crate) fn empty_view() -> CacheView {
    CacheView::new(Arc::new(EmptyState))
}

/// Header at `height`, one second per block
pub(crate) fn header(height: u64) -> BlockHeader {
    BlockHeader {
        chain_id: "test-chain".to_string(),
        height,
        time: GENESIS_TIME.saturating_add(QuorumTime::from_secs(height)),
    }
}
