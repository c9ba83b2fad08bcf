// Copyright (c) 2022 MASSA LABS <info@massa.net>

use quorum_db_exports::{CacheView, EmptyState};
use quorum_hash::Hash;
use quorum_models::Address;
use quorum_time::QuorumTime;
use std::sync::Arc;

mod randomized;
mod slash;
mod validator_set;

pub(crate) const GENESIS_TIME: QuorumTime = QuorumTime::from_secs(1_600_000_000);

pub(crate) fn address(seed: &str) -> Address {
    Address(Hash::compute_from(seed.as_bytes()))
}

pub(crate) fn empty_view() -> CacheView {
    CacheView::new(Arc::new(EmptyState))
}

/// `secs` seconds after genesis
pub(crate) fn at(secs: u64) -> QuorumTime {
    GENESIS_TIME.saturating_add(QuorumTime::from_secs(secs))
}
