// Copyright (c) 2022 MASSA LABS <info@massa.net>

/// Config structure for a `QuorumDB`
#[derive(Debug, Clone)]
pub struct QuorumDBConfig {
    /// Committed versions to keep (change batches and read snapshots)
    pub max_history_length: usize,
}
