// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Block replay: feeds recorded blocks to the application as the consensus engine would

use anyhow::{bail, Context};
use quorum_execution_exports::{
    ApplicationController, BeginBlockRequest, CommitResponse, GenesisState,
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// A recorded block, transactions are bs58 encoded wire bytes
#[derive(Debug, Deserialize, Clone)]
pub struct ReplayBlock {
    #[serde(flatten)]
    pub request: BeginBlockRequest,
    #[serde(default)]
    pub txs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReplayFile {
    blocks: Vec<ReplayBlock>,
}

pub fn load_genesis(path: &Path) -> anyhow::Result<GenesisState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read genesis file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid genesis file {}", path.display()))
}

pub fn load_blocks(path: &Path) -> anyhow::Result<Vec<ReplayBlock>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read block file {}", path.display()))?;
    let file: ReplayFile = serde_json::from_str(&content)
        .with_context(|| format!("invalid block file {}", path.display()))?;
    Ok(file.blocks)
}

/// Applies and commits `blocks` in order. Returns the last commit, if any.
///
/// Stops at the first fatal error: the state can no longer be trusted and
/// the node must halt.
pub fn replay_blocks(
    app: &dyn ApplicationController,
    blocks: Vec<ReplayBlock>,
) -> anyhow::Result<Option<CommitResponse>> {
    let mut last_commit = None;
    for block in blocks {
        let height = block.request.header.height;
        let txs = block
            .txs
            .iter()
            .enumerate()
            .map(|(index, tx)| {
                bs58::decode(tx)
                    .into_vec()
                    .with_context(|| format!("transaction {} of block {} is not bs58", index, height))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        app.begin_block(block.request)
            .with_context(|| format!("block {} halted in begin_block", height))?;
        for (index, tx) in txs.iter().enumerate() {
            let response = app
                .deliver_tx(tx)
                .with_context(|| format!("block {} halted in transaction {}", height, index))?;
            if response.is_ok() {
                debug!("block {} transaction {} applied", height, index);
            } else {
                warn!(
                    "block {} transaction {} failed with code {}: {}",
                    height, index, response.code, response.log
                );
            }
        }
        let updates = app
            .end_block()
            .with_context(|| format!("block {} halted in end_block", height))?;
        let commit = app
            .commit()
            .with_context(|| format!("block {} halted in commit", height))?;
        if commit.version != height {
            bail!(
                "block {} was committed as version {}",
                height,
                commit.version
            );
        }
        info!(
            "block {} committed, {} transactions, {} validator updates, state hash {}",
            height,
            txs.len(),
            updates.len(),
            commit.state_hash
        );
        last_commit = Some(commit);
    }
    Ok(last_commit)
}
