// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Standalone node: loads the settings and a genesis state, starts the
//! application over an in-memory database, and replays recorded blocks.
//! The node halts on the first fatal error.

mod replay;
mod settings;

use crate::replay::{load_blocks, load_genesis, replay_blocks};
use crate::settings::{build_settings, Settings, ENV_PREFIX};
use clap::Parser;
use parking_lot::RwLock;
use quorum_db_exports::QuorumDBController;
use quorum_db_worker::QuorumDB;
use quorum_execution_worker::start_application;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "quorum-node", version, about = "Replays blocks through the quorum state machine")]
struct Args {
    /// base settings file
    #[arg(long, default_value = "base_config/config.toml")]
    config: PathBuf,
    /// settings overriding the base file, ignored if missing
    #[arg(long, default_value = "config/config.toml")]
    config_override: PathBuf,
    /// genesis state, JSON
    #[arg(long)]
    genesis: PathBuf,
    /// blocks to replay after genesis, JSON
    #[arg(long)]
    blocks: Option<PathBuf>,
}

fn setup_logging(level: usize) {
    use tracing_subscriber::prelude::*;
    let filter = match level {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let tracing_layer = tracing_subscriber::fmt::layer().with_filter(filter);
    tracing_subscriber::registry().with(tracing_layer).init();
}

fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    let genesis = load_genesis(&args.genesis)?;
    let blocks = match &args.blocks {
        Some(path) => load_blocks(path)?,
        None => Vec::new(),
    };

    let db = Arc::new(RwLock::new(
        Box::new(QuorumDB::new(settings.db_config())) as Box<dyn QuorumDBController>
    ));
    let app = start_application(
        settings.execution_config(),
        settings.ledger_config(),
        settings.staking_config(),
        settings.slashing_config(),
        db,
    )?;

    let updates = app.init_chain(genesis)?;
    info!("genesis applied, {} validators bonded", updates.len());

    match replay_blocks(app.as_ref(), blocks)? {
        Some(commit) => info!(
            "replay done at version {}, state hash {}",
            commit.version, commit.state_hash
        ),
        None => info!("no block to replay"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = build_settings(&args.config, &args.config_override, ENV_PREFIX)?;
    setup_logging(settings.logging.level);

    if let Err(err) = run(&settings, &args) {
        error!("node halted: {:#}", err);
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
