//! Arena - benchmark runner for MCTS variants
//!
//! A batch process that:
//! 1. Resolves two search configurations from config.toml, env and CLI
//! 2. Plays repeated matches between them, in parallel across matches
//! 3. Optionally logs per-iteration time and depth for every search
//! 4. Writes an aggregated JSON summary to the data directory

use anyhow::Result;
use clap::Parser;
use mcts::CancelToken;
use std::path::Path;
use tokio::signal;
use tracing::{error, info, warn};

mod arena;
mod config;
mod play;
mod stats;

use crate::arena::{run_arena, ArenaPlan, TIME_DEPTH_DIR};
use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let data_dir = Path::new(&config.data_dir);
    let plan = ArenaPlan {
        game: config.game_kind()?,
        a: config.player_a()?,
        b: config.player_b()?,
        matches: config.matches,
        parallelism: config.parallelism,
        max_turns: config.max_turns,
        time_depth_root: config
            .time_depth_log
            .then(|| data_dir.join(TIME_DEPTH_DIR)),
    };
    info!("Searcher A ({}): {}", plan.a.label, plan.a.config.describe());
    info!("Searcher B ({}): {}", plan.b.label, plan.b.config.describe());

    // Setup graceful shutdown
    let cancel = CancelToken::new();
    let shutdown_token = cancel.clone();
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping in-flight searches...");
                shutdown_token.cancel();
            }
            Err(e) => warn!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let run_result = run_arena(plan, cancel).await;
    shutdown_handle.abort();

    match run_result {
        Ok(summary) => {
            summary.log();
            let path = summary.write(data_dir)?;
            info!("Summary written to {}", path.display());
            Ok(())
        }
        Err(e) => {
            error!("Arena failed: {:#}", e);
            Err(e)
        }
    }
}
