//! Parallel match scheduling.
//!
//! Each match runs on a blocking task. A semaphore keeps at most
//! `parallelism` matches in flight; searches inside a match are sequential.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use engine_games::GameKind;
use mcts::CancelToken;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::config::Player;
use crate::play::{MatchRecord, MatchSpec, MatchVisitor};
use crate::stats::ArenaSummary;

/// Subdirectory of the data directory holding time/depth logs.
pub const TIME_DEPTH_DIR: &str = "time_depth";

/// A fully resolved arena run.
#[derive(Debug, Clone)]
pub struct ArenaPlan {
    pub game: GameKind,
    pub a: Player,
    pub b: Player,
    pub matches: u32,
    pub parallelism: usize,
    pub max_turns: u32,
    /// Root of the time/depth logs, when enabled
    pub time_depth_root: Option<PathBuf>,
}

impl ArenaPlan {
    /// Log directory names for A and B; identical labels get a side suffix.
    fn log_labels(&self) -> (String, String) {
        if self.a.label == self.b.label {
            (format!("{}_a", self.a.label), format!("{}_b", self.b.label))
        } else {
            (self.a.label.clone(), self.b.label.clone())
        }
    }

    fn spec(&self, index: u32, cancel: &CancelToken) -> MatchSpec {
        let logs = self.time_depth_root.as_deref().map(|root| {
            let (label_a, label_b) = self.log_labels();
            (
                log_path(root, &label_a, index),
                log_path(root, &label_b, index),
            )
        });
        MatchSpec {
            index,
            a: self.a.config.clone(),
            b: self.b.config.clone(),
            max_turns: self.max_turns,
            logs,
            cancel: cancel.clone(),
        }
    }
}

/// `<root>/<label>/<match>.txt`
pub fn log_path(root: &Path, label: &str, index: u32) -> PathBuf {
    root.join(label).join(format!("{index}.txt"))
}

/// Play every match of `plan` and aggregate the results.
///
/// Raising `cancel` stops in-flight searches at their next iteration; the
/// summary then covers the matches that finished.
pub async fn run_arena(plan: ArenaPlan, cancel: CancelToken) -> Result<ArenaSummary> {
    let started = Instant::now();
    let plan = Arc::new(plan);
    let permits = Arc::new(Semaphore::new(plan.parallelism));

    info!(
        game = %plan.game,
        matches = plan.matches,
        parallelism = plan.parallelism,
        "Starting arena: {} vs {}",
        plan.a.label,
        plan.b.label
    );

    let mut handles = Vec::with_capacity(plan.matches as usize);
    for index in 0..plan.matches {
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .context("Match scheduler closed")?;
        if cancel.is_cancelled() {
            break;
        }

        let spec = plan.spec(index, &cancel);
        let game = plan.game;
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            game.dispatch(MatchVisitor { spec: &spec })
        }));
    }

    let mut records: Vec<MatchRecord> = Vec::with_capacity(handles.len());
    let mut failures = 0usize;
    for handle in handles {
        match handle.await.context("Match task panicked")? {
            Ok(record) => {
                info!(
                    index = record.index,
                    winner = ?record.winner,
                    turns = record.turns,
                    "Match {} complete",
                    record.index
                );
                records.push(record);
            }
            Err(e) => {
                error!("Match failed: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} of {} matches failed", failures, plan.matches));
    }

    Ok(ArenaSummary::from_records(
        plan.game.name(),
        &plan.a.label,
        &plan.b.label,
        records,
        started.elapsed().as_secs_f64(),
    ))
}
