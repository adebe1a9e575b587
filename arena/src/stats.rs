//! Arena result aggregation and persistence.
//!
//! The summary is written to a JSON file in the data directory so runs can be
//! compared after the fact.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use anyhow::{Context, Result};

use crate::play::{MatchRecord, MatchWinner};

/// File name of the summary inside the data directory.
pub const SUMMARY_FILE: &str = "arena_summary.json";

/// Serializable outcome of an arena run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaSummary {
    pub game: String,
    pub player_a: String,
    pub player_b: String,
    pub matches_played: u32,
    pub a_wins: u32,
    pub b_wins: u32,
    pub draws: u32,
    /// Matches interrupted by Ctrl-C; excluded from the counts above
    pub cancelled: u32,
    pub avg_turns: f64,
    pub avg_iterations_a: f64,
    pub avg_iterations_b: f64,
    pub runtime_seconds: f64,
    pub timestamp: u64,
    pub matches: Vec<MatchRecord>,
}

impl ArenaSummary {
    /// Aggregate finished matches.
    pub fn from_records(
        game: &str,
        player_a: &str,
        player_b: &str,
        mut records: Vec<MatchRecord>,
        runtime_seconds: f64,
    ) -> Self {
        records.sort_by_key(|r| r.index);

        let mut summary = Self {
            game: game.to_string(),
            player_a: player_a.to_string(),
            player_b: player_b.to_string(),
            matches_played: 0,
            a_wins: 0,
            b_wins: 0,
            draws: 0,
            cancelled: 0,
            avg_turns: 0.0,
            avg_iterations_a: 0.0,
            avg_iterations_b: 0.0,
            runtime_seconds,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            matches: Vec::new(),
        };

        let mut total_turns = 0u64;
        for record in records.iter().filter(|r| !r.cancelled) {
            summary.matches_played += 1;
            total_turns += u64::from(record.turns);
            match record.winner {
                MatchWinner::A => summary.a_wins += 1,
                MatchWinner::B => summary.b_wins += 1,
                MatchWinner::Draw => summary.draws += 1,
            }
        }
        summary.cancelled = records.iter().filter(|r| r.cancelled).count() as u32;

        if summary.matches_played > 0 {
            summary.avg_turns = total_turns as f64 / f64::from(summary.matches_played);
        }
        summary.avg_iterations_a = mean_iterations(records.iter().flat_map(|r| &r.iterations_a));
        summary.avg_iterations_b = mean_iterations(records.iter().flat_map(|r| &r.iterations_b));
        summary.matches = records;
        summary
    }

    pub fn log(&self) {
        info!(
            game = %self.game,
            matches = self.matches_played,
            a_wins = self.a_wins,
            b_wins = self.b_wins,
            draws = self.draws,
            cancelled = self.cancelled,
            avg_turns = self.avg_turns,
            "Arena finished: {} vs {}",
            self.player_a,
            self.player_b
        );
    }

    /// Write the summary to `data_dir` (atomic write-then-rename).
    pub fn write(&self, data_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let path = data_dir.join(SUMMARY_FILE);
        let temp_path = data_dir.join(format!("{SUMMARY_FILE}.tmp"));
        let json = serde_json::to_string_pretty(self).context("Failed to serialize summary")?;

        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("Failed to rename to {}", path.display()));
        }

        debug!("Wrote arena summary to {}", path.display());
        Ok(path)
    }
}

fn mean_iterations<'a>(iterations: impl Iterator<Item = &'a u32>) -> f64 {
    let (count, sum) = iterations.fold((0u64, 0u64), |(c, s), &n| (c + 1, s + u64::from(n)));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(index: u32, winner: MatchWinner, turns: u32, cancelled: bool) -> MatchRecord {
        MatchRecord {
            index,
            a_plays_first: index % 2 == 0,
            winner,
            turns,
            iterations_a: vec![100; (turns as usize + 1) / 2],
            iterations_b: vec![50; turns as usize / 2],
            cancelled,
        }
    }

    #[test]
    fn test_counts_outcomes() {
        let records = vec![
            record(2, MatchWinner::Draw, 9, false),
            record(0, MatchWinner::A, 5, false),
            record(1, MatchWinner::B, 6, false),
            record(3, MatchWinner::A, 7, false),
        ];
        let summary = ArenaSummary::from_records("tictactoe", "basic", "sigmoid", records, 1.5);

        assert_eq!(summary.matches_played, 4);
        assert_eq!(summary.a_wins, 2);
        assert_eq!(summary.b_wins, 1);
        assert_eq!(summary.draws, 1);
        assert!((summary.avg_turns - 6.75).abs() < 1e-12);
        assert!((summary.avg_iterations_a - 100.0).abs() < 1e-12);
        assert!((summary.avg_iterations_b - 50.0).abs() < 1e-12);
        let order: Vec<u32> = summary.matches.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cancelled_matches_are_excluded() {
        let records = vec![
            record(0, MatchWinner::A, 5, false),
            record(1, MatchWinner::Draw, 2, true),
        ];
        let summary = ArenaSummary::from_records("skirmish", "a", "b", records, 0.1);

        assert_eq!(summary.matches_played, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.draws, 0);
        assert!((summary.avg_turns - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_run_has_zero_averages() {
        let summary = ArenaSummary::from_records("skirmish", "a", "b", Vec::new(), 0.0);
        assert_eq!(summary.matches_played, 0);
        assert_eq!(summary.avg_turns, 0.0);
        assert!(!summary.avg_iterations_a.is_nan());
    }

    #[test]
    fn test_write_summary() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let summary = ArenaSummary::from_records(
            "tictactoe",
            "basic",
            "voi",
            vec![record(0, MatchWinner::B, 6, false)],
            0.5,
        );

        let path = summary.write(&data_dir).unwrap();
        assert_eq!(path, data_dir.join(SUMMARY_FILE));
        assert!(!data_dir.join(format!("{SUMMARY_FILE}.tmp")).exists());

        let content = fs::read_to_string(&path).unwrap();
        let parsed: ArenaSummary = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.b_wins, 1);
        assert_eq!(parsed.matches.len(), 1);
        assert_eq!(parsed.player_b, "voi");
    }
}
