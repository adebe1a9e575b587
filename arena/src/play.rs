//! One match between two searchers.

use std::path::PathBuf;

use engine_core::{Game, Outcome, Player};
use engine_games::GameVisitor;
use mcts::{
    CancelToken, IterationRecord, SearchConfig, SearchError, SearchLimits, Searcher, StopReason,
    TimeDepthLog,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which side won a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchWinner {
    A,
    B,
    Draw,
}

/// Everything needed to play match `index`.
#[derive(Debug, Clone)]
pub struct MatchSpec {
    pub index: u32,
    pub a: SearchConfig,
    pub b: SearchConfig,
    pub max_turns: u32,
    /// Time/depth log files for A and B, when enabled
    pub logs: Option<(PathBuf, PathBuf)>,
    pub cancel: CancelToken,
}

impl MatchSpec {
    /// Searcher A moves first in even-numbered matches.
    pub fn a_plays_first(&self) -> bool {
        self.index % 2 == 0
    }
}

/// Result of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub index: u32,
    pub a_plays_first: bool,
    pub winner: MatchWinner,
    pub turns: u32,
    /// Iterations of every search A ran, in move order
    pub iterations_a: Vec<u32>,
    pub iterations_b: Vec<u32>,
    /// Stopped by the cancel token before the game ended
    pub cancelled: bool,
}

/// Seed of match `index` derived from a base seed.
pub fn derive_seed(base: u64, index: u32) -> u64 {
    base ^ (u64::from(index) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Play one match of `game`.
pub fn play_match<G: Game>(game: &G, spec: &MatchSpec) -> Result<MatchRecord, SearchError> {
    let a_first = spec.a_plays_first();
    let mut setup = ChaCha20Rng::seed_from_u64(derive_seed(spec.a.seed ^ spec.b.seed, spec.index));
    let mut state = game.reset(&mut setup);

    let mut log_a = TimeDepthLog::new();
    let mut log_b = TimeDepthLog::new();
    let mut record = MatchRecord {
        index: spec.index,
        a_plays_first: a_first,
        winner: MatchWinner::Draw,
        turns: 0,
        iterations_a: Vec::new(),
        iterations_b: Vec::new(),
        cancelled: false,
    };

    {
        let config_a = spec.a.clone().with_seed(derive_seed(spec.a.seed, spec.index));
        let config_b = spec.b.clone().with_seed(derive_seed(spec.b.seed, spec.index));
        let mut searcher_a = Searcher::new(game, config_a)?;
        let mut searcher_b = Searcher::new(game, config_b)?;
        if spec.logs.is_some() {
            searcher_a.set_observer(Some(Box::new(|r: &IterationRecord| log_a.push(*r))));
            searcher_b.set_observer(Some(Box::new(|r: &IterationRecord| log_b.push(*r))));
        }

        let limits_a = SearchLimits::new(spec.a.budget).with_cancel(spec.cancel.clone());
        let limits_b = SearchLimits::new(spec.b.budget).with_cancel(spec.cancel.clone());

        while record.turns < spec.max_turns
            && !game.outcome(&state).is_decided()
            && !game.is_dead_draw(&state)
            && !game.legal_actions(&state).is_empty()
        {
            let a_to_move = (game.active_player(&state) == Player::First) == a_first;
            let result = if a_to_move {
                searcher_a.search_with(&state, &limits_a)?
            } else {
                searcher_b.search_with(&state, &limits_b)?
            };

            if result.stop == StopReason::Cancelled {
                record.cancelled = true;
                break;
            }

            if a_to_move {
                record.iterations_a.push(result.iterations);
            } else {
                record.iterations_b.push(result.iterations);
            }
            state = game.apply(&state, &result.action);
            record.turns += 1;
        }
    }

    record.winner = match game.outcome(&state) {
        Outcome::Win(player) if (player == Player::First) == a_first => MatchWinner::A,
        Outcome::Win(_) => MatchWinner::B,
        Outcome::Draw | Outcome::Ongoing => MatchWinner::Draw,
    };

    if let Some((path_a, path_b)) = &spec.logs {
        for (log, path) in [(&log_a, path_a), (&log_b, path_b)] {
            if let Err(e) = log.append_to(path) {
                warn!("Failed to write time/depth log {}: {}", path.display(), e);
            }
        }
    }

    debug!(
        index = record.index,
        winner = ?record.winner,
        turns = record.turns,
        cancelled = record.cancelled,
        "Match finished"
    );
    Ok(record)
}

/// Plays a [`MatchSpec`] against whichever game a `GameKind` dispatches to.
pub struct MatchVisitor<'s> {
    pub spec: &'s MatchSpec,
}

impl GameVisitor for MatchVisitor<'_> {
    type Output = Result<MatchRecord, SearchError>;

    fn visit<G: Game>(self, game: &G) -> Self::Output {
        play_match(game, self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_tictactoe::TicTacToe;
    use mcts::Variant;

    fn spec(index: u32) -> MatchSpec {
        MatchSpec {
            index,
            a: Variant::Basic.config().with_budget(60),
            b: Variant::Sigmoid.config().with_budget(60).with_seed(7),
            max_turns: 20,
            logs: None,
            cancel: CancelToken::new(),
        }
    }

    #[test]
    fn test_match_plays_to_the_end() {
        let record = play_match(&TicTacToe::new(), &spec(0)).unwrap();

        assert!(record.turns >= 5 && record.turns <= 9);
        assert!(!record.cancelled);
        assert!(record.a_plays_first);
        // A moves first, so it never has fewer searches than B
        assert_eq!(record.iterations_a.len(), (record.turns as usize + 1) / 2);
        assert_eq!(record.iterations_b.len(), record.turns as usize / 2);
        assert!(record.iterations_a.iter().all(|&n| n == 60));
    }

    #[test]
    fn test_colours_swap_every_other_match() {
        let record = play_match(&TicTacToe::new(), &spec(1)).unwrap();
        assert!(!record.a_plays_first);
        assert_eq!(record.iterations_b.len(), (record.turns as usize + 1) / 2);
    }

    #[test]
    fn test_match_is_reproducible() {
        let first = play_match(&TicTacToe::new(), &spec(3)).unwrap();
        let second = play_match(&TicTacToe::new(), &spec(3)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cancelled_match_is_flagged() {
        let spec = spec(0);
        spec.cancel.cancel();
        let record = play_match(&TicTacToe::new(), &spec).unwrap();

        assert!(record.cancelled);
        assert_eq!(record.turns, 0);
        assert_eq!(record.winner, MatchWinner::Draw);
    }

    #[test]
    fn test_turn_limit_scores_a_draw() {
        let mut spec = spec(0);
        spec.max_turns = 2;
        let record = play_match(&TicTacToe::new(), &spec).unwrap();

        assert_eq!(record.turns, 2);
        assert_eq!(record.winner, MatchWinner::Draw);
    }

    #[test]
    fn test_time_depth_logs_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("basic").join("0.txt");
        let path_b = dir.path().join("sigmoid").join("0.txt");
        let mut spec = spec(0);
        spec.logs = Some((path_a.clone(), path_b.clone()));

        let record = play_match(&TicTacToe::new(), &spec).unwrap();

        let lines_a = std::fs::read_to_string(&path_a).unwrap().lines().count();
        let lines_b = std::fs::read_to_string(&path_b).unwrap().lines().count();
        assert_eq!(lines_a, record.iterations_a.iter().sum::<u32>() as usize);
        assert_eq!(lines_b, record.iterations_b.iter().sum::<u32>() as usize);
    }

    #[test]
    fn test_derived_seeds_differ_per_match() {
        assert_ne!(derive_seed(42, 0), derive_seed(42, 1));
        assert_ne!(derive_seed(42, 0), 42);
        assert_eq!(derive_seed(42, 5), derive_seed(42, 5));
    }
}
