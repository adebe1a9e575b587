//! Random playouts from a tree node.

use engine_core::{Game, Outcome, Player};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

/// How intermediate evaluations are recorded during a playout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Record nothing
    Off,
    /// Record the mover's evaluation after every other ply, starting with the first
    EveryOtherPly { relative: bool },
}

/// Result of a playout.
#[derive(Debug, Clone)]
pub struct PlayoutResult<S> {
    /// Winner indicator of the final state
    pub outcome: Outcome,
    /// Plies played
    pub plies: u32,
    /// Sampled evaluations, in playout order
    pub samples: Vec<f64>,
    pub final_state: S,
}

/// Play uniformly random legal actions from `state`.
///
/// Stops when no action is legal, the position is a dead draw, or
/// `max_plies` have been played. Evaluations are taken from `mover`'s
/// perspective.
pub fn run_playout<G: Game>(
    game: &G,
    state: &G::State,
    mover: Player,
    max_plies: u32,
    sampling: Sampling,
    rng: &mut ChaCha20Rng,
) -> PlayoutResult<G::State> {
    let mut current = state.clone();
    let mut plies = 0u32;
    let mut samples = Vec::new();

    let start_eval = match sampling {
        Sampling::Off => 0.0,
        Sampling::EveryOtherPly { .. } => game.evaluate(state, mover),
    };

    while plies < max_plies && !game.is_dead_draw(&current) {
        let actions = game.legal_actions(&current);
        if actions.is_empty() {
            break;
        }
        let pick = rng.gen_range(0..actions.len());
        current = game.apply(&current, &actions[pick]);

        if let Sampling::EveryOtherPly { relative } = sampling {
            if plies % 2 == 0 {
                let eval = game.evaluate(&current, mover);
                samples.push(if relative { eval - start_eval } else { eval });
            }
        }
        plies += 1;
    }

    if plies == 0 && sampling != Sampling::Off {
        samples.push(start_eval);
    }

    PlayoutResult {
        outcome: game.outcome(&current),
        plies,
        samples,
        final_state: current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_skirmish::Skirmish;
    use games_tictactoe::{State, TicTacToe};
    use rand::SeedableRng;

    #[test]
    fn test_playout_reaches_terminal() {
        let game = TicTacToe::new();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let result = run_playout(&game, &State::new(), Player::Second, 100, Sampling::Off, &mut rng);

        // Either someone won, the board filled up, or every line got blocked
        assert!(result.outcome.is_decided() || game.is_dead_draw(&result.final_state));
        assert!(result.plies <= 9);
        assert!(result.samples.is_empty());
    }

    #[test]
    fn test_playout_respects_ply_limit() {
        let game = TicTacToe::new();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let result = run_playout(&game, &State::new(), Player::Second, 2, Sampling::Off, &mut rng);

        assert_eq!(result.plies, 2);
        assert_eq!(result.outcome, Outcome::Ongoing);
    }

    #[test]
    fn test_playout_is_deterministic_for_seed() {
        let game = Skirmish::new();
        let mut setup = ChaCha20Rng::seed_from_u64(9);
        let start = game.reset(&mut setup);
        let sampling = Sampling::EveryOtherPly { relative: false };

        let a = run_playout(&game, &start, Player::Second, 40, sampling, &mut ChaCha20Rng::seed_from_u64(5));
        let b = run_playout(&game, &start, Player::Second, 40, sampling, &mut ChaCha20Rng::seed_from_u64(5));

        assert_eq!(a.plies, b.plies);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.final_state, b.final_state);
    }

    #[test]
    fn test_samples_every_other_ply() {
        let game = Skirmish::new();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let start = game.reset(&mut rng);

        let result = run_playout(
            &game,
            &start,
            Player::Second,
            7,
            Sampling::EveryOtherPly { relative: false },
            &mut rng,
        );
        // Plies 1, 3, 5, 7 when the playout runs to its limit
        let expected = (result.plies as usize + 1) / 2;
        assert_eq!(result.samples.len(), expected);
    }

    #[test]
    fn test_terminal_start_records_start_evaluation() {
        let game = TicTacToe::new();
        let won = State::from_picture("XXXOO....");
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        let result = run_playout(
            &game,
            &won,
            Player::First,
            10,
            Sampling::EveryOtherPly { relative: true },
            &mut rng,
        );
        assert_eq!(result.plies, 0);
        assert_eq!(result.samples, vec![game.max_evaluation()]);
        assert_eq!(result.outcome, Outcome::Win(Player::First));
    }

    #[test]
    fn test_relative_samples_subtract_start() {
        let game = TicTacToe::new();
        let start = State::from_picture("X...O....");
        let start_eval = game.evaluate(&start, Player::Second);

        let sampling_abs = Sampling::EveryOtherPly { relative: false };
        let sampling_rel = Sampling::EveryOtherPly { relative: true };
        let abs = run_playout(&game, &start, Player::Second, 9, sampling_abs, &mut ChaCha20Rng::seed_from_u64(8));
        let rel = run_playout(&game, &start, Player::Second, 9, sampling_rel, &mut ChaCha20Rng::seed_from_u64(8));

        assert_eq!(abs.samples.len(), rel.samples.len());
        for (a, r) in abs.samples.iter().zip(&rel.samples) {
            assert!((a - start_eval - r).abs() < 1e-12);
        }
    }
}
