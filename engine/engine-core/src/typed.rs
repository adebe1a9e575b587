//! Typed Game trait consumed by the search engine
//!
//! Games implement this trait with their own strongly-typed state and action
//! types. The search core never looks inside a state; it only enumerates
//! actions, applies them, and asks for outcomes and evaluations.

use rand_chacha::ChaCha20Rng;
use std::fmt;
use std::str::FromStr;

/// One of the two sides of an adversarial game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Both players in turn order.
    pub const ALL: [Player; 2] = [Player::First, Player::Second];

    /// The other side.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// Zero-based index, handy for per-player arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::First => write!(f, "first"),
            Player::Second => write!(f, "second"),
        }
    }
}

impl FromStr for Player {
    type Err = ParsePlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "1" | "white" => Ok(Player::First),
            "second" | "2" | "black" => Ok(Player::Second),
            _ => Err(ParsePlayerError(s.to_string())),
        }
    }
}

/// Error returned when a player name cannot be parsed
#[derive(Debug, thiserror::Error)]
#[error("Unknown player: {0}")]
pub struct ParsePlayerError(pub String);

/// Result of a game position as reported by the game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No winner yet (also reported when a playout hits its ply limit)
    Ongoing,
    /// The given player has won
    Win(Player),
    /// The game ended without a winner
    Draw,
}

impl Outcome {
    /// Whether the game has finished, with or without a winner.
    pub fn is_decided(self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }

    /// The winning player, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            Outcome::Win(p) => Some(p),
            _ => None,
        }
    }
}

/// Main trait for game implementations
///
/// The search engine only talks to games through this trait. It requires
/// clone semantics from [`Game::apply`]: the engine never mutates a state it
/// does not own.
///
/// # Type Parameters
///
/// * `State` - Game state type, cloned into every tree node
/// * `Action` - Action type, should be small and cheap to clone
///
/// # Example
///
/// ```rust
/// # use engine_core::typed::*;
/// # use rand_chacha::ChaCha20Rng;
///
/// #[derive(Debug, Clone)]
/// struct CountdownState {
///     remaining: u8,
///     to_move: Player,
/// }
///
/// #[derive(Debug)]
/// struct Countdown;
///
/// impl Game for Countdown {
///     type State = CountdownState;
///     type Action = u8;
///
///     fn name(&self) -> &'static str { "countdown" }
///     fn reset(&self, _rng: &mut ChaCha20Rng) -> Self::State {
///         CountdownState { remaining: 5, to_move: Player::First }
///     }
///     fn legal_actions(&self, state: &Self::State) -> Vec<u8> {
///         (1..=state.remaining.min(2)).collect()
///     }
///     fn apply(&self, state: &Self::State, action: &u8) -> Self::State {
///         CountdownState {
///             remaining: state.remaining - action,
///             to_move: state.to_move.opponent(),
///         }
///     }
///     fn active_player(&self, state: &Self::State) -> Player { state.to_move }
///     fn outcome(&self, state: &Self::State) -> Outcome {
///         if state.remaining == 0 {
///             Outcome::Win(state.to_move.opponent())
///         } else {
///             Outcome::Ongoing
///         }
///     }
///     fn evaluate(&self, _state: &Self::State, _perspective: Player) -> f64 { 0.0 }
///     fn material(&self, _state: &Self::State, _player: Player) -> f64 { 1.0 }
///     fn max_evaluation(&self) -> f64 { 1.0 }
/// }
/// ```
pub trait Game: Send + Sync + fmt::Debug + 'static {
    /// Game state type - cloned into every tree node
    type State: Clone + fmt::Debug + Send + Sync + 'static;

    /// Action type - compared for equality in target-move tests
    type Action: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Short identifier of the game (used in logs and file names)
    fn name(&self) -> &'static str;

    /// Create the initial position
    ///
    /// The generator lets games randomize setups reproducibly.
    fn reset(&self, rng: &mut ChaCha20Rng) -> Self::State;

    /// All actions the active player may take, in a stable order.
    ///
    /// An empty list means the state is terminal.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Apply an action to a copy of `state` and return the successor.
    fn apply(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Player whose turn it is in `state`
    fn active_player(&self, state: &Self::State) -> Player;

    /// Winner indicator for `state`
    fn outcome(&self, state: &Self::State) -> Outcome;

    /// Signed material (or hull) difference seen from `perspective`.
    fn evaluate(&self, state: &Self::State, perspective: Player) -> f64;

    /// Remaining material (or hull) of one side.
    fn material(&self, state: &Self::State, player: Player) -> f64;

    /// Constant added to [`Game::material`] when it is used as a divisor,
    /// e.g. the value of a king that never leaves the board.
    fn material_floor(&self) -> f64 {
        0.0
    }

    /// Upper bound on `|evaluate|`, used to normalize outcome quality.
    fn max_evaluation(&self) -> f64;

    /// Whether neither side can win any more (insufficient material).
    ///
    /// Playouts stop early on such states.
    fn is_dead_draw(&self, _state: &Self::State) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::First.opponent(), Player::Second);
        assert_eq!(Player::Second.opponent(), Player::First);
        assert_eq!(Player::First.opponent().opponent(), Player::First);
    }

    #[test]
    fn test_player_index() {
        assert_eq!(Player::First.index(), 0);
        assert_eq!(Player::Second.index(), 1);
        assert_eq!(Player::ALL.len(), 2);
    }

    #[test]
    fn test_player_from_str() {
        assert_eq!("first".parse::<Player>().unwrap(), Player::First);
        assert_eq!("Black".parse::<Player>().unwrap(), Player::Second);
        assert!("third".parse::<Player>().is_err());
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(!Outcome::Ongoing.is_decided());
        assert!(Outcome::Draw.is_decided());
        assert_eq!(Outcome::Win(Player::Second).winner(), Some(Player::Second));
        assert_eq!(Outcome::Draw.winner(), None);
    }
}
