//! TicTacToe game implementation for the treelab engine
//!
//! This crate provides a small reference implementation of the [`Game`]
//! contract. It is cheap enough to search exhaustively, which makes it the
//! workhorse of the search engine's tests and benchmarks.
//!
//! Material is measured as the number of lines a player can still complete,
//! so the material-based rewards have something meaningful to compare.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::{Game, Outcome, Player};
//! use games_tictactoe::{Action, TicTacToe};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let game = TicTacToe::new();
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//! let state = game.reset(&mut rng);
//! let state = game.apply(&state, &Action::Place(4));
//! assert_eq!(game.active_player(&state), Player::Second);
//! assert_eq!(game.outcome(&state), Outcome::Ongoing);
//! ```

use engine_core::{signed_difference, Game, Outcome, Player};
use rand_chacha::ChaCha20Rng;

/// Winning positions (rows, columns, diagonals)
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// TicTacToe game state
///
/// Represents the complete state of a TicTacToe game including the board,
/// current player, and outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    /// Board cells, row-major; `None` is empty
    board: [Option<Player>; 9],
    /// Player to move (X is `First`)
    current_player: Player,
    /// Cached result of the last move
    outcome: Outcome,
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            current_player: Player::First, // X goes first
            outcome: Outcome::Ongoing,
        }
    }

    /// Build a position from a 9-character picture, row-major.
    ///
    /// `X`/`x` is the first player, `O`/`o` the second, anything else empty.
    /// The player to move is derived from the piece count.
    pub fn from_picture(picture: &str) -> Self {
        let mut board = [None; 9];
        for (cell, ch) in board.iter_mut().zip(picture.chars()) {
            *cell = match ch {
                'X' | 'x' => Some(Player::First),
                'O' | 'o' => Some(Player::Second),
                _ => None,
            };
        }

        let xs = board.iter().filter(|c| **c == Some(Player::First)).count();
        let os = board.iter().filter(|c| **c == Some(Player::Second)).count();
        let current_player = if xs > os {
            Player::Second
        } else {
            Player::First
        };

        Self {
            board,
            current_player,
            outcome: Self::check_winner(&board),
        }
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.outcome.is_decided()
    }

    /// Piece at a board position (0-8)
    pub fn cell(&self, position: u8) -> Option<Player> {
        self.board.get(position as usize).copied().flatten()
    }

    /// Player to move
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Get legal moves (empty positions)
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..9u8)
            .filter(|&pos| self.board[pos as usize].is_none())
            .collect()
    }

    /// Make a move and return the new state
    pub fn make_move(&self, position: u8) -> State {
        if self.is_done() || position >= 9 || self.board[position as usize].is_some() {
            return *self; // Invalid move, return unchanged state
        }

        let mut new_state = *self;
        new_state.board[position as usize] = Some(self.current_player);
        new_state.outcome = Self::check_winner(&new_state.board);

        // Switch player if game not over
        if !new_state.is_done() {
            new_state.current_player = self.current_player.opponent();
        }

        new_state
    }

    /// Number of lines `player` can still complete.
    pub fn open_lines(&self, player: Player) -> usize {
        let opponent = Some(player.opponent());
        LINES
            .iter()
            .filter(|line| line.iter().all(|&i| self.board[i] != opponent))
            .count()
    }

    /// Check for winner on the board
    fn check_winner(board: &[Option<Player>; 9]) -> Outcome {
        for line in &LINES {
            let [a, b, c] = *line;
            if let Some(player) = board[a] {
                if board[b] == Some(player) && board[c] == Some(player) {
                    return Outcome::Win(player);
                }
            }
        }

        // Board full but no winner
        if board.iter().all(|cell| cell.is_some()) {
            return Outcome::Draw;
        }

        Outcome::Ongoing
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// TicTacToe action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Place a piece at the given position (0-8)
    Place(u8),
}

impl Action {
    /// Get the position for this action
    pub fn position(&self) -> u8 {
        match self {
            Action::Place(pos) => *pos,
        }
    }
}

/// TicTacToe game implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct TicTacToe;

impl TicTacToe {
    /// Create a new TicTacToe game
    pub fn new() -> Self {
        Self
    }
}

impl Game for TicTacToe {
    type State = State;
    type Action = Action;

    fn name(&self) -> &'static str {
        "tictactoe"
    }

    fn reset(&self, _rng: &mut ChaCha20Rng) -> Self::State {
        State::new()
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        state.legal_moves().into_iter().map(Action::Place).collect()
    }

    fn apply(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        state.make_move(action.position())
    }

    fn active_player(&self, state: &Self::State) -> Player {
        state.current_player
    }

    fn outcome(&self, state: &Self::State) -> Outcome {
        state.outcome
    }

    fn evaluate(&self, state: &Self::State, perspective: Player) -> f64 {
        match state.outcome {
            Outcome::Win(winner) if winner == perspective => self.max_evaluation(),
            Outcome::Win(_) => -self.max_evaluation(),
            _ => signed_difference(
                [
                    self.material(state, Player::First),
                    self.material(state, Player::Second),
                ],
                perspective,
            ),
        }
    }

    fn material(&self, state: &Self::State, player: Player) -> f64 {
        state.open_lines(player) as f64
    }

    /// Keeps the material normalizer positive once every line is blocked.
    fn material_floor(&self) -> f64 {
        1.0
    }

    fn max_evaluation(&self) -> f64 {
        LINES.len() as f64
    }

    fn is_dead_draw(&self, state: &Self::State) -> bool {
        !state.is_done() && state.open_lines(Player::First) == 0 && state.open_lines(Player::Second) == 0
    }
}
