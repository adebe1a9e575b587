//! Catalogue of the games bundled with the search engine.
//!
//! Games have their own state and action types, so there is no boxed
//! `dyn Game`. Callers pick a [`GameKind`] by name and hand a
//! [`GameVisitor`] to [`GameKind::dispatch`], which runs it against the
//! concrete game type.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use engine_games::{GameKind, GameVisitor};
//!
//! struct Name;
//!
//! impl GameVisitor for Name {
//!     type Output = &'static str;
//!     fn visit<G: Game>(self, game: &G) -> Self::Output {
//!         game.name()
//!     }
//! }
//!
//! let kind: GameKind = "tictactoe".parse().unwrap();
//! assert_eq!(kind.dispatch(Name), "tictactoe");
//! ```

use std::fmt;
use std::str::FromStr;

use engine_core::Game;
use games_skirmish::Skirmish;
use games_tictactoe::TicTacToe;
use thiserror::Error;

/// Error for a game name that is not in the catalogue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown game '{name}' (available: {available})")]
pub struct UnknownGame {
    pub name: String,
    pub available: String,
}

/// Bundled games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKind {
    TicTacToe,
    Skirmish,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::TicTacToe, GameKind::Skirmish];

    /// Name used in configuration files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            GameKind::TicTacToe => "tictactoe",
            GameKind::Skirmish => "skirmish",
        }
    }

    /// Run `visitor` against this game with its default setup.
    pub fn dispatch<V: GameVisitor>(self, visitor: V) -> V::Output {
        match self {
            GameKind::TicTacToe => visitor.visit(&TicTacToe::new()),
            GameKind::Skirmish => visitor.visit(&Skirmish::new()),
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameKind {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| UnknownGame {
                name: s.to_string(),
                available: list_games().join(", "),
            })
    }
}

/// Code that is generic over the game type.
pub trait GameVisitor {
    type Output;

    fn visit<G: Game>(self, game: &G) -> Self::Output;
}

/// Names of all bundled games, in catalogue order.
pub fn list_games() -> Vec<&'static str> {
    GameKind::ALL.iter().map(|kind| kind.name()).collect()
}

/// Whether `name` refers to a bundled game.
pub fn is_known(name: &str) -> bool {
    name.parse::<GameKind>().is_ok()
}
