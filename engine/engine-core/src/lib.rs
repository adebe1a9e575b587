//! Core traits and types for the treelab search engine
//!
//! This crate provides the contract between the search engine and the games
//! it plays:
//! - `Game`: Typed trait every game implements
//! - `Player` / `Outcome`: Two-player turn and result bookkeeping
//! - `game_utils`: Reward helpers shared by games and search

pub mod game_utils;
pub mod typed;

// Re-export main types for convenience
pub use game_utils::{outcome_reward, signed_difference};
pub use typed::{Game, Outcome, ParsePlayerError, Player};
