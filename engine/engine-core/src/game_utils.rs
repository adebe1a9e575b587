//! Shared utilities for two-player game implementations
//!
//! This module provides common functionality used by the game crates and the
//! search engine so that rewards are computed the same way everywhere.

use crate::typed::{Outcome, Player};

/// Calculate the reward of an outcome for a two-player zero-sum game.
///
/// # Arguments
/// * `outcome` - Winner indicator of the position
/// * `perspective` - The player the reward is reported for
///
/// # Returns
/// * `1.0` if `perspective` won
/// * `-1.0` if `perspective` lost
/// * `0.0` for draws or ongoing games
///
/// # Example
/// ```
/// use engine_core::game_utils::outcome_reward;
/// use engine_core::{Outcome, Player};
///
/// assert_eq!(outcome_reward(Outcome::Win(Player::First), Player::First), 1.0);
/// assert_eq!(outcome_reward(Outcome::Win(Player::First), Player::Second), -1.0);
/// assert_eq!(outcome_reward(Outcome::Draw, Player::First), 0.0);
/// assert_eq!(outcome_reward(Outcome::Ongoing, Player::Second), 0.0);
/// ```
#[inline]
pub fn outcome_reward(outcome: Outcome, perspective: Player) -> f64 {
    match outcome {
        Outcome::Win(winner) if winner == perspective => 1.0,
        Outcome::Win(_) => -1.0,
        Outcome::Draw | Outcome::Ongoing => 0.0,
    }
}

/// Signed difference between two per-player totals, seen from `perspective`.
///
/// `totals` is indexed by [`Player::index`].
///
/// # Example
/// ```
/// use engine_core::game_utils::signed_difference;
/// use engine_core::Player;
///
/// assert_eq!(signed_difference([7.0, 3.0], Player::First), 4.0);
/// assert_eq!(signed_difference([7.0, 3.0], Player::Second), -4.0);
/// ```
#[inline]
pub fn signed_difference(totals: [f64; 2], perspective: Player) -> f64 {
    totals[perspective.index()] - totals[perspective.opponent().index()]
}
