//! Monte Carlo Tree Search with pluggable selection and reward layers.
//!
//! This crate provides a game-agnostic MCTS that works with any game
//! implementing the `engine-core` [`Game`](engine_core::Game) trait. Values
//! are stored from the perspective of the player who made the move into a
//! node and flip sign at every level on the way back to the root.
//!
//! # Overview
//!
//! Each iteration runs four phases:
//!
//! 1. **Selection**: descend with the root policy at the root (UCB1,
//!    UCB-sqrt, epsilon-greedy or VOI) and the tree policy (UCB1 or
//!    UCB1-Tuned) below it
//! 2. **Expansion**: add one child for an untried action, in enumeration or
//!    random order
//! 3. **Simulation**: play uniformly random moves from the new node
//! 4. **Backpropagation**: score the playout and add the reward along the
//!    path to the root
//!
//! # Usage
//!
//! ```rust
//! use mcts::{Searcher, Variant};
//! use games_tictactoe::{State, TicTacToe};
//!
//! let game = TicTacToe::new();
//! let config = Variant::Sigmoid.config().with_seed(42);
//! let mut searcher = Searcher::new(&game, config).unwrap();
//!
//! let result = searcher.search(&State::new(), 300).unwrap();
//! assert!(result.action.position() < 9);
//! assert_eq!(result.iterations, 300);
//! ```
//!
//! # Rewards
//!
//! A playout is scored in layers, see [`reward`]:
//!
//! - base reward: outcome, material balance, sigmoid of the evaluation, or a
//!   weighted playout over sampled evaluations
//! - optional relative/qualitative bonus
//! - optional segment weight that trades visit weight against iteration index
//!
//! # Architecture
//!
//! ```text
//! +--------------------------------------------------------+
//! |                        Searcher                        |
//! +--------------------------------------------------------+
//! |  +------------+   +-------------+   +---------------+  |
//! |  | SearchTree |   |   policy    |   | RewardPipeline|  |
//! |  |  (arena)   |   | (selection) |   | (scoring)     |  |
//! |  +-----+------+   +------+------+   +-------+-------+  |
//! |        |                 |                  |          |
//! |        v                 v                  v          |
//! |  +--------------------------------------------------+  |
//! |  |   select -> expand -> playout -> backpropagate   |  |
//! |  +--------------------------------------------------+  |
//! +--------------------------------------------------------+
//! ```

pub mod config;
pub mod instrument;
pub mod node;
pub mod playout;
pub mod policy;
pub mod reward;
pub mod search;
pub mod stats;
pub mod tree;

// Re-export main types
pub use config::{
    ConfigError, ExpansionOrder, RewardBase, RootPolicy, RqBonus, SearchConfig, Segmentation,
    TreePolicy, Variant, WeightedPlayout,
};
pub use instrument::{IterationObserver, IterationRecord, TimeDepthLog};
pub use node::{Node, NodeId};
pub use search::{
    run_search, CancelToken, SearchError, SearchLimits, SearchResult, Searcher, StopReason,
    TargetStreak,
};
pub use tree::{SearchTree, TreeStats};
