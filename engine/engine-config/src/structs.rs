//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.
//! Policy names stay strings here; `mcts` parses them into typed enums.

use crate::defaults::{self, SearchDefaults};
use serde::{Deserialize, Serialize};

fn d_opponent() -> SearchSection {
    SearchSection::from_defaults(defaults::opponent())
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchSection,
    /// The arena's second player. Keys missing from a partial `[opponent]`
    /// section take the `[search]` defaults.
    #[serde(default = "d_opponent")]
    pub opponent: SearchSection,
    #[serde(default)]
    pub arena: ArenaConfig,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            search: SearchSection::default(),
            opponent: d_opponent(),
            arena: ArenaConfig::default(),
        }
    }
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CommonConfig {
    pub data_dir: String,
    /// Name of the game to play, see `engine-games`
    pub game: String,
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            game: defaults::game().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// One searcher's parameters, as written in `[search]` or `[opponent]`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SearchSection {
    pub budget: u32,
    pub playout_depth: u32,
    /// Exploration constant C
    pub exploration: f64,
    pub tree_policy: String,
    pub root_policy: String,
    pub epsilon: f64,
    pub expansion: String,
    pub reward: String,
    pub sigmoid_k: f64,
    pub wp_voi_base: f64,
    pub wp_poe_base: f64,
    pub wp_cap: f64,
    pub wp_relative: bool,
    /// Enable the relative/qualitative bonus
    pub bonus: bool,
    pub bonus_k: f64,
    pub bonus_relative: bool,
    pub bonus_qualitative: bool,
    /// FAP segment count; 0 disables segmentation
    pub segments: u32,
    pub geometric_boundaries: bool,
    pub geometric_weights: bool,
    pub seed: u64,
}

impl SearchSection {
    pub(crate) fn from_defaults(d: &SearchDefaults) -> Self {
        Self {
            budget: d.budget,
            playout_depth: d.playout_depth,
            exploration: d.exploration,
            tree_policy: d.tree_policy.clone(),
            root_policy: d.root_policy.clone(),
            epsilon: d.epsilon,
            expansion: d.expansion.clone(),
            reward: d.reward.clone(),
            sigmoid_k: d.sigmoid_k,
            wp_voi_base: d.wp_voi_base,
            wp_poe_base: d.wp_poe_base,
            wp_cap: d.wp_cap,
            wp_relative: d.wp_relative,
            bonus: d.bonus,
            bonus_k: d.bonus_k,
            bonus_relative: d.bonus_relative,
            bonus_qualitative: d.bonus_qualitative,
            segments: d.segments,
            geometric_boundaries: d.geometric_boundaries,
            geometric_weights: d.geometric_weights,
            seed: d.seed,
        }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self::from_defaults(defaults::search())
    }
}

/// Benchmark arena configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    /// Matches to play; colours swap every other match
    pub matches: u32,
    /// Matches in flight at once
    pub parallelism: usize,
    /// Turns after which a match is scored as a draw
    pub max_turns: u32,
    /// Write per-iteration time/depth logs under `data_dir/time_depth`
    pub time_depth_log: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            matches: defaults::matches(),
            parallelism: defaults::parallelism(),
            max_turns: defaults::max_turns(),
            time_depth_log: defaults::time_depth_log(),
        }
    }
}
