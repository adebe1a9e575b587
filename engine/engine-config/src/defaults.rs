//! Default configuration values loaded from config.defaults.toml.
//!
//! This module loads defaults from the shared TOML file at compile time, so
//! the documented file and the binary can never disagree.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    search: SearchDefaults,
    opponent: SearchDefaults,
    arena: ArenaDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    game: String,
    log_level: String,
}

/// Defaults of one searcher section.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchDefaults {
    pub budget: u32,
    pub playout_depth: u32,
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
    pub bonus: bool,
    pub bonus_k: f64,
    pub bonus_relative: bool,
    pub bonus_qualitative: bool,
    pub segments: u32,
    pub geometric_boundaries: bool,
    pub geometric_weights: bool,
    pub seed: u64,
}

#[derive(Debug, Deserialize)]
struct ArenaDefaults {
    matches: u32,
    parallelism: usize,
    max_turns: u32,
    time_depth_log: bool,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn game() -> &'static str {
    &DEFAULTS.common.game
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Searchers
pub(crate) fn search() -> &'static SearchDefaults {
    &DEFAULTS.search
}
pub(crate) fn opponent() -> &'static SearchDefaults {
    &DEFAULTS.opponent
}

// Arena
pub fn matches() -> u32 {
    DEFAULTS.arena.matches
}
pub fn parallelism() -> usize {
    DEFAULTS.arena.parallelism
}
pub fn max_turns() -> u32 {
    DEFAULTS.arena.max_turns
}
pub fn time_depth_log() -> bool {
    DEFAULTS.arena.time_depth_log
}
