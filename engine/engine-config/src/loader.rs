//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::{CentralConfig, SearchSection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from a crate directory)
];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "TREELAB_CONFIG";

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the TREELAB_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_ENV_VAR, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// Unreadable or malformed files fall back to the built-in defaults.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($target:expr, $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $target.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, bool, etc.)
    ($target:expr, $field:ident, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.parse()) {
            Ok(Ok(v)) => $target.$field = v,
            Ok(Err(_)) => warn!("Ignoring unparseable {}", $key),
            Err(_) => {}
        }
    };
}

/// Apply overrides for one searcher section under `prefix`
/// (`TREELAB_SEARCH` or `TREELAB_OPPONENT`).
fn apply_search_overrides(section: &mut SearchSection, prefix: &str) {
    let key = |name: &str| format!("{prefix}_{name}");

    env_override!(section, budget, key("BUDGET"), parse);
    env_override!(section, playout_depth, key("PLAYOUT_DEPTH"), parse);
    env_override!(section, exploration, key("EXPLORATION"), parse);
    env_override!(section, tree_policy, key("TREE_POLICY"));
    env_override!(section, root_policy, key("ROOT_POLICY"));
    env_override!(section, epsilon, key("EPSILON"), parse);
    env_override!(section, expansion, key("EXPANSION"));
    env_override!(section, reward, key("REWARD"));
    env_override!(section, sigmoid_k, key("SIGMOID_K"), parse);
    env_override!(section, wp_voi_base, key("WP_VOI_BASE"), parse);
    env_override!(section, wp_poe_base, key("WP_POE_BASE"), parse);
    env_override!(section, wp_cap, key("WP_CAP"), parse);
    env_override!(section, wp_relative, key("WP_RELATIVE"), parse);
    env_override!(section, bonus, key("BONUS"), parse);
    env_override!(section, bonus_k, key("BONUS_K"), parse);
    env_override!(section, bonus_relative, key("BONUS_RELATIVE"), parse);
    env_override!(section, bonus_qualitative, key("BONUS_QUALITATIVE"), parse);
    env_override!(section, segments, key("SEGMENTS"), parse);
    env_override!(section, geometric_boundaries, key("GEOMETRIC_BOUNDARIES"), parse);
    env_override!(section, geometric_weights, key("GEOMETRIC_WEIGHTS"), parse);
    env_override!(section, seed, key("SEED"), parse);
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: TREELAB_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config.common, data_dir, "TREELAB_COMMON_DATA_DIR");
    env_override!(config.common, game, "TREELAB_COMMON_GAME");
    env_override!(config.common, log_level, "TREELAB_COMMON_LOG_LEVEL");

    // Searchers
    apply_search_overrides(&mut config.search, "TREELAB_SEARCH");
    apply_search_overrides(&mut config.opponent, "TREELAB_OPPONENT");

    // Arena
    env_override!(config.arena, matches, "TREELAB_ARENA_MATCHES", parse);
    env_override!(config.arena, parallelism, "TREELAB_ARENA_PARALLELISM", parse);
    env_override!(config.arena, max_turns, "TREELAB_ARENA_MAX_TURNS", parse);
    env_override!(config.arena, time_depth_log, "TREELAB_ARENA_TIME_DEPTH_LOG", parse);

    config
}
