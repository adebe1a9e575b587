//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic shared by
//! the arena and any other binary driving the search engine.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`TREELAB_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml, embedded at compile time)
//!
//! Command-line flags of a binary sit above all three.
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! TREELAB_<SECTION>_<KEY>=value
//!
//! Examples:
//!     TREELAB_COMMON_GAME=tictactoe
//!     TREELAB_COMMON_DATA_DIR=/data
//!     TREELAB_SEARCH_BUDGET=5000
//!     TREELAB_OPPONENT_REWARD=sigmoid
//!     TREELAB_ARENA_MATCHES=100
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, CONFIG_ENV_VAR, CONFIG_SEARCH_PATHS,
};
pub use structs::*;
