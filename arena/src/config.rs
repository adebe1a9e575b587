//! Configuration for the arena binary
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig, SearchSection};
use engine_games::GameKind;
use mcts::{
    ExpansionOrder, RewardBase, RootPolicy, RqBonus, SearchConfig, Segmentation, TreePolicy,
    Variant, WeightedPlayout,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_game() -> String {
    CENTRAL_CONFIG.common.game.clone()
}

fn default_data_dir() -> String {
    CENTRAL_CONFIG.common.data_dir.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_matches() -> u32 {
    CENTRAL_CONFIG.arena.matches
}

fn default_parallelism() -> usize {
    CENTRAL_CONFIG.arena.parallelism
}

fn default_max_turns() -> u32 {
    CENTRAL_CONFIG.arena.max_turns
}

fn default_time_depth_log() -> bool {
    CENTRAL_CONFIG.arena.time_depth_log
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "arena")]
#[command(about = "Benchmark arena - plays two MCTS configurations against each other")]
#[command(
    long_about = "Plays repeated matches between searcher A ([search] section) and
searcher B ([opponent] section), swapping colours every other match, and writes
a JSON summary plus optional per-iteration time/depth logs to the data directory.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Game to play (tictactoe, skirmish)
    #[arg(long, default_value_t = default_game())]
    pub game: String,

    /// Directory for the summary and time/depth logs
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Number of matches to play
    #[arg(long, default_value_t = default_matches())]
    pub matches: u32,

    /// Matches played concurrently
    #[arg(long, default_value_t = default_parallelism())]
    pub parallelism: usize,

    /// Turns after which a match is scored as a draw
    #[arg(long, default_value_t = default_max_turns())]
    pub max_turns: u32,

    /// Write per-iteration time/depth logs (true/false)
    #[arg(long, action = clap::ArgAction::Set, default_value_t = default_time_depth_log())]
    pub time_depth_log: bool,

    /// Preset for searcher A instead of the [search] section (e.g. voi, rq_bonus)
    #[arg(long)]
    pub variant_a: Option<String>,

    /// Preset for searcher B instead of the [opponent] section
    #[arg(long)]
    pub variant_b: Option<String>,

    /// Iteration budget per move for searcher A
    #[arg(long)]
    pub budget_a: Option<u32>,

    /// Iteration budget per move for searcher B
    #[arg(long)]
    pub budget_b: Option<u32>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.game_kind()?;

        if self.matches == 0 {
            return Err(anyhow!("matches must be greater than 0"));
        }

        if self.parallelism == 0 {
            return Err(anyhow!("parallelism must be greater than 0"));
        }

        if self.max_turns == 0 {
            return Err(anyhow!("max_turns must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        for variant in [&self.variant_a, &self.variant_b].into_iter().flatten() {
            variant.parse::<Variant>()?;
        }

        Ok(())
    }

    pub fn game_kind(&self) -> Result<GameKind> {
        Ok(self.game.parse::<GameKind>()?)
    }

    /// Search configuration of searcher A.
    pub fn player_a(&self) -> Result<Player> {
        Player::resolve(
            &CENTRAL_CONFIG.search,
            self.variant_a.as_deref(),
            self.budget_a,
            "search",
        )
        .context("Invalid configuration for searcher A")
    }

    /// Search configuration of searcher B.
    pub fn player_b(&self) -> Result<Player> {
        Player::resolve(
            &CENTRAL_CONFIG.opponent,
            self.variant_b.as_deref(),
            self.budget_b,
            "opponent",
        )
        .context("Invalid configuration for searcher B")
    }
}

/// A resolved arena participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Variant name or config section, used for log directories
    pub label: String,
    pub config: SearchConfig,
}

impl Player {
    /// Build from a config section, or from a preset that keeps the
    /// section's seed and playout depth. `budget` overrides either.
    pub fn resolve(
        section: &SearchSection,
        variant: Option<&str>,
        budget: Option<u32>,
        section_name: &str,
    ) -> Result<Self> {
        let (label, config) = match variant {
            Some(name) => {
                let variant: Variant = name.parse()?;
                let config = variant
                    .config()
                    .with_budget(section.budget)
                    .with_playout_depth(section.playout_depth)
                    .with_seed(section.seed);
                (variant.name().to_string(), config)
            }
            None => (section_name.to_string(), search_config(section)?),
        };

        let config = match budget {
            Some(budget) => config.with_budget(budget),
            None => config,
        };
        config.validate()?;
        Ok(Self { label, config })
    }
}

/// Typed search configuration from a config file section.
pub fn search_config(section: &SearchSection) -> Result<SearchConfig> {
    let reward = match section.reward.parse::<RewardBase>()? {
        RewardBase::Sigmoid { .. } => RewardBase::Sigmoid {
            k: section.sigmoid_k,
        },
        RewardBase::WeightedPlayout(_) => RewardBase::WeightedPlayout(WeightedPlayout {
            voi_base: section.wp_voi_base,
            poe_base: section.wp_poe_base,
            cap: section.wp_cap,
            relative: section.wp_relative,
        }),
        base => base,
    };

    let mut config = SearchConfig::default()
        .with_budget(section.budget)
        .with_playout_depth(section.playout_depth)
        .with_exploration(section.exploration)
        .with_tree_policy(section.tree_policy.parse::<TreePolicy>()?)
        .with_root_policy(section.root_policy.parse::<RootPolicy>()?)
        .with_epsilon(section.epsilon)
        .with_expansion(section.expansion.parse::<ExpansionOrder>()?)
        .with_reward(reward)
        .with_seed(section.seed);

    if section.bonus {
        config = config.with_bonus(RqBonus {
            k: section.bonus_k,
            relative: section.bonus_relative,
            qualitative: section.bonus_qualitative,
        });
    }
    if section.segments > 0 {
        config = config.with_segmentation(Segmentation {
            segments: section.segments,
            geometric_boundaries: section.geometric_boundaries,
            geometric_weights: section.geometric_weights,
        });
    }

    config.validate()?;
    Ok(config)
}
