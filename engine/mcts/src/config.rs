//! Search configuration: tree policy, root policy and reward pipeline.
//!
//! A [`SearchConfig`] is immutable for the lifetime of a
//! [`Searcher`](crate::Searcher). It is checked once by [`SearchConfig::validate`]
//! when the searcher is built; nothing is re-validated per search.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Default exploration constant C.
pub const DEFAULT_EXPLORATION: f64 = 1.0;
/// Default iteration budget.
pub const DEFAULT_BUDGET: u32 = 1000;
/// Default playout ply limit.
pub const DEFAULT_PLAYOUT_DEPTH: u32 = 200;
/// Default epsilon for the epsilon-greedy root policy.
pub const DEFAULT_EPSILON: f64 = 0.5;
/// Default slope of the sigmoid reward.
pub const DEFAULT_SIGMOID_K: f64 = 1.0;
/// Default slope of the RQ bonus sigmoid.
pub const DEFAULT_BONUS_K: f64 = 1.0;
/// Default base for both weighted-playout decay terms.
pub const DEFAULT_WP_BASE: f64 = 2.0;
/// Upper limit on a single weighted-playout weight term.
pub const DEFAULT_WP_CAP: f64 = 10_000.0;
/// Default number of FAP segments.
pub const DEFAULT_SEGMENTS: u32 = 4;

/// Geometric boundaries need `2^N` to stay exact in an f64.
const MAX_GEOMETRIC_SEGMENTS: u32 = 52;

/// Errors raised while validating a configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value} for {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),

    #[error("Unknown {kind}: {name}")]
    UnknownName { kind: &'static str, name: String },
}

impl ConfigError {
    fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Exploration formula used below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreePolicy {
    #[default]
    Ucb1,
    Ucb1Tuned,
}

/// Selection rule applied at the root only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootPolicy {
    /// Same formula as the rest of the tree
    #[default]
    Tree,
    /// UCB with `sqrt(N)` in place of `ln(N)`
    UcbSqrt,
    /// Empirical best with probability epsilon, otherwise uniform
    EpsilonGreedy,
    /// Value-of-information ranking between the two best children
    Voi,
}

/// Order in which untried actions are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionOrder {
    /// Enumeration order of the game's legal actions
    Ordered,
    /// Uniformly random among the untried actions
    #[default]
    Random,
}

/// Parameters of the weighted multi-sample playout reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPlayout {
    /// Base of the value-of-information term, favours late samples
    pub voi_base: f64,
    /// Base of the probability-of-encounter term, favours early samples
    pub poe_base: f64,
    /// Cap on each weight term
    pub cap: f64,
    /// Subtract the evaluation at the playout start from every sample
    pub relative: bool,
}

impl Default for WeightedPlayout {
    fn default() -> Self {
        Self {
            voi_base: DEFAULT_WP_BASE,
            poe_base: DEFAULT_WP_BASE,
            cap: DEFAULT_WP_CAP,
            relative: false,
        }
    }
}

/// First layer of the reward pipeline: scalar from a finished playout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RewardBase {
    /// +1 / 0 / -1 by game outcome
    #[default]
    Outcome,
    /// Signed material difference, backed up with per-node normalization
    Material,
    /// `2 * sigmoid(k * material) - 1`
    Sigmoid { k: f64 },
    /// Weighted average of evaluations sampled during the playout
    WeightedPlayout(WeightedPlayout),
}

/// Optional statistically-adjusted bonus on top of the base reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RqBonus {
    /// Slope of the bonus sigmoid
    pub k: f64,
    /// Reward short simulations
    pub relative: bool,
    /// Reward high-quality terminal states
    pub qualitative: bool,
}

impl Default for RqBonus {
    fn default() -> Self {
        Self {
            k: DEFAULT_BONUS_K,
            relative: true,
            qualitative: true,
        }
    }
}

/// Optional FAP time segmentation of the budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segmentation {
    pub segments: u32,
    /// Segment boundaries at `B * 2^j / (2^N - 1)` instead of equal widths
    pub geometric_boundaries: bool,
    /// Weight `2^(segment - 1)` instead of the segment index
    pub geometric_weights: bool,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            geometric_boundaries: false,
            geometric_weights: false,
        }
    }
}

/// Configuration for one [`Searcher`](crate::Searcher).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Iterations per search when the caller does not pass a budget.
    pub budget: u32,

    /// Maximum number of plies in one playout.
    pub playout_depth: u32,

    /// Exploration constant C of the UCB formulas.
    pub exploration: f64,

    pub tree_policy: TreePolicy,
    pub root_policy: RootPolicy,

    /// Probability of taking the empirical best child (epsilon-greedy root).
    pub epsilon: f64,

    pub expansion: ExpansionOrder,
    pub reward: RewardBase,
    pub bonus: Option<RqBonus>,
    pub segmentation: Option<Segmentation>,

    /// Seed of the searcher's random source.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            playout_depth: DEFAULT_PLAYOUT_DEPTH,
            exploration: DEFAULT_EXPLORATION,
            tree_policy: TreePolicy::Ucb1,
            root_policy: RootPolicy::Tree,
            epsilon: DEFAULT_EPSILON,
            expansion: ExpansionOrder::Random,
            reward: RewardBase::Outcome,
            bonus: None,
            segmentation: None,
            seed: 0,
        }
    }
}

impl SearchConfig {
    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            budget: 200,
            playout_depth: 50,
            expansion: ExpansionOrder::Ordered,
            seed: 42,
            ..Self::default()
        }
    }

    /// Builder pattern: set iteration budget.
    pub fn with_budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    /// Builder pattern: set playout ply limit.
    pub fn with_playout_depth(mut self, depth: u32) -> Self {
        self.playout_depth = depth;
        self
    }

    /// Builder pattern: set exploration constant C.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_tree_policy(mut self, policy: TreePolicy) -> Self {
        self.tree_policy = policy;
        self
    }

    pub fn with_root_policy(mut self, policy: RootPolicy) -> Self {
        self.root_policy = policy;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_expansion(mut self, order: ExpansionOrder) -> Self {
        self.expansion = order;
        self
    }

    pub fn with_reward(mut self, reward: RewardBase) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_bonus(mut self, bonus: RqBonus) -> Self {
        self.bonus = Some(bonus);
        self
    }

    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = Some(segmentation);
        self
    }

    /// Builder pattern: set RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check parameter ranges and combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget == 0 {
            return Err(ConfigError::invalid("budget", 0.0, "must be at least 1"));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(ConfigError::invalid(
                "exploration",
                self.exploration,
                "must be finite and non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::invalid(
                "epsilon",
                self.epsilon,
                "must lie in [0, 1]",
            ));
        }

        match self.reward {
            RewardBase::Outcome | RewardBase::Material => {}
            RewardBase::Sigmoid { k } => check_positive("sigmoid_k", k)?,
            RewardBase::WeightedPlayout(wp) => {
                check_positive("voi_base", wp.voi_base)?;
                check_positive("poe_base", wp.poe_base)?;
                check_positive("wp_cap", wp.cap)?;
            }
        }

        if let Some(bonus) = self.bonus {
            check_positive("bonus_k", bonus.k)?;
            if !bonus.relative && !bonus.qualitative {
                return Err(ConfigError::Incompatible(
                    "RQ bonus needs the relative or the qualitative metric".to_string(),
                ));
            }
        }

        if let Some(seg) = self.segmentation {
            if seg.segments == 0 {
                return Err(ConfigError::invalid(
                    "segments",
                    0.0,
                    "must be at least 1",
                ));
            }
            if seg.geometric_boundaries && seg.segments > MAX_GEOMETRIC_SEGMENTS {
                return Err(ConfigError::invalid(
                    "segments",
                    f64::from(seg.segments),
                    "too many for geometric boundaries",
                ));
            }
            if seg.segments > self.budget {
                return Err(ConfigError::Incompatible(format!(
                    "{} segments do not fit a budget of {} iterations",
                    seg.segments, self.budget
                )));
            }
        }

        if self.root_policy == RootPolicy::Voi && self.tree_policy == TreePolicy::Ucb1Tuned {
            return Err(ConfigError::Incompatible(
                "VOI root ranking is defined for the plain UCB1 tree policy".to_string(),
            ));
        }

        Ok(())
    }

    /// One-line summary for logs.
    pub fn describe(&self) -> String {
        let mut parts = vec![
            format!("tree={}", self.tree_policy),
            format!("root={}", self.root_policy),
            format!("reward={}", reward_name(&self.reward)),
            format!("c={}", self.exploration),
        ];
        if self.root_policy == RootPolicy::EpsilonGreedy {
            parts.push(format!("epsilon={}", self.epsilon));
        }
        if let Some(bonus) = self.bonus {
            parts.push(format!(
                "bonus(k={}, relative={}, qualitative={})",
                bonus.k, bonus.relative, bonus.qualitative
            ));
        }
        if let Some(seg) = self.segmentation {
            parts.push(format!(
                "segments={} (geometric boundaries={}, weights={})",
                seg.segments, seg.geometric_boundaries, seg.geometric_weights
            ));
        }
        parts.join(", ")
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, value, "must be finite and positive"))
    }
}

fn reward_name(reward: &RewardBase) -> &'static str {
    match reward {
        RewardBase::Outcome => "outcome",
        RewardBase::Material => "material",
        RewardBase::Sigmoid { .. } => "sigmoid",
        RewardBase::WeightedPlayout(_) => "weighted_playout",
    }
}

impl fmt::Display for TreePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TreePolicy::Ucb1 => "ucb1",
            TreePolicy::Ucb1Tuned => "ucb1_tuned",
        })
    }
}

impl FromStr for TreePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ucb1" | "ucb" => Ok(TreePolicy::Ucb1),
            "ucb1_tuned" | "ucb1-tuned" | "tuned" => Ok(TreePolicy::Ucb1Tuned),
            _ => Err(ConfigError::UnknownName {
                kind: "tree policy",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RootPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RootPolicy::Tree => "tree",
            RootPolicy::UcbSqrt => "ucb_sqrt",
            RootPolicy::EpsilonGreedy => "epsilon_greedy",
            RootPolicy::Voi => "voi",
        })
    }
}

impl FromStr for RootPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tree" | "same" => Ok(RootPolicy::Tree),
            "ucb_sqrt" | "ucb-sqrt" => Ok(RootPolicy::UcbSqrt),
            "epsilon_greedy" | "epsilon-greedy" => Ok(RootPolicy::EpsilonGreedy),
            "voi" => Ok(RootPolicy::Voi),
            _ => Err(ConfigError::UnknownName {
                kind: "root policy",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExpansionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpansionOrder::Ordered => "ordered",
            ExpansionOrder::Random => "random",
        })
    }
}

impl FromStr for ExpansionOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ordered" => Ok(ExpansionOrder::Ordered),
            "random" => Ok(ExpansionOrder::Random),
            _ => Err(ConfigError::UnknownName {
                kind: "expansion order",
                name: s.to_string(),
            }),
        }
    }
}

/// Reward base names accepted in configuration files.
///
/// Parsing yields the base with default parameters; callers fill in the
/// numeric parameters afterwards.
impl FromStr for RewardBase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outcome" | "plain" => Ok(RewardBase::Outcome),
            "material" | "hp" => Ok(RewardBase::Material),
            "sigmoid" => Ok(RewardBase::Sigmoid {
                k: DEFAULT_SIGMOID_K,
            }),
            "weighted_playout" | "wp" => Ok(RewardBase::WeightedPlayout(WeightedPlayout::default())),
            _ => Err(ConfigError::UnknownName {
                kind: "reward",
                name: s.to_string(),
            }),
        }
    }
}

/// Named algorithm presets of the benchmark harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Basic,
    Hp,
    Sigmoid,
    Fap,
    UcbTuned,
    SimpleRegret,
    EpsilonGreedy,
    Voi,
    RqBonus,
    Wp,
}

impl Variant {
    pub const ALL: [Variant; 10] = [
        Variant::Basic,
        Variant::Hp,
        Variant::Sigmoid,
        Variant::Fap,
        Variant::UcbTuned,
        Variant::SimpleRegret,
        Variant::EpsilonGreedy,
        Variant::Voi,
        Variant::RqBonus,
        Variant::Wp,
    ];

    /// Name used in configuration files and log directories.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Basic => "basic",
            Variant::Hp => "hp",
            Variant::Sigmoid => "sigmoid",
            Variant::Fap => "fap",
            Variant::UcbTuned => "ucb_tuned",
            Variant::SimpleRegret => "simple_regret",
            Variant::EpsilonGreedy => "epsilon_greedy",
            Variant::Voi => "voi",
            Variant::RqBonus => "rq_bonus",
            Variant::Wp => "wp",
        }
    }

    /// Default configuration of this variant.
    pub fn config(self) -> SearchConfig {
        let base = SearchConfig::default();
        match self {
            Variant::Basic => base,
            Variant::Hp => base.with_reward(RewardBase::Material),
            Variant::Sigmoid => base.with_reward(RewardBase::Sigmoid {
                k: DEFAULT_SIGMOID_K,
            }),
            Variant::Fap => base.with_segmentation(Segmentation::default()),
            Variant::UcbTuned => base.with_tree_policy(TreePolicy::Ucb1Tuned),
            Variant::SimpleRegret => base.with_root_policy(RootPolicy::UcbSqrt),
            Variant::EpsilonGreedy => base.with_root_policy(RootPolicy::EpsilonGreedy),
            Variant::Voi => base.with_root_policy(RootPolicy::Voi),
            Variant::RqBonus => base.with_bonus(RqBonus::default()),
            Variant::Wp => base.with_reward(RewardBase::WeightedPlayout(WeightedPlayout::default())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase().replace('-', "_");
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == lower)
            .ok_or_else(|| ConfigError::UnknownName {
                kind: "variant",
                name: s.to_string(),
            })
    }
}
