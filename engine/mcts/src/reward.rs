//! Reward pipeline: playout result to backed-up scalar.
//!
//! Three layers are applied in order: the base reward, the optional RQ
//! bonus, and the optional FAP segment factor. The same factor is used as
//! the visit increment of the backup.

use engine_core::{outcome_reward, Game, Player};

use crate::config::{RewardBase, RqBonus, Segmentation, WeightedPlayout};
use crate::node::Node;
use crate::playout::{PlayoutResult, Sampling};
use crate::stats::RunningStats;

/// `2 / (1 + e^(-k x)) - 1`, a sigmoid stretched onto (-1, 1).
#[inline]
pub fn signed_sigmoid(k: f64, x: f64) -> f64 {
    2.0 / (1.0 + (-k * x).exp()) - 1.0
}

/// Weight of sample `index` (0-based) out of `len` samples.
#[inline]
pub fn sample_weight(params: &WeightedPlayout, index: usize, len: usize) -> f64 {
    let i = index as f64;
    let n = len as f64;
    let poe = params.poe_base.powf(-i).min(params.cap);
    let voi = params.voi_base.powf(i - n).min(params.cap);
    (poe + voi) / 2.0
}

/// Weighted average of playout samples, normalized by `upper_bound`.
///
/// Returns 0.0 for an empty sample list or a zero normalizer.
pub fn weighted_playout_reward(params: &WeightedPlayout, samples: &[f64], upper_bound: f64) -> f64 {
    if samples.is_empty() || upper_bound == 0.0 {
        return 0.0;
    }

    let mut weighted = 0.0;
    let mut total = 0.0;
    for (i, &s) in samples.iter().enumerate() {
        let w = sample_weight(params, i, samples.len());
        weighted += w * s;
        total += w;
    }

    if total == 0.0 {
        return 0.0;
    }
    weighted / (total * upper_bound)
}

/// Base reward of a finished playout from `mover`'s perspective.
pub fn base_reward<G: Game>(
    game: &G,
    base: &RewardBase,
    playout: &PlayoutResult<G::State>,
    mover: Player,
    upper_bound: f64,
) -> f64 {
    match base {
        RewardBase::Outcome => outcome_reward(playout.outcome, mover),
        RewardBase::Material => game.evaluate(&playout.final_state, mover),
        RewardBase::Sigmoid { k } => {
            signed_sigmoid(*k, game.evaluate(&playout.final_state, mover))
        }
        RewardBase::WeightedPlayout(params) => {
            weighted_playout_reward(params, &playout.samples, upper_bound)
        }
    }
}

/// Iteration-to-segment mapping for FAP backups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSchedule {
    segmentation: Segmentation,
    budget: u32,
    width: u32,
}

impl SegmentSchedule {
    /// Returns `None` when the budget is too small for one iteration per
    /// linear segment.
    pub fn new(segmentation: Segmentation, budget: u32) -> Option<Self> {
        let width = budget / segmentation.segments.max(1);
        if width == 0 {
            return None;
        }
        Some(Self {
            segmentation,
            budget,
            width,
        })
    }

    /// 1-based segment of 1-based `iteration`.
    pub fn segment(&self, iteration: u32) -> u32 {
        if self.segmentation.geometric_boundaries {
            let n = self.segmentation.segments;
            let denominator = 2f64.powi(n as i32) - 1.0;
            let i = f64::from(iteration);
            let passed = (1..=n)
                .take_while(|&j| i >= f64::from(self.budget) * 2f64.powi(j as i32) / denominator)
                .count() as u32;
            1 + passed
        } else {
            (iteration - 1) / self.width + 1
        }
    }

    /// Reward factor and visit increment of `iteration`.
    pub fn weight(&self, iteration: u32) -> f64 {
        let segment = self.segment(iteration);
        if self.segmentation.geometric_weights {
            2f64.powi(segment as i32 - 1)
        } else {
            f64::from(segment)
        }
    }
}

/// Running state of the RQ bonus over one search.
#[derive(Debug, Clone)]
pub struct BonusTracker {
    k: f64,
    relative: Option<RunningStats>,
    qualitative: Option<RunningStats>,
}

impl BonusTracker {
    pub fn new(bonus: RqBonus) -> Self {
        Self {
            k: bonus.k,
            relative: bonus.relative.then(RunningStats::new),
            qualitative: bonus.qualitative.then(RunningStats::new),
        }
    }

    /// Adjust `reward` for this sample, then record the sample.
    ///
    /// `distance` is tree depth plus playout plies, `quality` the final
    /// evaluation normalized to [-1, 1], `base` the reward before any bonus.
    pub fn apply(&mut self, reward: f64, base: f64, distance: f64, quality: f64) -> f64 {
        let win = if base > 0.0 { 1.0 } else { 0.0 };
        let mut reward = reward;

        if let Some(stats) = self.relative.as_mut() {
            reward += reward * bonus_term(stats, stats.mean() - distance, self.k);
            stats.push(distance, win);
        }
        if let Some(stats) = self.qualitative.as_mut() {
            reward += reward * bonus_term(stats, quality - stats.mean(), self.k);
            stats.push(quality, win);
        }

        reward
    }
}

/// `alpha * b`, with `b` a sigmoid of the z-scored offset and `alpha` the
/// metric's covariance with winning over its spread.
fn bonus_term(stats: &RunningStats, offset: f64, k: f64) -> f64 {
    let s = stats.std_dev();
    if stats.count() < 2 || s <= 0.0 {
        return 0.0;
    }
    let lambda = offset / s;
    let bonus = signed_sigmoid(k, lambda);
    let alpha = stats.covariance().abs() / s;
    alpha * bonus
}

/// Per-search reward state built from a config.
#[derive(Debug, Clone)]
pub struct RewardPipeline {
    base: RewardBase,
    bonus: Option<BonusTracker>,
    segments: Option<SegmentSchedule>,
    /// Normalizer of the weighted-playout reward
    upper_bound: f64,
}

/// Reward and visit weight of one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPlayout {
    pub base: f64,
    pub reward: f64,
    pub weight: f64,
}

impl RewardPipeline {
    /// Returns `None` when segmentation does not fit `budget`.
    pub fn new<G: Game>(
        game: &G,
        root: &G::State,
        base: RewardBase,
        bonus: Option<RqBonus>,
        segmentation: Option<Segmentation>,
        budget: u32,
    ) -> Option<Self> {
        let segments = match segmentation {
            Some(seg) => Some(SegmentSchedule::new(seg, budget)?),
            None => None,
        };
        let upper_bound = match base {
            RewardBase::WeightedPlayout(_) => game
                .material(root, Player::First)
                .max(game.material(root, Player::Second)),
            _ => 0.0,
        };
        Some(Self {
            base,
            bonus: bonus.map(BonusTracker::new),
            segments,
            upper_bound,
        })
    }

    /// What the playout has to record for this pipeline.
    pub fn sampling(&self) -> Sampling {
        match self.base {
            RewardBase::WeightedPlayout(wp) => Sampling::EveryOtherPly {
                relative: wp.relative,
            },
            _ => Sampling::Off,
        }
    }

    /// Whether backups divide by the leading side's material.
    pub fn normalizes_backup(&self) -> bool {
        matches!(self.base, RewardBase::Material)
    }

    /// Run all layers for one iteration.
    pub fn score<G: Game>(
        &mut self,
        game: &G,
        playout: &PlayoutResult<G::State>,
        mover: Player,
        leaf_depth: u32,
        iteration: u32,
    ) -> ScoredPlayout {
        let base = base_reward(game, &self.base, playout, mover, self.upper_bound);
        let mut reward = base;

        if let Some(tracker) = self.bonus.as_mut() {
            let distance = f64::from(leaf_depth) + f64::from(playout.plies);
            let quality = game.evaluate(&playout.final_state, mover) / game.max_evaluation();
            reward = tracker.apply(reward, base, distance, quality);
        }

        let weight = self
            .segments
            .map_or(1.0, |schedule| schedule.weight(iteration));

        ScoredPlayout {
            base,
            reward: reward * weight,
            weight,
        }
    }
}

/// Amount added to a node's value for a material-based reward `r`.
///
/// `r` is divided by the material of the side ahead: the node's mover for a
/// positive reward, otherwise the player to move, plus the game's floor.
/// A zero reward stays zero even when both are empty.
pub fn material_normalized<G: Game>(game: &G, node: &Node<G>, r: f64) -> f64 {
    if r == 0.0 {
        return 0.0;
    }
    let leader = if r > 0.0 { node.mover } else { node.to_move() };
    r / (game.material(&node.state, leader) + game.material_floor())
}
