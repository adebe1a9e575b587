//! MCTS search driver.
//!
//! Each iteration runs the usual four phases:
//! 1. Selection: descend with the root policy at the root and the tree policy below it
//! 2. Expansion: add one child for an untried action
//! 3. Simulation: random playout, scored by the reward pipeline
//! 4. Backpropagation: add the reward along the path, flipping sign per level
//!
//! A [`Searcher`] owns the random stream and the configuration; every call to
//! [`Searcher::search`] builds a fresh tree from the given root state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use engine_core::Game;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{ConfigError, ExpansionOrder, RewardBase, RootPolicy, SearchConfig, TreePolicy};
use crate::instrument::{IterationObserver, IterationRecord};
use crate::node::NodeId;
use crate::playout::run_playout;
use crate::policy::{epsilon_greedy, select_child, select_voi, Exploit, RootChoice, Score};
use crate::reward::{material_normalized, RewardPipeline};
use crate::tree::{Backup, SearchTree};

/// Errors that can occur during a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Non-finite reward {value} in iteration {iteration}")]
    NonFiniteReward { iteration: u32, value: f64 },

    #[error("Node {node} has non-finite statistics after iteration {iteration}")]
    NonFiniteBackup { iteration: u32, node: u32 },

    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The iteration budget was used up
    Budget,
    /// The best root action stayed in the target set long enough
    TargetStreak,
    /// The wall-clock deadline passed
    Deadline,
    /// The cancel token was raised
    Cancelled,
}

/// Shared flag for stopping a search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Early stop once the best root action has been one of `actions` for
/// `streak` consecutive iterations.
#[derive(Debug, Clone)]
pub struct TargetStreak<A> {
    pub actions: Vec<A>,
    pub streak: u32,
}

/// Stopping conditions for one search.
#[derive(Debug, Clone)]
pub struct SearchLimits<A> {
    pub budget: u32,
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelToken>,
    pub target: Option<TargetStreak<A>>,
}

impl<A> SearchLimits<A> {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            deadline: None,
            cancel: None,
            target: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_target(mut self, actions: Vec<A>, streak: u32) -> Self {
        self.target = Some(TargetStreak { actions, streak });
        self
    }
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchResult<A> {
    /// Root action with the highest mean value
    pub action: A,

    /// Mean value of the chosen child, from the root mover's side
    pub value: f64,

    /// Iterations actually run
    pub iterations: u32,

    /// Deepest node selected during the search
    pub max_depth: u32,

    /// Nodes in the final tree
    pub nodes: usize,

    pub stop: StopReason,
}

/// Runs searches for one game under one configuration.
pub struct Searcher<'a, G: Game> {
    game: &'a G,
    config: SearchConfig,
    rng: ChaCha20Rng,
    observer: Option<Box<dyn IterationObserver + 'a>>,
    tree: Option<SearchTree<G>>,
}

impl<'a, G: Game> Searcher<'a, G> {
    /// Validates `config` and seeds the random stream from `config.seed`.
    pub fn new(game: &'a G, config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            game,
            rng: ChaCha20Rng::seed_from_u64(config.seed),
            config,
            observer: None,
            tree: None,
        })
    }

    pub fn with_observer(mut self, observer: impl IterationObserver + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn IterationObserver + 'a>>) {
        self.observer = observer;
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Tree of the most recent search.
    pub fn tree(&self) -> Option<&SearchTree<G>> {
        self.tree.as_ref()
    }

    /// Search `root` for `budget` iterations.
    pub fn search(
        &mut self,
        root: &G::State,
        budget: u32,
    ) -> Result<SearchResult<G::Action>, SearchError> {
        self.search_with(root, &SearchLimits::new(budget))
    }

    /// Search `root` until the budget runs out or another limit triggers.
    pub fn search_with(
        &mut self,
        root: &G::State,
        limits: &SearchLimits<G::Action>,
    ) -> Result<SearchResult<G::Action>, SearchError> {
        if limits.budget == 0 {
            return Err(SearchError::InvalidBudget("budget must be at least 1".into()));
        }
        if limits.target.as_ref().is_some_and(|t| t.streak == 0) {
            return Err(SearchError::InvalidBudget(
                "target streak must be at least 1".into(),
            ));
        }

        let mut tree = SearchTree::new(self.game, root.clone());
        if tree.get(tree.root()).terminal {
            return Err(SearchError::NoLegalMoves);
        }

        let mut pipeline = RewardPipeline::new(
            self.game,
            root,
            self.config.reward,
            self.config.bonus,
            self.config.segmentation,
            limits.budget,
        )
        .ok_or_else(|| {
            SearchError::InvalidBudget(format!(
                "budget {} leaves an empty segment",
                limits.budget
            ))
        })?;

        debug!(
            game = self.game.name(),
            budget = limits.budget,
            config = %self.config.describe(),
            "Starting search"
        );

        let mut run = Run {
            iteration: 0,
            max_depth: 0,
            streak: 0,
        };
        let started = Instant::now();
        let mut stop = StopReason::Budget;

        while run.iteration < limits.budget {
            if limits.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                stop = StopReason::Cancelled;
                break;
            }
            if limits.deadline.is_some_and(|d| Instant::now() >= d) {
                stop = StopReason::Deadline;
                break;
            }

            run.iteration += 1;
            self.simulate(&mut tree, &mut pipeline, &mut run)?;

            if let Some(target) = &limits.target {
                // Only count once every root action has been tried
                if tree.get(tree.root()).is_fully_expanded() {
                    let on_target = tree
                        .best_action()
                        .is_some_and(|a| target.actions.contains(a));
                    run.streak = if on_target { run.streak + 1 } else { 0 };
                    if run.streak >= target.streak {
                        stop = StopReason::TargetStreak;
                        break;
                    }
                }
            }
        }

        let (action, value) = match tree.best_child() {
            Some(id) => {
                let child = tree.get(id);
                (child.action.clone(), child.mean_value())
            }
            None => (fallback_action(&tree), 0.0),
        };
        let action = action.ok_or(SearchError::NoLegalMoves)?;

        let result = SearchResult {
            action,
            value,
            iterations: run.iteration,
            max_depth: run.max_depth,
            nodes: tree.len(),
            stop,
        };

        debug!(
            iterations = result.iterations,
            nodes = result.nodes,
            max_depth = result.max_depth,
            value = result.value,
            stop = ?result.stop,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );

        self.tree = Some(tree);
        Ok(result)
    }

    /// Run a single iteration.
    fn simulate(
        &mut self,
        tree: &mut SearchTree<G>,
        pipeline: &mut RewardPipeline,
        run: &mut Run,
    ) -> Result<(), SearchError> {
        let started = Instant::now();
        let game = self.game;
        let iteration = run.iteration;

        let leaf = self.select(tree, exploit_for(&self.config.reward));
        let (mover, depth) = {
            let node = tree.get(leaf);
            (node.mover, node.depth)
        };

        let playout = run_playout(
            game,
            &tree.get(leaf).state,
            mover,
            self.config.playout_depth,
            pipeline.sampling(),
            &mut self.rng,
        );
        let scored = pipeline.score(game, &playout, mover, depth, iteration);
        if !scored.reward.is_finite() {
            return Err(SearchError::NonFiniteReward {
                iteration,
                value: scored.reward,
            });
        }

        let backup = Backup {
            reward: scored.reward,
            weight: scored.weight,
            track_squares: self.config.tree_policy == TreePolicy::Ucb1Tuned,
        };
        let backed = if pipeline.normalizes_backup() {
            tree.backpropagate(leaf, backup, |node, r| material_normalized(game, node, r))
        } else {
            tree.backpropagate(leaf, backup, |_, r| r)
        };
        backed.map_err(|node| SearchError::NonFiniteBackup {
            iteration,
            node: node.0,
        })?;

        run.max_depth = run.max_depth.max(depth);

        trace!(
            iteration,
            leaf = leaf.0,
            depth,
            plies = playout.plies,
            base = scored.base,
            reward = scored.reward,
            weight = scored.weight,
            "Iteration complete"
        );

        if let Some(observer) = self.observer.as_mut() {
            observer.on_iteration(&IterationRecord {
                iteration,
                max_depth: run.max_depth,
                elapsed: started.elapsed(),
            });
        }

        Ok(())
    }

    /// Descend from the root, expanding at most one node.
    fn select(&mut self, tree: &mut SearchTree<G>, exploit: Exploit) -> NodeId {
        let root = tree.root();
        let mut current = root;

        loop {
            let (terminal, fully_expanded) = {
                let node = tree.get(current);
                (node.terminal, node.is_fully_expanded())
            };
            if terminal {
                return current;
            }

            if current == root && self.config.root_policy == RootPolicy::EpsilonGreedy {
                match epsilon_greedy(tree, root, self.config.epsilon, &mut self.rng) {
                    RootChoice::Child(id) => {
                        current = id;
                        continue;
                    }
                    RootChoice::Expand(offset) => return self.expand(tree, root, Some(offset)),
                    RootChoice::ExpandAny => return self.expand(tree, root, None),
                }
            }

            if !fully_expanded {
                return self.expand(tree, current, None);
            }

            let next = if current == root {
                self.select_at_root(tree, exploit)
            } else {
                let score = Score::for_tree(self.config.tree_policy, self.config.exploration);
                select_child(tree, current, score, exploit)
            };

            match next {
                Some(id) => current = id,
                None => return current,
            }
        }
    }

    fn select_at_root(&self, tree: &SearchTree<G>, exploit: Exploit) -> Option<NodeId> {
        let root = tree.root();
        let c = self.config.exploration;
        match self.config.root_policy {
            RootPolicy::Tree | RootPolicy::EpsilonGreedy => {
                select_child(tree, root, Score::for_tree(self.config.tree_policy, c), exploit)
            }
            RootPolicy::UcbSqrt => select_child(tree, root, Score::UcbSqrt { c }, exploit),
            RootPolicy::Voi => select_voi(tree, root),
        }
    }

    /// Expand one untried action of `node`. `offset` overrides the
    /// configured expansion order.
    fn expand(&mut self, tree: &mut SearchTree<G>, node: NodeId, offset: Option<usize>) -> NodeId {
        let remaining = tree.get(node).untried.remaining();
        if remaining == 0 {
            return node;
        }
        let offset = match offset {
            Some(offset) => offset,
            None => match self.config.expansion {
                ExpansionOrder::Ordered => 0,
                ExpansionOrder::Random => self.rng.gen_range(0..remaining),
            },
        };
        tree.expand_at(self.game, node, offset).unwrap_or(node)
    }
}

/// Counters of the search in progress.
struct Run {
    iteration: u32,
    max_depth: u32,
    streak: u32,
}

/// Weighted-playout rewards are signed and unbounded, so they enter the
/// exploitation term as stored.
fn exploit_for(reward: &RewardBase) -> Exploit {
    match reward {
        RewardBase::WeightedPlayout(_) => Exploit::Raw,
        _ => Exploit::Scaled,
    }
}

/// Action reported when no root child was visited.
fn fallback_action<G: Game>(tree: &SearchTree<G>) -> Option<G::Action> {
    let root = tree.get(tree.root());
    root.children
        .first()
        .and_then(|&id| tree.get(id).action.clone())
        .or_else(|| root.untried.peek().cloned())
}

/// Run one search with `config.budget` iterations.
pub fn run_search<G: Game>(
    game: &G,
    config: SearchConfig,
    root: &G::State,
) -> Result<SearchResult<G::Action>, SearchError> {
    let budget = config.budget;
    let mut searcher = Searcher::new(game, config)?;
    searcher.search(root, budget)
}
