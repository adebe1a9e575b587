//! Tree policies: scoring children during selection.
//!
//! Every scoring function is pure over a node and its parent's visit count.
//! Selection compares scores with a strict `>` against the running best, so
//! the earliest child wins ties. Unvisited children score `+inf`.

use engine_core::Game;
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::config::TreePolicy;
use crate::node::{Node, NodeId};
use crate::tree::SearchTree;

/// Upper bound on the UCB1-Tuned variance estimate.
pub const TUNED_VARIANCE_CAP: f64 = 0.25;

/// How a child's mean value enters the exploitation term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exploit {
    /// `(1 + mean) / 2`, in [0, 1] for rewards in [-1, 1]
    Scaled,
    /// The signed mean as stored
    Raw,
}

impl Exploit {
    #[inline]
    pub fn of<G: Game>(self, node: &Node<G>) -> f64 {
        match self {
            Exploit::Scaled => node.scaled_mean(),
            Exploit::Raw => node.mean_value(),
        }
    }
}

/// UCB1: `exploit + c * sqrt(ln(N) / n)`.
#[inline]
pub fn ucb1(exploit: f64, parent_visits: f64, visits: f64, c: f64) -> f64 {
    exploit + c * (parent_visits.ln() / visits).sqrt()
}

/// UCB1-Tuned variance estimate, capped at [`TUNED_VARIANCE_CAP`].
#[inline]
pub fn tuned_variance(squared_sum: f64, exploit: f64, parent_visits: f64, visits: f64) -> f64 {
    let v = squared_sum / visits - exploit * exploit
        + (2.0 * parent_visits.ln() / visits).sqrt();
    v.min(TUNED_VARIANCE_CAP)
}

/// UCB1-Tuned: `exploit + sqrt(ln(N) / n * min(0.25, v))`.
#[inline]
pub fn ucb1_tuned(exploit: f64, squared_sum: f64, parent_visits: f64, visits: f64) -> f64 {
    let variance = tuned_variance(squared_sum, exploit, parent_visits, visits);
    exploit + (parent_visits.ln() / visits * variance).sqrt()
}

/// UCB-sqrt: `exploit + c * sqrt(sqrt(N) / n)`.
#[inline]
pub fn ucb_sqrt(exploit: f64, parent_visits: f64, visits: f64, c: f64) -> f64 {
    exploit + c * (parent_visits.sqrt() / visits).sqrt()
}

/// Scoring rule for one selection step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Ucb1 { c: f64 },
    Ucb1Tuned,
    UcbSqrt { c: f64 },
}

impl Score {
    /// Scoring rule of a tree policy below the root.
    pub fn for_tree(policy: TreePolicy, c: f64) -> Self {
        match policy {
            TreePolicy::Ucb1 => Score::Ucb1 { c },
            TreePolicy::Ucb1Tuned => Score::Ucb1Tuned,
        }
    }

    /// Score of `child` under a parent with `parent_visits` visits.
    pub fn of<G: Game>(self, child: &Node<G>, parent_visits: f64, exploit: Exploit) -> f64 {
        if !child.is_visited() {
            return f64::INFINITY;
        }
        let mean = exploit.of(child);
        match self {
            Score::Ucb1 { c } => ucb1(mean, parent_visits, child.visits, c),
            Score::Ucb1Tuned => ucb1_tuned(mean, child.squared_value_sum, parent_visits, child.visits),
            Score::UcbSqrt { c } => ucb_sqrt(mean, parent_visits, child.visits, c),
        }
    }
}

/// Highest-scoring child of `parent`; earliest wins ties.
pub fn select_child<G: Game>(
    tree: &SearchTree<G>,
    parent: NodeId,
    score: Score,
    exploit: Exploit,
) -> Option<NodeId> {
    let parent_visits = tree.get(parent).visits;
    let mut best: Option<(NodeId, f64)> = None;

    for &id in tree.children(parent) {
        let s = score.of(tree.get(id), parent_visits, exploit);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((id, s));
        }
    }

    best.map(|(id, _)| id)
}

/// Value-of-information ranking at the root.
///
/// Finds the best and second-best children by scaled mean, then scores the
/// best child with `voiBest` and every other child with `voiOther`. A single
/// child is returned directly.
pub fn select_voi<G: Game>(tree: &SearchTree<G>, root: NodeId) -> Option<NodeId> {
    let children = tree.children(root);
    match children.len() {
        0 => return None,
        1 => return Some(children[0]),
        _ => {}
    }

    let mut best: Option<(NodeId, f64)> = None;
    let mut second: Option<(NodeId, f64)> = None;
    for &id in children {
        let mean = tree.get(id).scaled_mean();
        if best.map_or(true, |(_, b)| mean > b) {
            second = best;
            best = Some((id, mean));
        } else if second.map_or(true, |(_, s)| mean > s) {
            second = Some((id, mean));
        }
    }

    let (best_id, mu_best) = best?;
    let (_, mu_second) = second?;
    let best_visits = tree.get(best_id).visits;

    let mut chosen: Option<(NodeId, f64)> = None;
    for &id in children {
        let voi = if id == best_id {
            voi_best(mu_best, mu_second, best_visits)
        } else {
            let child = tree.get(id);
            voi_other(mu_best, child.scaled_mean(), child.visits)
        };
        if chosen.map_or(true, |(_, c)| voi > c) {
            chosen = Some((id, voi));
        }
    }

    chosen.map(|(id, _)| id)
}

/// `mu_second / (n_best + 1) * exp(-2 (mu_best - mu_second)^2 n_best)`
#[inline]
pub fn voi_best(mu_best: f64, mu_second: f64, best_visits: f64) -> f64 {
    let gap = mu_best - mu_second;
    mu_second / (best_visits + 1.0) * (-2.0 * gap * gap * best_visits).exp()
}

/// `(1 - mu_best) / (n + 1) * exp(-2 (mu_best - mu)^2 n)`
#[inline]
pub fn voi_other(mu_best: f64, mu: f64, visits: f64) -> f64 {
    let gap = mu_best - mu;
    (1.0 - mu_best) / (visits + 1.0) * (-2.0 * gap * gap * visits).exp()
}

/// Outcome of the epsilon-greedy root rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootChoice {
    /// Descend into an existing child
    Child(NodeId),
    /// Expand the untried action at this offset from the cursor
    Expand(usize),
    /// No children yet: expand in the configured order
    ExpandAny,
}

/// Epsilon-greedy choice at the root.
///
/// With probability `epsilon` the child with the highest raw mean is taken.
/// Otherwise a slot is drawn uniformly over the other children followed by
/// the untried actions. A root without children expands first.
pub fn epsilon_greedy<G: Game>(
    tree: &SearchTree<G>,
    root: NodeId,
    epsilon: f64,
    rng: &mut ChaCha20Rng,
) -> RootChoice {
    let node = tree.get(root);
    let children = &node.children;
    if children.is_empty() {
        return RootChoice::ExpandAny;
    }

    let mut best_index = 0;
    let mut best_mean = f64::NEG_INFINITY;
    for (i, &id) in children.iter().enumerate() {
        let mean = tree.get(id).mean_value();
        if mean > best_mean {
            best_index = i;
            best_mean = mean;
        }
    }

    if rng.gen::<f64>() < epsilon {
        return RootChoice::Child(children[best_index]);
    }

    let others = children.len() - 1;
    let slots = others + node.untried.remaining();
    if slots == 0 {
        return RootChoice::Child(children[best_index]);
    }

    let slot = rng.gen_range(0..slots);
    if slot < best_index {
        RootChoice::Child(children[slot])
    } else if slot < others {
        RootChoice::Child(children[slot + 1])
    } else {
        RootChoice::Expand(slot - others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Backup;
    use games_tictactoe::{State, TicTacToe};
    use rand::SeedableRng;

    fn backup(tree: &mut SearchTree<TicTacToe>, id: NodeId, reward: f64) {
        let b = Backup {
            reward,
            weight: 1.0,
            track_squares: true,
        };
        tree.backpropagate(id, b, |_, r| r).unwrap();
    }

    fn tree_with_children(n: usize) -> (TicTacToe, SearchTree<TicTacToe>, Vec<NodeId>) {
        let game = TicTacToe::new();
        let mut tree = SearchTree::new(&game, State::new());
        let root = tree.root();
        let ids = (0..n)
            .map(|_| tree.expand_next(&game, root).unwrap())
            .collect();
        (game, tree, ids)
    }

    #[test]
    fn test_ucb1_formula() {
        // exploit 0.75, N = 100, n = 10, c = 1
        let expected = 0.75 + (100f64.ln() / 10.0).sqrt();
        assert!((ucb1(0.75, 100.0, 10.0, 1.0) - expected).abs() < 1e-12);
        // c = 0 is pure exploitation
        assert_eq!(ucb1(0.3, 50.0, 5.0, 0.0), 0.3);
    }

    #[test]
    fn test_ucb_sqrt_formula() {
        let expected = 0.5 + 2.0 * (16f64.sqrt() / 4.0).sqrt();
        assert!((ucb_sqrt(0.5, 16.0, 4.0, 2.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tuned_variance_is_capped() {
        // Large exploration bonus pushes the raw estimate far above the cap
        let v = tuned_variance(1.0, 0.0, 1000.0, 1.0);
        assert_eq!(v, TUNED_VARIANCE_CAP);

        // Many visits with consistent rewards stay below the cap
        let n = 10_000.0;
        let v = tuned_variance(n * 0.25, 0.5, n, n);
        assert!(v < TUNED_VARIANCE_CAP);
        assert!(v >= 0.0);
    }

    #[test]
    fn test_tuned_variance_never_exceeds_cap() {
        for n in [1.0, 2.0, 5.0, 40.0] {
            for parent in [2.0, 10.0, 1e4] {
                for sq in [0.0, 0.3 * n, n] {
                    for exploit in [0.0, 0.5, 1.0] {
                        assert!(tuned_variance(sq, exploit, parent, n) <= TUNED_VARIANCE_CAP);
                    }
                }
            }
        }
    }

    #[test]
    fn test_unvisited_child_is_selected_first() {
        let (_, mut tree, ids) = tree_with_children(3);
        backup(&mut tree, ids[0], 1.0);
        backup(&mut tree, ids[2], 1.0);

        let root = tree.root();
        let picked = select_child(&tree, root, Score::Ucb1 { c: 1.0 }, Exploit::Scaled);
        assert_eq!(picked, Some(ids[1]));
    }

    #[test]
    fn test_ties_go_to_earliest_child() {
        let (_, mut tree, ids) = tree_with_children(3);
        for &id in &ids {
            backup(&mut tree, id, 0.0);
        }

        let root = tree.root();
        for score in [Score::Ucb1 { c: 1.0 }, Score::Ucb1Tuned, Score::UcbSqrt { c: 1.0 }] {
            assert_eq!(select_child(&tree, root, score, Exploit::Scaled), Some(ids[0]));
        }
    }

    #[test]
    fn test_exploit_prefers_better_mean_when_c_is_zero() {
        let (_, mut tree, ids) = tree_with_children(2);
        backup(&mut tree, ids[0], -1.0);
        backup(&mut tree, ids[1], 1.0);

        let root = tree.root();
        assert_eq!(
            select_child(&tree, root, Score::Ucb1 { c: 0.0 }, Exploit::Raw),
            Some(ids[1])
        );
    }

    #[test]
    fn test_voi_formulas() {
        let best = voi_best(0.8, 0.6, 10.0);
        let expected = 0.6 / 11.0 * (-2.0 * 0.04 * 10.0f64).exp();
        assert!((best - expected).abs() < 1e-12);

        let other = voi_other(0.8, 0.5, 3.0);
        let expected = 0.2 / 4.0 * (-2.0 * 0.09 * 3.0f64).exp();
        assert!((other - expected).abs() < 1e-12);
    }

    #[test]
    fn test_voi_single_child() {
        let (_, mut tree, ids) = tree_with_children(1);
        backup(&mut tree, ids[0], 1.0);
        assert_eq!(select_voi(&tree, tree.root()), Some(ids[0]));
    }

    #[test]
    fn test_voi_prefers_undersampled_close_rival() {
        let (_, mut tree, ids) = tree_with_children(3);
        // Best child sampled heavily, a close rival once, a clear loser once
        for _ in 0..30 {
            backup(&mut tree, ids[0], 0.2);
        }
        backup(&mut tree, ids[1], 0.1);
        backup(&mut tree, ids[2], -1.0);

        // voiBest is tiny after 30 visits; the close rival has the largest VOI
        assert_eq!(select_voi(&tree, tree.root()), Some(ids[1]));
    }

    #[test]
    fn test_epsilon_greedy_without_children_expands() {
        let game = TicTacToe::new();
        let tree = SearchTree::new(&game, State::new());
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        assert_eq!(
            epsilon_greedy(&tree, tree.root(), 0.5, &mut rng),
            RootChoice::ExpandAny
        );
    }

    #[test]
    fn test_epsilon_one_always_takes_best() {
        let (_, mut tree, ids) = tree_with_children(3);
        backup(&mut tree, ids[0], -1.0);
        backup(&mut tree, ids[1], 1.0);
        backup(&mut tree, ids[2], 0.0);

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(
                epsilon_greedy(&tree, tree.root(), 1.0, &mut rng),
                RootChoice::Child(ids[1])
            );
        }
    }

    #[test]
    fn test_epsilon_zero_skips_best_and_covers_untried() {
        let (_, mut tree, ids) = tree_with_children(3);
        backup(&mut tree, ids[0], -1.0);
        backup(&mut tree, ids[1], 1.0);
        backup(&mut tree, ids[2], 0.0);

        // 2 other children + 6 untried actions
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut saw_expand = false;
        for _ in 0..200 {
            match epsilon_greedy(&tree, tree.root(), 0.0, &mut rng) {
                RootChoice::Child(id) => assert_ne!(id, ids[1], "best child is excluded"),
                RootChoice::Expand(offset) => {
                    assert!(offset < 6);
                    saw_expand = true;
                }
                RootChoice::ExpandAny => panic!("root already has children"),
            }
        }
        assert!(saw_expand);
    }
}
