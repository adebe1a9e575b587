//! Search tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices. Nodes are never removed; the whole
//! tree is dropped when the search that built it ends.

use engine_core::Game;

use crate::node::{Node, NodeId};

/// Search tree with arena-based node storage.
#[derive(Debug)]
pub struct SearchTree<G: Game> {
    /// Arena storing all nodes
    nodes: Vec<Node<G>>,

    /// Root node index (always 0 after initialization)
    root: NodeId,
}

/// Per-level update applied by [`SearchTree::backpropagate`].
#[derive(Debug, Clone, Copy)]
pub struct Backup {
    /// Reward at the leaf, from the leaf mover's perspective
    pub reward: f64,
    /// Visit increment for every node on the path
    pub weight: f64,
    /// Also accumulate squared scaled rewards (UCB1-Tuned)
    pub track_squares: bool,
}

impl<G: Game> SearchTree<G> {
    /// Create a new tree rooted at `state`.
    pub fn new(game: &G, state: G::State) -> Self {
        Self {
            nodes: vec![Node::new_root(game, state)],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<G> {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<G> {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: Node<G>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of a node, in expansion order.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Expand the next untried action of `parent` in enumeration order.
    pub fn expand_next(&mut self, game: &G, parent: NodeId) -> Option<NodeId> {
        self.expand_at(game, parent, 0)
    }

    /// Expand the untried action `offset` places after the cursor of `parent`.
    ///
    /// Returns `None` when no such untried action exists. Every legal action
    /// is expanded at most once.
    pub fn expand_at(&mut self, game: &G, parent: NodeId, offset: usize) -> Option<NodeId> {
        let action = self.get_mut(parent).untried.take_at(offset)?;

        let parent_node = self.get(parent);
        let state = game.apply(&parent_node.state, &action);
        let mover = game.active_player(&parent_node.state);
        let depth = parent_node.depth + 1;

        let child = Node::new_child(game, parent, action, state, mover, depth);
        let child_id = self.allocate(child);

        // Add to parent's children
        self.get_mut(parent).children.push(child_id);

        Some(child_id)
    }

    /// Backpropagate a reward from a leaf to the root.
    ///
    /// `normalize` maps the signed reward seen at a node to the amount added
    /// to its value. The reward is negated at each level (opponent's
    /// perspective). Stops at the first node whose statistics become
    /// non-finite and returns its id.
    pub fn backpropagate<F>(
        &mut self,
        leaf_id: NodeId,
        backup: Backup,
        mut normalize: F,
    ) -> Result<(), NodeId>
    where
        F: FnMut(&Node<G>, f64) -> f64,
    {
        let mut current_id = leaf_id;
        let mut current_value = backup.reward;

        while current_id.is_some() {
            let node = self.get_mut(current_id);
            let added = normalize(&*node, current_value);

            node.visits += backup.weight;
            node.value += added;
            if backup.track_squares {
                let scaled = (1.0 + added) / 2.0;
                node.squared_value_sum += scaled * scaled;
            }

            if !node.value.is_finite() || !node.squared_value_sum.is_finite() {
                return Err(current_id);
            }

            // Negate for opponent's perspective
            current_value = -current_value;

            current_id = node.parent;
        }

        Ok(())
    }

    /// Root child with the highest mean value (strict `>`, first wins).
    /// Unvisited children are skipped.
    pub fn best_child(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for &id in self.children(self.root) {
            let child = self.get(id);
            if !child.is_visited() {
                continue;
            }
            let mean = child.mean_value();
            if best.map_or(true, |(_, b)| mean > b) {
                best = Some((id, mean));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Action of [`SearchTree::best_child`].
    pub fn best_action(&self) -> Option<&G::Action> {
        self.best_child().and_then(|id| self.get(id).action.as_ref())
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visits,
            root_value: root.mean_value(),
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }
}

/// Statistics about a search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: f64,
    pub root_value: f64,
    pub max_depth: u32,
}
