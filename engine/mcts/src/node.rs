//! Search tree node representation.
//!
//! Each node represents a game state reached by taking an action from the
//! parent. Legal actions are listed once when the node is created; child
//! states are only produced when an action is expanded.

use engine_core::{Game, Player};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// Cursor over the actions of a node that have not been expanded yet.
///
/// Actions before `cursor` have been handed out; the rest are untried.
/// Taking an arbitrary untried action swaps it into the cursor slot first,
/// so every action is handed out exactly once.
#[derive(Debug, Clone)]
pub struct UntriedActions<A> {
    actions: Vec<A>,
    cursor: usize,
}

impl<A: Clone> UntriedActions<A> {
    pub fn new(actions: Vec<A>) -> Self {
        Self { actions, cursor: 0 }
    }

    /// Number of actions not handed out yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.actions.len() - self.cursor
    }

    /// True once every action has been handed out.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.actions.len()
    }

    /// Next untried action in enumeration order without taking it.
    pub fn peek(&self) -> Option<&A> {
        self.actions.get(self.cursor)
    }

    /// Take the next untried action in enumeration order.
    pub fn try_next(&mut self) -> Option<A> {
        self.take_at(0)
    }

    /// Take the untried action `offset` places after the cursor.
    pub fn take_at(&mut self, offset: usize) -> Option<A> {
        if offset >= self.remaining() {
            return None;
        }
        self.actions.swap(self.cursor, self.cursor + offset);
        let action = self.actions[self.cursor].clone();
        self.cursor += 1;
        Some(action)
    }
}

/// A node in the search tree.
#[derive(Debug)]
pub struct Node<G: Game> {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Action that led to this node from parent (None for root)
    pub action: Option<G::Action>,

    /// Game state at this node
    pub state: G::State,

    /// Player who chose `action`; for the root, the opponent of the player to move
    pub mover: Player,

    /// Signed reward sum from the mover's perspective
    pub value: f64,

    /// Visit weight; FAP backups add more than one per iteration
    pub visits: f64,

    /// Sum of squared scaled rewards (UCB1-Tuned)
    pub squared_value_sum: f64,

    /// Distance from the root
    pub depth: u32,

    /// No legal actions from this state
    pub terminal: bool,

    /// Expanded children in expansion order
    pub children: Vec<NodeId>,

    pub untried: UntriedActions<G::Action>,
}

impl<G: Game> Node<G> {
    /// Create a new root node.
    pub fn new_root(game: &G, state: G::State) -> Self {
        let mover = game.active_player(&state).opponent();
        Self::build(game, NodeId::NONE, None, state, mover, 0)
    }

    /// Create a new child node.
    pub fn new_child(
        game: &G,
        parent: NodeId,
        action: G::Action,
        state: G::State,
        mover: Player,
        depth: u32,
    ) -> Self {
        Self::build(game, parent, Some(action), state, mover, depth)
    }

    fn build(
        game: &G,
        parent: NodeId,
        action: Option<G::Action>,
        state: G::State,
        mover: Player,
        depth: u32,
    ) -> Self {
        let actions = game.legal_actions(&state);
        Self {
            parent,
            action,
            terminal: actions.is_empty(),
            untried: UntriedActions::new(actions),
            state,
            mover,
            value: 0.0,
            visits: 0.0,
            squared_value_sum: 0.0,
            depth,
            children: Vec::new(),
        }
    }

    /// Mean reward `value / visits` from the mover's perspective.
    /// Returns 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f64 {
        if self.visits > 0.0 {
            self.value / self.visits
        } else {
            0.0
        }
    }

    /// Mean reward mapped from [-1, 1] into [0, 1].
    #[inline]
    pub fn scaled_mean(&self) -> f64 {
        (1.0 + self.mean_value()) / 2.0
    }

    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_exhausted()
    }

    #[inline]
    pub fn is_visited(&self) -> bool {
        self.visits > 0.0
    }

    /// Player to move at this node.
    #[inline]
    pub fn to_move(&self) -> Player {
        self.mover.opponent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_tictactoe::{Action, State, TicTacToe};

    #[test]
    fn test_node_id_none() {
        assert!(NodeId::NONE.is_none());
        assert!(!NodeId::NONE.is_some());
        assert!(!NodeId(0).is_none());
        assert!(NodeId(0).is_some());
    }

    #[test]
    fn test_new_root() {
        let game = TicTacToe::new();
        let node = Node::new_root(&game, State::new());

        assert!(node.parent.is_none());
        assert!(node.action.is_none());
        assert_eq!(node.mover, Player::Second);
        assert_eq!(node.to_move(), Player::First);
        assert_eq!(node.depth, 0);
        assert!(!node.terminal);
        assert!(!node.is_fully_expanded());
        assert_eq!(node.untried.remaining(), 9);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_terminal_node_is_fully_expanded() {
        let game = TicTacToe::new();
        let node = Node::new_root(&game, State::from_picture("XXXOO...."));
        assert!(node.terminal);
        assert!(node.is_fully_expanded());
    }

    #[test]
    fn test_mean_value() {
        let game = TicTacToe::new();
        let mut node = Node::new_root(&game, State::new());

        // Unvisited
        assert_eq!(node.mean_value(), 0.0);
        assert!((node.scaled_mean() - 0.5).abs() < 1e-12);

        // After visits
        node.visits = 4.0;
        node.value = 2.0;
        assert!((node.mean_value() - 0.5).abs() < 1e-12);
        assert!((node.scaled_mean() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_untried_in_order() {
        let mut untried = UntriedActions::new(vec![Action::Place(0), Action::Place(4)]);
        assert_eq!(untried.peek(), Some(&Action::Place(0)));
        assert_eq!(untried.try_next(), Some(Action::Place(0)));
        assert_eq!(untried.try_next(), Some(Action::Place(4)));
        assert_eq!(untried.try_next(), None);
        assert!(untried.is_exhausted());
        assert_eq!(untried.remaining(), 0);
    }

    #[test]
    fn test_untried_take_at_hands_out_each_action_once() {
        let mut untried = UntriedActions::new((0..5).collect::<Vec<u8>>());

        let mut taken = vec![
            untried.take_at(3).unwrap(),
            untried.take_at(0).unwrap(),
            untried.take_at(2).unwrap(),
        ];
        assert_eq!(untried.remaining(), 2);
        assert_eq!(untried.take_at(2), None);
        while let Some(a) = untried.try_next() {
            taken.push(a);
        }

        assert_eq!(taken[0], 3);
        taken.sort_unstable();
        assert_eq!(taken, vec![0, 1, 2, 3, 4]);
    }
}
