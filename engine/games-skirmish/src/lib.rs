//! Skirmish: a small turn-based unit combat game
//!
//! Two fleets of units take turns. On its turn a side either fires one of
//! its armed units at an enemy unit or patches one point of hull on one of
//! its own damaged units. A unit whose hull reaches zero is removed. A side
//! wins once the enemy fleet is gone, or once the side to move has nothing
//! left to do while the enemy can still fire; the game is drawn when the ply
//! limit runs out.
//!
//! Material is the total remaining hull of a fleet, so hull-based rewards
//! (material-normalized backup, sigmoid compression, weighted playouts)
//! behave as they would in a larger wargame.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::{Game, Player};
//! use games_skirmish::Skirmish;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let game = Skirmish::new();
//! let mut rng = ChaCha20Rng::seed_from_u64(3);
//! let state = game.reset(&mut rng);
//! assert_eq!(game.material(&state, Player::First), game.material(&state, Player::Second));
//! assert!(!game.legal_actions(&state).is_empty());
//! ```

use engine_core::{signed_difference, Game, Outcome, Player};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

/// Default ply limit before a game is declared drawn
pub const DEFAULT_MAX_PLIES: u32 = 60;

/// Hull counted for every fleet when material is used as a divisor.
const FLAGSHIP_HULL: f64 = 1.0;

/// Static description of a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSpec {
    pub hull: u32,
    pub damage: u32,
}

/// Fleet every side starts with: frigate, corvette, tender.
pub const DEFAULT_ROSTER: [UnitSpec; 3] = [
    UnitSpec { hull: 6, damage: 2 },
    UnitSpec { hull: 4, damage: 1 },
    UnitSpec { hull: 3, damage: 0 },
];

/// A unit on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub hull: u32,
    pub max_hull: u32,
    pub damage: u32,
}

impl Unit {
    pub fn from_spec(spec: UnitSpec) -> Self {
        Self {
            hull: spec.hull,
            max_hull: spec.hull,
            damage: spec.damage,
        }
    }

    fn is_damaged(&self) -> bool {
        self.hull < self.max_hull
    }
}

/// Skirmish game state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Fleets indexed by [`Player::index`]
    fleets: [Vec<Unit>; 2],
    to_move: Player,
    plies: u32,
    max_plies: u32,
}

impl State {
    /// Build a position from explicit fleets, first player to move.
    pub fn new(first: Vec<Unit>, second: Vec<Unit>, max_plies: u32) -> Self {
        Self {
            fleets: [first, second],
            to_move: Player::First,
            plies: 0,
            max_plies,
        }
    }

    /// Units still afloat for `player`
    pub fn fleet(&self, player: Player) -> &[Unit] {
        &self.fleets[player.index()]
    }

    /// Plies played so far
    pub fn plies(&self) -> u32 {
        self.plies
    }

    /// Total remaining hull of `player`
    pub fn hull(&self, player: Player) -> u32 {
        self.fleet(player).iter().map(|u| u.hull).sum()
    }

    fn outcome(&self) -> Outcome {
        let first_alive = !self.fleets[0].is_empty();
        let second_alive = !self.fleets[1].is_empty();
        match (first_alive, second_alive) {
            (true, false) => Outcome::Win(Player::First),
            (false, true) => Outcome::Win(Player::Second),
            (false, false) => Outcome::Draw,
            (true, true) if self.plies >= self.max_plies => Outcome::Draw,
            (true, true) if !self.can_act(self.to_move) => {
                // Stranded: nothing to fire and nothing to patch
                let enemy = self.to_move.opponent();
                if self.is_armed(enemy) {
                    Outcome::Win(enemy)
                } else {
                    Outcome::Draw
                }
            }
            (true, true) => Outcome::Ongoing,
        }
    }

    fn is_armed(&self, player: Player) -> bool {
        self.fleet(player).iter().any(|u| u.damage > 0)
    }

    fn can_act(&self, player: Player) -> bool {
        self.fleet(player)
            .iter()
            .any(|u| u.damage > 0 || u.is_damaged())
    }
}

/// Skirmish action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fire own unit `attacker` at enemy unit `target`
    Attack { attacker: u8, target: u8 },
    /// Restore one hull point on own unit `unit`
    Repair { unit: u8 },
}

/// Skirmish game implementation
#[derive(Debug, Clone)]
pub struct Skirmish {
    roster: Vec<UnitSpec>,
    max_plies: u32,
}

impl Skirmish {
    /// Create a game with the default roster and ply limit
    pub fn new() -> Self {
        Self::with_roster(DEFAULT_ROSTER.to_vec(), DEFAULT_MAX_PLIES)
    }

    /// Create a game with a custom roster (both fleets get the same units)
    pub fn with_roster(roster: Vec<UnitSpec>, max_plies: u32) -> Self {
        Self { roster, max_plies }
    }

    /// Builder method to change the ply limit
    pub fn with_max_plies(mut self, max_plies: u32) -> Self {
        self.max_plies = max_plies;
        self
    }
}

impl Default for Skirmish {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for Skirmish {
    type State = State;
    type Action = Action;

    fn name(&self) -> &'static str {
        "skirmish"
    }

    /// Each fleet gets the roster in its own shuffled order.
    fn reset(&self, rng: &mut ChaCha20Rng) -> Self::State {
        let mut fleet = || {
            let mut units: Vec<Unit> = self.roster.iter().copied().map(Unit::from_spec).collect();
            units.shuffle(&mut *rng);
            units
        };
        let first = fleet();
        let second = fleet();
        State::new(first, second, self.max_plies)
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if state.outcome().is_decided() {
            return Vec::new();
        }

        let own = state.fleet(state.to_move);
        let enemy = state.fleet(state.to_move.opponent());
        let mut actions = Vec::with_capacity(own.len() * (enemy.len() + 1));

        for (a, unit) in own.iter().enumerate() {
            if unit.damage == 0 {
                continue;
            }
            for t in 0..enemy.len() {
                actions.push(Action::Attack {
                    attacker: a as u8,
                    target: t as u8,
                });
            }
        }
        for (u, unit) in own.iter().enumerate() {
            if unit.is_damaged() {
                actions.push(Action::Repair { unit: u as u8 });
            }
        }
        actions
    }

    fn apply(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        let mut next = state.clone();
        let me = state.to_move.index();
        let enemy = state.to_move.opponent().index();

        match *action {
            Action::Attack { attacker, target } => {
                let damage = next.fleets[me]
                    .get(attacker as usize)
                    .map_or(0, |u| u.damage);
                if let Some(unit) = next.fleets[enemy].get_mut(target as usize) {
                    unit.hull = unit.hull.saturating_sub(damage);
                    if unit.hull == 0 {
                        next.fleets[enemy].remove(target as usize);
                    }
                }
            }
            Action::Repair { unit } => {
                if let Some(unit) = next.fleets[me].get_mut(unit as usize) {
                    unit.hull = (unit.hull + 1).min(unit.max_hull);
                }
            }
        }

        next.plies += 1;
        next.to_move = state.to_move.opponent();
        next
    }

    fn active_player(&self, state: &Self::State) -> Player {
        state.to_move
    }

    fn outcome(&self, state: &Self::State) -> Outcome {
        state.outcome()
    }

    fn evaluate(&self, state: &Self::State, perspective: Player) -> f64 {
        signed_difference(
            [
                state.hull(Player::First) as f64,
                state.hull(Player::Second) as f64,
            ],
            perspective,
        )
    }

    fn material(&self, state: &Self::State, player: Player) -> f64 {
        state.hull(player) as f64
    }

    fn material_floor(&self) -> f64 {
        FLAGSHIP_HULL
    }

    fn max_evaluation(&self) -> f64 {
        self.roster.iter().map(|s| s.hull as f64).sum::<f64>().max(1.0)
    }

    /// Nobody left with a gun on either side.
    fn is_dead_draw(&self, state: &Self::State) -> bool {
        state
            .fleets
            .iter()
            .flatten()
            .all(|unit| unit.damage == 0)
    }
}

#[cfg(test)]
mod tests;
