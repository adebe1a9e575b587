use super::*;
use rand::SeedableRng;

fn unit(hull: u32, damage: u32) -> Unit {
    Unit {
        hull,
        max_hull: hull,
        damage,
    }
}

fn duel(max_plies: u32) -> (Skirmish, State) {
    let game = Skirmish::with_roster(vec![UnitSpec { hull: 3, damage: 2 }], max_plies);
    let state = State::new(vec![unit(3, 2)], vec![unit(3, 2)], max_plies);
    (game, state)
}

#[test]
fn test_reset_gives_identical_fleets() {
    let game = Skirmish::new();
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let state = game.reset(&mut rng);

    assert_eq!(state.fleet(Player::First).len(), DEFAULT_ROSTER.len());
    assert_eq!(state.hull(Player::First), state.hull(Player::Second));
    assert_eq!(state.hull(Player::First), 13);
    assert_eq!(game.active_player(&state), Player::First);
    assert_eq!(game.outcome(&state), Outcome::Ongoing);
}

#[test]
fn test_reset_is_reproducible() {
    let game = Skirmish::new();
    let a = game.reset(&mut ChaCha20Rng::seed_from_u64(5));
    let b = game.reset(&mut ChaCha20Rng::seed_from_u64(5));
    assert_eq!(a, b);
}

#[test]
fn test_unarmed_units_do_not_attack() {
    let game = Skirmish::new();
    let state = State::new(
        vec![unit(6, 2), unit(3, 0)],
        vec![unit(4, 1), unit(3, 0)],
        DEFAULT_MAX_PLIES,
    );

    let actions = game.legal_actions(&state);
    // One armed unit times two targets, nothing to repair
    assert_eq!(actions.len(), 2);
    assert!(actions
        .iter()
        .all(|a| matches!(a, Action::Attack { attacker: 0, .. })));
}

#[test]
fn test_attack_reduces_hull_and_removes_wrecks() {
    let (game, state) = duel(DEFAULT_MAX_PLIES);
    let attack = Action::Attack {
        attacker: 0,
        target: 0,
    };

    let hit = game.apply(&state, &attack);
    assert_eq!(hit.fleet(Player::Second)[0].hull, 1);
    assert_eq!(game.active_player(&hit), Player::Second);
    assert_eq!(hit.plies(), 1);

    let hit = game.apply(&hit, &attack); // second fires back
    let sunk = game.apply(&hit, &attack); // first finishes it
    assert!(sunk.fleet(Player::Second).is_empty());
    assert_eq!(game.outcome(&sunk), Outcome::Win(Player::First));
    assert!(game.legal_actions(&sunk).is_empty());
}

#[test]
fn test_repair_is_capped_at_max_hull() {
    let (game, state) = duel(DEFAULT_MAX_PLIES);
    let attack = Action::Attack {
        attacker: 0,
        target: 0,
    };

    let state = game.apply(&state, &attack);
    let actions = game.legal_actions(&state);
    assert!(actions.contains(&Action::Repair { unit: 0 }));

    let repaired = game.apply(&state, &Action::Repair { unit: 0 });
    assert_eq!(repaired.fleet(Player::Second)[0].hull, 2);

    // Repairing a healthy unit changes nothing but the turn
    let healthy = game.apply(&repaired, &Action::Repair { unit: 0 });
    assert_eq!(healthy.fleet(Player::First)[0].hull, 3);
}

#[test]
fn test_ply_limit_draws() {
    let (game, state) = duel(2);
    let after_hit = game.apply(
        &state,
        &Action::Attack {
            attacker: 0,
            target: 0,
        },
    );
    let limit = game.apply(&after_hit, &Action::Repair { unit: 0 });

    assert_eq!(game.outcome(&limit), Outcome::Draw);
    assert!(game.legal_actions(&limit).is_empty());
}

#[test]
fn test_evaluate_and_material() {
    let game = Skirmish::new();
    let state = State::new(vec![unit(6, 2)], vec![unit(4, 1), unit(3, 0)], 10);

    assert_eq!(game.material(&state, Player::First), 6.0);
    assert_eq!(game.material(&state, Player::Second), 7.0);
    assert_eq!(game.evaluate(&state, Player::First), -1.0);
    assert_eq!(game.evaluate(&state, Player::Second), 1.0);
    assert_eq!(game.material_floor(), 1.0);
    assert_eq!(game.max_evaluation(), 13.0);
}

#[test]
fn test_dead_draw_when_nobody_is_armed() {
    let game = Skirmish::new();
    let unarmed = State::new(vec![unit(3, 0)], vec![unit(3, 0)], 10);
    assert!(game.is_dead_draw(&unarmed));

    let armed = State::new(vec![unit(3, 1)], vec![unit(3, 0)], 10);
    assert!(!game.is_dead_draw(&armed));
}

#[test]
fn test_stranded_side_loses_to_armed_enemy() {
    let game = Skirmish::new();
    let stranded = State::new(vec![unit(3, 0)], vec![unit(6, 2)], DEFAULT_MAX_PLIES);

    assert!(game.legal_actions(&stranded).is_empty());
    assert_eq!(game.outcome(&stranded), Outcome::Win(Player::Second));
}

#[test]
fn test_damaged_unarmed_side_can_still_repair() {
    let game = Skirmish::new();
    let mut tender = unit(3, 0);
    tender.hull = 2;
    let state = State::new(vec![tender], vec![unit(6, 2)], DEFAULT_MAX_PLIES);

    assert_eq!(game.legal_actions(&state), vec![Action::Repair { unit: 0 }]);
    assert_eq!(game.outcome(&state), Outcome::Ongoing);

    let repaired = game.apply(&state, &Action::Repair { unit: 0 });
    // Enemy to move now; it can still fire, so the game goes on
    assert_eq!(game.outcome(&repaired), Outcome::Ongoing);
}

#[test]
fn test_stranded_against_unarmed_enemy_is_a_draw() {
    let game = Skirmish::new();
    let state = State::new(vec![unit(3, 0)], vec![unit(3, 0)], DEFAULT_MAX_PLIES);

    assert!(game.legal_actions(&state).is_empty());
    assert_eq!(game.outcome(&state), Outcome::Draw);
}

#[test]
fn test_no_empty_action_list_while_ongoing() {
    let game = Skirmish::new();
    for seed in 0..20 {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut state = game.reset(&mut rng);
        loop {
            let actions = game.legal_actions(&state);
            if actions.is_empty() {
                assert!(game.outcome(&state).is_decided(), "seed {seed}: {state:?}");
                break;
            }
            let action = *actions.choose(&mut rng).unwrap();
            state = game.apply(&state, &action);
        }
    }
}
