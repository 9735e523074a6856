//! Phase orchestration integration tests

use std::cell::RefCell;
use std::rc::Rc;

use citadel_siege::core::config::StartingPhase;
use citadel_siege::core::types::{EntityId, Vec2};
use citadel_siege::economy::{LoyaltyState, Role};
use citadel_siege::phase::{GameOutcome, GamePhase, SiegeEvent};
use citadel_siege::simulation::Stationary;
use citadel_siege::{Siege, SiegeConfig};

const DT: f32 = 1.0 / 30.0;

fn run_for(siege: &mut Siege, seconds: f32) {
    for _ in 0..(seconds / DT).ceil() as usize {
        siege.tick(DT);
    }
}

fn record_phases(siege: &mut Siege) -> Rc<RefCell<Vec<(GamePhase, GamePhase)>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    siege.subscribe(move |event| {
        if let SiegeEvent::PhaseChanged { previous, next } = event {
            sink.borrow_mut().push((*previous, *next));
        }
    });
    seen
}

fn anger(siege: &mut Siege, id: EntityId) {
    for _ in 0..7 {
        siege.structure_destroyed(id).unwrap();
    }
    siege.structure_rebuilt(id).unwrap();
}

#[test]
fn test_timed_day_night_cycle() {
    let mut siege = Siege::new(SiegeConfig::default()).with_locomotion(Stationary);
    let phases = record_phases(&mut siege);

    run_for(&mut siege, 44.0);
    assert_eq!(siege.phase(), GamePhase::Day);

    run_for(&mut siege, 2.0);
    assert_eq!(siege.phase(), GamePhase::DayToNight);

    run_for(&mut siege, 3.0);
    assert_eq!(siege.phase(), GamePhase::Night);
    assert_eq!(siege.wave(), 1);

    siege.force_next_wave().unwrap();
    run_for(&mut siege, 3.5);
    assert_eq!(siege.phase(), GamePhase::Day);

    assert_eq!(
        *phases.borrow(),
        vec![
            (GamePhase::Day, GamePhase::DayToNight),
            (GamePhase::DayToNight, GamePhase::Night),
            (GamePhase::Night, GamePhase::NightToDay),
            (GamePhase::NightToDay, GamePhase::Day),
        ]
    );
}

#[test]
fn test_start_at_night() {
    let mut config = SiegeConfig::default();
    config.settings.starting_phase = StartingPhase::Night;
    let mut siege = Siege::new(config);

    siege.start().unwrap();

    assert_eq!(siege.phase(), GamePhase::Night);
    assert_eq!(siege.wave(), 1);
    assert!(siege.director().wave_active());
}

#[test]
fn test_victory_after_last_wave() {
    let mut config = SiegeConfig::default();
    config.settings.max_waves = 1;
    let mut siege = Siege::new(config);
    siege.start().unwrap();

    siege.end_day().unwrap();
    siege.skip_transition().unwrap();
    assert_eq!(siege.wave(), 1);
    siege.force_next_wave().unwrap();
    siege.skip_transition().unwrap();
    siege.end_day().unwrap();
    siege.skip_transition().unwrap();

    assert_eq!(siege.phase(), GamePhase::GameOver);
    assert_eq!(siege.outcome(), Some(GameOutcome::Victory));
}

#[test]
fn test_skip_transition_cancels_pending_timer() {
    let mut siege = Siege::new(SiegeConfig::default()).with_locomotion(Stationary);
    let phases = record_phases(&mut siege);
    siege.start().unwrap();
    siege.end_day().unwrap();
    siege.skip_transition().unwrap();

    run_for(&mut siege, 5.0);

    assert_eq!(siege.phase(), GamePhase::Night);
    assert_eq!(phases.borrow().len(), 2);
}

#[test]
fn test_pause_holds_the_day_timer() {
    let mut siege = Siege::new(SiegeConfig::default());
    siege.start().unwrap();
    siege.pause().unwrap();

    run_for(&mut siege, 60.0);
    assert_eq!(siege.phase(), GamePhase::Paused);
    assert_eq!(siege.now(), 0.0);

    siege.resume().unwrap();
    assert_eq!(siege.phase(), GamePhase::Day);
    run_for(&mut siege, 46.0);
    assert_eq!(siege.phase(), GamePhase::DayToNight);
}

#[test]
fn test_majority_rebels_lose_the_siege() {
    let mut siege = Siege::new(SiegeConfig::default());
    let a = siege.add_villager("a", Role::Commoner, Vec2::ZERO);
    let b = siege.add_villager("b", Role::Commoner, Vec2::ZERO);
    siege.start().unwrap();

    anger(&mut siege, a);
    anger(&mut siege, b);
    run_for(&mut siege, 5.0);

    assert_eq!(siege.phase(), GamePhase::GameOver);
    assert_eq!(siege.outcome(), Some(GameOutcome::RebellionLoss));
}

#[test]
fn test_mass_rebellion_ends_immediately() {
    let mut siege = Siege::new(SiegeConfig::default());
    let ids: Vec<EntityId> = (0..5)
        .map(|i| siege.add_villager(format!("v{i}"), Role::Commoner, Vec2::ZERO))
        .collect();
    siege.start().unwrap();

    for id in &ids[..3] {
        anger(&mut siege, *id);
    }
    // 90: past the defection threshold but not rebelling yet
    for _ in 0..6 {
        siege.structure_destroyed(ids[3]).unwrap();
    }

    let log = siege.tick(DT);

    assert_eq!(siege.outcome(), Some(GameOutcome::MassRebellion));
    assert!(siege.is_rebel(ids[3]));
    assert!(siege.is_loyal(ids[4]));
    assert!(log.iter().any(|e| matches!(e, SiegeEvent::MassRebellion { rebelling: 3, .. })));
}

#[test]
fn test_mass_rebellion_announces_each_defector() {
    let mut siege = Siege::new(SiegeConfig::default());
    let ids: Vec<EntityId> = (0..5)
        .map(|i| siege.add_villager(format!("v{i}"), Role::Commoner, Vec2::ZERO))
        .collect();
    siege.start().unwrap();
    for id in &ids[..3] {
        anger(&mut siege, *id);
    }
    for _ in 0..6 {
        siege.structure_destroyed(ids[3]).unwrap();
    }
    let rebels = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&rebels);
    siege.subscribe(move |event| {
        if let SiegeEvent::LoyaltyChanged {
            villager,
            loyalty: LoyaltyState::Rebel,
        } = event
        {
            sink.borrow_mut().push(*villager);
        }
    });

    let log = siege.tick(DT);

    assert_eq!(*rebels.borrow(), vec![ids[3]]);
    let rebelled: Vec<EntityId> = log
        .iter()
        .filter_map(|e| match e {
            SiegeEvent::VillagerRebelled { villager } => Some(*villager),
            _ => None,
        })
        .collect();
    assert_eq!(rebelled, vec![ids[3]]);
}

#[test]
fn test_game_over_is_final() {
    let mut siege = Siege::new(SiegeConfig::default());
    let a = siege.add_villager("a", Role::Commoner, Vec2::ZERO);
    siege.start().unwrap();
    anger(&mut siege, a);
    run_for(&mut siege, 5.0);
    assert!(siege.is_over());

    let now = siege.now();
    run_for(&mut siege, 10.0);

    assert_eq!(siege.now(), now);
    assert!(!siege.end_day().unwrap());
    assert!(siege.pause().is_ok());
    assert_eq!(siege.phase(), GamePhase::GameOver);
}
