use duelcore::*;
use std::sync::{Arc, Mutex};

fn engine() -> BattleEngine {
    BattleEngine::with_random(CombatConfig::default(), Box::new(SequenceRandom::never()))
}

fn fighter(id: &str, name: &str, atk: u32, max_hp: u32) -> Combatant {
    Combatant::new(id, name, CombatantStats::new(atk, 0, 5), max_hp)
}

/// Engine in `fighting` with the given pair loaded.
fn fighting(challenger: Combatant, opponent: Combatant) -> BattleEngine {
    let mut engine = engine();
    engine.init_battle(challenger, opponent);
    engine.start_battle().expect("ready battle starts");
    engine
}

fn record_kinds(engine: &mut BattleEngine) -> Arc<Mutex<Vec<EventKind>>> {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let kinds = Arc::clone(&kinds);
        engine.subscribe(kind, move |event| kinds.lock().unwrap().push(event.kind()));
    }
    kinds
}

/// Drain what `record_kinds` has seen so far.
fn take(kinds: &Arc<Mutex<Vec<EventKind>>>) -> Vec<EventKind> {
    std::mem::take(&mut *kinds.lock().unwrap())
}

// ============================================================================
// Attack resolution
// ============================================================================

#[test]
fn test_big_hit_is_critical() {
    let mut engine = fighting(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));
    let result = engine.execute_attack().unwrap();

    assert_eq!(result.damage, 50);
    assert_eq!(result.defender_new_hp, 50);
    assert!(result.is_critical);
    assert!(!result.is_knockout);
    assert_eq!(engine.state().unwrap().opponent.current_hp, 50);
}

#[test]
fn test_small_hit_is_not_critical() {
    let mut engine = fighting(fighter("a", "Aria", 20, 100), fighter("b", "Borin", 10, 100));
    let result = engine.execute_attack().unwrap();

    assert_eq!(result.damage, 20);
    assert!(!result.is_critical);

    let entry = engine.state().unwrap().battle_log.last().cloned().unwrap();
    let data = entry.attack_data().unwrap();
    assert_eq!(data.damage, 20);
    assert_eq!(data.remaining_hp, 80);
    assert!(!data.is_critical);
}

#[test]
fn test_crit_roll_doubles_damage() {
    let stats = CombatantStats::new(20, 0, 5).with_crit(50, 200);
    let mut engine =
        BattleEngine::with_random(CombatConfig::default(), Box::new(SequenceRandom::always()));
    engine.init_battle(
        Combatant::new("a", "Aria", stats, 100),
        fighter("b", "Borin", 10, 100),
    );
    engine.start_battle();

    let result = engine.execute_attack().unwrap();
    assert_eq!(result.damage, 40);
    assert_eq!(result.breakdown.base_damage, 20);
    assert_eq!(result.breakdown.crit_bonus, 20);
    assert!(result.is_critical);
}

#[test]
fn test_defense_reduces_damage_when_enabled() {
    let config = CombatConfig::default().with_defense(true);
    let mut engine = BattleEngine::with_random(config, Box::new(SequenceRandom::never()));
    engine.init_battle(
        fighter("a", "Aria", 50, 100),
        Combatant::new("b", "Borin", CombatantStats::new(10, 100, 5), 100),
    );
    engine.start_battle();

    // def 100 against scaling 100 halves the hit
    assert_eq!(engine.execute_attack().unwrap().damage, 25);
}

#[test]
fn test_lifesteal_is_committed_to_attacker() {
    let vampire = Combatant::new(
        "a",
        "Aria",
        CombatantStats::new(40, 0, 5).with_lifesteal(50),
        100,
    )
    .with_hp(50);
    let mut engine = fighting(vampire, fighter("b", "Borin", 10, 100));

    let result = engine.execute_attack().unwrap();
    assert_eq!(result.lifesteal_heal, 20);
    assert_eq!(result.attacker_new_hp, 70);
    assert_eq!(engine.state().unwrap().challenger.current_hp, 70);
}

#[test]
fn test_lifesteal_capped_at_max_hp() {
    let vampire = Combatant::new(
        "a",
        "Aria",
        CombatantStats::new(40, 0, 5).with_lifesteal(100),
        100,
    )
    .with_hp(90);
    let mut engine = fighting(vampire, fighter("b", "Borin", 10, 100));

    let result = engine.execute_attack().unwrap();
    assert_eq!(result.breakdown.lifesteal_amount, 40);
    assert_eq!(result.lifesteal_heal, 10);
    assert_eq!(engine.state().unwrap().challenger.current_hp, 100);
}

// ============================================================================
// Phase guards
// ============================================================================

#[test]
fn test_attack_after_finish_is_noop() {
    let mut engine = fighting(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));
    while engine.phase() == Some(BattlePhase::Fighting) {
        engine.execute_attack();
    }

    let before = engine.state().cloned().unwrap();
    assert!(before.is_finished());
    assert!(engine.execute_attack().is_none());
    assert_eq!(engine.state().cloned().unwrap(), before);
}

#[test]
fn test_attack_before_start_is_noop() {
    let mut engine = engine();
    engine.init_battle(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));

    let before = engine.state().cloned().unwrap();
    assert!(engine.execute_attack().is_none());
    assert_eq!(engine.state().cloned().unwrap(), before);
}

#[test]
fn test_start_twice_is_noop() {
    let mut engine = fighting(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));
    engine.execute_attack();

    let before = engine.state().cloned().unwrap();
    assert!(engine.start_battle().is_none());
    assert_eq!(engine.state().cloned().unwrap(), before);
}

#[test]
fn test_restored_setup_state_is_inert() {
    let setup = BattleState::setup(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));
    let json = BattleSerializer::serialize(&setup).unwrap();

    let mut engine = engine();
    let kinds = record_kinds(&mut engine);
    engine.deserialize(&json).unwrap();
    assert_eq!(engine.phase(), Some(BattlePhase::Setup));
    take(&kinds);

    assert!(engine.execute_attack().is_none());
    assert!(engine.start_battle().is_none());
    let rally = SkillActivation::new("s", "Rally", "buff");
    assert!(engine.log_skill(Role::Challenger, &rally).is_none());
    assert!(engine.run_to_completion(10).is_none());
    assert_eq!(engine.state().cloned().unwrap(), setup);
    assert!(take(&kinds).is_empty());
}

#[test]
fn test_no_battle_loaded() {
    let mut engine = engine();
    assert!(engine.phase().is_none());
    assert!(engine.execute_attack().is_none());
    assert!(engine.toggle_auto_battle().is_none());
    assert_eq!(engine.serialize(), Err(BattleError::NoBattleLoaded));
}

// ============================================================================
// Turn flow
// ============================================================================

#[test]
fn test_attackers_alternate() {
    let mut engine = fighting(fighter("a", "Aria", 5, 1000), fighter("b", "Borin", 5, 1000));
    let attackers = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&attackers);
    engine.subscribe(EventKind::Attack, move |event| {
        if let BattleEvent::Attack { attacker, .. } = event {
            seen.lock().unwrap().push(*attacker);
        }
    });

    for _ in 0..10 {
        engine.execute_attack().unwrap();
    }

    let attackers = attackers.lock().unwrap();
    assert_eq!(attackers[0], Role::Challenger);
    for pair in attackers.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
    assert_eq!(engine.state().unwrap().turn, 11);
}

#[test]
fn test_first_attacker_by_speed() {
    let config = CombatConfig {
        first_attacker: FirstAttackerRule::Speed,
        ..CombatConfig::default()
    };
    let slow = Combatant::new("a", "Aria", CombatantStats::new(10, 0, 3), 100);
    let fast = Combatant::new("b", "Borin", CombatantStats::new(10, 0, 9), 100);

    let mut engine = BattleEngine::with_random(config, Box::new(SequenceRandom::never()));
    assert_eq!(engine.init_battle(slow, fast).current_attacker, Role::Opponent);
}

#[test]
fn test_speed_tie_uses_random_source() {
    let config = CombatConfig {
        first_attacker: FirstAttackerRule::Speed,
        ..CombatConfig::default()
    };
    let a = fighter("a", "Aria", 10, 100);
    let b = fighter("b", "Borin", 10, 100);

    let mut low = BattleEngine::with_random(config, Box::new(SequenceRandom::constant(0.1)));
    assert_eq!(low.init_battle(a.clone(), b.clone()).current_attacker, Role::Challenger);

    let mut high = BattleEngine::with_random(config, Box::new(SequenceRandom::constant(0.9)));
    assert_eq!(high.init_battle(a, b).current_attacker, Role::Opponent);
}

#[test]
fn test_victory_log_and_result() {
    let mut engine = fighting(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));
    let result = engine.run_to_completion(100).unwrap();

    assert_eq!(result.winner, Role::Challenger);
    assert_eq!(result.winner_name, "Aria");
    assert_eq!(result.total_turns, 3);

    let state = engine.state().unwrap();
    assert!(state.opponent.is_defeated);
    assert_eq!(state.battle_log.len(), 4);
    let last = state.battle_log.last().unwrap();
    assert_eq!(last.entry_type(), LogEntryType::Victory);
    assert_eq!(last.message, "Aria wins the battle!");
}

#[test]
fn test_double_knockout_goes_to_opponent() {
    let state = BattleState::new(
        fighter("a", "Aria", 10, 100).with_hp(0),
        fighter("b", "Borin", 10, 100).with_hp(0),
    )
    .advance_to(BattlePhase::Fighting)
    .unwrap();
    let json = BattleSerializer::serialize(&state).unwrap();

    let mut engine = engine();
    engine.deserialize(&json).unwrap();
    engine.execute_attack().unwrap();

    let result = engine.state().unwrap().result.clone().unwrap();
    assert_eq!(result.winner, Role::Opponent);
    assert_eq!(result.winner_name, "Borin");
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_event_order_through_a_battle() {
    let mut engine = engine();
    let kinds = record_kinds(&mut engine);

    engine.init_battle(fighter("a", "Aria", 60, 100), fighter("b", "Borin", 10, 100));
    assert_eq!(take(&kinds), vec![EventKind::StateChanged]);

    engine.start_battle();
    assert_eq!(
        take(&kinds),
        vec![EventKind::BattleStart, EventKind::StateChanged]
    );

    engine.execute_attack();
    assert_eq!(
        take(&kinds),
        vec![
            EventKind::TurnStart,
            EventKind::DamageDealt,
            EventKind::Attack,
            EventKind::TurnEnd,
            EventKind::StateChanged,
        ]
    );

    engine.execute_attack();
    take(&kinds);

    engine.execute_attack();
    assert_eq!(
        take(&kinds),
        vec![
            EventKind::TurnStart,
            EventKind::DamageDealt,
            EventKind::Attack,
            EventKind::CombatantDefeated,
            EventKind::BattleEnd,
            EventKind::StateChanged,
        ]
    );
}

#[test]
fn test_noop_emits_nothing() {
    let mut engine = engine();
    engine.init_battle(fighter("a", "Aria", 60, 100), fighter("b", "Borin", 10, 100));
    let kinds = record_kinds(&mut engine);

    engine.execute_attack();
    assert!(take(&kinds).is_empty());
}

#[test]
fn test_event_payloads() {
    let mut engine = fighting(fighter("a", "Aria", 100, 100), fighter("b", "Borin", 10, 100));
    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::CombatantDefeated, EventKind::BattleEnd] {
        let events = Arc::clone(&events);
        engine.subscribe(kind, move |event| events.lock().unwrap().push(event.clone()));
    }

    engine.execute_attack();

    let events = events.lock().unwrap();
    assert_eq!(
        events[0],
        BattleEvent::CombatantDefeated {
            role: Role::Opponent,
            combatant_id: "b".into(),
        }
    );
    match &events[1] {
        BattleEvent::BattleEnd(result) => {
            assert_eq!(result.winner, Role::Challenger);
            assert_eq!(result.total_turns, 1);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_turn_and_damage_payloads() {
    let mut engine = fighting(fighter("a", "Aria", 30, 100), fighter("b", "Borin", 20, 80));
    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::TurnStart, EventKind::DamageDealt] {
        let events = Arc::clone(&events);
        engine.subscribe(kind, move |event| events.lock().unwrap().push(event.clone()));
    }

    engine.execute_attack();
    engine.execute_attack();

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            BattleEvent::TurnStart {
                turn: 1,
                attacker: Role::Challenger,
            },
            BattleEvent::DamageDealt {
                target: Role::Opponent,
                damage: 30,
                remaining_hp: 50,
            },
            BattleEvent::TurnStart {
                turn: 2,
                attacker: Role::Opponent,
            },
            BattleEvent::DamageDealt {
                target: Role::Challenger,
                damage: 20,
                remaining_hp: 80,
            },
        ]
    );
}

#[test]
fn test_unsubscribe_and_clear() {
    let mut engine = engine();
    let count = Arc::new(Mutex::new(0));
    let c = Arc::clone(&count);
    let id = engine.subscribe(EventKind::StateChanged, move |_| *c.lock().unwrap() += 1);

    engine.init_battle(fighter("a", "Aria", 10, 100), fighter("b", "Borin", 10, 100));
    assert_eq!(*count.lock().unwrap(), 1);

    assert!(engine.unsubscribe(id));
    engine.toggle_auto_battle();
    assert_eq!(*count.lock().unwrap(), 1);

    engine.subscribe(EventKind::StateChanged, |_| {});
    engine.clear_subscriptions();
    assert_eq!(engine.events_mut().subscriber_count(EventKind::StateChanged), 0);
}

// ============================================================================
// Reset and auto battle
// ============================================================================

#[test]
fn test_reset_restores_full_health() {
    let mut engine = fighting(fighter("a", "Aria", 30, 100), fighter("b", "Borin", 20, 80));
    engine.execute_attack();
    engine.execute_attack();

    let reset = engine.reset_battle().cloned().unwrap();
    assert_eq!(reset.phase, BattlePhase::Ready);
    assert_eq!(reset.turn, 1);
    assert_eq!(reset.challenger.current_hp, 100);
    assert_eq!(reset.opponent.current_hp, 80);
    assert!(reset.battle_log.is_empty());
    assert!(reset.result.is_none());
    assert_eq!(reset.challenger.base_stats.atk, 30);
}

#[test]
fn test_reset_after_finish_allows_rematch() {
    let mut engine = fighting(fighter("a", "Aria", 100, 100), fighter("b", "Borin", 10, 100));
    engine.run_to_completion(10);
    assert_eq!(engine.phase(), Some(BattlePhase::Finished));

    engine.reset_battle();
    assert!(!engine.state().unwrap().opponent.is_defeated);
    assert!(engine.start_battle().is_some());
}

#[test]
fn test_toggle_auto_battle_is_only_a_flag() {
    let mut engine = fighting(fighter("a", "Aria", 10, 100), fighter("b", "Borin", 10, 100));
    let before = engine.state().cloned().unwrap();

    assert_eq!(engine.toggle_auto_battle(), Some(true));
    let after = engine.state().cloned().unwrap();
    assert!(after.is_auto_battle);
    assert_eq!(after.with_auto_battle(false), before);
}

// ============================================================================
// Skills
// ============================================================================

#[test]
fn test_skill_entries_only_while_fighting() {
    let mut engine = engine();
    engine.init_battle(fighter("a", "Aria", 10, 100), fighter("b", "Borin", 10, 100));
    let skill = SkillActivation::new("s1", "Frenzy", "buff");

    assert!(engine.log_skill(Role::Challenger, &skill).is_none());
    engine.start_battle();

    let entry = engine.log_skill(Role::Challenger, &skill).cloned().unwrap();
    assert_eq!(entry.entry_type(), LogEntryType::Skill);

    let gem = engine
        .log_gem_skill(Role::Opponent, "ruby", &SkillActivation::new("s2", "Spark", "unknown"))
        .cloned()
        .unwrap();
    assert_eq!(gem.entry_type(), LogEntryType::GemSkill);
    match gem.payload {
        LogPayload::GemSkill(data) => {
            assert_eq!(data.gem_id, "ruby");
            assert_eq!(data.caster_id, "b");
            assert_eq!(data.effect, "triggers a special effect");
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

// ============================================================================
// Recording and history
// ============================================================================

#[test]
fn test_finished_battle_is_saved_to_history() {
    let history = InMemoryHistory::new();
    let mut engine = engine()
        .with_recorder(InMemoryRecorder::new())
        .with_history(history.clone());
    engine.init_battle(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));
    engine.run_to_completion(100);

    assert_eq!(history.len(), 1);
    let record = &history.records()[0];
    assert_eq!(record.winner_id, "a");
    assert_eq!(record.winner_name, "Aria");
    assert_eq!(record.total_turns, 3);
    assert_eq!(record.turns[0].defender_hp_before, 100);
    assert_eq!(record.turns[0].defender_hp_after, 50);
    assert_eq!(record.turns[1].attacker_id, "b");
}

#[test]
fn test_history_failure_does_not_stop_battle() {
    let mut engine = engine()
        .with_recorder(InMemoryRecorder::new())
        .with_history(InMemoryHistory::failing("disk full"));
    engine.init_battle(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));

    let result = engine.run_to_completion(100).unwrap();
    assert_eq!(result.winner, Role::Challenger);
    assert_eq!(engine.phase(), Some(BattlePhase::Finished));
}

#[test]
fn test_history_without_recorder_saves_nothing() {
    let history = InMemoryHistory::new();
    let mut engine = engine().with_history(history.clone());
    engine.init_battle(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));
    engine.run_to_completion(100);
    assert!(history.is_empty());
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_engine_round_trip() {
    let mut engine = fighting(fighter("a", "Aria", 30, 100), fighter("b", "Borin", 20, 80));
    engine.execute_attack();
    let json = engine.serialize().unwrap();

    let mut restored = self::engine();
    let state = restored.deserialize(&json).cloned().unwrap();
    assert_eq!(&state, engine.state().unwrap());

    // The restored engine picks up where the original left off.
    let result = restored.execute_attack().unwrap();
    assert_eq!(result.attacker.id, "b");
}

#[test]
fn test_failed_deserialize_keeps_state() {
    let mut engine = fighting(fighter("a", "Aria", 30, 100), fighter("b", "Borin", 20, 80));
    let before = engine.state().cloned().unwrap();

    let err = engine.deserialize("{\"phase\": \"fighting\"}").unwrap_err();
    assert_eq!(err.path(), Some("turn"));
    assert!(matches!(
        engine.deserialize("not json"),
        Err(BattleError::MalformedJson(_))
    ));
    assert_eq!(engine.state().cloned().unwrap(), before);
}

#[test]
fn test_battle_runs_on_a_worker_thread() {
    let history = InMemoryHistory::new();
    let mut engine = engine()
        .with_recorder(InMemoryRecorder::new())
        .with_history(history.clone());
    let attacks = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&attacks);
    engine.subscribe(EventKind::Attack, move |_| *counter.lock().unwrap() += 1);
    engine.init_battle(fighter("a", "Aria", 50, 100), fighter("b", "Borin", 10, 100));

    let result = std::thread::spawn(move || engine.run_to_completion(100))
        .join()
        .unwrap()
        .unwrap();

    assert_eq!(result.winner, Role::Challenger);
    assert_eq!(*attacks.lock().unwrap(), 3);
    assert_eq!(history.len(), 1);
}

#[test]
fn test_seeded_battles_replay_identically() {
    let run = || {
        let mut engine =
            BattleEngine::with_random(CombatConfig::default(), Box::new(SeededRandom::new(42)));
        engine.init_battle(
            Combatant::new("a", "Aria", CombatantStats::new(20, 0, 5).with_crit(40, 180), 150),
            Combatant::new("b", "Borin", CombatantStats::new(18, 0, 5).with_crit(30, 200), 150),
        );
        let result = engine.run_to_completion(500).unwrap();
        let damage: Vec<u32> = engine
            .state()
            .unwrap()
            .battle_log
            .iter()
            .filter_map(|entry| entry.attack_data().map(|d| d.damage))
            .collect();
        (result, damage)
    };

    assert_eq!(run(), run());
}
