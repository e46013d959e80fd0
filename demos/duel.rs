//! A complete duel from setup to history.
//!
//! Run with `RUST_LOG=duelcore=debug cargo run --example duel` to see the
//! per-attack traces. An optional first argument seeds the random source.

use duelcore::*;

fn main() -> Result<(), BattleError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(2024);

    let config = CombatConfig::from_json(
        r#"{ "defense": { "enabled": true, "scalingFactor": 100 }, "firstAttacker": "speed" }"#,
    )?;

    let history = InMemoryHistory::new();
    let mut engine = BattleEngine::with_random(config, Box::new(SeededRandom::new(seed)))
        .with_recorder(InMemoryRecorder::new())
        .with_history(history.clone());

    engine.subscribe(EventKind::Attack, |event| {
        if let BattleEvent::Attack { attacker, result } = event {
            let crit = if result.breakdown.crit_bonus > 0 { " (crit)" } else { "" };
            println!(
                "  {:<10} hits for {:>3}{}  → {} HP left",
                attacker.as_str(),
                result.damage,
                crit,
                result.defender_new_hp
            );
        }
    });
    engine.subscribe(EventKind::BattleEnd, |event| {
        if let BattleEvent::BattleEnd(result) = event {
            println!("{} wins after {} turns", result.winner_name, result.total_turns);
        }
    });

    let paladin = Combatant::new(
        "paladin",
        "Paladin",
        CombatantStats::new(28, 40, 7).with_crit(10, 150).with_lifesteal(15),
        180,
    );
    let duelist = Combatant::new(
        "duelist",
        "Duelist",
        CombatantStats::new(34, 15, 12).with_crit(30, 180).with_armor_pen(25),
        130,
    )
    .with_effective_range(2);

    let first = engine.init_battle(paladin, duelist).current_attacker;
    println!("{} opens (seed {})", first, seed);

    engine.run_to_completion(1_000);

    for entry in &engine.state().ok_or(BattleError::NoBattleLoaded)?.battle_log {
        tracing::debug!(kind = entry.entry_type().as_str(), "{}", entry.message);
    }

    let snapshot = engine.serialize()?;
    let restored = BattleSerializer::deserialize(&snapshot)?;
    println!(
        "snapshot: {} bytes, {} log entries, {} record(s) in history",
        snapshot.len(),
        restored.battle_log.len(),
        history.len()
    );

    Ok(())
}
