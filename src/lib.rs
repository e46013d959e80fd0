//! # duelcore - Deterministic Turn-Based Duel Resolver
//!
//! A combat engine for two-sided, turn-based battles that provides:
//! - **Deterministic** resolution (same random draws → same battle)
//! - **Immutable** state transitions (every operation produces a new state)
//! - **Event-driven** notifications for presentation layers
//! - **Validated** JSON persistence with field-path errors
//!
//! ## Core Concepts
//!
//! ### Battle Pipeline
//!
//! Each attack flows through a fixed pipeline:
//!
//! ```text
//! [DamageCalculator] → [CombatSystem] → [VictorySystem] → [TurnSystem]
//! ```
//!
//! 1. **DamageCalculator** turns attack and defense stats into a damage roll
//! 2. **CombatSystem** applies the roll to both combatants (damage, lifesteal)
//! 3. **VictorySystem** checks whether a side is down
//! 4. **TurnSystem** hands the turn to the other side
//!
//! [`BattleEngine`] drives the pipeline and owns the only mutable state: the
//! current [`BattleState`], which moves through
//! `setup → ready → fighting → finished`.
//!
//! ### Key Features
//!
//! - **Injectable randomness**: crit rolls and speed ties draw from a [`RandomSource`]
//! - **Phase guards**: out-of-phase calls are no-ops, never errors
//! - **Structured log**: every attack, victory and skill leaves a typed log entry
//! - **Optional recording**: a [`BattleRecorder`] captures turns for history
//!
//! ## Example
//!
//! ```rust
//! use duelcore::*;
//!
//! let mut engine = BattleEngine::with_random(
//!     CombatConfig::default(),
//!     Box::new(SeededRandom::new(7)),
//! );
//! engine.init_battle(
//!     Combatant::new("knight", "Knight", CombatantStats::new(30, 5, 10), 120),
//!     Combatant::new("rogue", "Rogue", CombatantStats::new(25, 2, 14).with_crit(25, 200), 90),
//! );
//!
//! let result = engine.run_to_completion(100).unwrap();
//! let state = engine.state().unwrap();
//! assert_eq!(state.phase, BattlePhase::Finished);
//! assert_eq!(state.winner().map(|c| c.name.as_str()), Some(result.winner_name.as_str()));
//!
//! // Round trip through JSON
//! let json = engine.serialize().unwrap();
//! assert_eq!(&BattleSerializer::deserialize(&json).unwrap(), state);
//! ```
//!
//! ## Modules
//!
//! - [`combatant`] - Combatants, stats and buffs
//! - [`state`] - Battle state and phase transitions
//! - [`damage`] - Damage formula
//! - [`combat`] - Attack resolution
//! - [`turn`] - Turn order
//! - [`victory`] - Victory detection
//! - [`events`] - Synchronous event bus
//! - [`logger`] - Battle log entries
//! - [`serializer`] - JSON encode and validating decode
//! - [`recorder`] - Battle recording and history
//! - [`random`] - Random sources
//! - [`config`] - Combat configuration
//! - [`engine`] - Battle engine
//! - [`error`] - Error types

pub mod combat;
pub mod combatant;
pub mod config;
pub mod damage;
pub mod engine;
pub mod error;
pub mod events;
pub mod logger;
pub mod random;
pub mod recorder;
pub mod serializer;
pub mod state;
pub mod turn;
pub mod victory;

// Re-export main types for convenience
pub use combat::{AttackResult, CombatSystem, DamageBreakdown};
pub use combatant::{Buff, BuffStat, Combatant, CombatantStats, StackRule};
pub use config::{CombatConfig, DefenseConfig, FirstAttackerRule};
pub use damage::{DamageCalculator, DamageInput, DamageResult};
pub use engine::BattleEngine;
pub use error::BattleError;
pub use events::{BattleEvent, EventBus, EventKind, SubscriptionId};
pub use logger::{BattleLogEntry, CombatLogger, LogEntryType, LogPayload, SkillActivation};
pub use random::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
pub use recorder::{
    BattleRecord, BattleRecorder, HistoryStore, InMemoryHistory, InMemoryRecorder, TurnRecord,
};
pub use serializer::BattleSerializer;
pub use state::{BattlePhase, BattleResult, BattleState, Role};
pub use turn::TurnSystem;
pub use victory::VictorySystem;
