//! Battle engine.
//!
//! `BattleEngine` is the only stateful piece of the crate. It holds at most
//! one `BattleState` and replaces it wholesale on every operation. The
//! combat, turn and victory systems it delegates to are pure and are built
//! from the engine's `CombatConfig`.
//!
//! Calling an operation in the wrong phase is not an error: the call
//! returns `None` and the held state is left exactly as it was.

use crate::combat::{AttackResult, CombatSystem};
use crate::combatant::Combatant;
use crate::config::{CombatConfig, FirstAttackerRule};
use crate::error::BattleError;
use crate::events::{BattleEvent, EventBus, EventKind, SubscriptionId};
use crate::logger::{BattleLogEntry, CombatLogger, SkillActivation};
use crate::random::{RandomSource, ThreadRandom};
use crate::recorder::{BattleRecorder, HistoryStore};
use crate::serializer::BattleSerializer;
use crate::state::{BattlePhase, BattleResult, BattleState, Role};
use crate::turn::TurnSystem;
use crate::victory::VictorySystem;

/// Orchestrates a single two-sided battle.
///
/// # Examples
///
/// ```rust
/// use duelcore::random::SequenceRandom;
/// use duelcore::{BattleEngine, BattlePhase, CombatConfig, Combatant, CombatantStats, Role};
///
/// let config = CombatConfig::default();
/// let mut engine = BattleEngine::with_random(config, Box::new(SequenceRandom::never()));
/// engine.init_battle(
///     Combatant::new("a", "Aria", CombatantStats::new(40, 0, 10), 100),
///     Combatant::new("b", "Borin", CombatantStats::new(25, 0, 8), 100),
/// );
/// engine.start_battle();
///
/// while engine.phase() == Some(BattlePhase::Fighting) {
///     engine.execute_attack();
/// }
///
/// let result = engine.state().unwrap().result.clone().unwrap();
/// assert_eq!(result.winner, Role::Challenger);
/// assert_eq!(result.total_turns, 5);
/// ```
pub struct BattleEngine {
    state: Option<BattleState>,
    config: CombatConfig,
    combat: CombatSystem,
    turns: TurnSystem,
    victory: VictorySystem,
    logger: CombatLogger,
    events: EventBus,
    rng: Box<dyn RandomSource>,
    recorder: Option<Box<dyn BattleRecorder>>,
    history: Option<Box<dyn HistoryStore>>,
}

impl BattleEngine {
    /// Engine drawing from the thread-local generator.
    pub fn new(config: CombatConfig) -> Self {
        Self::with_random(config, Box::new(ThreadRandom))
    }

    /// Engine drawing from `rng`, for seeded replays and tests.
    pub fn with_random(config: CombatConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            state: None,
            config,
            combat: CombatSystem::new(&config),
            turns: TurnSystem::new(),
            victory: VictorySystem::new(),
            logger: CombatLogger::new(config.critical_damage_threshold),
            events: EventBus::new(),
            rng,
            recorder: None,
            history: None,
        }
    }

    /// Attach a recorder that follows every battle this engine runs.
    pub fn with_recorder(mut self, recorder: impl BattleRecorder + 'static) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }

    /// Attach the store finished recordings are saved to.
    ///
    /// Only used together with a recorder.
    pub fn with_history(mut self, history: impl HistoryStore + 'static) -> Self {
        self.history = Some(Box::new(history));
        self
    }

    /// The configuration every system was built from.
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// The held state, `None` before the first `init_battle`.
    pub fn state(&self) -> Option<&BattleState> {
        self.state.as_ref()
    }

    /// Phase of the held state, `None` before the first `init_battle`.
    pub fn phase(&self) -> Option<BattlePhase> {
        self.state.as_ref().map(|s| s.phase)
    }

    /// Direct access to the event bus.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Register `handler` for `kind`. See [`EventBus::subscribe`].
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&BattleEvent) + Send + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    /// Remove one subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Drop every subscription.
    pub fn clear_subscriptions(&mut self) {
        self.events.clear();
    }

    fn first_attacker(&mut self, challenger: &Combatant, opponent: &Combatant) -> Role {
        match self.config.first_attacker {
            FirstAttackerRule::Challenger => Role::Challenger,
            FirstAttackerRule::Speed => {
                self.turns
                    .determine_first_attacker(challenger, opponent, self.rng.as_mut())
            }
        }
    }

    fn emit(&mut self, event: BattleEvent) {
        self.events.emit(&event);
    }

    fn state_changed(state: &BattleState) -> BattleEvent {
        BattleEvent::StateChanged {
            phase: state.phase,
            turn: state.turn,
        }
    }

    /// Load a fresh `ready` battle, replacing whatever was held.
    pub fn init_battle(&mut self, challenger: Combatant, opponent: Combatant) -> &BattleState {
        let first = self.first_attacker(&challenger, &opponent);
        let state = BattleState::new(challenger, opponent).with_first_attacker(first);
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.reset();
        }
        tracing::info!(
            challenger = %state.challenger.id,
            opponent = %state.opponent.id,
            first_attacker = %first,
            "battle initialized"
        );

        self.emit(Self::state_changed(&state));
        self.state.insert(state)
    }

    /// `ready → fighting`. `None` in any other phase.
    pub fn start_battle(&mut self) -> Option<&BattleState> {
        let current = self.state.as_ref()?;
        if current.phase != BattlePhase::Ready {
            tracing::debug!(phase = %current.phase, "start_battle ignored");
            return None;
        }
        let next = current.clone().advance_to(BattlePhase::Fighting)?;

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.start_recording(&next.challenger, &next.opponent);
        }
        tracing::info!(
            challenger = %next.challenger.id,
            opponent = %next.opponent.id,
            "battle started"
        );

        self.emit(BattleEvent::BattleStart {
            challenger_id: next.challenger.id.clone(),
            opponent_id: next.opponent.id.clone(),
        });
        self.emit(Self::state_changed(&next));
        Some(self.state.insert(next))
    }

    /// Resolve one attack by the current attacker.
    ///
    /// `None`, with the state untouched, unless the battle is fighting.
    ///
    /// Emits `turn_start`, `damage_dealt` and `attack`, then either
    /// `turn_end` or `combatant_defeated` and `battle_end`, and finally
    /// `state_changed`.
    pub fn execute_attack(&mut self) -> Option<AttackResult> {
        let state = self.state.clone()?;
        if state.phase != BattlePhase::Fighting {
            tracing::debug!(phase = %state.phase, "execute_attack ignored");
            return None;
        }

        let attacker_role = state.current_attacker;
        let defender_role = attacker_role.opposite();
        let attacker = state.combatant(attacker_role).clone();
        let defender = state.combatant(defender_role).clone();
        let turn = state.turn;

        self.emit(BattleEvent::TurnStart {
            turn,
            attacker: attacker_role,
        });

        let result = self
            .combat
            .calculate_attack(&attacker, &defender, self.rng.as_mut());

        let mut next = state.with_combatant(defender_role, result.defender.clone());
        if result.breakdown.lifesteal_amount > 0 {
            next = next.with_combatant(attacker_role, result.attacker.clone());
        }
        let entry = self
            .logger
            .log_attack(&attacker, &defender, result.damage, result.defender_new_hp);
        next = next.with_log_entry(entry);

        self.emit(BattleEvent::DamageDealt {
            target: defender_role,
            damage: result.damage,
            remaining_hp: result.defender_new_hp,
        });

        if let Some(recorder) = self.recorder.as_mut() {
            if recorder.is_recording() {
                recorder.record_turn(
                    turn,
                    &attacker,
                    &defender,
                    &result,
                    defender.current_hp,
                    attacker.current_hp,
                );
            }
        }

        self.emit(BattleEvent::Attack {
            attacker: attacker_role,
            result: Box::new(result.clone()),
        });

        match self.victory.check_victory(&next) {
            Some(outcome) => {
                let loser = outcome.winner.opposite();
                let loser_id = next.combatant(loser).id.clone();
                let winner_id = next.combatant(outcome.winner).id.clone();
                let entry = self.logger.log_victory(&outcome.winner_name);
                let finished = next.with_log_entry(entry).finish(outcome.clone())?;
                tracing::info!(
                    winner = %winner_id,
                    winner_role = %outcome.winner,
                    total_turns = outcome.total_turns,
                    "battle finished"
                );
                self.state = Some(finished);

                self.emit(BattleEvent::CombatantDefeated {
                    role: loser,
                    combatant_id: loser_id,
                });
                self.emit(BattleEvent::BattleEnd(outcome.clone()));
                self.archive(&winner_id, &outcome.winner_name);
            }
            None => {
                let advanced = self.turns.advance_turn(next);
                let turn_end = BattleEvent::TurnEnd {
                    turn: advanced.turn,
                    next_attacker: advanced.current_attacker,
                };
                self.state = Some(advanced);
                self.emit(turn_end);
            }
        }

        if let Some(state) = self.state.as_ref() {
            let changed = Self::state_changed(state);
            self.emit(changed);
        }
        Some(result)
    }

    /// Hand the finished recording to the history store. Failures are logged only.
    fn archive(&mut self, winner_id: &str, winner_name: &str) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        if !recorder.is_recording() {
            return;
        }
        let Some(record) = recorder.finish_recording(winner_id, winner_name) else {
            return;
        };
        let Some(history) = self.history.as_mut() else {
            return;
        };
        match history.save(&record) {
            Ok(()) => tracing::debug!(record = %record.id, "battle history saved"),
            Err(err) => tracing::warn!(
                record = %record.id,
                error = %err,
                "failed to save battle history"
            ),
        }
    }

    /// Fresh `ready` battle with both sides at full HP.
    ///
    /// Log and result are discarded; identity and stats are kept.
    pub fn reset_battle(&mut self) -> Option<&BattleState> {
        let current = self.state.as_ref()?;
        let fresh = current.reset();
        let (challenger, opponent) = (fresh.challenger.clone(), fresh.opponent.clone());
        let first = self.first_attacker(&challenger, &opponent);
        let fresh = fresh.with_first_attacker(first);

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.reset();
        }
        tracing::info!("battle reset");

        self.emit(Self::state_changed(&fresh));
        Some(self.state.insert(fresh))
    }

    /// Flip the auto-battle hint. `None` when nothing is loaded.
    pub fn toggle_auto_battle(&mut self) -> Option<bool> {
        let current = self.state.as_ref()?;
        let next = current.clone().with_auto_battle(!current.is_auto_battle);
        let enabled = next.is_auto_battle;
        self.emit(Self::state_changed(&next));
        self.state = Some(next);
        Some(enabled)
    }

    /// Append a skill activation to the log. Only while fighting.
    pub fn log_skill(
        &mut self,
        caster: Role,
        skill: &SkillActivation,
    ) -> Option<&BattleLogEntry> {
        let current = self.state.as_ref()?;
        if current.phase != BattlePhase::Fighting {
            return None;
        }
        let entry = self.logger.log_skill(current.combatant(caster), skill);
        self.append_entry(entry)
    }

    /// Append a gem-triggered skill activation to the log. Only while fighting.
    pub fn log_gem_skill(
        &mut self,
        caster: Role,
        gem_id: &str,
        skill: &SkillActivation,
    ) -> Option<&BattleLogEntry> {
        let current = self.state.as_ref()?;
        if current.phase != BattlePhase::Fighting {
            return None;
        }
        let entry = self
            .logger
            .log_gem_skill(current.combatant(caster), gem_id, skill);
        self.append_entry(entry)
    }

    fn append_entry(&mut self, entry: BattleLogEntry) -> Option<&BattleLogEntry> {
        let next = self.state.clone()?.with_log_entry(entry);
        self.emit(Self::state_changed(&next));
        self.state.insert(next).battle_log.last()
    }

    /// Start if ready, then attack until finished or `max_attacks` is reached.
    pub fn run_to_completion(&mut self, max_attacks: u32) -> Option<BattleResult> {
        if self.phase() == Some(BattlePhase::Ready) {
            self.start_battle();
        }
        let mut attacks = 0;
        while self.phase() == Some(BattlePhase::Fighting) && attacks < max_attacks {
            self.execute_attack();
            attacks += 1;
        }
        self.state.as_ref().and_then(|s| s.result.clone())
    }

    /// Encode the held state.
    pub fn serialize(&self) -> Result<String, BattleError> {
        let state = self.state.as_ref().ok_or(BattleError::NoBattleLoaded)?;
        BattleSerializer::serialize(state)
    }

    /// Replace the held state with a decoded one. On error nothing changes.
    pub fn deserialize(&mut self, text: &str) -> Result<&BattleState, BattleError> {
        let state = BattleSerializer::deserialize(text)?;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.reset();
        }
        self.emit(Self::state_changed(&state));
        Ok(self.state.insert(state))
    }
}

impl Default for BattleEngine {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}

impl std::fmt::Debug for BattleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleEngine")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("events", &self.events)
            .field("recorder", &self.recorder.is_some())
            .field("history", &self.history.is_some())
            .finish()
    }
}
