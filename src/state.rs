//! Battle state and its transitions.
//!
//! `BattleState` is never edited in place by the engine. Each helper here
//! consumes or borrows a state and returns the next one, which keeps two
//! invariants easy to hold:
//!
//! - the phase only moves forward (`setup → ready → fighting → finished`);
//! - `result` is `Some` exactly when the phase is `finished`.
//!
//! Phase changes that would break either invariant return `None`.

use crate::combatant::Combatant;
use crate::logger::BattleLogEntry;
use serde::Serialize;

/// A side of the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Challenger,
    Opponent,
}

impl Role {
    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            Role::Challenger => Role::Opponent,
            Role::Opponent => Role::Challenger,
        }
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Challenger => "challenger",
            Role::Opponent => "opponent",
        }
    }

    /// Inverse of [`Role::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "challenger" => Some(Role::Challenger),
            "opponent" => Some(Role::Opponent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a battle.
///
/// # Examples
///
/// ```rust
/// use duelcore::BattlePhase;
///
/// assert!(BattlePhase::Ready.can_advance_to(BattlePhase::Fighting));
/// assert!(!BattlePhase::Finished.can_advance_to(BattlePhase::Ready));
/// assert!(!BattlePhase::Fighting.can_advance_to(BattlePhase::Fighting));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BattlePhase {
    Setup,
    Ready,
    Fighting,
    Finished,
}

impl BattlePhase {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            BattlePhase::Setup => "setup",
            BattlePhase::Ready => "ready",
            BattlePhase::Fighting => "fighting",
            BattlePhase::Finished => "finished",
        }
    }

    /// Inverse of [`BattlePhase::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "setup" => Some(BattlePhase::Setup),
            "ready" => Some(BattlePhase::Ready),
            "fighting" => Some(BattlePhase::Fighting),
            "finished" => Some(BattlePhase::Finished),
            _ => None,
        }
    }

    /// Strictly forward moves only.
    pub fn can_advance_to(self, next: BattlePhase) -> bool {
        next > self
    }
}

impl std::fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResult {
    pub winner: Role,
    pub winner_name: String,
    pub total_turns: u32,
}

/// Full snapshot of an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleState {
    pub phase: BattlePhase,
    /// Starts at 1.
    pub turn: u32,
    pub challenger: Combatant,
    pub opponent: Combatant,
    pub current_attacker: Role,
    pub battle_log: Vec<BattleLogEntry>,
    pub result: Option<BattleResult>,
    /// Presentation hint only.
    pub is_auto_battle: bool,
}

impl BattleState {
    /// A state in `setup`, turn 1, challenger to act.
    pub fn setup(challenger: Combatant, opponent: Combatant) -> Self {
        Self {
            phase: BattlePhase::Setup,
            turn: 1,
            challenger,
            opponent,
            current_attacker: Role::Challenger,
            battle_log: Vec::new(),
            result: None,
            is_auto_battle: false,
        }
    }

    /// A state in `ready`, turn 1, challenger to act.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use duelcore::{BattlePhase, BattleState, Combatant, CombatantStats, Role};
    ///
    /// let a = Combatant::new("a", "Aria", CombatantStats::new(10, 0, 5), 50);
    /// let b = Combatant::new("b", "Borin", CombatantStats::new(10, 0, 5), 50);
    /// let state = BattleState::new(a, b);
    ///
    /// assert_eq!(state.phase, BattlePhase::Ready);
    /// assert_eq!(state.turn, 1);
    /// assert_eq!(state.current_attacker, Role::Challenger);
    /// assert!(state.result.is_none());
    /// ```
    pub fn new(challenger: Combatant, opponent: Combatant) -> Self {
        Self {
            phase: BattlePhase::Ready,
            ..Self::setup(challenger, opponent)
        }
    }

    /// The combatant on `role`'s side.
    pub fn combatant(&self, role: Role) -> &Combatant {
        match role {
            Role::Challenger => &self.challenger,
            Role::Opponent => &self.opponent,
        }
    }

    /// The side whose turn it is.
    pub fn attacker(&self) -> &Combatant {
        self.combatant(self.current_attacker)
    }

    /// The side being attacked this turn.
    pub fn defender(&self) -> &Combatant {
        self.combatant(self.current_attacker.opposite())
    }

    /// `true` in the `finished` phase.
    pub fn is_finished(&self) -> bool {
        self.phase == BattlePhase::Finished
    }

    /// The winning combatant once finished.
    pub fn winner(&self) -> Option<&Combatant> {
        self.result.as_ref().map(|r| self.combatant(r.winner))
    }

    /// Move to a later non-terminal phase. Use [`BattleState::finish`] to end.
    pub fn advance_to(self, phase: BattlePhase) -> Option<Self> {
        if phase == BattlePhase::Finished || !self.phase.can_advance_to(phase) {
            return None;
        }
        Some(Self { phase, ..self })
    }

    /// Move to `finished` with `result`. `None` if already finished.
    pub fn finish(self, result: BattleResult) -> Option<Self> {
        if !self.phase.can_advance_to(BattlePhase::Finished) {
            return None;
        }
        Some(Self {
            phase: BattlePhase::Finished,
            result: Some(result),
            ..self
        })
    }

    /// Copy with `role`'s side replaced.
    pub fn with_combatant(self, role: Role, combatant: Combatant) -> Self {
        match role {
            Role::Challenger => Self {
                challenger: combatant,
                ..self
            },
            Role::Opponent => Self {
                opponent: combatant,
                ..self
            },
        }
    }

    /// Copy with `entry` appended to the log.
    pub fn with_log_entry(mut self, entry: BattleLogEntry) -> Self {
        self.battle_log.push(entry);
        self
    }

    /// Copy at `turn` with `current_attacker` up next.
    pub fn with_turn(self, turn: u32, current_attacker: Role) -> Self {
        Self {
            turn,
            current_attacker,
            ..self
        }
    }

    /// Copy with `role` opening.
    pub fn with_first_attacker(self, role: Role) -> Self {
        Self {
            current_attacker: role,
            ..self
        }
    }

    /// Copy with the auto-battle flag set. Nothing else reads it.
    pub fn with_auto_battle(self, is_auto_battle: bool) -> Self {
        Self {
            is_auto_battle,
            ..self
        }
    }

    /// A brand-new `ready` state with both sides restored to full health.
    ///
    /// Log and result are discarded; identity and stats are kept.
    pub fn reset(&self) -> Self {
        Self::new(self.challenger.restored(), self.opponent.restored())
    }
}
