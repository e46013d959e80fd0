//! Battle recording and history collaborators.
//!
//! Both are optional. A [`BattleRecorder`] follows a battle turn by turn;
//! when the battle ends the engine hands the finished [`BattleRecord`] to a
//! [`HistoryStore`]. A failed save is logged by the engine and otherwise
//! ignored.

use crate::combat::AttackResult;
use crate::combatant::Combatant;
use crate::error::BattleError;
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// One resolved attack, as recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    pub turn: u32,
    pub attacker_id: String,
    pub defender_id: String,
    pub damage: u32,
    pub is_critical: bool,
    pub lifesteal_heal: u32,
    pub defender_hp_before: u32,
    pub defender_hp_after: u32,
    pub attacker_hp_before: u32,
    pub attacker_hp_after: u32,
}

/// A complete, replayable battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRecord {
    pub id: String,
    pub challenger: Combatant,
    pub opponent: Combatant,
    pub turns: Vec<TurnRecord>,
    pub winner_id: String,
    pub winner_name: String,
    pub total_turns: u32,
    /// Unix milliseconds.
    pub started_at: i64,
    /// Unix milliseconds.
    pub finished_at: i64,
}

/// Follows a battle from start to finish.
///
/// The engine calls `start_recording` when a battle starts, `record_turn`
/// after every attack while `is_recording` holds, and `finish_recording`
/// once a winner is known.
pub trait BattleRecorder: Send {
    /// Begin a new recording, dropping any recording in progress.
    fn start_recording(&mut self, challenger: &Combatant, opponent: &Combatant);

    /// `attacker` and `defender` are the snapshots before the attack.
    fn record_turn(
        &mut self,
        turn: u32,
        attacker: &Combatant,
        defender: &Combatant,
        result: &AttackResult,
        defender_hp_before: u32,
        attacker_hp_before: u32,
    );

    /// `true` between `start_recording` and `finish_recording`/`reset`.
    fn is_recording(&self) -> bool;

    /// Close the recording. `None` if nothing was being recorded.
    fn finish_recording(&mut self, winner_id: &str, winner_name: &str) -> Option<BattleRecord>;

    /// Drop any recording in progress.
    fn reset(&mut self);
}

/// Durable sink for finished battles.
pub trait HistoryStore: Send {
    /// Persist `record`. Errors are logged by the engine, never propagated.
    fn save(&mut self, record: &BattleRecord) -> Result<(), BattleError>;
}

#[derive(Debug, Clone)]
struct Recording {
    challenger: Combatant,
    opponent: Combatant,
    turns: Vec<TurnRecord>,
    started_at: i64,
}

/// Recorder that keeps the battle in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecorder {
    current: Option<Recording>,
}

impl InMemoryRecorder {
    /// A recorder with nothing in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns recorded so far.
    pub fn turns(&self) -> &[TurnRecord] {
        match &self.current {
            Some(recording) => &recording.turns,
            None => &[],
        }
    }
}

impl BattleRecorder for InMemoryRecorder {
    fn start_recording(&mut self, challenger: &Combatant, opponent: &Combatant) {
        self.current = Some(Recording {
            challenger: challenger.clone(),
            opponent: opponent.clone(),
            turns: Vec::new(),
            started_at: Utc::now().timestamp_millis(),
        });
    }

    fn record_turn(
        &mut self,
        turn: u32,
        attacker: &Combatant,
        defender: &Combatant,
        result: &AttackResult,
        defender_hp_before: u32,
        attacker_hp_before: u32,
    ) {
        let Some(recording) = self.current.as_mut() else {
            return;
        };
        recording.turns.push(TurnRecord {
            turn,
            attacker_id: attacker.id.clone(),
            defender_id: defender.id.clone(),
            damage: result.damage,
            is_critical: result.is_critical,
            lifesteal_heal: result.lifesteal_heal,
            defender_hp_before,
            defender_hp_after: result.defender_new_hp,
            attacker_hp_before,
            attacker_hp_after: result.attacker_new_hp,
        });
    }

    fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    fn finish_recording(&mut self, winner_id: &str, winner_name: &str) -> Option<BattleRecord> {
        let recording = self.current.take()?;
        Some(BattleRecord {
            id: Uuid::new_v4().to_string(),
            total_turns: recording.turns.len() as u32,
            challenger: recording.challenger,
            opponent: recording.opponent,
            turns: recording.turns,
            winner_id: winner_id.to_string(),
            winner_name: winner_name.to_string(),
            started_at: recording.started_at,
            finished_at: Utc::now().timestamp_millis(),
        })
    }

    fn reset(&mut self) {
        self.current = None;
    }
}

/// History kept in memory behind a shared handle.
///
/// Clones share the same storage, so a caller can keep one clone and
/// give another to the engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    records: Arc<Mutex<Vec<BattleRecord>>>,
    failure: Option<String>,
}

impl InMemoryHistory {
    /// An empty store whose saves succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every save fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            records: Arc::default(),
            failure: Some(reason.into()),
        }
    }

    /// A poisoned lock still holds consistent data: saves only push.
    fn lock(&self) -> MutexGuard<'_, Vec<BattleRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every saved record, oldest first.
    pub fn records(&self) -> Vec<BattleRecord> {
        self.lock().clone()
    }

    /// Number of saved records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` when nothing has been saved.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl HistoryStore for InMemoryHistory {
    fn save(&mut self, record: &BattleRecord) -> Result<(), BattleError> {
        if let Some(reason) = &self.failure {
            return Err(BattleError::HistorySave(reason.clone()));
        }
        self.lock().push(record.clone());
        Ok(())
    }
}
