//! Combat log entries.
//!
//! `CombatLogger` is a stateless factory: each call stamps a fresh id and
//! the current time onto an immutable [`BattleLogEntry`]. The entry's
//! payload is a closed enum keyed by the entry type, so an attack entry
//! always carries attack data and a victory entry carries none.

use crate::combatant::Combatant;
use chrono::Utc;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// The wire tag of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEntryType {
    Attack,
    Victory,
    Skill,
    GemSkill,
}

impl LogEntryType {
    /// Wire tag, e.g. `gem_skill`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogEntryType::Attack => "attack",
            LogEntryType::Victory => "victory",
            LogEntryType::Skill => "skill",
            LogEntryType::GemSkill => "gem_skill",
        }
    }

    /// Inverse of [`LogEntryType::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attack" => Some(LogEntryType::Attack),
            "victory" => Some(LogEntryType::Victory),
            "skill" => Some(LogEntryType::Skill),
            "gem_skill" => Some(LogEntryType::GemSkill),
            _ => None,
        }
    }
}

/// Data of an `attack` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackLogData {
    pub attacker_id: String,
    pub defender_id: String,
    pub damage: u32,
    /// Big-hit flag: damage above the configured share of defender max HP.
    pub is_critical: bool,
    pub remaining_hp: u32,
}

/// Data of a `skill` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLogData {
    pub skill_id: String,
    pub skill_name: String,
    pub skill_type: String,
    pub caster_id: String,
    pub effect: String,
}

/// Data of a `gem_skill` entry. `gem_id` names the gem that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GemSkillLogData {
    pub gem_id: String,
    pub skill_id: String,
    pub skill_name: String,
    pub skill_type: String,
    pub caster_id: String,
    pub effect: String,
}

/// Structured data attached to a log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogPayload {
    Attack(AttackLogData),
    Victory,
    Skill(SkillLogData),
    GemSkill(GemSkillLogData),
}

impl LogPayload {
    /// The tag this payload serializes under.
    pub fn entry_type(&self) -> LogEntryType {
        match self {
            LogPayload::Attack(_) => LogEntryType::Attack,
            LogPayload::Victory => LogEntryType::Victory,
            LogPayload::Skill(_) => LogEntryType::Skill,
            LogPayload::GemSkill(_) => LogEntryType::GemSkill,
        }
    }
}

/// One line of the battle log.
///
/// Serializes as `{ id, timestamp, type, message, data }`, with `data`
/// set to `null` for victory entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleLogEntry {
    pub id: String,
    /// Unix time in milliseconds.
    pub timestamp: i64,
    pub message: String,
    pub payload: LogPayload,
}

impl BattleLogEntry {
    /// Shorthand for `self.payload.entry_type()`.
    pub fn entry_type(&self) -> LogEntryType {
        self.payload.entry_type()
    }

    /// Attack data, if this is an attack entry.
    pub fn attack_data(&self) -> Option<&AttackLogData> {
        match &self.payload {
            LogPayload::Attack(data) => Some(data),
            _ => None,
        }
    }
}

impl Serialize for BattleLogEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entry = serializer.serialize_struct("BattleLogEntry", 5)?;
        entry.serialize_field("id", &self.id)?;
        entry.serialize_field("timestamp", &self.timestamp)?;
        entry.serialize_field("type", self.entry_type().as_str())?;
        entry.serialize_field("message", &self.message)?;
        match &self.payload {
            LogPayload::Attack(data) => entry.serialize_field("data", data)?,
            LogPayload::Victory => entry.serialize_field("data", &Option::<()>::None)?,
            LogPayload::Skill(data) => entry.serialize_field("data", data)?,
            LogPayload::GemSkill(data) => entry.serialize_field("data", data)?,
        }
        entry.end()
    }
}

/// A skill firing, as reported by a skill extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillActivation {
    pub skill_id: String,
    pub skill_name: String,
    /// Free-form type tag; unknown tags get a generic description.
    pub skill_type: String,
}

impl SkillActivation {
    /// Activation of skill `skill_id`. `skill_type` picks the effect text.
    pub fn new(
        skill_id: impl Into<String>,
        skill_name: impl Into<String>,
        skill_type: impl Into<String>,
    ) -> Self {
        Self {
            skill_id: skill_id.into(),
            skill_name: skill_name.into(),
            skill_type: skill_type.into(),
        }
    }
}

/// Short effect text for a skill type.
pub fn effect_description(skill_type: &str) -> &'static str {
    match skill_type {
        "damage" => "deals bonus damage",
        "heal" => "restores health",
        "buff" => "boosts combat stats",
        "debuff" => "weakens the enemy",
        "shield" => "raises a protective shield",
        "stun" => "stuns the enemy",
        "lifesteal" => "drains life from the enemy",
        _ => "triggers a special effect",
    }
}

/// Builds log entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatLogger {
    critical_damage_threshold: f64,
}

impl CombatLogger {
    /// Logger flagging attacks above `critical_damage_threshold` of defender max HP.
    pub fn new(critical_damage_threshold: f64) -> Self {
        Self {
            critical_damage_threshold,
        }
    }

    fn entry(message: String, payload: LogPayload) -> BattleLogEntry {
        BattleLogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            message,
            payload,
        }
    }

    /// Log a resolved attack. `remaining_hp` is the defender's HP afterwards.
    pub fn log_attack(
        &self,
        attacker: &Combatant,
        defender: &Combatant,
        damage: u32,
        remaining_hp: u32,
    ) -> BattleLogEntry {
        let is_critical =
            f64::from(damage) > f64::from(defender.max_hp) * self.critical_damage_threshold;
        let message = if is_critical {
            format!(
                "{} lands a critical hit on {} for {} damage! ({} HP left)",
                attacker.name, defender.name, damage, remaining_hp
            )
        } else {
            format!(
                "{} attacks {} for {} damage ({} HP left)",
                attacker.name, defender.name, damage, remaining_hp
            )
        };
        Self::entry(
            message,
            LogPayload::Attack(AttackLogData {
                attacker_id: attacker.id.clone(),
                defender_id: defender.id.clone(),
                damage,
                is_critical,
                remaining_hp,
            }),
        )
    }

    /// Victory entry. Carries no data.
    pub fn log_victory(&self, winner_name: &str) -> BattleLogEntry {
        Self::entry(format!("{} wins the battle!", winner_name), LogPayload::Victory)
    }

    /// Skill entry for `caster`.
    pub fn log_skill(&self, caster: &Combatant, skill: &SkillActivation) -> BattleLogEntry {
        let effect = effect_description(&skill.skill_type);
        Self::entry(
            format!("{} uses {}: {}", caster.name, skill.skill_name, effect),
            LogPayload::Skill(SkillLogData {
                skill_id: skill.skill_id.clone(),
                skill_name: skill.skill_name.clone(),
                skill_type: skill.skill_type.clone(),
                caster_id: caster.id.clone(),
                effect: effect.to_string(),
            }),
        )
    }

    /// Skill entry for a skill fired by one of `caster`'s gems.
    pub fn log_gem_skill(
        &self,
        caster: &Combatant,
        gem_id: &str,
        skill: &SkillActivation,
    ) -> BattleLogEntry {
        let effect = effect_description(&skill.skill_type);
        Self::entry(
            format!(
                "{}'s gem activates {}: {}",
                caster.name, skill.skill_name, effect
            ),
            LogPayload::GemSkill(GemSkillLogData {
                gem_id: gem_id.to_string(),
                skill_id: skill.skill_id.clone(),
                skill_name: skill.skill_name.clone(),
                skill_type: skill.skill_type.clone(),
                caster_id: caster.id.clone(),
                effect: effect.to_string(),
            }),
        )
    }
}

impl Default for CombatLogger {
    fn default() -> Self {
        Self::new(0.3)
    }
}
