//! JSON encoding and validating decoding of `BattleState`.
//!
//! Encoding goes through the serde `Serialize` impls on the model types.
//! Decoding walks the parsed JSON tree field by field and builds each value
//! bottom-up, from primitives to the full state. The first invalid field
//! aborts the whole decode with a [`BattleError::InvalidField`] naming its
//! path, e.g. `battleLog[1].data.damage`. No partial state is returned.

use crate::combatant::{Buff, BuffStat, Combatant, CombatantStats, StackRule};
use crate::error::BattleError;
use crate::logger::{
    AttackLogData, BattleLogEntry, GemSkillLogData, LogEntryType, LogPayload, SkillLogData,
};
use crate::state::{BattlePhase, BattleResult, BattleState, Role};
use serde_json::{Map, Value};

/// Encoder/decoder for the battle state wire format.
///
/// # Examples
///
/// ```rust
/// use duelcore::{BattleSerializer, BattleState, Combatant, CombatantStats};
///
/// let state = BattleState::new(
///     Combatant::new("a", "Aria", CombatantStats::new(10, 2, 5), 50),
///     Combatant::new("b", "Borin", CombatantStats::new(12, 1, 4), 60),
/// );
///
/// let json = BattleSerializer::serialize(&state).unwrap();
/// assert_eq!(BattleSerializer::deserialize(&json).unwrap(), state);
///
/// let err = BattleSerializer::deserialize(&json.replace("\"ready\"", "\"paused\"")).unwrap_err();
/// assert_eq!(err.path(), Some("phase"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BattleSerializer;

impl BattleSerializer {
    /// Compact JSON.
    pub fn serialize(state: &BattleState) -> Result<String, BattleError> {
        serde_json::to_string(state).map_err(|e| BattleError::Encode(e.to_string()))
    }

    /// Indented JSON, same shape as [`BattleSerializer::serialize`].
    pub fn serialize_pretty(state: &BattleState) -> Result<String, BattleError> {
        serde_json::to_string_pretty(state).map_err(|e| BattleError::Encode(e.to_string()))
    }

    /// Parse and fully validate a serialized state.
    pub fn deserialize(text: &str) -> Result<BattleState, BattleError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| BattleError::MalformedJson(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<BattleState, BattleError> {
        decode_state(&Node::root(value))
    }
}

/// A JSON value together with its path from the root.
struct Node<'a> {
    value: &'a Value,
    path: String,
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    fn fail(&self, reason: impl Into<String>) -> BattleError {
        let path = if self.path.is_empty() {
            "$".to_string()
        } else {
            self.path.clone()
        };
        BattleError::invalid_field(path, reason)
    }

    fn expected(&self, what: &str) -> BattleError {
        self.fail(format!("expected {}, found {}", what, json_type(self.value)))
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn object(&self) -> Result<&'a Map<String, Value>, BattleError> {
        self.value.as_object().ok_or_else(|| self.expected("an object"))
    }

    /// Required field.
    fn get(&self, key: &str) -> Result<Node<'a>, BattleError> {
        let object = self.object()?;
        let path = self.child_path(key);
        match object.get(key) {
            Some(value) => Ok(Node { value, path }),
            None => Err(BattleError::invalid_field(path, "missing required field")),
        }
    }

    /// Optional field; absent and `null` are both `None`.
    fn get_optional(&self, key: &str) -> Result<Option<Node<'a>>, BattleError> {
        let object = self.object()?;
        Ok(object
            .get(key)
            .filter(|value| !value.is_null())
            .map(|value| Node {
                value,
                path: self.child_path(key),
            }))
    }

    fn items(&self) -> Result<Vec<Node<'a>>, BattleError> {
        let array = self.value.as_array().ok_or_else(|| self.expected("an array"))?;
        Ok(array
            .iter()
            .enumerate()
            .map(|(i, value)| Node {
                value,
                path: format!("{}[{}]", self.path, i),
            })
            .collect())
    }

    fn string(&self) -> Result<String, BattleError> {
        self.value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.expected("a string"))
    }

    fn boolean(&self) -> Result<bool, BattleError> {
        self.value.as_bool().ok_or_else(|| self.expected("a boolean"))
    }

    fn integer(&self) -> Result<i64, BattleError> {
        let Value::Number(number) = self.value else {
            return Err(self.expected("a number"));
        };
        if let Some(i) = number.as_i64() {
            return Ok(i);
        }
        if number.as_u64().is_some() {
            return Err(self.fail("integer out of range"));
        }
        match number.as_f64() {
            Some(f) if f.is_nan() => Err(self.fail("must not be NaN")),
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
            _ => Err(self.fail("expected an integer")),
        }
    }

    fn u32(&self) -> Result<u32, BattleError> {
        let i = self.integer()?;
        u32::try_from(i)
            .map_err(|_| self.fail(format!("expected a non-negative integer, found {}", i)))
    }

    fn positive(&self) -> Result<u32, BattleError> {
        let value = self.u32()?;
        if value == 0 {
            return Err(self.fail("must be at least 1"));
        }
        Ok(value)
    }

    fn i32(&self) -> Result<i32, BattleError> {
        let i = self.integer()?;
        i32::try_from(i).map_err(|_| self.fail(format!("integer {} out of range", i)))
    }

    fn percent(&self) -> Result<u32, BattleError> {
        let value = self.u32()?;
        if value > 100 {
            return Err(self.fail(format!("must be between 0 and 100, found {}", value)));
        }
        Ok(value)
    }

    fn one_of<T>(
        &self,
        parse: impl Fn(&str) -> Option<T>,
        allowed: &str,
    ) -> Result<T, BattleError> {
        let raw = self.string()?;
        parse(&raw)
            .ok_or_else(|| self.fail(format!("must be one of {}, found \"{}\"", allowed, raw)))
    }
}

fn decode_stats(node: &Node) -> Result<CombatantStats, BattleError> {
    let crit_damage_node = node.get("critDamage")?;
    let crit_damage = crit_damage_node.u32()?;
    if crit_damage < 100 {
        return Err(crit_damage_node.fail(format!("must be at least 100, found {}", crit_damage)));
    }
    Ok(CombatantStats {
        atk: node.get("atk")?.positive()?,
        def: node.get("def")?.u32()?,
        spd: node.get("spd")?.positive()?,
        crit_chance: node.get("critChance")?.percent()?,
        crit_damage,
        armor_pen: node.get("armorPen")?.percent()?,
        lifesteal: node.get("lifesteal")?.percent()?,
    })
}

fn decode_buff(node: &Node) -> Result<Buff, BattleError> {
    Ok(Buff {
        id: node.get("id")?.string()?,
        stat: node.get("stat")?.one_of(
            BuffStat::parse,
            "atk, def, spd, critChance, critDamage, armorPen, lifesteal",
        )?,
        value: node.get("value")?.i32()?,
        duration: node.get("duration")?.u32()?,
        stacking: node
            .get("stacking")?
            .one_of(StackRule::parse, "replace, add, max")?,
    })
}

fn decode_combatant(node: &Node) -> Result<Combatant, BattleError> {
    let id = node.get("id")?.string()?;
    let name = node.get("name")?.string()?;
    let image_url = node.get("imageUrl")?.string()?;
    let base_stats = decode_stats(&node.get("baseStats")?)?;

    let max_hp = node.get("maxHp")?.u32()?;
    let current_hp_node = node.get("currentHp")?;
    let current_hp = current_hp_node.u32()?;
    if current_hp > max_hp {
        return Err(current_hp_node.fail(format!(
            "must not exceed maxHp ({}), found {}",
            max_hp, current_hp
        )));
    }

    let buffs = node
        .get("buffs")?
        .items()?
        .iter()
        .map(decode_buff)
        .collect::<Result<Vec<_>, _>>()?;

    let defeated_node = node.get("isDefeated")?;
    let is_defeated = defeated_node.boolean()?;
    if is_defeated != (current_hp == 0) {
        return Err(defeated_node.fail(format!(
            "must be {} when currentHp is {}",
            current_hp == 0,
            current_hp
        )));
    }

    let effective_range = match node.get_optional("effectiveRange")? {
        Some(range) => Some(range.u32()?),
        None => None,
    };

    Ok(Combatant {
        id,
        name,
        image_url,
        base_stats,
        current_hp,
        max_hp,
        buffs,
        is_defeated,
        effective_range,
    })
}

fn decode_attack_data(node: &Node) -> Result<AttackLogData, BattleError> {
    Ok(AttackLogData {
        attacker_id: node.get("attackerId")?.string()?,
        defender_id: node.get("defenderId")?.string()?,
        damage: node.get("damage")?.u32()?,
        is_critical: node.get("isCritical")?.boolean()?,
        remaining_hp: node.get("remainingHp")?.u32()?,
    })
}

fn decode_skill_data(node: &Node) -> Result<SkillLogData, BattleError> {
    Ok(SkillLogData {
        skill_id: node.get("skillId")?.string()?,
        skill_name: node.get("skillName")?.string()?,
        skill_type: node.get("skillType")?.string()?,
        caster_id: node.get("casterId")?.string()?,
        effect: node.get("effect")?.string()?,
    })
}

fn decode_gem_skill_data(node: &Node) -> Result<GemSkillLogData, BattleError> {
    Ok(GemSkillLogData {
        gem_id: node.get("gemId")?.string()?,
        skill_id: node.get("skillId")?.string()?,
        skill_name: node.get("skillName")?.string()?,
        skill_type: node.get("skillType")?.string()?,
        caster_id: node.get("casterId")?.string()?,
        effect: node.get("effect")?.string()?,
    })
}

fn decode_log_entry(node: &Node) -> Result<BattleLogEntry, BattleError> {
    let id = node.get("id")?.string()?;
    let timestamp = node.get("timestamp")?.integer()?;
    let entry_type = node
        .get("type")?
        .one_of(LogEntryType::parse, "attack, victory, skill, gem_skill")?;
    let message = node.get("message")?.string()?;

    let payload = match entry_type {
        LogEntryType::Attack => LogPayload::Attack(decode_attack_data(&node.get("data")?)?),
        LogEntryType::Skill => LogPayload::Skill(decode_skill_data(&node.get("data")?)?),
        LogEntryType::GemSkill => LogPayload::GemSkill(decode_gem_skill_data(&node.get("data")?)?),
        LogEntryType::Victory => {
            if let Some(data) = node.get_optional("data")? {
                return Err(data.fail("must be null for victory entries"));
            }
            LogPayload::Victory
        }
    };

    Ok(BattleLogEntry {
        id,
        timestamp,
        message,
        payload,
    })
}

fn decode_result(node: &Node) -> Result<BattleResult, BattleError> {
    Ok(BattleResult {
        winner: node
            .get("winner")?
            .one_of(Role::parse, "challenger, opponent")?,
        winner_name: node.get("winnerName")?.string()?,
        total_turns: node.get("totalTurns")?.u32()?,
    })
}

fn decode_state(node: &Node) -> Result<BattleState, BattleError> {
    let phase = node
        .get("phase")?
        .one_of(BattlePhase::parse, "setup, ready, fighting, finished")?;

    let turn_node = node.get("turn")?;
    let turn = turn_node.u32()?;
    if turn == 0 {
        return Err(turn_node.fail("must be at least 1"));
    }

    let challenger = decode_combatant(&node.get("challenger")?)?;
    let opponent = decode_combatant(&node.get("opponent")?)?;
    let current_attacker = node
        .get("currentAttacker")?
        .one_of(Role::parse, "challenger, opponent")?;

    let battle_log = node
        .get("battleLog")?
        .items()?
        .iter()
        .map(decode_log_entry)
        .collect::<Result<Vec<_>, _>>()?;

    let result_node = node.get("result")?;
    let result = match node.get_optional("result")? {
        Some(result) => Some(decode_result(&result)?),
        None => None,
    };
    match (phase, &result) {
        (BattlePhase::Finished, None) => {
            return Err(result_node.fail("must be present when phase is finished"));
        }
        (p, Some(_)) if p != BattlePhase::Finished => {
            return Err(result_node.fail(format!("must be null when phase is {}", p)));
        }
        _ => {}
    }

    let is_auto_battle = node.get("isAutoBattle")?.boolean()?;

    Ok(BattleState {
        phase,
        turn,
        challenger,
        opponent,
        current_attacker,
        battle_log,
        result,
        is_auto_battle,
    })
}
