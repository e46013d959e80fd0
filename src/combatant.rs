//! Combatant model.
//!
//! A `Combatant` is a value: every change (damage, healing, a new buff)
//! produces a new `Combatant` and leaves the original untouched.
//! `is_defeated` is derived from `current_hp` by every constructor here.

use serde::Serialize;

/// Numeric attributes of a fighter.
///
/// Percent fields are whole percents: `crit_chance = 25` is a 25% chance,
/// `crit_damage = 150` multiplies a landed crit by 1.5.
///
/// # Examples
///
/// ```rust
/// use duelcore::CombatantStats;
///
/// let stats = CombatantStats::new(40, 10, 12).with_crit(25, 200).with_lifesteal(10);
/// assert_eq!(stats.crit_chance, 25);
/// assert_eq!(stats.crit_damage, 200);
/// assert_eq!(stats.armor_pen, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantStats {
    pub atk: u32,
    pub def: u32,
    pub spd: u32,
    /// 0..=100
    pub crit_chance: u32,
    /// >= 100
    pub crit_damage: u32,
    /// 0..=100
    pub armor_pen: u32,
    /// 0..=100
    pub lifesteal: u32,
}

impl CombatantStats {
    /// Default crit multiplier (x1.5).
    pub const DEFAULT_CRIT_DAMAGE: u32 = 150;

    /// Stats with no crit chance, no penetration and no lifesteal.
    pub fn new(atk: u32, def: u32, spd: u32) -> Self {
        Self {
            atk,
            def,
            spd,
            crit_chance: 0,
            crit_damage: Self::DEFAULT_CRIT_DAMAGE,
            armor_pen: 0,
            lifesteal: 0,
        }
    }

    /// Set crit chance (capped at 100) and crit damage percent (at least 100).
    pub fn with_crit(mut self, chance: u32, damage: u32) -> Self {
        self.crit_chance = chance.min(100);
        self.crit_damage = damage.max(100);
        self
    }

    /// Percent of defender DEF ignored, capped at 100.
    pub fn with_armor_pen(mut self, armor_pen: u32) -> Self {
        self.armor_pen = armor_pen.min(100);
        self
    }

    /// Percent of damage dealt healed back, capped at 100.
    pub fn with_lifesteal(mut self, lifesteal: u32) -> Self {
        self.lifesteal = lifesteal.min(100);
        self
    }

    fn get(&self, stat: BuffStat) -> u32 {
        match stat {
            BuffStat::Atk => self.atk,
            BuffStat::Def => self.def,
            BuffStat::Spd => self.spd,
            BuffStat::CritChance => self.crit_chance,
            BuffStat::CritDamage => self.crit_damage,
            BuffStat::ArmorPen => self.armor_pen,
            BuffStat::Lifesteal => self.lifesteal,
        }
    }

    fn set(&mut self, stat: BuffStat, value: u32) {
        match stat {
            BuffStat::Atk => self.atk = value,
            BuffStat::Def => self.def = value,
            BuffStat::Spd => self.spd = value,
            BuffStat::CritChance => self.crit_chance = value.min(100),
            BuffStat::CritDamage => self.crit_damage = value.max(100),
            BuffStat::ArmorPen => self.armor_pen = value.min(100),
            BuffStat::Lifesteal => self.lifesteal = value.min(100),
        }
    }
}

/// The stat a buff modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BuffStat {
    Atk,
    Def,
    Spd,
    CritChance,
    CritDamage,
    ArmorPen,
    Lifesteal,
}

impl BuffStat {
    /// Every stat, in wire order.
    pub const ALL: [BuffStat; 7] = [
        BuffStat::Atk,
        BuffStat::Def,
        BuffStat::Spd,
        BuffStat::CritChance,
        BuffStat::CritDamage,
        BuffStat::ArmorPen,
        BuffStat::Lifesteal,
    ];

    /// Wire name, matching the `CombatantStats` field names.
    pub fn as_str(self) -> &'static str {
        match self {
            BuffStat::Atk => "atk",
            BuffStat::Def => "def",
            BuffStat::Spd => "spd",
            BuffStat::CritChance => "critChance",
            BuffStat::CritDamage => "critDamage",
            BuffStat::ArmorPen => "armorPen",
            BuffStat::Lifesteal => "lifesteal",
        }
    }

    /// Inverse of [`BuffStat::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stat| stat.as_str() == s)
    }
}

/// How a buff combines with an existing buff of the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackRule {
    /// The new buff overwrites the old one.
    #[default]
    Replace,
    /// Values are summed; the longer duration is kept.
    Add,
    /// The larger value is kept; the longer duration is kept.
    Max,
}

impl StackRule {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            StackRule::Replace => "replace",
            StackRule::Add => "add",
            StackRule::Max => "max",
        }
    }

    /// Inverse of [`StackRule::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(StackRule::Replace),
            "add" => Some(StackRule::Add),
            "max" => Some(StackRule::Max),
            _ => None,
        }
    }
}

/// A timed stat modifier. Negative values are debuffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buff {
    pub id: String,
    pub stat: BuffStat,
    pub value: i32,
    /// Remaining turns.
    pub duration: u32,
    pub stacking: StackRule,
}

impl Buff {
    /// Buff lasting `duration` turns that replaces any buff with the same id.
    pub fn new(id: impl Into<String>, stat: BuffStat, value: i32, duration: u32) -> Self {
        Self {
            id: id.into(),
            stat,
            value,
            duration,
            stacking: StackRule::Replace,
        }
    }

    /// Use `rule` when this buff meets an existing one.
    pub fn stacking(mut self, rule: StackRule) -> Self {
        self.stacking = rule;
        self
    }

    /// Combine `incoming` into `self` under `incoming.stacking`.
    fn merged_with(&self, incoming: &Buff) -> Buff {
        match incoming.stacking {
            StackRule::Replace => incoming.clone(),
            StackRule::Add => Buff {
                value: self.value.saturating_add(incoming.value),
                duration: self.duration.max(incoming.duration),
                ..incoming.clone()
            },
            StackRule::Max => Buff {
                value: self.value.max(incoming.value),
                duration: self.duration.max(incoming.duration),
                ..incoming.clone()
            },
        }
    }
}

/// One side of a battle.
///
/// # Examples
///
/// ```rust
/// use duelcore::{Combatant, CombatantStats};
///
/// let knight = Combatant::new("c1", "Knight", CombatantStats::new(30, 10, 8), 120);
/// let hurt = knight.with_hp(0);
///
/// assert_eq!(knight.current_hp, 120);
/// assert!(!knight.is_defeated);
/// assert!(hurt.is_defeated);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub base_stats: CombatantStats,
    pub current_hp: u32,
    pub max_hp: u32,
    pub buffs: Vec<Buff>,
    pub is_defeated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_range: Option<u32>,
}

impl Combatant {
    /// A combatant at full health with no buffs.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_stats: CombatantStats,
        max_hp: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_url: String::new(),
            base_stats,
            current_hp: max_hp,
            max_hp,
            buffs: Vec::new(),
            is_defeated: max_hp == 0,
            effective_range: None,
        }
    }

    /// Card art shown by clients. Not used by combat.
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    /// Attack reach in tiles.
    ///
    /// Carried through serialization only; a duel has no positions.
    pub fn with_effective_range(mut self, range: u32) -> Self {
        self.effective_range = Some(range);
        self
    }

    /// Copy with `current_hp` clamped to `0..=max_hp` and `is_defeated` rederived.
    pub fn with_hp(&self, hp: u32) -> Self {
        let current_hp = hp.min(self.max_hp);
        Self {
            current_hp,
            is_defeated: current_hp == 0,
            ..self.clone()
        }
    }

    /// Copy at full health, undefeated, with buffs cleared.
    pub fn restored(&self) -> Self {
        Self {
            current_hp: self.max_hp,
            is_defeated: self.max_hp == 0,
            buffs: Vec::new(),
            ..self.clone()
        }
    }

    /// `true` while any HP remains.
    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Fraction of max HP remaining, `0.0` when `max_hp` is zero.
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        f64::from(self.current_hp) / f64::from(self.max_hp)
    }

    /// Copy with `buff` applied under its stacking rule.
    pub fn with_buff(&self, buff: Buff) -> Self {
        let mut buffs = self.buffs.clone();
        match buffs.iter_mut().find(|existing| existing.id == buff.id) {
            Some(existing) => *existing = existing.merged_with(&buff),
            None => buffs.push(buff),
        }
        Self {
            buffs,
            ..self.clone()
        }
    }

    /// Copy with every buff's duration decremented and expired buffs dropped.
    pub fn tick_buffs(&self) -> Self {
        let buffs = self
            .buffs
            .iter()
            .filter(|buff| buff.duration > 1)
            .map(|buff| Buff {
                duration: buff.duration - 1,
                ..buff.clone()
            })
            .collect();
        Self {
            buffs,
            ..self.clone()
        }
    }

    /// Base stats with every active buff folded in.
    pub fn effective_stats(&self) -> CombatantStats {
        let mut stats = self.base_stats;
        for stat in BuffStat::ALL {
            let delta: i64 = self
                .buffs
                .iter()
                .filter(|buff| buff.stat == stat)
                .map(|buff| i64::from(buff.value))
                .sum();
            if delta != 0 {
                let value = (i64::from(stats.get(stat)) + delta).clamp(0, i64::from(u32::MAX));
                stats.set(stat, value as u32);
            }
        }
        stats
    }
}
