//! Combat configuration.
//!
//! A `CombatConfig` is the single value every system is built from. The
//! engine constructs its own calculator, combat, turn and victory systems
//! from it; nothing is read from ambient state.

use crate::error::BattleError;
use serde::{Deserialize, Serialize};

/// Armor settings for the damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefenseConfig {
    /// When `false`, defense is ignored and damage equals scaled ATK.
    pub enabled: bool,

    /// Denominator offset in `def / (def + scaling_factor)`.
    pub scaling_factor: f64,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scaling_factor: 100.0,
        }
    }
}

/// Who acts on turn 1 after a battle is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstAttackerRule {
    /// The challenger always opens.
    #[default]
    Challenger,
    /// Higher speed opens, ties broken at random.
    Speed,
}

/// Tunables for damage resolution and turn order.
///
/// Every field has a default, so a partial JSON document is enough.
///
/// # Examples
///
/// ```rust
/// use duelcore::CombatConfig;
///
/// let json = r#"{ "minDamage": 5, "defense": { "enabled": true } }"#;
/// let config = CombatConfig::from_json(json).unwrap();
/// assert_eq!(config.min_damage, 5);
/// assert!(config.defense.enabled);
/// assert_eq!(config.defense.scaling_factor, 100.0);
/// assert_eq!(config.critical_damage_threshold, 0.3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatConfig {
    pub defense: DefenseConfig,

    /// Floor applied to base damage so no attack is fully nullified.
    /// Must be at least 1.
    pub min_damage: u32,

    /// A hit larger than `max_hp * threshold` counts as a critical hit.
    pub critical_damage_threshold: f64,

    pub first_attacker: FirstAttackerRule,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            defense: DefenseConfig::default(),
            min_damage: 1,
            critical_damage_threshold: 0.3,
            first_attacker: FirstAttackerRule::Challenger,
        }
    }
}

impl CombatConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(text: &str) -> Result<Self, BattleError> {
        let config: CombatConfig =
            serde_json::from_str(text).map_err(|e| BattleError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every numeric bound is usable by the damage formula.
    pub fn validate(&self) -> Result<(), BattleError> {
        if !self.defense.scaling_factor.is_finite() || self.defense.scaling_factor <= 0.0 {
            return Err(BattleError::InvalidConfig(format!(
                "defense.scalingFactor must be a positive number, got {}",
                self.defense.scaling_factor
            )));
        }
        if self.min_damage == 0 {
            return Err(BattleError::InvalidConfig("minDamage must be at least 1".to_string()));
        }
        if !self.critical_damage_threshold.is_finite() || self.critical_damage_threshold < 0.0 {
            return Err(BattleError::InvalidConfig(format!(
                "criticalDamageThreshold must be a non-negative number, got {}",
                self.critical_damage_threshold
            )));
        }
        Ok(())
    }

    /// Builder-style toggle for the armor branch.
    pub fn with_defense(mut self, enabled: bool) -> Self {
        self.defense.enabled = enabled;
        self
    }
}
