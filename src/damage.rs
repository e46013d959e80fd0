//! Damage calculation.
//!
//! The calculator is pure apart from the crit roll, which is drawn from
//! the caller's [`RandomSource`].
//!
//! ```text
//! effective_def = def * (1 - armor_pen / 100)
//! reduction     = effective_def / (effective_def + scaling_factor)
//! base          = max(min_damage, round(atk * skill_mult * (1 - reduction)))
//! final         = crit ? round(base * crit_damage / 100) : base
//! lifesteal     = floor(final * lifesteal / 100)
//! ```
//!
//! With defense disabled, `reduction` is zero.

use crate::combatant::CombatantStats;
use crate::config::CombatConfig;
use crate::random::RandomSource;
use serde::Serialize;

/// Inputs to a single damage roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    pub attacker_atk: u32,
    pub defender_def: u32,
    pub armor_pen: u32,
    pub crit_chance: u32,
    pub crit_damage: u32,
    pub lifesteal: u32,
    pub skill_multiplier: f64,
}

impl DamageInput {
    /// Plain attack: no crit, no penetration, no lifesteal, multiplier 1.
    pub fn new(attacker_atk: u32, defender_def: u32) -> Self {
        Self {
            attacker_atk,
            defender_def,
            armor_pen: 0,
            crit_chance: 0,
            crit_damage: CombatantStats::DEFAULT_CRIT_DAMAGE,
            lifesteal: 0,
            skill_multiplier: 1.0,
        }
    }

    /// Take every offensive stat from `attacker`.
    pub fn from_stats(attacker: &CombatantStats, defender_def: u32) -> Self {
        Self {
            attacker_atk: attacker.atk,
            defender_def,
            armor_pen: attacker.armor_pen,
            crit_chance: attacker.crit_chance,
            crit_damage: attacker.crit_damage,
            lifesteal: attacker.lifesteal,
            skill_multiplier: 1.0,
        }
    }

    /// Scale base damage, e.g. `1.5` for a heavy strike.
    pub fn with_skill_multiplier(mut self, skill_multiplier: f64) -> Self {
        self.skill_multiplier = skill_multiplier;
        self
    }
}

/// Breakdown of one damage roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageResult {
    pub final_damage: u32,
    pub base_damage: u32,
    pub is_crit: bool,
    /// `final_damage - base_damage` on a crit, otherwise 0.
    pub crit_bonus: u32,
    pub lifesteal_amount: u32,
}

/// Computes damage from attacker and defender stats.
///
/// # Examples
///
/// ```rust
/// use duelcore::damage::{DamageCalculator, DamageInput};
/// use duelcore::random::SequenceRandom;
/// use duelcore::CombatConfig;
///
/// let calculator = DamageCalculator::new(&CombatConfig::default());
/// let mut rng = SequenceRandom::never();
///
/// let result = calculator.calculate_with_details(&DamageInput::new(50, 999), &mut rng);
/// assert_eq!(result.final_damage, 50); // defense disabled by default
/// assert!(!result.is_crit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageCalculator {
    defense_enabled: bool,
    def_scaling_factor: f64,
    min_damage: u32,
    critical_damage_threshold: f64,
}

impl DamageCalculator {
    /// Calculator for `config`. A `min_damage` of 0 is raised to 1.
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            defense_enabled: config.defense.enabled,
            def_scaling_factor: config.defense.scaling_factor,
            min_damage: config.min_damage.max(1),
            critical_damage_threshold: config.critical_damage_threshold,
        }
    }

    /// Damage before the crit roll, floored at `min_damage`.
    pub fn base_damage(&self, input: &DamageInput) -> u32 {
        let raw = f64::from(input.attacker_atk) * input.skill_multiplier;
        let scaled = if self.defense_enabled {
            let armor_pen = f64::from(input.armor_pen.min(100));
            let effective_def = f64::from(input.defender_def) * (1.0 - armor_pen / 100.0);
            let reduction = effective_def / (effective_def + self.def_scaling_factor);
            raw * (1.0 - reduction)
        } else {
            raw
        };
        let rounded = if scaled.is_finite() && scaled > 0.0 {
            scaled.round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        rounded.max(self.min_damage)
    }

    /// Full damage roll with crit and lifesteal.
    pub fn calculate_with_details(
        &self,
        input: &DamageInput,
        rng: &mut dyn RandomSource,
    ) -> DamageResult {
        let base_damage = self.base_damage(input);
        let is_crit = rng.chance(input.crit_chance);
        tracing::trace!(
            crit_chance = input.crit_chance,
            is_crit,
            "rolled critical hit"
        );

        let final_damage = if is_crit {
            let crit_damage = u64::from(input.crit_damage.max(100));
            let scaled = (u64::from(base_damage) * crit_damage + 50) / 100;
            scaled.min(u64::from(u32::MAX)) as u32
        } else {
            base_damage
        };
        let crit_bonus = if is_crit {
            final_damage - base_damage
        } else {
            0
        };
        let lifesteal_amount =
            (u64::from(final_damage) * u64::from(input.lifesteal.min(100)) / 100) as u32;

        DamageResult {
            final_damage,
            base_damage,
            is_crit,
            crit_bonus,
            lifesteal_amount,
        }
    }

    /// `true` when `damage` exceeds the configured share of `defender_max_hp`.
    ///
    /// Independent of the crit roll.
    pub fn is_critical_damage(&self, damage: u32, defender_max_hp: u32) -> bool {
        f64::from(damage) > f64::from(defender_max_hp) * self.critical_damage_threshold
    }

    /// Share of defender max HP above which a hit counts as a big hit.
    pub fn critical_damage_threshold(&self) -> f64 {
        self.critical_damage_threshold
    }
}

impl Default for DamageCalculator {
    fn default() -> Self {
        Self::new(&CombatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;

    fn with_defense() -> DamageCalculator {
        DamageCalculator::new(&CombatConfig::default().with_defense(true))
    }

    #[test]
    fn test_no_defense_is_raw_atk() {
        let calc = DamageCalculator::default();
        let result =
            calc.calculate_with_details(&DamageInput::new(50, 80), &mut SequenceRandom::never());
        assert_eq!(result.base_damage, 50);
        assert_eq!(result.final_damage, 50);
        assert_eq!(result.crit_bonus, 0);
        assert_eq!(result.lifesteal_amount, 0);
    }

    #[test]
    fn test_defense_reduction() {
        // def 100, scaling 100 → reduction 0.5
        let calc = with_defense();
        assert_eq!(calc.base_damage(&DamageInput::new(50, 100)), 25);
        // def 0 → no reduction
        assert_eq!(calc.base_damage(&DamageInput::new(50, 0)), 50);
    }

    #[test]
    fn test_armor_pen_ignores_defense() {
        let calc = with_defense();
        let mut input = DamageInput::new(50, 100);
        input.armor_pen = 100;
        assert_eq!(calc.base_damage(&input), 50);
        input.armor_pen = 50;
        // effective def 50 → reduction 1/3 → 33.33 → 33
        assert_eq!(calc.base_damage(&input), 33);
    }

    #[test]
    fn test_min_damage_floor() {
        let calc = with_defense();
        assert_eq!(calc.base_damage(&DamageInput::new(1, 100_000)), 1);
        assert_eq!(DamageCalculator::default().base_damage(&DamageInput::new(0, 0)), 1);

        let mut config = CombatConfig::default();
        config.min_damage = 7;
        assert_eq!(DamageCalculator::new(&config).base_damage(&DamageInput::new(3, 0)), 7);
    }

    #[test]
    fn test_zero_min_damage_still_deals_one() {
        let config = CombatConfig {
            min_damage: 0,
            ..CombatConfig::default().with_defense(true)
        };
        let calc = DamageCalculator::new(&config);
        assert_eq!(calc.base_damage(&DamageInput::new(0, 0)), 1);
        assert_eq!(calc.base_damage(&DamageInput::new(1, 100_000)), 1);
    }

    #[test]
    fn test_skill_multiplier() {
        let calc = DamageCalculator::default();
        let input = DamageInput::new(30, 0).with_skill_multiplier(1.5);
        assert_eq!(calc.base_damage(&input), 45);
    }

    #[test]
    fn test_crit_applies_multiplier() {
        let calc = DamageCalculator::default();
        let mut input = DamageInput::new(33, 0);
        input.crit_chance = 50;
        input.crit_damage = 150;

        let crit = calc.calculate_with_details(&input, &mut SequenceRandom::constant(0.2));
        assert!(crit.is_crit);
        // 33 * 1.5 = 49.5 → 50
        assert_eq!(crit.final_damage, 50);
        assert_eq!(crit.crit_bonus, crit.final_damage - crit.base_damage);

        let miss = calc.calculate_with_details(&input, &mut SequenceRandom::constant(0.7));
        assert!(!miss.is_crit);
        assert_eq!(miss.final_damage, 33);
        assert_eq!(miss.crit_bonus, 0);
    }

    #[test]
    fn test_zero_crit_chance_never_crits() {
        let calc = DamageCalculator::default();
        let result =
            calc.calculate_with_details(&DamageInput::new(10, 0), &mut SequenceRandom::always());
        assert!(!result.is_crit);
    }

    #[test]
    fn test_lifesteal_floors() {
        let calc = DamageCalculator::default();
        let mut input = DamageInput::new(37, 0);
        input.lifesteal = 25;
        let result = calc.calculate_with_details(&input, &mut SequenceRandom::never());
        // 37 * 0.25 = 9.25 → 9
        assert_eq!(result.lifesteal_amount, 9);

        for damage in [1u32, 7, 19, 50, 99, 101] {
            for lifesteal in [0u32, 1, 33, 50, 100] {
                let mut input = DamageInput::new(damage, 0);
                input.lifesteal = lifesteal;
                let result = calc.calculate_with_details(&input, &mut SequenceRandom::never());
                assert_eq!(
                    result.lifesteal_amount,
                    (f64::from(damage) * f64::from(lifesteal) / 100.0).floor() as u32
                );
            }
        }
    }

    #[test]
    fn test_is_critical_damage() {
        let calc = DamageCalculator::default();
        assert!(calc.is_critical_damage(50, 100));
        assert!(!calc.is_critical_damage(30, 100));
        assert!(!calc.is_critical_damage(20, 100));
    }

    #[test]
    fn test_from_stats() {
        let stats = CombatantStats::new(40, 5, 5)
            .with_crit(20, 180)
            .with_armor_pen(10)
            .with_lifesteal(15);
        let input = DamageInput::from_stats(&stats, 12);
        assert_eq!(input.attacker_atk, 40);
        assert_eq!(input.defender_def, 12);
        assert_eq!(input.crit_chance, 20);
        assert_eq!(input.crit_damage, 180);
        assert_eq!(input.armor_pen, 10);
        assert_eq!(input.lifesteal, 15);
        assert_eq!(input.skill_multiplier, 1.0);
    }
}
