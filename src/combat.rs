//! Attack resolution.
//!
//! `CombatSystem` turns a damage roll into updated combatant snapshots.
//! Nothing here is committed to a battle; the engine decides what to keep.

use crate::combatant::Combatant;
use crate::config::CombatConfig;
use crate::damage::{DamageCalculator, DamageInput, DamageResult};
use crate::random::RandomSource;
use serde::Serialize;

/// Presentation breakdown of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageBreakdown {
    pub base_damage: u32,
    pub crit_bonus: u32,
    pub lifesteal_amount: u32,
}

impl From<&DamageResult> for DamageBreakdown {
    fn from(result: &DamageResult) -> Self {
        Self {
            base_damage: result.base_damage,
            crit_bonus: result.crit_bonus,
            lifesteal_amount: result.lifesteal_amount,
        }
    }
}

/// Everything one attack changed, before it is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackResult {
    /// Attacker after lifesteal.
    pub attacker: Combatant,
    /// Defender after damage.
    pub defender: Combatant,
    pub damage: u32,
    pub defender_new_hp: u32,
    pub attacker_new_hp: u32,
    /// Landed crit roll, or a hit above the big-hit threshold.
    pub is_critical: bool,
    pub is_knockout: bool,
    /// HP actually restored to the attacker (after the max-HP cap).
    pub lifesteal_heal: u32,
    pub breakdown: DamageBreakdown,
}

/// Resolves attacks and applies damage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombatSystem {
    calculator: DamageCalculator,
}

impl CombatSystem {
    /// Combat system using the damage rules in `config`.
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            calculator: DamageCalculator::new(config),
        }
    }

    /// The underlying calculator.
    pub fn calculator(&self) -> &DamageCalculator {
        &self.calculator
    }

    /// Resolve `attacker` hitting `defender` with a basic attack.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use duelcore::random::SequenceRandom;
    /// use duelcore::{CombatConfig, CombatSystem, Combatant, CombatantStats};
    ///
    /// let combat = CombatSystem::new(&CombatConfig::default());
    /// let attacker = Combatant::new("a", "Aria", CombatantStats::new(50, 0, 10), 100);
    /// let defender = Combatant::new("b", "Borin", CombatantStats::new(10, 0, 5), 100);
    ///
    /// let result = combat.calculate_attack(&attacker, &defender, &mut SequenceRandom::never());
    /// assert_eq!(result.damage, 50);
    /// assert_eq!(result.defender_new_hp, 50);
    /// assert!(result.is_critical); // 50 > 0.3 * 100
    /// ```
    pub fn calculate_attack(
        &self,
        attacker: &Combatant,
        defender: &Combatant,
        rng: &mut dyn RandomSource,
    ) -> AttackResult {
        let input = DamageInput::from_stats(&attacker.base_stats, defender.base_stats.def);
        let roll = self.calculator.calculate_with_details(&input, rng);

        let defender_after = self.apply_damage(defender, roll.final_damage);
        let is_knockout = defender_after.current_hp == 0;
        let is_critical = roll.is_crit
            || self
                .calculator
                .is_critical_damage(roll.final_damage, defender.max_hp);

        let attacker_after = self.apply_heal(attacker, roll.lifesteal_amount);
        let lifesteal_heal = attacker_after.current_hp.saturating_sub(attacker.current_hp);

        tracing::debug!(
            attacker = %attacker.id,
            defender = %defender.id,
            damage = roll.final_damage,
            is_crit = roll.is_crit,
            is_knockout,
            lifesteal_heal,
            "resolved attack"
        );

        AttackResult {
            defender_new_hp: defender_after.current_hp,
            attacker_new_hp: attacker_after.current_hp,
            attacker: attacker_after,
            defender: defender_after,
            damage: roll.final_damage,
            is_critical,
            is_knockout,
            lifesteal_heal,
            breakdown: DamageBreakdown::from(&roll),
        }
    }

    /// Copy of `combatant` with `damage` subtracted, floored at zero.
    pub fn apply_damage(&self, combatant: &Combatant, damage: u32) -> Combatant {
        combatant.with_hp(combatant.current_hp.saturating_sub(damage))
    }

    /// Copy of `combatant` with `amount` healed, capped at max HP.
    pub fn apply_heal(&self, combatant: &Combatant, amount: u32) -> Combatant {
        combatant.with_hp(combatant.current_hp.saturating_add(amount))
    }
}
