//! Turn order.

use crate::combatant::Combatant;
use crate::random::RandomSource;
use crate::state::{BattleState, Role};

/// Decides who opens and alternates attackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnSystem;

impl TurnSystem {
    /// Turn system. Holds no state.
    pub fn new() -> Self {
        Self
    }

    /// Faster side opens; an exact speed tie is a coin flip.
    pub fn determine_first_attacker(
        &self,
        challenger: &Combatant,
        opponent: &Combatant,
        rng: &mut dyn RandomSource,
    ) -> Role {
        let (c, o) = (challenger.base_stats.spd, opponent.base_stats.spd);
        if c > o {
            Role::Challenger
        } else if o > c {
            Role::Opponent
        } else if rng.next_f64() < 0.5 {
            Role::Challenger
        } else {
            Role::Opponent
        }
    }

    /// Whoever did not just attack.
    pub fn get_next_attacker(&self, current: Role) -> Role {
        current.opposite()
    }

    /// Next turn number with the attacker toggled. Nothing else changes.
    pub fn advance_turn(&self, state: BattleState) -> BattleState {
        let turn = state.turn.saturating_add(1);
        let next = self.get_next_attacker(state.current_attacker);
        state.with_turn(turn, next)
    }
}
