//! Victory detection.

use crate::combatant::Combatant;
use crate::state::{BattleResult, BattleState, Role};

/// Decides when a battle is over and who won.
///
/// # Examples
///
/// ```rust
/// use duelcore::{BattleState, Combatant, CombatantStats, Role, VictorySystem};
///
/// let victory = VictorySystem::new();
/// let a = Combatant::new("a", "Aria", CombatantStats::new(10, 0, 5), 100);
/// let b = Combatant::new("b", "Borin", CombatantStats::new(10, 0, 5), 100);
///
/// let state = BattleState::new(a, b.clone());
/// assert!(victory.check_victory(&state).is_none());
///
/// let state = state.with_combatant(Role::Opponent, b.with_hp(0));
/// let result = victory.check_victory(&state).unwrap();
/// assert_eq!(result.winner, Role::Challenger);
/// assert_eq!(result.winner_name, "Aria");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VictorySystem;

impl VictorySystem {
    /// Victory system. Holds no state.
    pub fn new() -> Self {
        Self
    }

    /// Down at 0 HP, regardless of the stored `is_defeated` flag.
    pub fn is_defeated(&self, combatant: &Combatant) -> bool {
        combatant.current_hp == 0
    }

    /// The result if either side is down, `None` while both stand.
    ///
    /// The challenger is checked first, so a double knockout goes to the
    /// opponent.
    pub fn check_victory(&self, state: &BattleState) -> Option<BattleResult> {
        let winner = if self.is_defeated(&state.challenger) {
            Role::Opponent
        } else if self.is_defeated(&state.opponent) {
            Role::Challenger
        } else {
            return None;
        };
        Some(BattleResult {
            winner,
            winner_name: state.combatant(winner).name.clone(),
            total_turns: state.turn,
        })
    }
}
