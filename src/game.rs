//! Game state: board, mana, combatants, perks, pacing counters.

use crate::combat::{Enemy, Perks, Player};
use crate::config::Rules;
use crate::grid::Grid;
use crate::rng::RandomSource;
use crate::scoring::ManaPool;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BattleStatus {
    Ongoing,
    /// Enemy down; waiting for a perk pick and the next floor.
    Victory,
    Defeat,
}

/// Everything a turn transition reads or writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub grid: Grid,
    pub mana: ManaPool,
    pub player: Player,
    pub enemy: Enemy,
    pub perks: Perks,
    /// Accepted swaps left before the enemy attacks.
    pub moves_left: u32,
    /// 1-based.
    pub floor: u32,
}

impl GameState {
    /// Floor 1 with a fresh match-free board.
    pub fn new(rules: &Rules, rng: &mut impl RandomSource) -> Self {
        Self::with_grid(Grid::generate(rng), rules)
    }

    /// Floor 1 on a given board.
    pub fn with_grid(grid: Grid, rules: &Rules) -> Self {
        Self {
            grid,
            mana: ManaPool::new(rules.mana_cap),
            player: Player::new(rules.player_base_hp),
            enemy: Enemy::for_floor(1, rules),
            perks: Perks::default(),
            moves_left: rules.moves_per_attack,
            floor: 1,
        }
    }

    /// Enemy defeat is checked first: a pass that kills both counts as a win.
    pub fn status(&self) -> BattleStatus {
        if self.enemy.is_defeated() {
            BattleStatus::Victory
        } else if self.player.is_dead() {
            BattleStatus::Defeat
        } else {
            BattleStatus::Ongoing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::detect;
    use crate::rng::GameRng;

    #[test]
    fn test_new_state() {
        let rules = Rules::default();
        let state = GameState::new(&rules, &mut GameRng::seeded(9));
        assert_eq!(state.floor, 1);
        assert_eq!(state.moves_left, 10);
        assert_eq!(state.player.hp, 100);
        assert_eq!(state.enemy.hp, 600);
        assert!(detect(&state.grid).is_empty());
        assert!(!state.grid.has_empty());
        assert_eq!(state.status(), BattleStatus::Ongoing);
    }

    #[test]
    fn test_status_prefers_victory() {
        let rules = Rules::default();
        let mut state = GameState::new(&rules, &mut GameRng::seeded(9));
        state.player.take_damage(1000);
        assert_eq!(state.status(), BattleStatus::Defeat);
        state.enemy.take_damage(10_000);
        assert_eq!(state.status(), BattleStatus::Victory);
    }
}
