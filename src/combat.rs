//! Combat records the resolution output writes into: player, enemy, perks.

use crate::config::Rules;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub hp: u32,
    pub max_hp: u32,
}

impl Player {
    pub fn new(max_hp: u32) -> Self {
        Self { hp: max_hp, max_hp }
    }

    /// Returns the damage actually taken (HP floors at zero).
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.hp);
        self.hp -= taken;
        taken
    }

    /// Returns the HP actually restored (capped at max HP).
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max_hp - self.hp);
        self.hp += healed;
        healed
    }

    /// Raises both max and current HP.
    pub fn fortify(&mut self, amount: u32) {
        self.max_hp += amount;
        self.hp += amount;
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }
}

/// Static description of an enemy before floor scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyTemplate {
    pub name: &'static str,
    pub base_hp: u32,
    pub damage: u32,
}

/// Enemies in floor order; the roster repeats past the last entry.
pub const ROSTER: [EnemyTemplate; 4] = [
    EnemyTemplate {
        name: "Forest Slime",
        base_hp: 600,
        damage: 15,
    },
    EnemyTemplate {
        name: "Shadow Spirit",
        base_hp: 1500,
        damage: 25,
    },
    EnemyTemplate {
        name: "Fire Demon",
        base_hp: 4000,
        damage: 35,
    },
    EnemyTemplate {
        name: "Ancient Dragon",
        base_hp: 10000,
        damage: 50,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enemy {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    /// Damage dealt to the player on each attack.
    pub damage: u32,
}

impl Enemy {
    /// Enemy for a 1-based floor, HP scaled by `1 + growth * (floor - 1)`.
    pub fn for_floor(floor: u32, rules: &Rules) -> Self {
        let floor = floor.max(1);
        let template = ROSTER[(floor as usize - 1) % ROSTER.len()];
        let scale = 1.0 + f64::from(floor - 1) * rules.enemy_hp_growth;
        let hp = (f64::from(template.base_hp) * scale).round() as u32;
        Self {
            name: template.name.to_string(),
            hp,
            max_hp: hp,
            damage: template.damage,
        }
    }

    /// Returns the damage actually taken (HP floors at zero).
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.hp);
        self.hp -= taken;
        taken
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Perk {
    /// Cleared Apples heal the player.
    Vampire,
    /// Area bursts deal double damage per stack.
    Pyro,
    /// More max HP.
    Tank,
    /// Higher crit chance and crit multiplier.
    Lucky,
}

impl Perk {
    pub const ALL: [Self; 4] = [Self::Vampire, Self::Pyro, Self::Tank, Self::Lucky];

    fn index(self) -> usize {
        match self {
            Self::Vampire => 0,
            Self::Pyro => 1,
            Self::Tank => 2,
            Self::Lucky => 3,
        }
    }
}

/// Stack counts of every perk taken this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Perks {
    stacks: [u32; 4],
}

impl Perks {
    pub fn add(&mut self, perk: Perk) {
        self.stacks[perk.index()] += 1;
    }

    pub fn count(&self, perk: Perk) -> u32 {
        self.stacks[perk.index()]
    }

    pub fn with(mut self, perk: Perk, stacks: u32) -> Self {
        self.stacks[perk.index()] += stacks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_hp_bounds() {
        let mut player = Player::new(100);
        assert_eq!(player.take_damage(30), 30);
        assert_eq!(player.heal(50), 30);
        assert_eq!(player.hp, 100);
        assert_eq!(player.take_damage(250), 100);
        assert!(player.is_dead());
    }

    #[test]
    fn test_fortify() {
        let mut player = Player::new(100);
        player.take_damage(40);
        player.fortify(100);
        assert_eq!((player.hp, player.max_hp), (160, 200));
    }

    #[test]
    fn test_enemy_scaling_and_roster_wrap() {
        let rules = Rules::default();
        let first = Enemy::for_floor(1, &rules);
        assert_eq!((first.name.as_str(), first.hp, first.damage), ("Forest Slime", 600, 15));

        let second = Enemy::for_floor(2, &rules);
        assert_eq!(second.name, "Shadow Spirit");
        assert_eq!(second.max_hp, 2100);

        let fifth = Enemy::for_floor(5, &rules);
        assert_eq!(fifth.name, "Forest Slime");
        assert_eq!(fifth.max_hp, 1560);
    }

    #[test]
    fn test_enemy_hp_floors_at_zero() {
        let mut enemy = Enemy::for_floor(1, &Rules::default());
        assert_eq!(enemy.take_damage(10_000), 600);
        assert!(enemy.is_defeated());
    }

    #[test]
    fn test_perk_stacks() {
        let mut perks = Perks::default();
        perks.add(Perk::Pyro);
        perks.add(Perk::Pyro);
        assert_eq!(perks.count(Perk::Pyro), 2);
        assert_eq!(perks.count(Perk::Lucky), 0);
        assert_eq!(perks.with(Perk::Lucky, 3).count(Perk::Lucky), 3);
    }
}
