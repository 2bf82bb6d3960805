//! Resolution calculator: damage, crits, combo scaling, mana and healing for one cascade pass.

use crate::chain::Resolution;
use crate::combat::{Perk, Perks};
use crate::config::Rules;
use crate::grid::Grid;
use crate::rng::RandomSource;
use crate::tile::Symbol;
use serde::Serialize;

/// Skills, each fed by one mana symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Skill {
    /// Apple: fixed damage to the enemy.
    Fury,
    /// Lemon: fixed healing.
    Mend,
    /// Grape: gamble on self-damage or four random special tiles.
    Chaos,
}

impl Skill {
    pub const ALL: [Self; 3] = [Self::Fury, Self::Mend, Self::Chaos];

    pub fn symbol(self) -> Symbol {
        match self {
            Self::Fury => Symbol::Apple,
            Self::Mend => Symbol::Lemon,
            Self::Chaos => Symbol::Grape,
        }
    }

    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.symbol() == symbol)
    }

    fn index(self) -> usize {
        match self {
            Self::Fury => 0,
            Self::Mend => 1,
            Self::Chaos => 2,
        }
    }
}

/// Mana per skill. Also used for deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ManaGain {
    levels: [f64; 3],
}

impl ManaGain {
    pub fn get(&self, skill: Skill) -> f64 {
        self.levels[skill.index()]
    }

    fn add(&mut self, skill: Skill, amount: f64) {
        self.levels[skill.index()] += amount;
    }

    pub fn is_zero(&self) -> bool {
        self.levels.iter().all(|v| *v == 0.0)
    }
}

/// Accrued mana per skill, each capped. Persists across turns; reset per floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManaPool {
    levels: ManaGain,
    cap: f64,
}

impl ManaPool {
    pub fn new(cap: f64) -> Self {
        Self {
            levels: ManaGain::default(),
            cap,
        }
    }

    pub fn get(&self, skill: Skill) -> f64 {
        self.levels.get(skill)
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn is_full(&self, skill: Skill) -> bool {
        self.get(skill) >= self.cap
    }

    /// Adds `gain` capped per skill; returns what was actually added.
    pub fn absorb(&mut self, gain: &ManaGain) -> ManaGain {
        let mut applied = ManaGain::default();
        for skill in Skill::ALL {
            let before = self.get(skill);
            let after = (before + gain.get(skill)).min(self.cap);
            self.levels.levels[skill.index()] = after;
            applied.add(skill, after - before);
        }
        applied
    }

    /// Empties one pool.
    pub fn drain(&mut self, skill: Skill) {
        self.levels.levels[skill.index()] = 0.0;
    }

    pub fn reset(&mut self) {
        self.levels = ManaGain::default();
    }

    /// Test and setup helper: fill a pool to its cap.
    pub fn fill(&mut self, skill: Skill) {
        self.levels.levels[skill.index()] = self.cap;
    }
}

/// What one cascade pass is worth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassOutcome {
    /// Total damage after the combo multiplier, rounded.
    pub damage: u32,
    /// At least one tile rolled a crit.
    pub crit: bool,
    pub combo_multiplier: f64,
    /// Uncapped mana earned; the pool applies its cap.
    pub mana: ManaGain,
    /// Uncapped healing; the player applies the max-HP cap.
    pub healing: u32,
}

/// Combo multiplier for a 1-based cascade depth.
pub fn combo_multiplier(depth: u32, rules: &Rules) -> f64 {
    1.0 + rules.combo_step * f64::from(depth.saturating_sub(1))
}

/// Score one pass.
///
/// `snapshot` must be the grid as it was before this pass cleared anything:
/// mana and healing are keyed on the original symbols of the cleared cells.
/// Every cleared tile rolls its own crit, in row-major order.
pub fn compute(
    snapshot: &Grid,
    resolution: &Resolution,
    depth: u32,
    perks: &Perks,
    rules: &Rules,
    rng: &mut impl RandomSource,
) -> PassOutcome {
    let pyro = perks.count(Perk::Pyro);
    let lucky = f64::from(perks.count(Perk::Lucky));
    let crit_chance = rules.crit_chance + rules.crit_chance_per_lucky * lucky;
    let crit_multiplier = rules.crit_multiplier + rules.crit_multiplier_per_lucky * lucky;
    let explosion_multiplier = 2f64.powi(pyro as i32);

    let mut raw = 0.0;
    let mut crit = false;
    for pos in resolution.cleared.positions() {
        let mut tile_damage = rules.base_tile_damage;
        if resolution.explosions.contains(&pos) {
            tile_damage *= explosion_multiplier;
        }
        if rng.chance(crit_chance) {
            tile_damage *= crit_multiplier;
            crit = true;
        }
        raw += tile_damage;
    }
    let combo_multiplier = combo_multiplier(depth, rules);
    let damage = (raw * combo_multiplier).round() as u32;

    let mut mana = ManaGain::default();
    let mut apples = 0u32;
    for pos in resolution.cleared.positions() {
        let Some(symbol) = snapshot.symbol(pos) else {
            continue;
        };
        if let Some(skill) = Skill::from_symbol(symbol) {
            mana.add(skill, rules.mana_per_tile);
        }
        if symbol == Symbol::Apple {
            apples += 1;
        }
    }
    let healing = apples * rules.vampire_heal * perks.count(Perk::Vampire);

    PassOutcome {
        damage,
        crit,
        combo_multiplier,
        mana,
        healing,
    }
}
