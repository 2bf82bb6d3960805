//! Balance rules: every tunable constant, loadable from a `key = value` file.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: unknown rule {key:?}")]
    UnknownKey { line: usize, key: String },
    #[error("line {line}: invalid value {value:?} for {key}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },
    #[error("line {line}: expected `key = value`")]
    Malformed { line: usize },
}

/// Tunable numbers for damage, mana, skills, and battle pacing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rules {
    /// Damage per cleared tile before multipliers.
    pub base_tile_damage: f64,
    pub crit_chance: f64,
    pub crit_chance_per_lucky: f64,
    pub crit_multiplier: f64,
    pub crit_multiplier_per_lucky: f64,
    /// Combo multiplier is `1 + combo_step * (depth - 1)`.
    pub combo_step: f64,
    pub mana_per_tile: f64,
    pub mana_cap: f64,
    /// Healing per Apple cleared, per vampire stack.
    pub vampire_heal: u32,
    pub fury_damage: u32,
    pub mend_heal: u32,
    pub chaos_backfire_chance: f64,
    pub chaos_backfire_damage: u32,
    /// Random cells re-marked by a successful chaos roll.
    pub chaos_mutations: usize,
    /// Accepted swaps between enemy attacks.
    pub moves_per_attack: u32,
    pub player_base_hp: u32,
    pub tank_hp_bonus: u32,
    /// Enemy HP grows by this fraction of base per floor after the first.
    pub enemy_hp_growth: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            base_tile_damage: 10.0,
            crit_chance: 0.10,
            crit_chance_per_lucky: 0.15,
            crit_multiplier: 1.5,
            crit_multiplier_per_lucky: 0.5,
            combo_step: 0.3,
            mana_per_tile: 5.0,
            mana_cap: 50.0,
            vampire_heal: 5,
            fury_damage: 500,
            mend_heal: 100,
            chaos_backfire_chance: 0.30,
            chaos_backfire_damage: 40,
            chaos_mutations: 4,
            moves_per_attack: 10,
            player_base_hp: 100,
            tank_hp_bonus: 100,
            enemy_hp_growth: 0.4,
        }
    }
}

impl Rules {
    /// Load rules from a file; keys absent from the file keep their defaults.
    /// A missing path yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = std::fs::read_to_string(path)?;
        Self::parse(&s)
    }

    /// Parse `key = value` lines. `#` starts a comment line.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let mut rules = Self::default();
        for (line, key, value) in parse_rules_file(s)? {
            rules.apply(line, &key, &value)?;
        }
        Ok(rules)
    }

    fn apply(&mut self, line: usize, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        };
        let float = || value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).ok_or_else(invalid);
        let int = || value.parse::<u32>().map_err(|_| invalid());

        match key {
            "base_tile_damage" => self.base_tile_damage = float()?,
            "crit_chance" => self.crit_chance = float()?,
            "crit_chance_per_lucky" => self.crit_chance_per_lucky = float()?,
            "crit_multiplier" => self.crit_multiplier = float()?,
            "crit_multiplier_per_lucky" => self.crit_multiplier_per_lucky = float()?,
            "combo_step" => self.combo_step = float()?,
            "mana_per_tile" => self.mana_per_tile = float()?,
            "mana_cap" => self.mana_cap = float()?,
            "vampire_heal" => self.vampire_heal = int()?,
            "fury_damage" => self.fury_damage = int()?,
            "mend_heal" => self.mend_heal = int()?,
            "chaos_backfire_chance" => self.chaos_backfire_chance = float()?,
            "chaos_backfire_damage" => self.chaos_backfire_damage = int()?,
            "chaos_mutations" => self.chaos_mutations = int()? as usize,
            "moves_per_attack" => {
                let v = int()?;
                if v == 0 {
                    return Err(invalid());
                }
                self.moves_per_attack = v;
            }
            "player_base_hp" => self.player_base_hp = int()?,
            "tank_hp_bonus" => self.tank_hp_bonus = int()?,
            "enemy_hp_growth" => self.enemy_hp_growth = float()?,
            _ => {
                return Err(ConfigError::UnknownKey {
                    line,
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Split a rules file into `(line number, key, value)` triples.
fn parse_rules_file(s: &str) -> Result<Vec<(usize, String, String)>, ConfigError> {
    let mut entries = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (i, line) in s.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::Malformed { line: line_no });
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if key.is_empty() || value.is_empty() {
            return Err(ConfigError::Malformed { line: line_no });
        }
        // Later lines override earlier ones.
        if let Some(&idx) = seen.get(key) {
            entries[idx] = (line_no, key.to_string(), value.to_string());
        } else {
            seen.insert(key.to_string(), entries.len());
            entries.push((line_no, key.to_string(), value.to_string()));
        }
    }
    Ok(entries)
}
