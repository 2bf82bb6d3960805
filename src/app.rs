//! App: headless autoplay session. Picks actions, drives cascades, streams events.

use crate::combat::Perk;
use crate::config::Rules;
use crate::game::BattleStatus;
use crate::grid::Position;
use crate::matcher;
use crate::rng::RandomSource;
use crate::scoring::Skill;
use crate::turn::{CascadeEvent, SkillEffect, TurnController};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info};

/// How events are written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// One human-readable line per event, boards printed after each turn.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Limits and choices for one autoplay run.
#[derive(Debug, Clone)]
pub struct Session {
    /// Stop after clearing this many floors.
    pub floors: u32,
    /// Stop after this many accepted player actions.
    pub max_actions: u32,
    /// Perk taken after every victory; cycles through all perks when unset.
    pub perk: Option<Perk>,
    pub format: Format,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            floors: 3,
            max_actions: 500,
            perk: None,
            format: Format::Text,
        }
    }
}

/// A player decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Swap(Position, Position),
    Skill(Skill),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Every requested floor was cleared.
    Cleared { floors: u32 },
    Defeated { floor: u32 },
    OutOfActions { floor: u32 },
    /// No swap makes a match and no skill is ready.
    Stalled { floor: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: Outcome,
    pub actions: u32,
    pub total_damage: u64,
}

/// One line of the event stream.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
enum Record<'a> {
    Floor {
        floor: u32,
        enemy: &'a str,
        enemy_hp: u32,
        perk: Option<Perk>,
    },
    Action(Action),
    Skill(&'a SkillEffect),
    Cascade(&'a CascadeEvent),
    Done(&'a RunReport),
}

pub struct App<R, W> {
    controller: TurnController,
    rng: R,
    out: W,
    session: Session,
    actions: u32,
    total_damage: u64,
}

impl<R: RandomSource, W: Write> App<R, W> {
    pub fn new(rules: Rules, session: Session, mut rng: R, out: W) -> Self {
        let controller = TurnController::new(rules, &mut rng);
        Self {
            controller,
            rng,
            out,
            session,
            actions: 0,
            total_damage: 0,
        }
    }

    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    /// Play until the floor goal, a defeat, a stall, or the action limit.
    pub fn run(&mut self) -> Result<RunReport> {
        self.announce_floor(None)?;
        let outcome = loop {
            let floor = self.controller.state().floor;
            match self.controller.state().status() {
                BattleStatus::Victory if floor >= self.session.floors => {
                    break Outcome::Cleared { floors: floor };
                }
                BattleStatus::Victory => {
                    let perk = self.pick_perk();
                    self.controller.advance_floor(perk, &mut self.rng)?;
                    self.announce_floor(Some(perk))?;
                    continue;
                }
                BattleStatus::Defeat => break Outcome::Defeated { floor },
                BattleStatus::Ongoing => {}
            }
            if self.actions >= self.session.max_actions {
                break Outcome::OutOfActions { floor };
            }
            let Some(action) = self.choose_action() else {
                break Outcome::Stalled { floor };
            };
            self.apply_action(action)?;
        };

        let report = RunReport {
            outcome,
            actions: self.actions,
            total_damage: self.total_damage,
        };
        info!("run over: {:?} after {} actions", report.outcome, report.actions);
        self.emit(&Record::Done(&report))?;
        self.out.flush()?;
        Ok(report)
    }

    /// A ready skill first (mend only when hurt), else the swap that lines up
    /// the most tiles.
    fn choose_action(&self) -> Option<Action> {
        let state = self.controller.state();
        let hurt = state.player.hp < state.player.max_hp;
        let ready = Skill::ALL
            .into_iter()
            .filter(|&skill| state.mana.is_full(skill))
            .find(|&skill| skill != Skill::Mend || hurt);
        if let Some(skill) = ready {
            return Some(Action::Skill(skill));
        }

        matcher::find_swaps(&state.grid)
            .into_iter()
            .max_by_key(|&(a, b)| {
                let mut candidate = state.grid.clone();
                candidate.swap(a, b);
                let lined_up: usize = matcher::detect(&candidate).iter().map(|g| g.len()).sum();
                // Ties go to the first hint in row-major order.
                (lined_up, std::cmp::Reverse((a, b)))
            })
            .map(|(a, b)| Action::Swap(a, b))
    }

    fn apply_action(&mut self, action: Action) -> Result<()> {
        debug!("action {:?}", action);
        self.emit(&Record::Action(action))?;
        self.actions += 1;
        let cascading = match action {
            Action::Swap(a, b) => {
                self.controller.attempt_swap(a, b)?;
                true
            }
            Action::Skill(skill) => {
                let effect = self.controller.activate_skill(skill, &mut self.rng)?;
                if let SkillEffect::Fury { damage } = effect {
                    self.total_damage += u64::from(damage);
                }
                self.emit(&Record::Skill(&effect))?;
                effect.starts_cascade()
            }
        };
        if cascading {
            self.drain_cascade()?;
        }
        Ok(())
    }

    fn drain_cascade(&mut self) -> Result<()> {
        while let Some(event) = self.controller.advance(&mut self.rng) {
            if let CascadeEvent::Cleared(report) = &event {
                self.total_damage += u64::from(report.damage);
            }
            self.emit(&Record::Cascade(&event))?;
        }
        Ok(())
    }

    fn pick_perk(&self) -> Perk {
        self.session.perk.unwrap_or_else(|| {
            let index = (self.controller.state().floor as usize - 1) % Perk::ALL.len();
            Perk::ALL[index]
        })
    }

    fn announce_floor(&mut self, perk: Option<Perk>) -> Result<()> {
        let state = self.controller.state();
        let record = Record::Floor {
            floor: state.floor,
            enemy: &state.enemy.name,
            enemy_hp: state.enemy.hp,
            perk,
        };
        match self.session.format {
            Format::Json => write_json(&mut self.out, &record),
            Format::Text => {
                writeln!(self.out, "{}", describe(&record))?;
                writeln!(self.out, "{}", state.grid)?;
                Ok(())
            }
        }
    }

    fn emit(&mut self, record: &Record<'_>) -> Result<()> {
        match self.session.format {
            Format::Json => write_json(&mut self.out, record),
            Format::Text => {
                writeln!(self.out, "{}", describe(record))?;
                if let Record::Cascade(CascadeEvent::Finished(_)) = record {
                    writeln!(self.out, "{}", self.controller.state().grid)?;
                }
                Ok(())
            }
        }
    }
}

fn write_json(out: &mut impl Write, record: &Record<'_>) -> Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)?;
    Ok(())
}

fn describe(record: &Record<'_>) -> String {
    match record {
        Record::Floor {
            floor,
            enemy,
            enemy_hp,
            perk,
        } => {
            let taken = perk.map(|p| format!(" (took {p:?})")).unwrap_or_default();
            format!("== floor {floor}: {enemy}, {enemy_hp} HP{taken}")
        }
        Record::Action(Action::Swap(a, b)) => format!("> swap {a} {b}"),
        Record::Action(Action::Skill(skill)) => format!("> skill {skill:?}"),
        Record::Skill(effect) => match effect {
            SkillEffect::Fury { damage } => format!("  fury hits for {damage}"),
            SkillEffect::Mend { healed } => format!("  mend restores {healed} HP"),
            SkillEffect::ChaosBackfire { damage } => format!("  chaos backfires for {damage}"),
            SkillEffect::ChaosSurge { marked } => {
                let cells: Vec<String> = marked
                    .iter()
                    .map(|(pos, modifier)| format!("{pos}{}", modifier.mark().unwrap_or(' ')))
                    .collect();
                format!("  chaos marks {}", cells.join(" "))
            }
        },
        Record::Cascade(CascadeEvent::Cleared(report)) => format!(
            "  pass {}: {} cleared, {} damage{} x{:.1}, enemy {} HP",
            report.depth,
            report.cleared.len(),
            report.damage,
            if report.crit { " crit" } else { "" },
            report.combo_multiplier,
            report.enemy_hp
        ),
        Record::Cascade(CascadeEvent::Settled { depth, .. }) => format!("  pass {depth}: settled"),
        Record::Cascade(CascadeEvent::Finished(summary)) => {
            let strike = summary
                .enemy_strike
                .map(|d| format!(", enemy strikes for {d}"))
                .unwrap_or_default();
            format!(
                "  turn: {} passes, {} damage{strike}",
                summary.passes, summary.total_damage
            )
        }
        Record::Done(report) => format!(
            "== {:?} after {} actions, {} damage dealt",
            report.outcome, report.actions, report.total_damage
        ),
    }
}
