//! Turn controller: swap and skill entry points, and the stepwise cascade.
//!
//! A cascade is driven one sub-step at a time through [`TurnController::advance`]:
//! a clear step (detect, chain, score, blank, place bonuses) followed by a
//! settle step (gravity), repeated until detection comes back empty. The
//! controller's phase doubles as the busy flag, so a presentation layer can
//! pace the steps however it likes without affecting the outcome.

use crate::chain::{self, ClearCause};
use crate::combat::{Enemy, Perk};
use crate::config::Rules;
use crate::game::{BattleStatus, GameState};
use crate::gravity;
use crate::grid::{Grid, Position};
use crate::matcher::{self, MatchGroup};
use crate::rng::RandomSource;
use crate::scoring::{self, ManaGain, Skill};
use crate::tile::{Modifier, Symbol};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Accepting swaps and skills.
    Idle,
    /// Next step detects and clears; `depth` is the 1-based pass number.
    Resolving { depth: u32 },
    /// Next step applies gravity to the cleared board of pass `depth`.
    AwaitingGravitySettle { depth: u32 },
}

/// Why a request was ignored. State is untouched on every rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum Rejection {
    #[error("a cascade is still resolving")]
    Busy,
    #[error("the battle is over")]
    BattleOver,
    #[error("{a} and {b} are not adjacent")]
    NotAdjacent { a: Position, b: Position },
    #[error("swap would not make a match")]
    NoMatch,
    #[error("{0:?} mana is not full")]
    ManaNotFull(Skill),
    #[error("the enemy is still standing")]
    NotCleared,
}

/// A tile destroyed in a clear step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearedTile {
    pub position: Position,
    /// Symbol before clearing.
    pub symbol: Option<Symbol>,
    pub cause: ClearCause,
    /// Particle anchor `(x, y)` in percent of the board.
    pub anchor: (f64, f64),
}

/// Everything a clear step did, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearReport {
    pub depth: u32,
    /// Board after clearing and bonus placement, before gravity.
    pub board: Grid,
    pub cleared: Vec<ClearedTile>,
    pub damage: u32,
    pub crit: bool,
    pub combo_multiplier: f64,
    /// Mana actually added after caps.
    pub mana: ManaGain,
    /// HP actually restored after the max-HP cap.
    pub healed: u32,
    pub bonuses: Vec<(Position, Modifier)>,
    pub triggered: Vec<(Position, Modifier)>,
    pub enemy_hp: u32,
}

/// Totals for one player action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    pub passes: u32,
    pub total_damage: u32,
    pub crit: bool,
    /// Damage taken from an enemy attack at the end of the cascade.
    pub enemy_strike: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CascadeEvent {
    Cleared(ClearReport),
    Settled { depth: u32, grid: Grid },
    /// Detection found nothing; the controller is idle again.
    Finished(TurnSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkillEffect {
    Fury { damage: u32 },
    Mend { healed: u32 },
    ChaosBackfire { damage: u32 },
    /// Special tiles stamped on the board; a cascade is now running.
    ChaosSurge { marked: Vec<(Position, Modifier)> },
}

impl SkillEffect {
    /// True when the effect left a cascade to drive.
    pub fn starts_cascade(&self) -> bool {
        matches!(self, Self::ChaosSurge { .. })
    }
}

#[derive(Debug, Clone)]
pub struct TurnController {
    state: GameState,
    rules: Rules,
    phase: Phase,
    /// Cleared board between a clear step and its settle step.
    pending: Option<Grid>,
    tally: TurnSummary,
    strike_due: bool,
}

impl TurnController {
    pub fn new(rules: Rules, rng: &mut impl RandomSource) -> Self {
        let state = GameState::new(&rules, rng);
        Self::from_state(state, rules)
    }

    pub fn from_state(state: GameState, rules: Rules) -> Self {
        Self {
            state,
            rules,
            phase: Phase::Idle,
            pending: None,
            tally: TurnSummary::default(),
            strike_due: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    fn ensure_ready(&self) -> Result<(), Rejection> {
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        if self.state.status() != BattleStatus::Ongoing {
            return Err(Rejection::BattleOver);
        }
        Ok(())
    }

    fn begin_cascade(&mut self) {
        self.phase = Phase::Resolving { depth: 1 };
        self.tally = TurnSummary::default();
    }

    /// Swap two adjacent tiles. Accepted only if the result has a match, in
    /// which case a move is spent and a cascade starts; otherwise the board
    /// is left exactly as it was.
    pub fn attempt_swap(&mut self, a: Position, b: Position) -> Result<(), Rejection> {
        self.ensure_ready()?;
        if !a.is_adjacent(b) {
            return Err(Rejection::NotAdjacent { a, b });
        }
        let mut candidate = self.state.grid.clone();
        candidate.swap(a, b);
        if matcher::detect(&candidate).is_empty() {
            debug!("swap {} <-> {} reverted: no match", a, b);
            return Err(Rejection::NoMatch);
        }

        self.state.grid = candidate;
        self.state.moves_left = self.state.moves_left.saturating_sub(1);
        if self.state.moves_left == 0 {
            self.strike_due = true;
        }
        debug!(
            "swap {} <-> {} accepted, {} moves left",
            a, b, self.state.moves_left
        );
        self.begin_cascade();
        Ok(())
    }

    /// Spend a full mana pool.
    pub fn activate_skill(
        &mut self,
        skill: Skill,
        rng: &mut impl RandomSource,
    ) -> Result<SkillEffect, Rejection> {
        self.ensure_ready()?;
        if !self.state.mana.is_full(skill) {
            return Err(Rejection::ManaNotFull(skill));
        }
        self.state.mana.drain(skill);

        let effect = match skill {
            Skill::Fury => SkillEffect::Fury {
                damage: self.state.enemy.take_damage(self.rules.fury_damage),
            },
            Skill::Mend => SkillEffect::Mend {
                healed: self.state.player.heal(self.rules.mend_heal),
            },
            Skill::Chaos => self.roll_chaos(rng),
        };
        info!("{:?} activated: {:?}", skill, effect);
        Ok(effect)
    }

    /// Backfire on a low roll; otherwise stamp random special tiles (cells
    /// may repeat) and start a cascade on the result.
    fn roll_chaos(&mut self, rng: &mut impl RandomSource) -> SkillEffect {
        if rng.chance(self.rules.chaos_backfire_chance) {
            let damage = self.state.player.take_damage(self.rules.chaos_backfire_damage);
            return SkillEffect::ChaosBackfire { damage };
        }
        let marked: Vec<(Position, Modifier)> = (0..self.rules.chaos_mutations)
            .map(|_| {
                let pos = Position::random(rng);
                let modifier = Modifier::random_special(rng);
                self.state.grid.set_modifier(pos, modifier);
                (pos, modifier)
            })
            .collect();
        self.begin_cascade();
        SkillEffect::ChaosSurge { marked }
    }

    /// Take a perk and move to the next floor. Only after a victory.
    pub fn advance_floor(
        &mut self,
        perk: Perk,
        rng: &mut impl RandomSource,
    ) -> Result<(), Rejection> {
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        if self.state.status() != BattleStatus::Victory {
            return Err(Rejection::NotCleared);
        }
        let state = &mut self.state;
        state.perks.add(perk);
        if perk == Perk::Tank {
            state.player.fortify(self.rules.tank_hp_bonus);
        }
        state.floor += 1;
        state.enemy = Enemy::for_floor(state.floor, &self.rules);
        state.moves_left = self.rules.moves_per_attack;
        state.grid = Grid::generate(rng);
        state.mana.reset();
        self.strike_due = false;
        info!(
            "floor {}: {} with {} HP",
            state.floor, state.enemy.name, state.enemy.hp
        );
        Ok(())
    }

    /// Run one sub-step of the current cascade. `None` when idle.
    pub fn advance(&mut self, rng: &mut impl RandomSource) -> Option<CascadeEvent> {
        match self.phase {
            Phase::Idle => None,
            Phase::Resolving { depth } => Some(self.clear_step(depth, rng)),
            Phase::AwaitingGravitySettle { depth } => Some(self.settle_step(depth, rng)),
        }
    }

    /// Iterator over the remaining sub-steps of the current cascade.
    pub fn cascade<'a, R: RandomSource>(&'a mut self, rng: &'a mut R) -> Cascade<'a, R> {
        Cascade {
            controller: self,
            rng,
        }
    }

    fn clear_step(&mut self, depth: u32, rng: &mut impl RandomSource) -> CascadeEvent {
        let groups = matcher::detect(&self.state.grid);
        if groups.is_empty() {
            return self.finish();
        }

        // Chain and scoring both read this copy; the live board is only replaced after gravity.
        let snapshot = self.state.grid.clone();
        let resolution = chain::resolve(
            &snapshot,
            groups.iter().flat_map(|g| g.positions.iter().copied()),
        );
        let outcome = scoring::compute(
            &snapshot,
            &resolution,
            depth,
            &self.state.perks,
            &self.rules,
            rng,
        );

        self.state.enemy.take_damage(outcome.damage);
        let mana = self.state.mana.absorb(&outcome.mana);
        let healed = self.state.player.heal(outcome.healing);

        let mut board = snapshot.clone();
        for pos in resolution.cleared.positions() {
            board.clear(pos);
        }
        let bonuses = place_bonuses(&mut board, &groups, rng);

        let cleared = resolution
            .cleared
            .iter()
            .map(|(position, cause)| ClearedTile {
                position,
                symbol: snapshot.symbol(position),
                cause,
                anchor: position.percent_center(),
            })
            .collect::<Vec<_>>();

        self.tally.passes = depth;
        self.tally.total_damage += outcome.damage;
        self.tally.crit |= outcome.crit;
        debug!(
            "pass {}: {} groups, {} cleared, {} damage{}",
            depth,
            groups.len(),
            cleared.len(),
            outcome.damage,
            if outcome.crit { " (crit)" } else { "" }
        );

        self.pending = Some(board.clone());
        self.phase = Phase::AwaitingGravitySettle { depth };
        CascadeEvent::Cleared(ClearReport {
            depth,
            board,
            cleared,
            damage: outcome.damage,
            crit: outcome.crit,
            combo_multiplier: outcome.combo_multiplier,
            mana,
            healed,
            bonuses,
            triggered: resolution.triggered,
            enemy_hp: self.state.enemy.hp,
        })
    }

    fn settle_step(&mut self, depth: u32, rng: &mut impl RandomSource) -> CascadeEvent {
        let cleared = self
            .pending
            .take()
            .unwrap_or_else(|| self.state.grid.clone());
        let board = gravity::compact(&cleared, rng);
        self.state.grid = board.clone();
        self.phase = Phase::Resolving { depth: depth + 1 };
        CascadeEvent::Settled { depth, grid: board }
    }

    fn finish(&mut self) -> CascadeEvent {
        self.phase = Phase::Idle;
        let mut summary = std::mem::take(&mut self.tally);
        if self.state.moves_left == 0 {
            self.state.moves_left = self.rules.moves_per_attack;
        }
        // Due strikes land even if this cascade finished the enemy off.
        if std::mem::take(&mut self.strike_due) {
            let damage = self.state.player.take_damage(self.state.enemy.damage);
            summary.enemy_strike = Some(damage);
        }
        info!(
            "cascade finished: {} passes, {} damage, enemy {}/{} HP, player {}/{} HP",
            summary.passes,
            summary.total_damage,
            self.state.enemy.hp,
            self.state.enemy.max_hp,
            self.state.player.hp,
            self.state.player.max_hp
        );
        CascadeEvent::Finished(summary)
    }
}

/// Bonus tiles for long runs, each with a fresh random symbol at the run's
/// first cell. Length-4 bonuses go down first and length-5+ bonuses after,
/// so color-clear wins a shared cell.
fn place_bonuses(
    board: &mut Grid,
    groups: &[MatchGroup],
    rng: &mut impl RandomSource,
) -> Vec<(Position, Modifier)> {
    let mut placed: Vec<(Position, Modifier)> = Vec::new();
    for kind in [Modifier::Area, Modifier::ColorClear] {
        for group in groups.iter().filter(|g| g.bonus() == Some(kind)) {
            let at = group.first();
            let symbol = Symbol::random(rng);
            board.place(at, symbol, kind);
            placed.retain(|(p, _)| *p != at);
            placed.push((at, kind));
        }
    }
    placed
}

/// Sub-steps of one cascade, ending with [`CascadeEvent::Finished`].
#[derive(Debug)]
pub struct Cascade<'a, R: RandomSource> {
    controller: &'a mut TurnController,
    rng: &'a mut R,
}

impl<R: RandomSource> Iterator for Cascade<'_, R> {
    type Item = CascadeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.controller.advance(self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::{p, striped};
    use crate::rng::{GameRng, ScriptedRng};

    fn controller(grid: Grid) -> TurnController {
        let rules = Rules::default();
        TurnController::from_state(GameState::with_grid(grid, &rules), rules)
    }

    /// Row 0 reads `A A L` with an Apple under (0, 2); swapping (0, 2) and (1, 2) matches.
    fn one_swap_from_match() -> Grid {
        let mut grid = striped();
        grid.place(p(0, 1), Symbol::Apple, Modifier::None);
        grid.place(p(1, 2), Symbol::Apple, Modifier::None);
        grid
    }

    fn first_report(events: &[CascadeEvent]) -> &ClearReport {
        match &events[0] {
            CascadeEvent::Cleared(report) => report,
            other => panic!("expected a clear step, got {other:?}"),
        }
    }

    fn finished(events: &[CascadeEvent]) -> &TurnSummary {
        match events.last() {
            Some(CascadeEvent::Finished(summary)) => summary,
            other => panic!("expected a finish, got {other:?}"),
        }
    }

    #[test]
    fn test_swap_without_match_reverts() {
        let mut ctl = controller(striped());
        let before = ctl.state().clone();
        assert_eq!(ctl.attempt_swap(p(0, 0), p(0, 1)), Err(Rejection::NoMatch));
        assert_eq!(ctl.state(), &before);
        assert_eq!(ctl.state().moves_left, 10);
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[test]
    fn test_non_adjacent_swap_rejected() {
        let mut ctl = controller(one_swap_from_match());
        let before = ctl.state().clone();
        assert_eq!(
            ctl.attempt_swap(p(0, 2), p(2, 2)),
            Err(Rejection::NotAdjacent { a: p(0, 2), b: p(2, 2) })
        );
        assert_eq!(ctl.state(), &before);
    }

    #[test]
    fn test_accepted_swap_runs_cascade() {
        let mut ctl = controller(one_swap_from_match());
        let mut rng = ScriptedRng::never_crit();
        assert_eq!(ctl.attempt_swap(p(0, 2), p(1, 2)), Ok(()));
        assert_eq!(ctl.state().moves_left, 9);
        assert_eq!(ctl.phase(), Phase::Resolving { depth: 1 });

        // Busy until the cascade is done.
        assert_eq!(ctl.attempt_swap(p(4, 4), p(4, 5)), Err(Rejection::Busy));
        assert_eq!(
            ctl.activate_skill(Skill::Fury, &mut rng),
            Err(Rejection::Busy)
        );

        let events: Vec<_> = ctl.cascade(&mut rng).collect();
        let report = first_report(&events);
        assert_eq!(report.depth, 1);
        assert_eq!(report.damage, 30);
        assert_eq!(report.cleared.len(), 3);
        assert!(report.cleared.iter().all(|t| t.symbol == Some(Symbol::Apple)));
        assert_eq!(report.mana.get(Skill::Fury), 15.0);
        assert!(report.board.is_empty(p(0, 0)));
        assert!(matches!(events[1], CascadeEvent::Settled { depth: 1, .. }));

        let summary = finished(&events);
        assert!(summary.total_damage >= 30);
        assert_eq!(summary.enemy_strike, None);
        assert_eq!(ctl.state().enemy.hp, 600 - summary.total_damage);
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(!ctl.state().grid.has_empty());
        assert!(matcher::detect(&ctl.state().grid).is_empty());
        assert_eq!(ctl.advance(&mut rng), None);
    }

    #[test]
    fn test_events_alternate_and_depth_grows() {
        let mut ctl = controller(one_swap_from_match());
        let mut rng = GameRng::seeded(21);
        ctl.attempt_swap(p(0, 2), p(1, 2)).unwrap();
        let events: Vec<_> = ctl.cascade(&mut rng).collect();
        let steps = &events[..events.len() - 1];
        assert_eq!(steps.len() % 2, 0);
        for (i, pair) in steps.chunks(2).enumerate() {
            let depth = i as u32 + 1;
            match (&pair[0], &pair[1]) {
                (CascadeEvent::Cleared(r), CascadeEvent::Settled { depth: d, grid: board }) => {
                    assert_eq!(r.depth, depth);
                    assert_eq!(*d, depth);
                    assert!(!board.has_empty());
                    assert!((r.combo_multiplier - (1.0 + 0.3 * f64::from(depth - 1))).abs() < 1e-9);
                }
                other => panic!("unexpected pair {other:?}"),
            }
        }
        assert_eq!(finished(&events).passes as usize, steps.len() / 2);
    }

    #[test]
    fn test_four_run_spawns_area_tile() {
        let mut grid = striped();
        for col in 1..4 {
            grid.place(p(0, col), Symbol::Apple, Modifier::None);
        }
        let mut ctl = controller(grid);
        ctl.begin_cascade();
        let mut rng = ScriptedRng::never_crit();

        let Some(CascadeEvent::Cleared(report)) = ctl.advance(&mut rng) else {
            panic!("expected a clear step");
        };
        assert_eq!(report.bonuses, vec![(p(0, 0), Modifier::Area)]);
        let bonus = report.board.get(p(0, 0));
        assert_eq!(bonus.modifier, Modifier::Area);
        assert!(bonus.symbol.is_some());
        for col in 1..4 {
            assert!(report.board.is_empty(p(0, col)));
        }

        let Some(CascadeEvent::Settled { grid: board, .. }) = ctl.advance(&mut rng) else {
            panic!("expected a settle step");
        };
        assert_eq!(board.get(p(0, 0)).modifier, Modifier::Area);
        let areas = Position::all()
            .filter(|&q| board.get(q).modifier == Modifier::Area)
            .count();
        assert_eq!(areas, 1);
    }

    #[test]
    fn test_five_run_spawns_color_clear() {
        let mut grid = striped();
        for col in 1..5 {
            grid.place(p(0, col), Symbol::Apple, Modifier::None);
        }
        grid.place(p(0, 5), Symbol::Orange, Modifier::None);
        let mut ctl = controller(grid);
        ctl.begin_cascade();
        let Some(CascadeEvent::Cleared(report)) = ctl.advance(&mut ScriptedRng::never_crit()) else {
            panic!("expected a clear step");
        };
        assert_eq!(report.bonuses, vec![(p(0, 0), Modifier::ColorClear)]);
    }

    #[test]
    fn test_color_clear_wins_shared_bonus_cell() {
        let mut grid = striped();
        // Row 0 cols 0..4 and column 0 rows 0..6 are Apple.
        for col in 1..4 {
            grid.place(p(0, col), Symbol::Apple, Modifier::None);
        }
        for row in 1..5 {
            grid.place(p(row, 0), Symbol::Apple, Modifier::None);
        }
        let mut ctl = controller(grid);
        ctl.begin_cascade();
        let Some(CascadeEvent::Cleared(report)) = ctl.advance(&mut ScriptedRng::never_crit()) else {
            panic!("expected a clear step");
        };
        assert_eq!(report.bonuses, vec![(p(0, 0), Modifier::ColorClear)]);
        assert_eq!(report.board.get(p(0, 0)).modifier, Modifier::ColorClear);
    }

    #[test]
    fn test_preplaced_area_tile_explodes() {
        let mut grid = one_swap_from_match();
        grid.set_modifier(p(0, 1), Modifier::Area);
        let mut ctl = controller(grid);
        ctl.state.perks.add(Perk::Pyro);
        ctl.attempt_swap(p(0, 2), p(1, 2)).unwrap();
        let Some(CascadeEvent::Cleared(report)) = ctl.advance(&mut ScriptedRng::never_crit()) else {
            panic!("expected a clear step");
        };
        let cleared: Vec<Position> = report.cleared.iter().map(|t| t.position).collect();
        for q in p(0, 1).neighbourhood() {
            assert!(cleared.contains(&q));
        }
        assert_eq!(cleared.len(), 6);
        // Six burst tiles at double damage.
        assert_eq!(report.damage, 120);
        assert_eq!(report.triggered, vec![(p(0, 1), Modifier::Area)]);
    }

    #[test]
    fn test_skill_requires_full_mana() {
        let mut ctl = controller(striped());
        let mut rng = ScriptedRng::never_crit();
        assert_eq!(
            ctl.activate_skill(Skill::Mend, &mut rng),
            Err(Rejection::ManaNotFull(Skill::Mend))
        );
    }

    #[test]
    fn test_fury_and_mend() {
        let mut ctl = controller(striped());
        let mut rng = ScriptedRng::never_crit();
        ctl.state.mana.fill(Skill::Fury);
        assert_eq!(
            ctl.activate_skill(Skill::Fury, &mut rng),
            Ok(SkillEffect::Fury { damage: 500 })
        );
        assert_eq!(ctl.state().enemy.hp, 100);
        assert_eq!(ctl.state().mana.get(Skill::Fury), 0.0);
        assert_eq!(ctl.phase(), Phase::Idle);

        ctl.state.player.take_damage(30);
        ctl.state.mana.fill(Skill::Mend);
        assert_eq!(
            ctl.activate_skill(Skill::Mend, &mut rng),
            Ok(SkillEffect::Mend { healed: 30 })
        );
        assert_eq!(ctl.state().player.hp, 100);
    }

    #[test]
    fn test_chaos_backfire_leaves_board_alone() {
        let mut ctl = controller(striped());
        let before = ctl.state().grid.clone();
        ctl.state.mana.fill(Skill::Chaos);
        let mut rng = ScriptedRng::steady(0.1);
        assert_eq!(
            ctl.activate_skill(Skill::Chaos, &mut rng),
            Ok(SkillEffect::ChaosBackfire { damage: 40 })
        );
        assert_eq!(ctl.state().player.hp, 60);
        assert_eq!(ctl.state().grid, before);
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[test]
    fn test_chaos_surge_marks_cells_and_cascades() {
        let mut ctl = controller(striped());
        ctl.state.mana.fill(Skill::Chaos);
        let mut rng = ScriptedRng::never_crit()
            .with_units(&[0.9])
            .with_indices(&[0, 0, 0, 7, 7, 1, 3, 4, 2, 3, 4, 0]);
        let effect = ctl.activate_skill(Skill::Chaos, &mut rng).unwrap();
        assert!(effect.starts_cascade());
        assert_eq!(
            effect,
            SkillEffect::ChaosSurge {
                marked: vec![
                    (p(0, 0), Modifier::Area),
                    (p(7, 7), Modifier::Sweep),
                    (p(3, 4), Modifier::ColorClear),
                    (p(3, 4), Modifier::Area),
                ]
            }
        );
        assert_eq!(ctl.state().grid.get(p(3, 4)).modifier, Modifier::Area);
        assert_eq!(ctl.phase(), Phase::Resolving { depth: 1 });

        // The striped board has no run, so the cascade ends at once.
        let events: Vec<_> = ctl.cascade(&mut rng).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(finished(&events).passes, 0);
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[test]
    fn test_enemy_strikes_when_moves_run_out() {
        let mut ctl = controller(one_swap_from_match());
        ctl.state.moves_left = 1;
        ctl.attempt_swap(p(0, 2), p(1, 2)).unwrap();
        assert_eq!(ctl.state().moves_left, 0);
        let events: Vec<_> = ctl.cascade(&mut ScriptedRng::never_crit()).collect();
        assert_eq!(finished(&events).enemy_strike, Some(15));
        assert_eq!(ctl.state().player.hp, 85);
        assert_eq!(ctl.state().moves_left, 10);
    }

    #[test]
    fn test_last_move_strike_lands_on_killing_cascade() {
        let mut ctl = controller(one_swap_from_match());
        ctl.state.moves_left = 1;
        ctl.state.enemy.hp = 20;
        ctl.attempt_swap(p(0, 2), p(1, 2)).unwrap();
        let events: Vec<_> = ctl.cascade(&mut ScriptedRng::never_crit()).collect();
        assert_eq!(ctl.state().enemy.hp, 0);
        assert_eq!(finished(&events).enemy_strike, Some(15));
        assert_eq!(ctl.state().player.hp, 85);
        assert_eq!(ctl.state().status(), BattleStatus::Victory);
    }

    #[test]
    fn test_battle_over_blocks_actions() {
        let mut ctl = controller(one_swap_from_match());
        ctl.state.enemy.take_damage(10_000);
        assert_eq!(ctl.state().status(), BattleStatus::Victory);
        assert_eq!(
            ctl.attempt_swap(p(0, 2), p(1, 2)),
            Err(Rejection::BattleOver)
        );
    }

    #[test]
    fn test_advance_floor() {
        let mut ctl = controller(striped());
        let mut rng = GameRng::seeded(8);
        assert_eq!(ctl.advance_floor(Perk::Tank, &mut rng), Err(Rejection::NotCleared));

        ctl.state.enemy.take_damage(10_000);
        ctl.state.mana.fill(Skill::Fury);
        ctl.state.moves_left = 3;
        assert_eq!(ctl.advance_floor(Perk::Tank, &mut rng), Ok(()));

        let state = ctl.state();
        assert_eq!(state.floor, 2);
        assert_eq!(state.enemy.name, "Shadow Spirit");
        assert_eq!(state.enemy.hp, 2100);
        assert_eq!((state.player.hp, state.player.max_hp), (200, 200));
        assert_eq!(state.perks.count(Perk::Tank), 1);
        assert_eq!(state.mana.get(Skill::Fury), 0.0);
        assert_eq!(state.moves_left, ctl.rules().moves_per_attack);
        assert!(matcher::detect(&state.grid).is_empty());
        assert_eq!(state.status(), BattleStatus::Ongoing);
    }

    #[test]
    fn test_stepwise_and_bulk_agree() {
        let seeded = || {
            let mut rng = GameRng::seeded(99);
            let ctl = TurnController::new(Rules::default(), &mut rng);
            (ctl, rng)
        };
        let (mut bulk, mut rng_a) = seeded();
        let (mut stepwise, mut rng_b) = seeded();

        let (a, b) = matcher::find_swaps(&bulk.state().grid)[0];
        bulk.attempt_swap(a, b).unwrap();
        stepwise.attempt_swap(a, b).unwrap();

        let all: Vec<_> = bulk.cascade(&mut rng_a).collect();
        let mut one_by_one = Vec::new();
        while let Some(event) = stepwise.advance(&mut rng_b) {
            assert!(stepwise.is_busy() || matches!(event, CascadeEvent::Finished(_)));
            one_by_one.push(event);
        }
        assert_eq!(all, one_by_one);
        assert_eq!(bulk.state(), stepwise.state());
    }
}
