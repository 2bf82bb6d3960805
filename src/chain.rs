//! Chain resolution: expand directly matched cells through special-tile effects.

use crate::grid::{Grid, Position};
use crate::tile::Modifier;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Why a cell was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClearCause {
    /// Part of a detected run.
    Match,
    /// Swept up by a special tile's effect.
    Chain,
}

/// Every cell destroyed in one cascade pass, deduplicated, with its cause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearSet {
    cells: BTreeMap<Position, ClearCause>,
}

impl ClearSet {
    /// Records `pos`; the first cause recorded wins.
    fn insert(&mut self, pos: Position, cause: ClearCause) {
        self.cells.entry(pos).or_insert(cause);
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains_key(&pos)
    }

    pub fn cause(&self, pos: Position) -> Option<ClearCause> {
        self.cells.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, ClearCause)> + '_ {
        self.cells.iter().map(|(p, c)| (*p, *c))
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.keys().copied()
    }
}

/// Output of one resolution: what gets cleared and what was caught in an area burst.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub cleared: ClearSet,
    /// Cells inside any fired area burst; they take the explosion multiplier.
    pub explosions: BTreeSet<Position>,
    /// Special tiles that fired, in firing order.
    pub triggered: Vec<(Position, Modifier)>,
}

/// Breadth-first expansion from the directly matched cells.
///
/// Effects are evaluated against `grid` as given, which the caller keeps as
/// the pre-clear snapshot, so a late trigger still sees original symbols.
/// Each special tile fires at most once per call no matter how many times
/// its cell is reached.
pub fn resolve(grid: &Grid, initial: impl IntoIterator<Item = Position>) -> Resolution {
    let mut resolution = Resolution::default();
    let mut fired: HashSet<Position> = HashSet::new();
    let mut queue: VecDeque<(Position, ClearCause)> = initial
        .into_iter()
        .map(|pos| (pos, ClearCause::Match))
        .collect();

    while let Some((pos, cause)) = queue.pop_front() {
        // A revisit still gets its modifier check; `fired` keeps it to one firing.
        resolution.cleared.insert(pos, cause);

        let tile = grid.get(pos);
        if !tile.modifier.is_special() || !fired.insert(pos) {
            continue;
        }
        let affected = affected_positions(grid, pos);
        tracing::debug!(
            "{:?} at {} fires over {} cells",
            tile.modifier,
            pos,
            affected.len()
        );
        if tile.modifier == Modifier::Area {
            resolution.explosions.extend(affected.iter().copied());
        }
        resolution.triggered.push((pos, tile.modifier));
        queue.extend(affected.into_iter().map(|p| (p, ClearCause::Chain)));
    }
    resolution
}

/// Cells hit when the special tile at `pos` fires.
pub fn affected_positions(grid: &Grid, pos: Position) -> Vec<Position> {
    let tile = grid.get(pos);
    match tile.modifier {
        Modifier::None => Vec::new(),
        Modifier::Area => pos.neighbourhood().collect(),
        Modifier::Sweep => pos.cross().collect(),
        Modifier::ColorClear => match tile.symbol {
            Some(symbol) => Position::all()
                .filter(|&p| grid.symbol(p) == Some(symbol))
                .collect(),
            None => Vec::new(),
        },
    }
}
