//! Match detection: maximal runs of three or more equal symbols.

use crate::grid::{GRID_SIZE, Grid, Position};
use crate::tile::{Modifier, Symbol};
use serde::Serialize;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Row,
    Column,
}

/// One maximal run. `positions` are in ascending index order along the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchGroup {
    pub orientation: Orientation,
    pub symbol: Symbol,
    pub positions: Vec<Position>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Lowest-index cell of the run; where a bonus tile lands.
    pub fn first(&self) -> Position {
        self.positions[0]
    }

    /// Bonus earned by this run: area for exactly four, color-clear for five or more.
    pub fn bonus(&self) -> Option<Modifier> {
        match self.len() {
            4 => Some(Modifier::Area),
            n if n >= 5 => Some(Modifier::ColorClear),
            _ => None,
        }
    }
}

/// Every maximal run in the grid: rows top-to-bottom first, then columns
/// left-to-right. A cell in a T/L/plus shape shows up in both a row group
/// and a column group.
pub fn detect(grid: &Grid) -> Vec<MatchGroup> {
    let mut groups = Vec::new();
    for row in 0..GRID_SIZE {
        let line = (0..GRID_SIZE).map(move |col| Position::at(row, col));
        scan_line(grid, line, Orientation::Row, &mut groups);
    }
    for col in 0..GRID_SIZE {
        let line = (0..GRID_SIZE).map(move |row| Position::at(row, col));
        scan_line(grid, line, Orientation::Column, &mut groups);
    }
    groups
}

fn scan_line(
    grid: &Grid,
    line: impl Iterator<Item = Position>,
    orientation: Orientation,
    out: &mut Vec<MatchGroup>,
) {
    let mut run: Vec<Position> = Vec::with_capacity(GRID_SIZE);
    let mut current: Option<Symbol> = None;

    for pos in line {
        let symbol = grid.symbol(pos);
        if symbol.is_some() && symbol == current {
            run.push(pos);
            continue;
        }
        flush(&mut run, current, orientation, out);
        current = symbol;
        if symbol.is_some() {
            run.push(pos);
        }
    }
    flush(&mut run, current, orientation, out);
}

fn flush(
    run: &mut Vec<Position>,
    symbol: Option<Symbol>,
    orientation: Orientation,
    out: &mut Vec<MatchGroup>,
) {
    if let Some(symbol) = symbol {
        if run.len() >= MIN_RUN {
            out.push(MatchGroup {
                orientation,
                symbol,
                positions: std::mem::take(run),
            });
        }
    }
    run.clear();
}

/// True if swapping `a` and `b` would leave at least one match.
pub fn swap_matches(grid: &Grid, a: Position, b: Position) -> bool {
    let mut candidate = grid.clone();
    candidate.swap(a, b);
    !detect(&candidate).is_empty()
}

/// Every adjacent swap that produces a match, each pair listed once.
pub fn find_swaps(grid: &Grid) -> Vec<(Position, Position)> {
    Position::all()
        .flat_map(|a| a.forward_neighbours().map(move |b| (a, b)))
        .filter(|&(a, b)| grid.symbol(a) != grid.symbol(b) && swap_matches(grid, a, b))
        .collect()
}
