//! Grid model: fixed 8x8 board of tiles, positions, and the text board format.

use crate::rng::RandomSource;
use crate::tile::{Modifier, Symbol, Tile, TileId};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Board side length.
pub const GRID_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("position ({row}, {col}) is outside the grid")]
    OutOfRange { row: usize, col: usize },
    #[error("board text line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// A cell coordinate, always inside the grid. Orders row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Result<Self, GridError> {
        if row < GRID_SIZE && col < GRID_SIZE {
            Ok(Self { row, col })
        } else {
            Err(GridError::OutOfRange { row, col })
        }
    }

    /// For loops already bounded by `GRID_SIZE`.
    #[inline]
    pub(crate) fn at(row: usize, col: usize) -> Self {
        debug_assert!(row < GRID_SIZE && col < GRID_SIZE);
        Self { row, col }
    }

    #[inline]
    pub fn row(self) -> usize {
        self.row
    }

    #[inline]
    pub fn col(self) -> usize {
        self.col
    }

    /// Every position on the board, row-major.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..GRID_SIZE).flat_map(|row| (0..GRID_SIZE).map(move |col| Self { row, col }))
    }

    pub fn random(rng: &mut impl RandomSource) -> Self {
        let row = rng.below(GRID_SIZE);
        let col = rng.below(GRID_SIZE);
        Self { row, col }
    }

    /// Manhattan distance exactly 1.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// Right and down neighbours (the swaps worth trying from this cell).
    pub fn forward_neighbours(self) -> impl Iterator<Item = Self> {
        let right = (self.col + 1 < GRID_SIZE).then(|| Self { row: self.row, col: self.col + 1 });
        let down = (self.row + 1 < GRID_SIZE).then(|| Self { row: self.row + 1, col: self.col });
        right.into_iter().chain(down)
    }

    /// The 3x3 block centred here, clamped to the board.
    pub fn neighbourhood(self) -> impl Iterator<Item = Self> {
        let rows = self.row.saturating_sub(1)..=(self.row + 1).min(GRID_SIZE - 1);
        let cols = self.col.saturating_sub(1)..=(self.col + 1).min(GRID_SIZE - 1);
        rows.flat_map(move |row| cols.clone().map(move |col| Self { row, col }))
    }

    /// Full row followed by full column. The crossing cell appears twice.
    pub fn cross(self) -> impl Iterator<Item = Self> {
        let row = (0..GRID_SIZE).map(move |col| Self { row: self.row, col });
        let col = (0..GRID_SIZE).map(move |row| Self { row, col: self.col });
        row.chain(col)
    }

    /// Centre of the cell in percent of the board, `(x, y)`, for particle placement.
    pub fn percent_center(self) -> (f64, f64) {
        let cell = 100.0 / GRID_SIZE as f64;
        (
            self.col as f64 * cell + cell / 2.0,
            self.row as f64 * cell + cell / 2.0,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Board of tiles. rows[0] is the top; gravity pulls towards higher row indices.
///
/// Equality compares tiles only, not the id counter.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Grid {
    rows: [[Tile; GRID_SIZE]; GRID_SIZE],
    /// Next identity handed out by `fresh`.
    #[serde(skip)]
    next_id: u64,
}

impl Grid {
    /// Board of empty tiles. Only used as a starting point for construction.
    fn blank() -> Self {
        let mut next_id = 0u64;
        let rows = std::array::from_fn(|_| {
            std::array::from_fn(|_| {
                next_id += 1;
                Tile::empty(TileId(next_id - 1))
            })
        });
        Self { rows, next_id }
    }

    /// Random board with no pre-made run of three: each cell re-rolls its
    /// symbol while it would complete a run with the two cells to its left
    /// or the two cells above.
    pub fn generate(rng: &mut impl RandomSource) -> Self {
        let mut grid = Self::blank();
        for pos in Position::all() {
            let symbol = loop {
                let candidate = Symbol::random(rng);
                if !grid.completes_run(pos, candidate) {
                    break candidate;
                }
            };
            grid.place(pos, symbol, Modifier::None);
        }
        grid
    }

    /// Board from explicit symbols, no modifiers.
    pub fn from_symbols(symbols: [[Symbol; GRID_SIZE]; GRID_SIZE]) -> Self {
        let mut grid = Self::blank();
        for pos in Position::all() {
            grid.place(pos, symbols[pos.row][pos.col], Modifier::None);
        }
        grid
    }

    fn completes_run(&self, pos: Position, symbol: Symbol) -> bool {
        let Position { row, col } = pos;
        let left = col >= 2
            && self.rows[row][col - 1].symbol == Some(symbol)
            && self.rows[row][col - 2].symbol == Some(symbol);
        let up = row >= 2
            && self.rows[row - 1][col].symbol == Some(symbol)
            && self.rows[row - 2][col].symbol == Some(symbol);
        left || up
    }

    /// New tile with a fresh identity.
    pub fn fresh(&mut self, symbol: Symbol, modifier: Modifier) -> Tile {
        let id = self.next_identity();
        Tile::new(id, symbol, modifier)
    }

    /// New random plain tile with a fresh identity.
    pub fn fresh_random(&mut self, rng: &mut impl RandomSource) -> Tile {
        let symbol = Symbol::random(rng);
        self.fresh(symbol, Modifier::None)
    }

    fn next_identity(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn get(&self, pos: Position) -> &Tile {
        &self.rows[pos.row][pos.col]
    }

    #[inline]
    pub fn set(&mut self, pos: Position, tile: Tile) {
        self.rows[pos.row][pos.col] = tile;
    }

    /// Raw-coordinate access.
    pub fn tile_at(&self, row: usize, col: usize) -> Result<&Tile, GridError> {
        Position::new(row, col).map(|pos| self.get(pos))
    }

    #[inline]
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_empty()
    }

    #[inline]
    pub fn symbol(&self, pos: Position) -> Option<Symbol> {
        self.get(pos).symbol
    }

    /// Puts a fresh tile at `pos`.
    pub fn place(&mut self, pos: Position, symbol: Symbol, modifier: Modifier) {
        let tile = self.fresh(symbol, modifier);
        self.set(pos, tile);
    }

    /// Blanks `pos` (no symbol, no modifier).
    pub fn clear(&mut self, pos: Position) {
        let id = self.next_identity();
        self.set(pos, Tile::empty(id));
    }

    /// Overwrites the modifier of a non-empty tile, keeping its symbol and identity.
    /// Empty cells are left alone.
    pub fn set_modifier(&mut self, pos: Position, modifier: Modifier) {
        let tile = &mut self.rows[pos.row][pos.col];
        if !tile.is_empty() {
            tile.modifier = modifier;
        }
    }

    pub fn swap(&mut self, a: Position, b: Position) {
        let ta = *self.get(a);
        let tb = *self.get(b);
        self.set(a, tb);
        self.set(b, ta);
    }

    pub fn has_empty(&self) -> bool {
        Position::all().any(|p| self.is_empty(p))
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.rows.iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = row.iter().map(|t| format!("{:<2}", t.to_string())).collect();
            write!(f, "{}", line.join(" ").trim_end())?;
        }
        Ok(())
    }
}

/// Text board: one line per row, whitespace-separated tokens. A token is a
/// symbol letter (`A O L G K`) with an optional modifier mark (`*` area,
/// `+` sweep, `@` color-clear), or `.` for an empty cell.
impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() != GRID_SIZE {
            return Err(GridError::Parse {
                line: lines.len(),
                reason: format!("expected {GRID_SIZE} rows, found {}", lines.len()),
            });
        }
        let mut grid = Self::blank();
        for (row, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != GRID_SIZE {
                return Err(GridError::Parse {
                    line: row + 1,
                    reason: format!("expected {GRID_SIZE} tiles, found {}", tokens.len()),
                });
            }
            for (col, token) in tokens.into_iter().enumerate() {
                let pos = Position { row, col };
                if token == "." {
                    grid.clear(pos);
                    continue;
                }
                let mut chars = token.chars();
                let symbol = chars
                    .next()
                    .and_then(Symbol::from_glyph)
                    .ok_or_else(|| GridError::Parse {
                        line: row + 1,
                        reason: format!("bad symbol in {token:?}"),
                    })?;
                let modifier = match chars.next() {
                    None => Modifier::None,
                    Some(mark) => Modifier::from_mark(mark).ok_or_else(|| GridError::Parse {
                        line: row + 1,
                        reason: format!("bad modifier in {token:?}"),
                    })?,
                };
                if chars.next().is_some() {
                    return Err(GridError::Parse {
                        line: row + 1,
                        reason: format!("token {token:?} too long"),
                    });
                }
                grid.place(pos, symbol, modifier);
            }
        }
        Ok(grid)
    }
}
