//! Tile values: symbol, special modifier, and presentation identity.

use crate::rng::RandomSource;
use serde::Serialize;
use std::fmt;

/// Tile symbols. The board never holds anything outside this set except empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Symbol {
    Apple,
    Orange,
    Lemon,
    Grape,
    Kiwi,
}

impl Symbol {
    pub const ALL: [Self; 5] = [Self::Apple, Self::Orange, Self::Lemon, Self::Grape, Self::Kiwi];

    /// Uniformly random symbol.
    pub fn random(rng: &mut impl RandomSource) -> Self {
        Self::ALL[rng.below(Self::ALL.len())]
    }

    /// Single-letter form used by the text board format.
    pub fn glyph(self) -> char {
        match self {
            Self::Apple => 'A',
            Self::Orange => 'O',
            Self::Lemon => 'L',
            Self::Grape => 'G',
            Self::Kiwi => 'K',
        }
    }

    pub fn from_glyph(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.glyph() == c.to_ascii_uppercase())
    }
}

/// Special effect carried by a tile, fired when the tile is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Modifier {
    #[default]
    None,
    /// 3x3 burst around the tile.
    Area,
    /// Whole row and whole column.
    Sweep,
    /// Every tile sharing the trigger's symbol.
    ColorClear,
}

impl Modifier {
    /// Modifiers that actually do something.
    pub const SPECIALS: [Self; 3] = [Self::Area, Self::Sweep, Self::ColorClear];

    pub fn is_special(self) -> bool {
        self != Self::None
    }

    pub fn random_special(rng: &mut impl RandomSource) -> Self {
        Self::SPECIALS[rng.below(Self::SPECIALS.len())]
    }

    /// Suffix mark in the text board format. `None` has no mark.
    pub fn mark(self) -> Option<char> {
        match self {
            Self::None => None,
            Self::Area => Some('*'),
            Self::Sweep => Some('+'),
            Self::ColorClear => Some('@'),
        }
    }

    pub fn from_mark(c: char) -> Option<Self> {
        Self::SPECIALS.into_iter().find(|m| m.mark() == Some(c))
    }
}

/// Identity for presentation continuity only; unique within one grid's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct TileId(pub u64);

/// A single board cell. An empty tile never carries a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Tile {
    pub id: TileId,
    pub symbol: Option<Symbol>,
    pub modifier: Modifier,
}

impl Tile {
    pub fn new(id: TileId, symbol: Symbol, modifier: Modifier) -> Self {
        Self {
            id,
            symbol: Some(symbol),
            modifier,
        }
    }

    pub fn empty(id: TileId) -> Self {
        Self {
            id,
            symbol: None,
            modifier: Modifier::None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol {
            None => write!(f, "."),
            Some(symbol) => match self.modifier.mark() {
                Some(mark) => write!(f, "{}{}", symbol.glyph(), mark),
                None => write!(f, "{}", symbol.glyph()),
            },
        }
    }
}
