//! Gravity: compact surviving tiles downward, refill the top with fresh tiles.

use crate::grid::{GRID_SIZE, Grid, Position};
use crate::rng::RandomSource;

/// Returns the compacted grid; the input is untouched.
///
/// Columns are independent. Each is scanned bottom-to-top, every non-empty
/// tile drops by the number of empties seen below it, and the vacated top
/// cells get fresh random tiles. Refills are unconstrained and may form
/// matches; that is what feeds a cascade.
pub fn compact(grid: &Grid, rng: &mut impl RandomSource) -> Grid {
    let mut next = grid.clone();
    for col in 0..GRID_SIZE {
        let vacated = settle_column(&mut next, col);
        for row in 0..vacated {
            let tile = next.fresh_random(rng);
            next.set(Position::at(row, col), tile);
        }
    }
    next
}

/// Drops the tiles of one column; returns how many cells at the top were vacated.
fn settle_column(grid: &mut Grid, col: usize) -> usize {
    let mut empties = 0;
    for row in (0..GRID_SIZE).rev() {
        let pos = Position::at(row, col);
        if grid.is_empty(pos) {
            empties += 1;
        } else if empties > 0 {
            grid.swap(pos, Position::at(row + empties, col));
        }
    }
    empties
}
