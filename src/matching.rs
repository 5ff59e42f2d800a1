//! Run detection and swap probing.

use std::collections::BTreeSet;

use crate::grid::{Grid, Pos, EMPTY};

/// Coordinates taking part in at least one run, in row-major order.
pub type MatchSet = BTreeSet<Pos>;

/// Every cell in a horizontal or vertical run of three or more equal,
/// non-empty tokens. Runs longer than three are reported in full.
pub fn detect(grid: &Grid) -> MatchSet {
    let (rows, cols) = (grid.rows(), grid.cols());
    let mut matches = MatchSet::new();

    for row in 0..rows {
        for col in 0..cols.saturating_sub(2) {
            let token = grid.at(row, col);
            if token == EMPTY || token != grid.at(row, col + 1) || token != grid.at(row, col + 2) {
                continue;
            }

            let mut end = col;
            while end < cols && grid.at(row, end) == token {
                matches.insert((row, end));
                end += 1;
            }
        }
    }

    for col in 0..cols {
        for row in 0..rows.saturating_sub(2) {
            let token = grid.at(row, col);
            if token == EMPTY || token != grid.at(row + 1, col) || token != grid.at(row + 2, col) {
                continue;
            }

            let mut end = row;
            while end < rows && grid.at(end, col) == token {
                matches.insert((end, col));
                end += 1;
            }
        }
    }

    matches
}

/// Whether swapping `a` and `b` would line up a run through either cell.
///
/// The swap is applied, probed with [`detect`] and undone, so the grid is
/// left exactly as it was. Swapping two equal tokens changes nothing and is
/// never a match. Adjacency is the caller's concern.
pub fn would_match(grid: &mut Grid, a: Pos, b: Pos) -> bool {
    let (Some(first), Some(second)) = (grid.get(a.0, a.1), grid.get(b.0, b.1)) else {
        return false;
    };
    if first == second {
        return false;
    }

    grid.swap(a, b);
    let matches = detect(grid);
    grid.swap(a, b);

    matches.contains(&a) || matches.contains(&b)
}
