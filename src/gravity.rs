//! Dropping tokens into cleared cells and refilling the gaps.

use crate::grid::{Grid, Pos, Token, EMPTY};
use crate::rng::random_token;

/// A token that fell from `from` to `to` during a gravity pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fall {
    pub from: Pos,
    pub to: Pos,
    pub token: Token,
}

/// One compaction pass: every column's tokens slide to the bottom, keeping
/// their order. Returns the cells that moved; empty means already settled.
pub fn settle(grid: &mut Grid) -> Vec<Fall> {
    let mut falls = Vec::new();

    for col in 0..grid.cols() {
        let mut write = grid.rows();
        for row in (0..grid.rows()).rev() {
            let token = grid.at(row, col);
            if token == EMPTY {
                continue;
            }

            write -= 1;
            if row != write {
                grid.set(write, col, token);
                grid.set(row, col, EMPTY);
                falls.push(Fall {
                    from: (row, col),
                    to: (write, col),
                    token,
                });
            }
        }
    }

    falls
}

/// Repeats [`settle`] until a pass moves nothing. Returns the number of
/// passes that moved at least one token.
pub fn settle_fully(grid: &mut Grid) -> usize {
    let mut passes = 0;
    while !settle(grid).is_empty() {
        passes += 1;
    }

    passes
}

/// Puts a random token in every empty cell, column by column from the top.
/// Returns the filled positions. Refills may form new runs.
pub fn fill(grid: &mut Grid, colors: Token) -> Vec<Pos> {
    let mut filled = Vec::new();

    for col in 0..grid.cols() {
        for row in 0..grid.rows() {
            if grid.at(row, col) == EMPTY {
                grid.set(row, col, random_token(colors));
                filled.push((row, col));
            }
        }
    }

    filled
}
