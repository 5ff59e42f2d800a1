//! Initial board generation with no pre-existing runs.

use log::{debug, warn};

use crate::grid::{Grid, Token};
use crate::rng::{random_token, random_usize};

/// Attempts made before giving up on a run-free board.
pub const MAX_ATTEMPTS: usize = 100;

/// Fills a fresh `rows x cols` board.
///
/// Each cell is drawn from the tokens that don't complete a run with the two
/// cells before it in its row or column. That local rule misses some cases,
/// so every candidate board is re-checked with [`has_run`] and redrawn if it
/// fails. After [`MAX_ATTEMPTS`] failures the board is filled without any
/// constraint and may contain runs.
pub fn generate(rows: usize, cols: usize, colors: Token) -> Grid {
    for attempt in 1..=MAX_ATTEMPTS {
        let mut grid = Grid::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let allowed = allowed_tokens(&grid, row, col, colors);
                let token = allowed[random_usize(allowed.len())];
                grid.set(row, col, token);
            }
        }

        if !has_run(&grid) {
            debug!("generated {rows}x{cols} board after {attempt} attempt(s)");
            return grid;
        }
    }

    warn!("no run-free {rows}x{cols} board in {MAX_ATTEMPTS} attempts, using a random board");
    random_grid(rows, cols, colors)
}

/// Tokens that may go at `(row, col)` given the cells already placed above and
/// to the left. Falls back to every token when the exclusions leave nothing.
pub fn allowed_tokens(grid: &Grid, row: usize, col: usize, colors: Token) -> Vec<Token> {
    let mut allowed: Vec<Token> = (1..=colors).collect();

    if col >= 2 {
        let prev = grid.at(row, col - 1);
        if prev == grid.at(row, col - 2) {
            allowed.retain(|token| *token != prev);
        }
    }

    if row >= 2 {
        let prev = grid.at(row - 1, col);
        if prev == grid.at(row - 2, col) {
            allowed.retain(|token| *token != prev);
        }
    }

    if allowed.is_empty() {
        return (1..=colors).collect();
    }

    allowed
}

/// True when any three equal cells line up horizontally or vertically.
pub fn has_run(grid: &Grid) -> bool {
    let (rows, cols) = (grid.rows(), grid.cols());

    for row in 0..rows {
        for col in 0..cols.saturating_sub(2) {
            let token = grid.at(row, col);
            if token == grid.at(row, col + 1) && token == grid.at(row, col + 2) {
                return true;
            }
        }
    }

    for col in 0..cols {
        for row in 0..rows.saturating_sub(2) {
            let token = grid.at(row, col);
            if token == grid.at(row + 1, col) && token == grid.at(row + 2, col) {
                return true;
            }
        }
    }

    false
}

/// A board with every cell drawn independently.
pub fn random_grid(rows: usize, cols: usize, colors: Token) -> Grid {
    let mut grid = Grid::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            grid.set(row, col, random_token(colors));
        }
    }

    grid
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::grid::EMPTY;
    use crate::matching::detect;

    #[rstest]
    #[case(3, 3, 2)]
    #[case(8, 8, 6)]
    #[case(9, 9, 7)]
    #[case(4, 12, 3)]
    fn generated_boards_are_full_and_run_free(
        #[case] rows: usize,
        #[case] cols: usize,
        #[case] colors: Token,
    ) {
        for _ in 0..20 {
            let grid = generate(rows, cols, colors);

            assert_eq!(grid.rows(), rows);
            assert_eq!(grid.cols(), cols);
            assert_eq!(grid.empty_count(), 0);
            assert!(grid.iter().all(|(_, _, token)| (1..=colors).contains(&token)));
            assert!(detect(&grid).is_empty());
        }
    }

    #[test]
    fn allowed_tokens_excludes_both_axes() {
        let grid = Grid::from_rows(&[[1, 1, EMPTY], [2, 3, EMPTY], [2, 3, EMPTY]]);

        assert_eq!(allowed_tokens(&grid, 0, 2, 3), vec![2, 3]);

        let grid = Grid::from_rows(&[[3, 1, 2], [3, 2, 2], [EMPTY, EMPTY, EMPTY]]);
        assert_eq!(allowed_tokens(&grid, 2, 0, 3), vec![1, 2]);
    }

    #[test]
    fn allowed_tokens_falls_back_when_exhausted() {
        let single = Grid::from_rows(&[[1, 2, 1], [1, 2, 2], [2, 2, EMPTY]]);
        assert_eq!(allowed_tokens(&single, 2, 2, 2), vec![1]);

        let exhausted = Grid::from_rows(&[[1, 2, 1], [1, 2, 1], [2, 2, EMPTY]]);
        assert_eq!(allowed_tokens(&exhausted, 2, 2, 2), vec![1, 2]);
    }

    #[test]
    fn random_grid_is_full() {
        let grid = random_grid(5, 4, 3);

        assert_eq!(grid.empty_count(), 0);
        assert!(grid.iter().all(|(_, _, token)| (1..=3).contains(&token)));
    }

    #[test]
    fn has_run_detects_both_axes() {
        assert!(has_run(&Grid::from_rows(&[[1, 1, 1], [2, 3, 2], [3, 2, 3]])));
        assert!(has_run(&Grid::from_rows(&[[1, 2, 3], [1, 3, 2], [1, 2, 3]])));
        assert!(!has_run(&Grid::from_rows(&[[1, 1, 2], [2, 2, 1], [1, 1, 2]])));
    }
}
