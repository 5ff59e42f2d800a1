//! Hooks the simulation calls into. Nothing here feeds back into game state.

use crate::grid::{Grid, Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sound {
    Match,
    InvalidSwap,
}

/// Draws the board, score and countdown.
pub trait Renderer {
    /// Redraws the whole board, e.g. after a new level starts.
    fn render_grid(&mut self, grid: &Grid);

    /// Shows `token` at one cell; `EMPTY` means the cell is blank.
    fn update_cell(&mut self, row: usize, col: usize, token: Token);

    fn mark_selected(&mut self, row: usize, col: usize, on: bool);

    fn mark_invalid(&mut self, row: usize, col: usize, on: bool);

    fn mark_new(&mut self, row: usize, col: usize, on: bool);

    fn score_changed(&mut self, score: u32);

    fn time_changed(&mut self, remaining_seconds: u32);
}

/// Fire-and-forget sound effects. Implementations swallow their own failures.
pub trait AudioNotifier {
    fn notify(&mut self, sound: Sound);
}
