//! One attempt at one level: the board, score, countdown and the swap /
//! cascade state machine.
//!
//! The cascade runs as discrete steps so a front-end can animate between
//! them. [`LevelSession::advance`] performs one step and says how long to wait
//! before the next; [`LevelSession::resolve`] runs every step back to back.

use log::{debug, info};

use crate::generator::generate;
use crate::gravity::{fill, settle};
use crate::grid::{is_adjacent, Grid, Pos, EMPTY};
use crate::level::LevelConfig;
use crate::matching::{detect, would_match};
use crate::presenter::{AudioNotifier, Renderer, Sound};

/// Pause after a committed swap before the first detection pass.
pub const SWAP_DELAY_MS: u32 = 300;
/// Pause after removing matches, and between gravity passes.
pub const GRAVITY_DELAY_MS: u32 = 300;
/// Pause after refilling before looking for new matches.
pub const REFILL_DELAY_MS: u32 = 500;
/// How long a rejected swap stays marked invalid.
pub const INVALID_SWAP_MS: u32 = 500;

/// Removed cells needed before the match sound plays.
const MATCH_SOUND_MIN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Detect,
    Gravity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapState {
    Idle,
    AwaitingSecondSelection(Pos),
    /// A swap was refused; both cells are shown as invalid until the next step.
    Rejected(Pos, Pos),
    Cascading(Stage),
    /// The target score was reached. The session takes no more input.
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    Selected,
    Deselected,
    Rejected,
    Committed,
}

impl ClickOutcome {
    /// Delay before [`LevelSession::advance`] should run, if a step is pending.
    pub fn wait_ms(self) -> Option<u32> {
        match self {
            Self::Rejected => Some(INVALID_SWAP_MS),
            Self::Committed => Some(SWAP_DELAY_MS),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Wait(u32),
    Idle,
    LevelComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running(u32),
    Expired,
}

pub struct LevelSession {
    config: LevelConfig,
    grid: Grid,
    score: u32,
    remaining_time: u32,
    state: SwapState,
    fresh: Vec<Pos>,
}

impl LevelSession {
    pub fn new(config: LevelConfig) -> Self {
        let grid = generate(config.rows, config.cols, config.colors);
        Self::with_grid(config, grid)
    }

    /// Starts a session on a prepared board instead of a generated one.
    pub fn with_grid(config: LevelConfig, grid: Grid) -> Self {
        Self {
            config,
            grid,
            score: 0,
            remaining_time: config.time_limit,
            state: SwapState::Idle,
            fresh: Vec::new(),
        }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn remaining_time(&self) -> u32 {
        self.remaining_time
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    /// True while a rejection or cascade is in flight; clicks are ignored.
    pub fn is_processing(&self) -> bool {
        matches!(
            self.state,
            SwapState::Rejected(..) | SwapState::Cascading(_) | SwapState::Complete
        )
    }

    /// Pushes the whole session state to the renderer.
    pub fn present<R: Renderer>(&self, view: &mut R) {
        view.render_grid(&self.grid);
        view.score_changed(self.score);
        view.time_changed(self.remaining_time);
    }

    pub fn click<V>(&mut self, row: usize, col: usize, view: &mut V) -> ClickOutcome
    where
        V: Renderer + AudioNotifier,
    {
        if self.is_processing() || !self.grid.contains(row, col) {
            return ClickOutcome::Ignored;
        }

        let pos = (row, col);
        let first = match self.state {
            SwapState::AwaitingSecondSelection(first) => first,
            _ => {
                self.state = SwapState::AwaitingSecondSelection(pos);
                view.mark_selected(row, col, true);
                return ClickOutcome::Selected;
            }
        };

        view.mark_selected(first.0, first.1, false);
        if !is_adjacent(first, pos) {
            self.state = SwapState::Idle;
            return ClickOutcome::Deselected;
        }

        if !would_match(&mut self.grid, first, pos) {
            debug!("rejected swap {first:?} <-> {pos:?}");
            view.notify(Sound::InvalidSwap);
            view.mark_invalid(first.0, first.1, true);
            view.mark_invalid(row, col, true);
            self.state = SwapState::Rejected(first, pos);
            return ClickOutcome::Rejected;
        }

        self.grid.swap(first, pos);
        view.update_cell(first.0, first.1, self.grid.at(first.0, first.1));
        view.update_cell(row, col, self.grid.at(row, col));
        self.state = SwapState::Cascading(Stage::Detect);
        ClickOutcome::Committed
    }

    /// Runs the next pending step, if any.
    pub fn advance<V>(&mut self, view: &mut V) -> Step
    where
        V: Renderer + AudioNotifier,
    {
        match self.state {
            SwapState::Idle | SwapState::AwaitingSecondSelection(_) => Step::Idle,
            SwapState::Complete => Step::LevelComplete,
            SwapState::Rejected(a, b) => {
                view.mark_invalid(a.0, a.1, false);
                view.mark_invalid(b.0, b.1, false);
                self.state = SwapState::Idle;
                Step::Idle
            }
            SwapState::Cascading(Stage::Detect) => self.remove_matches(view),
            SwapState::Cascading(Stage::Gravity) => self.drop_and_refill(view),
        }
    }

    /// Runs steps until the session is idle or the level is complete.
    pub fn resolve<V>(&mut self, view: &mut V) -> Step
    where
        V: Renderer + AudioNotifier,
    {
        loop {
            match self.advance(view) {
                Step::Wait(_) => continue,
                step => return step,
            }
        }
    }

    /// Counts down one second. Runs regardless of any cascade in flight.
    pub fn tick<R: Renderer>(&mut self, view: &mut R) -> TickOutcome {
        self.remaining_time = self.remaining_time.saturating_sub(1);
        view.time_changed(self.remaining_time);

        if self.remaining_time == 0 {
            return TickOutcome::Expired;
        }

        TickOutcome::Running(self.remaining_time)
    }

    fn remove_matches<V>(&mut self, view: &mut V) -> Step
    where
        V: Renderer + AudioNotifier,
    {
        for (row, col) in self.fresh.drain(..) {
            view.mark_new(row, col, false);
        }

        let matches = detect(&self.grid);
        if matches.is_empty() {
            self.state = SwapState::Idle;
            return Step::Idle;
        }

        for &(row, col) in &matches {
            self.grid.set(row, col, EMPTY);
            view.update_cell(row, col, EMPTY);
        }

        self.score += matches.len() as u32;
        view.score_changed(self.score);
        if matches.len() >= MATCH_SOUND_MIN {
            view.notify(Sound::Match);
        }
        debug!("removed {} cell(s), score {}", matches.len(), self.score);

        if self.score >= self.config.target_score {
            info!("target score {} reached", self.config.target_score);
            self.state = SwapState::Complete;
            return Step::LevelComplete;
        }

        self.state = SwapState::Cascading(Stage::Gravity);
        Step::Wait(GRAVITY_DELAY_MS)
    }

    fn drop_and_refill<V>(&mut self, view: &mut V) -> Step
    where
        V: Renderer + AudioNotifier,
    {
        let falls = settle(&mut self.grid);
        if !falls.is_empty() {
            for fall in falls {
                view.update_cell(fall.to.0, fall.to.1, fall.token);
                view.update_cell(fall.from.0, fall.from.1, EMPTY);
            }

            return Step::Wait(GRAVITY_DELAY_MS);
        }

        let filled = fill(&mut self.grid, self.config.colors);
        if filled.is_empty() {
            self.state = SwapState::Idle;
            return Step::Idle;
        }

        for &(row, col) in &filled {
            view.update_cell(row, col, self.grid.at(row, col));
            view.mark_new(row, col, true);
        }
        self.fresh = filled;
        self.state = SwapState::Cascading(Stage::Detect);
        Step::Wait(REFILL_DELAY_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::recording::{Call, Recorder};

    fn config(target_score: u32) -> LevelConfig {
        LevelConfig::new(4, 4, 4, 300).with_target_score(target_score)
    }

    // Swapping (1,2) and (2,2) lines up three 1s along row 2.
    fn board() -> Grid {
        Grid::from_rows(&[
            [2, 3, 4, 2],
            [3, 4, 1, 3],
            [1, 1, 2, 4],
            [4, 2, 3, 1],
        ])
    }

    #[test]
    fn first_click_selects() {
        let mut session = LevelSession::with_grid(config(50), board());
        let mut view = Recorder::default();

        assert_eq!(session.click(0, 0, &mut view), ClickOutcome::Selected);
        assert_eq!(session.state(), SwapState::AwaitingSecondSelection((0, 0)));
        assert_eq!(view.calls, vec![Call::Selected(0, 0, true)]);
    }

    #[test]
    fn non_adjacent_click_clears_selection() {
        let mut session = LevelSession::with_grid(config(50), board());
        let mut view = Recorder::default();

        session.click(0, 0, &mut view);
        assert_eq!(session.click(2, 2, &mut view), ClickOutcome::Deselected);
        assert_eq!(session.state(), SwapState::Idle);
        assert_eq!(session.grid(), &board());
        assert!(view.sounds.is_empty());
    }

    #[test]
    fn out_of_bounds_click_is_ignored() {
        let mut session = LevelSession::with_grid(config(50), board());
        let mut view = Recorder::default();

        assert_eq!(session.click(9, 0, &mut view), ClickOutcome::Ignored);
        assert!(view.calls.is_empty());
    }

    #[test]
    fn rejected_swap_blocks_input_until_advanced() {
        let mut session = LevelSession::with_grid(config(50), board());
        let mut view = Recorder::default();

        session.click(0, 0, &mut view);
        let outcome = session.click(0, 1, &mut view);

        assert_eq!(outcome, ClickOutcome::Rejected);
        assert_eq!(outcome.wait_ms(), Some(INVALID_SWAP_MS));
        assert_eq!(view.sounds, vec![Sound::InvalidSwap]);
        assert!(view.calls.contains(&Call::Invalid(0, 1, true)));
        assert!(session.is_processing());
        assert_eq!(session.grid(), &board());
        assert_eq!(session.click(3, 3, &mut view), ClickOutcome::Ignored);

        assert_eq!(session.advance(&mut view), Step::Idle);
        assert!(!session.is_processing());
        assert!(view.calls.contains(&Call::Invalid(0, 0, false)));
        assert_eq!(session.click(3, 3, &mut view), ClickOutcome::Selected);
    }

    #[test]
    fn committed_swap_scores_and_refills() {
        let mut session = LevelSession::with_grid(config(50), board());
        let mut view = Recorder::default();

        session.click(1, 2, &mut view);
        let outcome = session.click(2, 2, &mut view);
        assert_eq!(outcome, ClickOutcome::Committed);
        assert_eq!(outcome.wait_ms(), Some(SWAP_DELAY_MS));
        assert!(session.is_processing());

        assert_eq!(session.advance(&mut view), Step::Wait(GRAVITY_DELAY_MS));
        assert_eq!(session.score(), 3);
        assert_eq!(session.grid().at(2, 0), EMPTY);
        assert_eq!(view.sounds, vec![Sound::Match]);

        assert_eq!(session.resolve(&mut view), Step::Idle);
        assert!(!session.is_processing());
        assert_eq!(session.grid().empty_count(), 0);
        assert!(detect(session.grid()).is_empty());
        assert!(session.score() >= 3);
        assert_eq!(view.last_score(), Some(session.score()));
    }

    #[test]
    fn gravity_keeps_column_order() {
        let mut session = LevelSession::with_grid(config(50), board());
        let mut view = Recorder::default();

        session.click(1, 2, &mut view);
        session.click(2, 2, &mut view);
        session.advance(&mut view);

        // Cells above the cleared row fall one step.
        assert_eq!(session.advance(&mut view), Step::Wait(GRAVITY_DELAY_MS));
        assert_eq!(session.grid().at(2, 0), 3);
        assert_eq!(session.grid().at(1, 0), 2);
        assert_eq!(session.grid().at(2, 2), 2);
        assert_eq!(session.grid().at(0, 1), EMPTY);
    }

    #[test]
    fn fallen_tokens_form_a_second_run() {
        let grid = Grid::from_rows(&[
            [2, 3, 4, 5],
            [3, 1, 4, 3],
            [1, 4, 3, 4],
            [1, 2, 2, 3],
        ]);
        let mut session = LevelSession::with_grid(config(50), grid);
        let mut view = Recorder::default();

        // Column 0 clears, then the 2 lands beside row 3's pair of 2s.
        session.click(1, 0, &mut view);
        assert_eq!(session.click(1, 1, &mut view), ClickOutcome::Committed);
        assert_eq!(session.advance(&mut view), Step::Wait(GRAVITY_DELAY_MS));
        assert_eq!(session.score(), 3);

        assert_eq!(session.advance(&mut view), Step::Wait(GRAVITY_DELAY_MS));
        assert_eq!(session.grid().at(3, 0), 2);
        assert_eq!(session.advance(&mut view), Step::Wait(REFILL_DELAY_MS));
        assert_eq!(session.grid().empty_count(), 0);

        session.advance(&mut view);
        assert!(session.score() >= 6);
        assert_eq!(session.grid().at(3, 1), EMPTY);
        assert_eq!(session.grid().at(3, 2), EMPTY);

        assert_eq!(session.resolve(&mut view), Step::Idle);
        assert_eq!(session.grid().empty_count(), 0);
        assert!(detect(session.grid()).is_empty());
        assert_eq!(view.last_score(), Some(session.score()));
    }

    #[test]
    fn reaching_target_stops_before_gravity() {
        let mut session = LevelSession::with_grid(config(3), board());
        let mut view = Recorder::default();

        session.click(1, 2, &mut view);
        session.click(2, 2, &mut view);

        assert_eq!(session.advance(&mut view), Step::LevelComplete);
        assert_eq!(session.state(), SwapState::Complete);
        assert_eq!(session.grid().empty_count(), 3);
        assert_eq!(session.click(0, 0, &mut view), ClickOutcome::Ignored);
        assert_eq!(session.resolve(&mut view), Step::LevelComplete);
    }

    #[test]
    fn cumulative_score_reaches_default_target() {
        let mut session = LevelSession::with_grid(LevelConfig::new(4, 4, 4, 300), board());
        let mut view = Recorder::default();
        session.score = 47;

        session.click(1, 2, &mut view);
        session.click(2, 2, &mut view);

        assert_eq!(session.advance(&mut view), Step::LevelComplete);
        assert_eq!(session.score(), 50);
        assert_eq!(session.grid().at(2, 0), EMPTY);
        assert_eq!(session.grid().at(1, 0), 3);
    }

    #[test]
    fn score_counts_cells_not_runs() {
        let grid = Grid::from_rows(&[
            [1, 3, 2, 4],
            [2, 3, 4, 1],
            [3, 4, 3, 3],
            [4, 2, 1, 2],
        ]);
        let mut session = LevelSession::with_grid(config(50), grid);
        let mut view = Recorder::default();

        // The 3 lands at (2,1): a row of three and a column of three sharing it.
        session.click(2, 0, &mut view);
        assert_eq!(session.click(2, 1, &mut view), ClickOutcome::Committed);
        session.advance(&mut view);

        assert_eq!(session.score(), 5);
        assert_eq!(view.sounds, vec![Sound::Match]);
    }

    #[test]
    fn tick_counts_down_to_expiry() {
        let mut session = LevelSession::with_grid(LevelConfig::new(4, 4, 4, 2), board());
        let mut view = Recorder::default();

        assert_eq!(session.tick(&mut view), TickOutcome::Running(1));
        assert_eq!(session.tick(&mut view), TickOutcome::Expired);
        assert_eq!(session.tick(&mut view), TickOutcome::Expired);
        assert_eq!(view.calls, vec![Call::Time(1), Call::Time(0), Call::Time(0)]);
    }

    #[test]
    fn new_session_is_generated_and_idle() {
        let session = LevelSession::new(LevelConfig::new(8, 8, 6, 300));

        assert_eq!(session.grid().rows(), 8);
        assert_eq!(session.grid().cols(), 8);
        assert_eq!(session.score(), 0);
        assert_eq!(session.remaining_time(), 300);
        assert!(!session.is_processing());
    }
}
