use log::info;

use crate::level::{validate_levels, LevelConfig, LevelConfigError};
use crate::presenter::{AudioNotifier, Renderer};
use crate::session::{ClickOutcome, LevelSession, Step, TickOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Complete,
}

/// Level transitions a front-end should react to. Any event other than
/// `None` replaces the session, so pending cascade steps and the countdown
/// must be rescheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    None,
    LevelStarted { index: usize },
    /// Level `index` was cleared and the next one has started.
    LevelComplete { index: usize },
    /// Level `index` ran out of time and has been restarted.
    LevelFailed { index: usize },
    GameComplete,
}

/// Result of one cascade step as seen by the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Run [`Game::advance`] again after this many milliseconds.
    pub wait_ms: Option<u32>,
    pub event: GameEvent,
}

pub struct Game {
    levels: Vec<LevelConfig>,
    level_index: usize,
    session: LevelSession,
    status: GameStatus,
}

impl Game {
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self, LevelConfigError> {
        validate_levels(&levels)?;
        let session = LevelSession::new(levels[0]);
        info!("starting level 1 of {}", levels.len());

        Ok(Self {
            levels,
            level_index: 0,
            session,
            status: GameStatus::Playing,
        })
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn session(&self) -> &LevelSession {
        &self.session
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn click<V>(&mut self, row: usize, col: usize, view: &mut V) -> ClickOutcome
    where
        V: Renderer + AudioNotifier,
    {
        if self.status == GameStatus::Complete {
            return ClickOutcome::Ignored;
        }

        self.session.click(row, col, view)
    }

    pub fn advance<V>(&mut self, view: &mut V) -> Progress
    where
        V: Renderer + AudioNotifier,
    {
        match self.session.advance(view) {
            Step::Wait(ms) => Progress {
                wait_ms: Some(ms),
                event: GameEvent::None,
            },
            Step::Idle => Progress {
                wait_ms: None,
                event: GameEvent::None,
            },
            Step::LevelComplete => Progress {
                wait_ms: None,
                event: self.complete_level(view),
            },
        }
    }

    /// Runs the pending cascade to the end without pausing.
    pub fn resolve<V>(&mut self, view: &mut V) -> GameEvent
    where
        V: Renderer + AudioNotifier,
    {
        loop {
            let progress = self.advance(view);
            if progress.wait_ms.is_none() {
                return progress.event;
            }
        }
    }

    /// One second of countdown. Expiry restarts the current level.
    pub fn tick<R: Renderer>(&mut self, view: &mut R) -> GameEvent {
        if self.status == GameStatus::Complete {
            return GameEvent::None;
        }

        match self.session.tick(view) {
            TickOutcome::Running(_) => GameEvent::None,
            TickOutcome::Expired => {
                info!("level {} timed out", self.level_index + 1);
                self.start_level(self.level_index, view);
                GameEvent::LevelFailed {
                    index: self.level_index,
                }
            }
        }
    }

    /// Restarts the current level, or the whole game once it is complete.
    pub fn restart<R: Renderer>(&mut self, view: &mut R) -> GameEvent {
        if self.status == GameStatus::Complete {
            self.status = GameStatus::Playing;
            self.start_level(0, view);
        } else {
            self.start_level(self.level_index, view);
        }

        GameEvent::LevelStarted {
            index: self.level_index,
        }
    }

    fn complete_level<R: Renderer>(&mut self, view: &mut R) -> GameEvent {
        let index = self.level_index;
        info!("level {} complete", index + 1);

        if index + 1 >= self.levels.len() {
            info!("all {} levels complete", self.levels.len());
            self.status = GameStatus::Complete;
            return GameEvent::GameComplete;
        }

        self.start_level(index + 1, view);
        GameEvent::LevelComplete { index }
    }

    fn start_level<R: Renderer>(&mut self, index: usize, view: &mut R) {
        self.level_index = index;
        self.session = LevelSession::new(self.levels[index]);
        self.session.present(view);
        info!("starting level {} of {}", index + 1, self.levels.len());
    }
}
