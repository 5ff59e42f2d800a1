use thiserror::Error;

use crate::grid::Token;

/// Score that completes a level unless a config says otherwise.
pub const DEFAULT_TARGET_SCORE: u32 = 50;

pub const MIN_SIDE: usize = 3;
pub const MAX_SIDE: usize = 32;
pub const MIN_COLORS: Token = 2;
pub const MAX_COLORS: Token = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    pub rows: usize,
    pub cols: usize,
    pub colors: Token,
    /// Countdown length in seconds.
    pub time_limit: u32,
    pub target_score: u32,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelConfigError {
    #[error("no levels configured")]
    NoLevels,
    #[error("level {level}: rows must be between {} and {}, got {value}", MIN_SIDE, MAX_SIDE)]
    Rows { level: usize, value: usize },
    #[error("level {level}: cols must be between {} and {}, got {value}", MIN_SIDE, MAX_SIDE)]
    Cols { level: usize, value: usize },
    #[error("level {level}: colors must be between {} and {}, got {value}", MIN_COLORS, MAX_COLORS)]
    Colors { level: usize, value: Token },
    #[error("level {level}: time limit must be at least one second")]
    TimeLimit { level: usize },
    #[error("level {level}: target score must be at least 1")]
    TargetScore { level: usize },
}

impl LevelConfig {
    pub const fn new(rows: usize, cols: usize, colors: Token, time_limit: u32) -> Self {
        Self {
            rows,
            cols,
            colors,
            time_limit,
            target_score: DEFAULT_TARGET_SCORE,
        }
    }

    pub const fn with_target_score(mut self, target_score: u32) -> Self {
        self.target_score = target_score;
        self
    }

    /// Checks the config as level number `level` (used in error messages).
    pub fn validate(&self, level: usize) -> Result<(), LevelConfigError> {
        if !(MIN_SIDE..=MAX_SIDE).contains(&self.rows) {
            return Err(LevelConfigError::Rows {
                level,
                value: self.rows,
            });
        }

        if !(MIN_SIDE..=MAX_SIDE).contains(&self.cols) {
            return Err(LevelConfigError::Cols {
                level,
                value: self.cols,
            });
        }

        if !(MIN_COLORS..=MAX_COLORS).contains(&self.colors) {
            return Err(LevelConfigError::Colors {
                level,
                value: self.colors,
            });
        }

        if self.time_limit == 0 {
            return Err(LevelConfigError::TimeLimit { level });
        }

        if self.target_score == 0 {
            return Err(LevelConfigError::TargetScore { level });
        }

        Ok(())
    }
}

/// The built-in level table, easiest first.
pub fn default_levels() -> Vec<LevelConfig> {
    vec![LevelConfig::new(8, 8, 6, 300), LevelConfig::new(9, 9, 7, 300)]
}

/// Validates a whole level table, reporting the first bad level (1-based).
pub fn validate_levels(levels: &[LevelConfig]) -> Result<(), LevelConfigError> {
    if levels.is_empty() {
        return Err(LevelConfigError::NoLevels);
    }

    levels
        .iter()
        .enumerate()
        .try_for_each(|(idx, config)| config.validate(idx + 1))
}
