use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("minimum level must be >= 1")]
    InvalidMinLevel,

    #[error("minimum level ({min}) must be <= maximum level ({max})")]
    InvalidLevelBounds { min: u32, max: u32 },

    #[error("correct answers to level up must be >= 1")]
    InvalidLevelUpThreshold,

    #[error("a match needs at least one question")]
    InvalidMatchLength,

    #[error("turn time limit must be between 1 and 600 seconds")]
    InvalidTurnTimeLimit,

    #[error("unknown used-question scope: {0}")]
    UnknownScope(String),
}

//
// ─── LEVELING ──────────────────────────────────────────────────────────────────
//

pub const DEFAULT_MIN_LEVEL: u32 = 1;
pub const DEFAULT_MAX_LEVEL: u32 = 65;
pub const DEFAULT_CORRECT_TO_LEVEL_UP: u32 = 2;

/// Level range and streak threshold used by the adaptive policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelingSettings {
    min_level: u32,
    max_level: u32,
    correct_to_level_up: u32,
}

impl Default for LevelingSettings {
    fn default() -> Self {
        Self {
            min_level: DEFAULT_MIN_LEVEL,
            max_level: DEFAULT_MAX_LEVEL,
            correct_to_level_up: DEFAULT_CORRECT_TO_LEVEL_UP,
        }
    }
}

impl LevelingSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the bounds are inverted, start below 1, or the
    /// threshold is zero.
    pub fn new(
        min_level: u32,
        max_level: u32,
        correct_to_level_up: u32,
    ) -> Result<Self, SettingsError> {
        if min_level == 0 {
            return Err(SettingsError::InvalidMinLevel);
        }
        if min_level > max_level {
            return Err(SettingsError::InvalidLevelBounds {
                min: min_level,
                max: max_level,
            });
        }
        if correct_to_level_up == 0 {
            return Err(SettingsError::InvalidLevelUpThreshold);
        }
        Ok(Self {
            min_level,
            max_level,
            correct_to_level_up,
        })
    }

    #[must_use]
    pub fn min_level(&self) -> u32 {
        self.min_level
    }

    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    #[must_use]
    pub fn correct_to_level_up(&self) -> u32 {
        self.correct_to_level_up
    }

    #[must_use]
    pub fn clamp(&self, level: u32) -> u32 {
        level.clamp(self.min_level, self.max_level)
    }
}

//
// ─── SELECTION SCOPE ───────────────────────────────────────────────────────────
//

/// How long "already shown" question tracking lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsedQuestionScope {
    /// Cleared whenever a quiz session starts.
    #[default]
    Session,
    /// Kept until explicitly reset.
    Global,
}

impl fmt::Display for UsedQuestionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsedQuestionScope::Session => f.write_str("session"),
            UsedQuestionScope::Global => f.write_str("global"),
        }
    }
}

impl FromStr for UsedQuestionScope {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "global" => Ok(Self::Global),
            other => Err(SettingsError::UnknownScope(other.to_owned())),
        }
    }
}

//
// ─── QUIZ SETTINGS ─────────────────────────────────────────────────────────────
//

pub const DEFAULT_MATCH_QUESTIONS: u32 = 10;
pub const DEFAULT_TURN_TIME_LIMIT_SECS: u32 = 10;

/// Engine-wide configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    leveling: LevelingSettings,
    used_scope: UsedQuestionScope,
    match_questions: u32,
    turn_time_limit_secs: u32,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            leveling: LevelingSettings::default(),
            used_scope: UsedQuestionScope::Session,
            match_questions: DEFAULT_MATCH_QUESTIONS,
            turn_time_limit_secs: DEFAULT_TURN_TIME_LIMIT_SECS,
        }
    }
}

impl QuizSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the match length is zero or the turn limit is
    /// outside 1..=600 seconds.
    pub fn new(
        leveling: LevelingSettings,
        used_scope: UsedQuestionScope,
        match_questions: u32,
        turn_time_limit_secs: u32,
    ) -> Result<Self, SettingsError> {
        if match_questions == 0 {
            return Err(SettingsError::InvalidMatchLength);
        }
        if !(1..=600).contains(&turn_time_limit_secs) {
            return Err(SettingsError::InvalidTurnTimeLimit);
        }
        Ok(Self {
            leveling,
            used_scope,
            match_questions,
            turn_time_limit_secs,
        })
    }

    #[must_use]
    pub fn with_used_scope(mut self, scope: UsedQuestionScope) -> Self {
        self.used_scope = scope;
        self
    }

    #[must_use]
    pub fn leveling(&self) -> LevelingSettings {
        self.leveling
    }

    #[must_use]
    pub fn used_scope(&self) -> UsedQuestionScope {
        self.used_scope
    }

    #[must_use]
    pub fn match_questions(&self) -> u32 {
        self.match_questions
    }

    #[must_use]
    pub fn turn_time_limit_secs(&self) -> u32 {
        self.turn_time_limit_secs
    }
}
