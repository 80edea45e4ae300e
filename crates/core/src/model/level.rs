use serde::{Deserialize, Serialize};
use std::fmt;

/// Current difficulty level plus the running streak of correct answers.
///
/// Only [`crate::AdaptiveLevelPolicy`] produces new states, which keeps the
/// level inside the policy's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    level: u32,
    consecutive_correct: u32,
}

impl LevelState {
    pub(crate) fn new(level: u32, consecutive_correct: u32) -> Self {
        Self {
            level,
            consecutive_correct,
        }
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }
}

/// What a single answer did to the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelChangeResult {
    NoChange { level: u32, streak: u32 },
    LeveledUp { from: u32, to: u32 },
    LeveledDown { from: u32, to: u32 },
    AtMaxLevel { level: u32 },
    AtMinLevel { level: u32 },
}

impl LevelChangeResult {
    /// Level after the answer, whatever the variant.
    #[must_use]
    pub fn current_level(&self) -> u32 {
        match *self {
            LevelChangeResult::NoChange { level, .. }
            | LevelChangeResult::AtMaxLevel { level }
            | LevelChangeResult::AtMinLevel { level } => level,
            LevelChangeResult::LeveledUp { to, .. } | LevelChangeResult::LeveledDown { to, .. } => {
                to
            }
        }
    }

    #[must_use]
    pub fn did_level_change(&self) -> bool {
        matches!(
            self,
            LevelChangeResult::LeveledUp { .. } | LevelChangeResult::LeveledDown { .. }
        )
    }

    /// Player-facing banner text, if the change is worth announcing.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match *self {
            LevelChangeResult::LeveledUp { to, .. } => Some(format!("Level Up! Now at Level {to}")),
            LevelChangeResult::LeveledDown { to, .. } => {
                Some(format!("Level Down. Now at Level {to}"))
            }
            LevelChangeResult::AtMaxLevel { .. } => Some("Maximum Level Reached!".to_owned()),
            LevelChangeResult::AtMinLevel { .. } => None,
            LevelChangeResult::NoChange { streak, .. } if streak > 0 => {
                Some(format!("{streak} in a row!"))
            }
            LevelChangeResult::NoChange { .. } => None,
        }
    }
}

impl fmt::Display for LevelChangeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(&message),
            None => write!(f, "Level {}", self.current_level()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_level_per_variant() {
        assert_eq!(LevelChangeResult::NoChange { level: 4, streak: 1 }.current_level(), 4);
        assert_eq!(LevelChangeResult::LeveledUp { from: 4, to: 5 }.current_level(), 5);
        assert_eq!(LevelChangeResult::LeveledDown { from: 4, to: 3 }.current_level(), 3);
        assert_eq!(LevelChangeResult::AtMaxLevel { level: 65 }.current_level(), 65);
        assert_eq!(LevelChangeResult::AtMinLevel { level: 1 }.current_level(), 1);
    }

    #[test]
    fn only_moves_count_as_changes() {
        assert!(LevelChangeResult::LeveledUp { from: 1, to: 2 }.did_level_change());
        assert!(LevelChangeResult::LeveledDown { from: 2, to: 1 }.did_level_change());
        assert!(!LevelChangeResult::AtMaxLevel { level: 65 }.did_level_change());
        assert!(!LevelChangeResult::NoChange { level: 3, streak: 1 }.did_level_change());
    }

    #[test]
    fn messages() {
        assert_eq!(
            LevelChangeResult::LeveledUp { from: 10, to: 11 }.message().as_deref(),
            Some("Level Up! Now at Level 11")
        );
        assert_eq!(
            LevelChangeResult::LeveledDown { from: 11, to: 10 }.message().as_deref(),
            Some("Level Down. Now at Level 10")
        );
        assert_eq!(
            LevelChangeResult::AtMaxLevel { level: 65 }.message().as_deref(),
            Some("Maximum Level Reached!")
        );
        assert_eq!(LevelChangeResult::AtMinLevel { level: 1 }.message(), None);
        assert_eq!(
            LevelChangeResult::NoChange { level: 3, streak: 1 }.message().as_deref(),
            Some("1 in a row!")
        );
        assert_eq!(LevelChangeResult::NoChange { level: 3, streak: 0 }.message(), None);
    }
}
