use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quiz subject. Each subject keeps its own level on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    Grammar,
    Memory,
    Math,
    Spelling,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Grammar,
        Subject::Memory,
        Subject::Math,
        Subject::Spelling,
    ];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Subject::Grammar => "Grammar",
            Subject::Memory => "Memory",
            Subject::Math => "Math",
            Subject::Spelling => "Spelling",
        }
    }

    /// Stable lowercase key used in storage columns and CLI flags.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Subject::Grammar => "grammar",
            Subject::Memory => "memory",
            Subject::Math => "math",
            Subject::Spelling => "spelling",
        }
    }

    /// Memory is played as a card-matching game and has no question pools.
    #[must_use]
    pub fn has_question_content(self) -> bool {
        !matches!(self, Subject::Memory)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subject: {0}")]
pub struct ParseSubjectError(pub String);

impl FromStr for Subject {
    type Err = ParseSubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grammar" => Ok(Subject::Grammar),
            "memory" => Ok(Subject::Memory),
            "math" => Ok(Subject::Math),
            "spelling" => Ok(Subject::Spelling),
            _ => Err(ParseSubjectError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("MATH".parse::<Subject>().unwrap(), Subject::Math);
        assert_eq!(" Spelling ".parse::<Subject>().unwrap(), Subject::Spelling);
        assert!("history".parse::<Subject>().is_err());
    }

    #[test]
    fn key_round_trips() {
        for subject in Subject::ALL {
            assert_eq!(subject.key().parse::<Subject>().unwrap(), subject);
        }
    }

    #[test]
    fn only_memory_lacks_questions() {
        assert!(!Subject::Memory.has_question_content());
        assert!(Subject::Grammar.has_question_content());
    }
}
