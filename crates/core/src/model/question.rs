use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuestionId, Subject};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least 2 options, got {0}")]
    TooFewOptions(usize),

    #[error("correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("question level must be >= 1")]
    InvalidLevel,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question, as authored in a content pack or produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub subject: Subject,
    pub level: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Check the option/index invariant and assign a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options are
    /// given, the correct index is out of range, or the level is zero.
    pub fn validate(self) -> Result<QuestionRecord, QuestionError> {
        self.validate_with_id(QuestionId::new_v4())
    }

    /// Like [`QuestionDraft::validate`] but keeps a caller-supplied id.
    ///
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn validate_with_id(self, id: QuestionId) -> Result<QuestionRecord, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions(self.options.len()));
        }
        if self.correct_index >= self.options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                len: self.options.len(),
            });
        }
        if self.level == 0 {
            return Err(QuestionError::InvalidLevel);
        }

        let explanation = self
            .explanation
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        Ok(QuestionRecord {
            id,
            subject: self.subject,
            level: self.level,
            prompt: self.prompt,
            options: self.options,
            correct_index: self.correct_index,
            explanation,
        })
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Always satisfies `correct_index < options.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRecord {
    id: QuestionId,
    subject: Subject,
    level: u32,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: Option<String>,
}

impl QuestionRecord {
    /// The question handed out when a pool has nothing to offer.
    #[must_use]
    pub fn fallback(subject: Subject, level: u32) -> Self {
        Self {
            id: QuestionId::new_v4(),
            subject,
            level: level.max(1),
            prompt: "What is 1 + 1?".to_owned(),
            options: vec!["2".into(), "3".into(), "1".into(), "4".into()],
            correct_index: 0,
            explanation: Some("1 + 1 = 2".to_owned()),
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn is_correct(&self, selected_index: usize) -> bool {
        selected_index == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
