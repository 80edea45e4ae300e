use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use quiz_core::model::{QuestionDraft, QuestionRecord, Subject};

use super::{QuestionSource, validate_all};
use crate::error::ContentError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentPack {
    Wrapped { questions: Vec<QuestionDraft> },
    Bare(Vec<QuestionDraft>),
}

impl ContentPack {
    fn into_drafts(self) -> Vec<QuestionDraft> {
        match self {
            ContentPack::Wrapped { questions } | ContentPack::Bare(questions) => questions,
        }
    }
}

/// Hand-authored questions loaded from a JSON content pack.
///
/// The pack is either an array of questions or an object with a `questions`
/// array. Every entry is validated up front; levels with no entries produce
/// an empty pool.
#[derive(Debug, Clone, Default)]
pub struct JsonQuestionSource {
    pools: HashMap<(Subject, u32), Vec<QuestionRecord>>,
}

impl JsonQuestionSource {
    /// # Errors
    ///
    /// Returns `ContentError::Parse` for malformed JSON and
    /// `ContentError::InvalidQuestion` for an entry that breaks a question
    /// invariant.
    pub fn from_json_str(raw: &str) -> Result<Self, ContentError> {
        let pack: ContentPack = serde_json::from_str(raw)?;
        let records = validate_all(pack.into_drafts())?;

        let mut pools: HashMap<(Subject, u32), Vec<QuestionRecord>> = HashMap::new();
        for record in records {
            pools
                .entry((record.subject(), record.level()))
                .or_default()
                .push(record);
        }
        Ok(Self { pools })
    }

    /// # Errors
    ///
    /// Returns `ContentError::Io` if the file cannot be read, otherwise as
    /// [`JsonQuestionSource::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl QuestionSource for JsonQuestionSource {
    async fn generate(
        &self,
        subject: Subject,
        level: u32,
    ) -> Result<Vec<QuestionRecord>, ContentError> {
        Ok(self.pools.get(&(subject, level)).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK: &str = r#"{
        "questions": [
            {
                "subject": "Math",
                "level": 3,
                "prompt": "What is 2 + 2?",
                "options": ["4", "3", "5", "22"],
                "correct_index": 0,
                "explanation": "2 + 2 = 4"
            },
            {
                "subject": "Grammar",
                "level": 3,
                "prompt": "Which is a verb?",
                "options": ["run", "cat"],
                "correct_index": 0
            }
        ]
    }"#;

    #[tokio::test]
    async fn pack_is_grouped_by_subject_and_level() {
        let source = JsonQuestionSource::from_json_str(PACK).unwrap();
        assert_eq!(source.question_count(), 2);

        let math = source.generate(Subject::Math, 3).await.unwrap();
        assert_eq!(math.len(), 1);
        assert_eq!(math[0].correct_answer(), "4");
        assert_eq!(math[0].explanation(), Some("2 + 2 = 4"));

        let grammar = source.generate(Subject::Grammar, 3).await.unwrap();
        assert_eq!(grammar[0].explanation(), None);

        assert!(source.generate(Subject::Math, 4).await.unwrap().is_empty());
    }

    #[test]
    fn bare_array_is_accepted() {
        let raw = r#"[{"subject":"Spelling","level":1,"prompt":"Spell cat","options":["cat","kat"],"correct_index":0}]"#;
        let source = JsonQuestionSource::from_json_str(raw).unwrap();
        assert_eq!(source.question_count(), 1);
    }

    #[test]
    fn invalid_entry_reports_its_index() {
        let raw = r#"[
            {"subject":"Math","level":1,"prompt":"ok","options":["1","2"],"correct_index":1},
            {"subject":"Math","level":1,"prompt":"bad","options":["1","2"],"correct_index":5}
        ]"#;
        let err = JsonQuestionSource::from_json_str(raw).unwrap_err();
        assert!(matches!(err, ContentError::InvalidQuestion { index: 1, .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = JsonQuestionSource::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ContentError::Parse(_)));
    }
}
