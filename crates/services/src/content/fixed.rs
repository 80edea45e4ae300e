use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use quiz_core::model::{QuestionRecord, Subject};

use super::QuestionSource;
use crate::error::ContentError;

/// In-memory pools keyed by (subject, level), for fixtures and tests.
///
/// Counts how many times a pool was requested so callers can check that the
/// bank generates each pool once.
#[derive(Debug, Default)]
pub struct StaticQuestionSource {
    pools: HashMap<(Subject, u32), Vec<QuestionRecord>>,
    calls: AtomicUsize,
}

impl StaticQuestionSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pool(mut self, subject: Subject, level: u32, questions: Vec<QuestionRecord>) -> Self {
        self.pools.insert((subject, level), questions);
        self
    }

    /// Number of `generate` calls served so far.
    #[must_use]
    pub fn generate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn generate(
        &self,
        subject: Subject,
        level: u32,
    ) -> Result<Vec<QuestionRecord>, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pools.get(&(subject, level)).cloned().unwrap_or_default())
    }
}
