//! Question sources feeding the `QuestionBank`.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use quiz_core::model::{QuestionDraft, QuestionRecord, Subject};

use crate::error::ContentError;

mod fixed;
mod language;
mod math;
mod pack;

pub use fixed::StaticQuestionSource;
pub use pack::JsonQuestionSource;

/// Upper bound on the size of a generated pool.
pub const POOL_CAP: usize = 100;

/// Number of options on a generated multiple-choice question.
pub const OPTION_COUNT: usize = 4;

/// Produces the candidate questions for one (subject, level).
///
/// An empty result is not an error: the selector answers it with the
/// fallback question.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `ContentError` when the source cannot produce a pool at all.
    async fn generate(
        &self,
        subject: Subject,
        level: u32,
    ) -> Result<Vec<QuestionRecord>, ContentError>;
}

/// Procedurally generated content for Math, Grammar and Spelling.
///
/// Memory has no question content and always yields an empty pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinQuestionSource {
    seed: Option<u64>,
}

impl BuiltinQuestionSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic pools: the same seed, subject and level always give the
    /// same questions (ids aside).
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng_for(&self, subject: Subject, level: u32) -> StdRng {
        match self.seed {
            Some(seed) => {
                let key = ((subject as u64) << 32) | u64::from(level);
                StdRng::seed_from_u64(seed ^ key)
            }
            None => StdRng::from_os_rng(),
        }
    }

    fn drafts(&self, subject: Subject, level: u32) -> Vec<QuestionDraft> {
        let mut rng = self.rng_for(subject, level);
        let mut drafts = match subject {
            Subject::Math => math::questions_for_level(level, &mut rng),
            Subject::Grammar => language::grammar_for_level(level, &mut rng),
            Subject::Spelling => language::spelling_for_level(level, &mut rng),
            Subject::Memory => Vec::new(),
        };
        drafts.shuffle(&mut rng);
        drafts.truncate(POOL_CAP);
        drafts
    }
}

#[async_trait]
impl QuestionSource for BuiltinQuestionSource {
    async fn generate(
        &self,
        subject: Subject,
        level: u32,
    ) -> Result<Vec<QuestionRecord>, ContentError> {
        validate_all(self.drafts(subject, level))
    }
}

pub(crate) fn validate_all(drafts: Vec<QuestionDraft>) -> Result<Vec<QuestionRecord>, ContentError> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            draft
                .validate()
                .map_err(|source| ContentError::InvalidQuestion { index, source })
        })
        .collect()
}

/// Four distinct non-negative answers around `correct`, shuffled.
///
/// Distractors step outwards from the correct value, alternating above and
/// below, by at most `variance`. Values that would go negative clamp to zero,
/// and small numbers are topped up from zero upwards.
pub fn unique_options<R: Rng + ?Sized>(correct: u32, variance: u32, rng: &mut R) -> Vec<String> {
    let variance = variance.max(1);
    let mut values = vec![correct];

    for attempt in 0..20_u32 {
        if values.len() >= OPTION_COUNT {
            break;
        }
        let step = attempt % variance + 1;
        let wrong = if attempt % 2 == 0 {
            correct.saturating_add(step)
        } else {
            correct.saturating_sub(step)
        };
        if !values.contains(&wrong) {
            values.push(wrong);
        }
    }

    let mut filler = 0_u32;
    while values.len() < OPTION_COUNT {
        if !values.contains(&filler) {
            values.push(filler);
        }
        filler += 1;
    }

    values.shuffle(rng);
    values.into_iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_options_are_distinct_and_contain_answer() {
        let mut rng = StdRng::seed_from_u64(42);
        for (correct, variance) in [(0, 2), (1, 1), (7, 3), (144, 36), (0, 0)] {
            let options = unique_options(correct, variance, &mut rng);
            assert_eq!(options.len(), OPTION_COUNT);
            assert!(options.contains(&correct.to_string()));
            let mut sorted = options.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), OPTION_COUNT, "duplicates for {correct}");
        }
    }

    #[test]
    fn unique_options_stay_close_to_answer() {
        let mut rng = StdRng::seed_from_u64(1);
        let options = unique_options(50, 5, &mut rng);
        for option in options {
            let value: i64 = option.parse().unwrap();
            assert!((value - 50).abs() <= 5);
        }
    }

    #[tokio::test]
    async fn memory_has_no_generated_content() {
        let source = BuiltinQuestionSource::seeded(1);
        let pool = source.generate(Subject::Memory, 5).await.unwrap();
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn pools_are_capped_and_tagged() {
        let source = BuiltinQuestionSource::seeded(1);
        for subject in [Subject::Math, Subject::Grammar, Subject::Spelling] {
            let pool = source.generate(subject, 12).await.unwrap();
            assert!(!pool.is_empty());
            assert!(pool.len() <= POOL_CAP);
            assert!(pool.iter().all(|q| q.subject() == subject && q.level() == 12));
        }
    }

    #[tokio::test]
    async fn seeded_sources_are_deterministic() {
        let a = BuiltinQuestionSource::seeded(99).generate(Subject::Math, 22).await.unwrap();
        let b = BuiltinQuestionSource::seeded(99).generate(Subject::Math, 22).await.unwrap();
        let prompts = |pool: &[QuestionRecord]| {
            pool.iter().map(|q| q.prompt().to_owned()).collect::<Vec<_>>()
        };
        assert_eq!(prompts(&a), prompts(&b));
    }
}
