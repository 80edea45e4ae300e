use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use quiz_core::model::{QuestionId, QuestionRecord, Subject};

use crate::error::QuestionBankError;
use crate::question_bank::QuestionBank;

//
// ─── LEDGER ────────────────────────────────────────────────────────────────────
//

/// Ids of questions already handed out in the current selection scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedQuestionLedger {
    used: HashSet<QuestionId>,
}

impl UsedQuestionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.used.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }

    fn mark(&mut self, id: QuestionId) {
        self.used.insert(id);
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// How a question was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Not shown before in this scope; now recorded in the ledger.
    Fresh,
    /// The pool was exhausted, so an already shown question came back.
    Reused,
    /// The pool was empty.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedQuestion {
    pub question: QuestionRecord,
    pub selection: Selection,
}

/// Pick from `pool`: unused first, then any, then the fallback question.
///
/// Only a fresh pick touches the ledger.
pub fn select_from_pool<R: Rng + ?Sized>(
    pool: &[QuestionRecord],
    ledger: &mut UsedQuestionLedger,
    subject: Subject,
    level: u32,
    rng: &mut R,
) -> SelectedQuestion {
    let unused: Vec<&QuestionRecord> = pool.iter().filter(|q| !ledger.contains(q.id())).collect();

    if let Some(question) = unused.choose(rng) {
        ledger.mark(question.id());
        return SelectedQuestion {
            question: (*question).clone(),
            selection: Selection::Fresh,
        };
    }

    if let Some(question) = pool.choose(rng) {
        return SelectedQuestion {
            question: question.clone(),
            selection: Selection::Reused,
        };
    }

    SelectedQuestion {
        question: QuestionRecord::fallback(subject, level),
        selection: Selection::Fallback,
    }
}

//
// ─── SELECTOR ──────────────────────────────────────────────────────────────────
//

/// Non-repeating question picker over a shared `QuestionBank`.
pub struct QuestionSelector {
    bank: Arc<QuestionBank>,
    ledger: UsedQuestionLedger,
    rng: StdRng,
}

impl QuestionSelector {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self {
            bank,
            ledger: UsedQuestionLedger::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Same as [`QuestionSelector::new`] but with reproducible picks.
    #[must_use]
    pub fn with_seed(bank: Arc<QuestionBank>, seed: u64) -> Self {
        Self {
            bank,
            ledger: UsedQuestionLedger::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a question for `subject` at `level`.
    ///
    /// Subjects without question content get the fallback question without
    /// touching the bank.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` when the pool cannot be generated. An empty
    /// pool is not an error.
    pub async fn select(
        &mut self,
        subject: Subject,
        level: u32,
    ) -> Result<SelectedQuestion, QuestionBankError> {
        if !subject.has_question_content() {
            return Ok(SelectedQuestion {
                question: QuestionRecord::fallback(subject, level),
                selection: Selection::Fallback,
            });
        }

        let pool = self.bank.pool(subject, level).await?;
        Ok(select_from_pool(
            &pool,
            &mut self.ledger,
            subject,
            level,
            &mut self.rng,
        ))
    }

    pub fn reset_used_questions(&mut self) {
        self.ledger.clear();
    }

    #[must_use]
    pub fn ledger(&self) -> &UsedQuestionLedger {
        &self.ledger
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }
}

impl std::fmt::Debug for QuestionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionSelector")
            .field("used", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticQuestionSource;
    use quiz_core::model::QuestionDraft;

    fn pool(size: usize) -> Vec<QuestionRecord> {
        (0..size)
            .map(|i| {
                QuestionDraft {
                    subject: Subject::Math,
                    level: 3,
                    prompt: format!("question {i}"),
                    options: vec!["yes".into(), "no".into()],
                    correct_index: 0,
                    explanation: None,
                }
                .validate()
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn fresh_picks_never_repeat_until_exhausted() {
        let pool = pool(5);
        let mut ledger = UsedQuestionLedger::new();
        let mut rng = StdRng::seed_from_u64(3);

        let mut seen = HashSet::new();
        for _ in 0..5 {
            let picked = select_from_pool(&pool, &mut ledger, Subject::Math, 3, &mut rng);
            assert_eq!(picked.selection, Selection::Fresh);
            assert!(seen.insert(picked.question.id()));
        }
        assert_eq!(ledger.len(), 5);

        let reused = select_from_pool(&pool, &mut ledger, Subject::Math, 3, &mut rng);
        assert_eq!(reused.selection, Selection::Reused);
        assert!(seen.contains(&reused.question.id()));
        assert_eq!(ledger.len(), 5);
    }

    #[test]
    fn empty_pool_falls_back_without_touching_ledger() {
        let mut ledger = UsedQuestionLedger::new();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = select_from_pool(&[], &mut ledger, Subject::Spelling, 9, &mut rng);

        assert_eq!(picked.selection, Selection::Fallback);
        assert_eq!(picked.question.prompt(), "What is 1 + 1?");
        assert_eq!(picked.question.subject(), Subject::Spelling);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn memory_skips_the_bank() {
        let source = Arc::new(StaticQuestionSource::new());
        let bank = Arc::new(QuestionBank::new(source.clone()));
        let mut selector = QuestionSelector::with_seed(bank, 1);

        let picked = selector.select(Subject::Memory, 4).await.unwrap();
        assert_eq!(picked.selection, Selection::Fallback);
        assert_eq!(source.generate_calls(), 0);
    }

    #[tokio::test]
    async fn reset_allows_fresh_picks_again() {
        let source = Arc::new(StaticQuestionSource::new().with_pool(Subject::Math, 3, pool(2)));
        let bank = Arc::new(QuestionBank::new(source));
        let mut selector = QuestionSelector::with_seed(bank, 8);

        selector.select(Subject::Math, 3).await.unwrap();
        selector.select(Subject::Math, 3).await.unwrap();
        let third = selector.select(Subject::Math, 3).await.unwrap();
        assert_eq!(third.selection, Selection::Reused);

        selector.reset_used_questions();
        assert!(selector.ledger().is_empty());
        let fourth = selector.select(Subject::Math, 3).await.unwrap();
        assert_eq!(fourth.selection, Selection::Fresh);
    }
}
