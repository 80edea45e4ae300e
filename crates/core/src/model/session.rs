use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{LevelingSettings, ProfileId, QuestionRecord, SessionId, Subject};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("session has already ended")]
    AlreadyEnded,

    #[error("session is still active")]
    StillActive,

    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed total answers ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("too many answers for a single session: {len}")]
    TooManyAnswers { len: usize },
}

//
// ─── ANSWERED QUESTION ─────────────────────────────────────────────────────────
//

/// One submitted answer, with the question as it was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredQuestion {
    question: QuestionRecord,
    selected_index: Option<usize>,
    is_correct: bool,
    answered_at: DateTime<Utc>,
    response_time_ms: u64,
}

impl AnsweredQuestion {
    /// `selected_index` is `None` when the player ran out of time, which always
    /// counts as incorrect.
    #[must_use]
    pub fn new(
        question: QuestionRecord,
        selected_index: Option<usize>,
        answered_at: DateTime<Utc>,
        response_time_ms: u64,
    ) -> Self {
        let is_correct = selected_index.is_some_and(|index| question.is_correct(index));
        Self {
            question,
            selected_index,
            is_correct,
            answered_at,
            response_time_ms,
        }
    }

    #[must_use]
    pub fn question(&self) -> &QuestionRecord {
        &self.question
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn answered_at(&self) -> DateTime<Utc> {
        self.answered_at
    }

    #[must_use]
    pub fn response_time_ms(&self) -> u64 {
        self.response_time_ms
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One continuous run of questions in a single subject.
///
/// Transitions consume the session and hand back the next value, so a caller
/// holding an old snapshot never observes later answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSession {
    id: SessionId,
    subject: Subject,
    start_level: u32,
    current_level: u32,
    answers: Vec<AnsweredQuestion>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    bounds: LevelingSettings,
}

impl QuizSession {
    /// Start a session. `start_level` is clamped into `bounds`.
    #[must_use]
    pub fn new(
        subject: Subject,
        start_level: u32,
        bounds: LevelingSettings,
        started_at: DateTime<Utc>,
    ) -> Self {
        let start_level = bounds.clamp(start_level);
        Self {
            id: SessionId::new_v4(),
            subject,
            start_level,
            current_level: start_level,
            answers: Vec::new(),
            started_at,
            ended_at: None,
            bounds,
        }
    }

    /// Append an answer and move the level.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::AlreadyEnded` once the session has ended.
    pub fn record_answer(
        mut self,
        answer: AnsweredQuestion,
        new_level: u32,
    ) -> Result<Self, QuizSessionError> {
        if !self.is_active() {
            return Err(QuizSessionError::AlreadyEnded);
        }
        self.answers.push(answer);
        self.current_level = self.bounds.clamp(new_level);
        Ok(self)
    }

    /// Close the session. Ending is one-way.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::AlreadyEnded` if called twice, or
    /// `QuizSessionError::InvalidTimeRange` if `at` precedes the start.
    pub fn end(mut self, at: DateTime<Utc>) -> Result<Self, QuizSessionError> {
        if !self.is_active() {
            return Err(QuizSessionError::AlreadyEnded);
        }
        if at < self.started_at {
            return Err(QuizSessionError::InvalidTimeRange);
        }
        self.ended_at = Some(at);
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn start_level(&self) -> u32 {
        self.start_level
    }

    #[must_use]
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct()).count()
    }

    #[must_use]
    pub fn incorrect_count(&self) -> usize {
        self.total_questions() - self.correct_count()
    }

    /// Fraction of correct answers; `0.0` before the first answer.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct_count(), self.total_questions())
    }

    /// Signed distance from the starting level.
    #[must_use]
    pub fn level_change(&self) -> i64 {
        i64::from(self.current_level) - i64::from(self.start_level)
    }

    /// Mean response time over all answers, if any.
    #[must_use]
    pub fn average_response_time_ms(&self) -> Option<u64> {
        let total = self
            .answers
            .iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.response_time_ms()));
        let count = u64::try_from(self.answers.len()).ok().filter(|n| *n > 0)?;
        Some(total / count)
    }
}

/// `part / whole`, or 0 when `whole` is 0.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Persisted aggregate of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    session_id: SessionId,
    profile_id: Option<ProfileId>,
    subject: Subject,
    start_level: u32,
    end_level: u32,
    total_questions: u32,
    correct_count: u32,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Summarise an ended session.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::StillActive` for a running session and
    /// `QuizSessionError::TooManyAnswers` if counts do not fit in `u32`.
    pub fn from_session(
        session: &QuizSession,
        profile_id: Option<ProfileId>,
    ) -> Result<Self, QuizSessionError> {
        let ended_at = session.ended_at().ok_or(QuizSessionError::StillActive)?;
        let len = session.total_questions();
        let total_questions =
            u32::try_from(len).map_err(|_| QuizSessionError::TooManyAnswers { len })?;
        let correct_count = u32::try_from(session.correct_count())
            .map_err(|_| QuizSessionError::TooManyAnswers { len })?;

        Self::from_persisted(
            session.id(),
            profile_id,
            session.subject(),
            session.start_level(),
            session.current_level(),
            total_questions,
            correct_count,
            session.started_at(),
            ended_at,
        )
    }

    /// Rehydrate a summary from storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError` if timestamps are inverted or counts disagree.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        session_id: SessionId,
        profile_id: Option<ProfileId>,
        subject: Subject,
        start_level: u32,
        end_level: u32,
        total_questions: u32,
        correct_count: u32,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<Self, QuizSessionError> {
        if ended_at < started_at {
            return Err(QuizSessionError::InvalidTimeRange);
        }
        if correct_count > total_questions {
            return Err(QuizSessionError::CountMismatch {
                correct: correct_count,
                total: total_questions,
            });
        }
        Ok(Self {
            session_id,
            profile_id,
            subject,
            start_level,
            end_level,
            total_questions,
            correct_count,
            started_at,
            ended_at,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn start_level(&self) -> u32 {
        self.start_level
    }

    #[must_use]
    pub fn end_level(&self) -> u32 {
        self.end_level
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct_count as usize, self.total_questions as usize)
    }

    #[must_use]
    pub fn level_change(&self) -> i64 {
        i64::from(self.end_level) - i64::from(self.start_level)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn question() -> QuestionRecord {
        QuestionDraft {
            subject: Subject::Math,
            level: 10,
            prompt: "What is 3 + 4?".into(),
            options: vec!["7".into(), "6".into(), "8".into()],
            correct_index: 0,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    fn answer(correct: bool) -> AnsweredQuestion {
        let selected = if correct { 0 } else { 1 };
        AnsweredQuestion::new(question(), Some(selected), fixed_now(), 1200)
    }

    fn session() -> QuizSession {
        QuizSession::new(Subject::Math, 10, LevelingSettings::default(), fixed_now())
    }

    #[test]
    fn average_response_time_saturates_on_huge_values() {
        let slow = AnsweredQuestion::new(question(), None, fixed_now(), u64::MAX);
        let s = session()
            .record_answer(slow.clone(), 10)
            .unwrap()
            .record_answer(slow, 10)
            .unwrap();
        assert_eq!(s.average_response_time_ms(), Some(u64::MAX / 2));
        assert_eq!(session().average_response_time_ms(), None);
    }

    #[test]
    fn accuracy_over_mixed_answers() {
        let mut s = session();
        for correct in [true, false, true, true] {
            s = s.record_answer(answer(correct), 10).unwrap();
        }
        assert_eq!(s.correct_count(), 3);
        assert_eq!(s.incorrect_count(), 1);
        assert!((s.accuracy() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_session_has_zero_accuracy() {
        let s = session();
        assert_eq!(s.accuracy(), 0.0);
        assert_eq!(s.average_response_time_ms(), None);
        assert!(s.is_active());
    }

    #[test]
    fn timeout_counts_as_incorrect() {
        let a = AnsweredQuestion::new(question(), None, fixed_now(), 10_000);
        assert!(!a.is_correct());
    }

    #[test]
    fn level_change_is_signed_and_clamped() {
        let s = session().record_answer(answer(false), 9).unwrap();
        assert_eq!(s.level_change(), -1);
        let s = s.record_answer(answer(true), 500).unwrap();
        assert_eq!(s.current_level(), 65);
    }

    #[test]
    fn ended_session_rejects_answers() {
        let s = session().end(fixed_now() + Duration::seconds(5)).unwrap();
        assert!(!s.is_active());
        let err = s.clone().record_answer(answer(true), 10).unwrap_err();
        assert_eq!(err, QuizSessionError::AlreadyEnded);
        assert_eq!(s.end(fixed_now()).unwrap_err(), QuizSessionError::AlreadyEnded);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = session().end(fixed_now() - Duration::seconds(1)).unwrap_err();
        assert_eq!(err, QuizSessionError::InvalidTimeRange);
    }

    #[test]
    fn summary_requires_ended_session() {
        let s = session().record_answer(answer(true), 10).unwrap();
        assert_eq!(
            SessionSummary::from_session(&s, None).unwrap_err(),
            QuizSessionError::StillActive
        );

        let s = s.end(fixed_now()).unwrap();
        let summary = SessionSummary::from_session(&s, None).unwrap();
        assert_eq!(summary.total_questions(), 1);
        assert_eq!(summary.correct_count(), 1);
        assert_eq!(summary.end_level(), 10);
        assert_eq!(summary.session_id(), s.id());
    }

    #[test]
    fn persisted_summary_checks_counts() {
        let err = SessionSummary::from_persisted(
            SessionId::new_v4(),
            None,
            Subject::Grammar,
            1,
            2,
            3,
            4,
            fixed_now(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuizSessionError::CountMismatch { correct: 4, total: 3 });
    }
}
