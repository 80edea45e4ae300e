use tracing::{debug, info, warn};

use quiz_core::model::{
    AnsweredQuestion, LevelChangeResult, LevelState, QuestionRecord, QuizSession, QuizSettings,
    Subject, UsedQuestionScope,
};
use quiz_core::{AdaptiveLevelPolicy, Clock};

use crate::selector::{QuestionSelector, Selection};

/// Shown when a question could not be loaded.
pub const LOAD_ERROR_MESSAGE: &str = "Unable to load question. Please try again.";

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    AwaitingQuestion,
    QuestionReady,
    ResultShown,
    LoadFailed,
}

/// Outcome of a call that tries to put a question in front of the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    QuestionReady {
        question: QuestionRecord,
        selection: Selection,
    },
    LoadFailed {
        message: String,
    },
    NoActiveSession,
}

/// Feedback for a single answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub is_correct: bool,
    pub level_change: LevelChangeResult,
    pub explanation: Option<String>,
    pub correct_answer: String,
}

impl AnswerResult {
    fn neutral(level: u32) -> Self {
        Self {
            is_correct: false,
            level_change: LevelChangeResult::NoChange { level, streak: 0 },
            explanation: None,
            correct_answer: String::new(),
        }
    }
}

/// Live statistics for the running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub questions_answered: usize,
    pub correct_count: usize,
    pub current_level: u32,
    pub start_level: u32,
    pub streak: u32,
}

impl QuizProgress {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        quiz_core::model::ratio(self.correct_count, self.questions_answered)
    }

    #[must_use]
    pub fn level_change(&self) -> i64 {
        i64::from(self.current_level) - i64::from(self.start_level)
    }
}

/// Read-only snapshot for a UI to render.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizView {
    pub phase: QuizPhase,
    pub subject: Option<Subject>,
    pub question: Option<QuestionRecord>,
    pub is_loading: bool,
    pub last_result: Option<AnswerResult>,
    pub load_error: Option<String>,
    pub progress: QuizProgress,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one solo session: question, answer, level update, next question.
#[derive(Debug)]
pub struct QuizSessionController {
    settings: QuizSettings,
    policy: AdaptiveLevelPolicy,
    selector: QuestionSelector,
    clock: Clock,
    phase: QuizPhase,
    level_state: Option<LevelState>,
    session: Option<QuizSession>,
    current_question: Option<QuestionRecord>,
    last_result: Option<AnswerResult>,
    load_error: Option<String>,
}

impl QuizSessionController {
    #[must_use]
    pub fn new(settings: QuizSettings, selector: QuestionSelector, clock: Clock) -> Self {
        Self {
            policy: AdaptiveLevelPolicy::new(settings.leveling()),
            settings,
            selector,
            clock,
            phase: QuizPhase::Idle,
            level_state: None,
            session: None,
            current_question: None,
            last_result: None,
            load_error: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.current_question.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn level_state(&self) -> Option<LevelState> {
        self.level_state
    }

    #[must_use]
    pub fn selector(&self) -> &QuestionSelector {
        &self.selector
    }

    /// Mutable access to the clock, for stepping a fixed clock between answers.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Begin a session and load its first question.
    ///
    /// Any session still running is discarded.
    pub async fn start_session(&mut self, subject: Subject, start_level: u32) -> QuizEvent {
        if let Some(previous) = self.session.take() {
            warn!(session = %previous.id(), "starting a new session over an unfinished one");
        }

        if self.settings.used_scope() == UsedQuestionScope::Session {
            self.selector.reset_used_questions();
        }

        let state = self.policy.start(start_level);
        let session = QuizSession::new(
            subject,
            state.level(),
            self.settings.leveling(),
            self.clock.now(),
        );
        info!(session = %session.id(), %subject, level = state.level(), "quiz session started");

        self.level_state = Some(state);
        self.session = Some(session);
        self.current_question = None;
        self.last_result = None;
        self.load_error = None;

        self.load_question().await
    }

    /// Fetch a question at the current level. Also the manual retry after a
    /// failed load.
    pub async fn load_question(&mut self) -> QuizEvent {
        let (Some(session), Some(state)) = (self.session.as_ref(), self.level_state) else {
            warn!("load_question called without an active session");
            return QuizEvent::NoActiveSession;
        };
        let subject = session.subject();

        self.phase = QuizPhase::AwaitingQuestion;
        self.load_error = None;

        match self.selector.select(subject, state.level()).await {
            Ok(selected) => {
                if selected.selection != Selection::Fresh {
                    debug!(%subject, level = state.level(), selection = ?selected.selection, "no unused question available");
                }
                self.current_question = Some(selected.question.clone());
                self.phase = QuizPhase::QuestionReady;
                QuizEvent::QuestionReady {
                    question: selected.question,
                    selection: selected.selection,
                }
            }
            Err(err) => {
                warn!(error = %err, %subject, level = state.level(), "failed to load question");
                self.current_question = None;
                self.phase = QuizPhase::LoadFailed;
                self.load_error = Some(LOAD_ERROR_MESSAGE.to_owned());
                QuizEvent::LoadFailed {
                    message: LOAD_ERROR_MESSAGE.to_owned(),
                }
            }
        }
    }

    /// Answer the current question with option `selected_index`.
    ///
    /// Without a question awaiting an answer, nothing changes and a neutral
    /// result comes back.
    pub fn submit_answer(&mut self, selected_index: usize, response_time_ms: u64) -> AnswerResult {
        self.record(Some(selected_index), response_time_ms)
    }

    /// The turn timer ran out: counts as an incorrect answer.
    pub fn submit_timeout(&mut self, response_time_ms: u64) -> AnswerResult {
        self.record(None, response_time_ms)
    }

    fn record(&mut self, selected_index: Option<usize>, response_time_ms: u64) -> AnswerResult {
        let neutral = AnswerResult::neutral(self.policy.min_level());
        if self.phase != QuizPhase::QuestionReady {
            warn!(phase = ?self.phase, "answer submitted with no question on screen");
            return neutral;
        }
        let (Some(question), Some(state), Some(session)) = (
            self.current_question.take(),
            self.level_state,
            self.session.take(),
        ) else {
            warn!("answer submitted without an active session");
            return neutral;
        };

        let correct = selected_index.is_some_and(|i| question.is_correct(i));
        let (next, change) = self.policy.record_answer(state, correct);

        let result = AnswerResult {
            is_correct: correct,
            level_change: change,
            explanation: question.explanation().map(str::to_owned),
            correct_answer: question.correct_answer().to_owned(),
        };

        let answer = AnsweredQuestion::new(question, selected_index, self.clock.now(), response_time_ms);
        match session.record_answer(answer, next.level()) {
            Ok(session) => self.session = Some(session),
            Err(err) => {
                warn!(error = %err, "session rejected the answer");
                self.phase = QuizPhase::Idle;
                self.level_state = None;
                return neutral;
            }
        }

        if change.did_level_change() {
            debug!(from = state.level(), to = next.level(), "level changed");
        }

        self.level_state = Some(next);
        self.last_result = Some(result.clone());
        self.phase = QuizPhase::ResultShown;
        result
    }

    /// Dismiss the answer feedback and load the next question.
    pub async fn continue_after_result(&mut self) -> QuizEvent {
        self.last_result = None;
        self.load_question().await
    }

    /// Finish the session and hand it back for persistence.
    pub fn end_session(&mut self) -> Option<QuizSession> {
        let session = self.session.take();
        self.phase = QuizPhase::Idle;
        self.level_state = None;
        self.current_question = None;
        self.last_result = None;
        self.load_error = None;

        let session = session?;
        match session.end(self.clock.now()) {
            Ok(ended) => {
                info!(
                    session = %ended.id(),
                    subject = %ended.subject(),
                    answered = ended.total_questions(),
                    correct = ended.correct_count(),
                    level = ended.current_level(),
                    "quiz session ended"
                );
                Some(ended)
            }
            Err(err) => {
                warn!(error = %err, "could not end session");
                None
            }
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let min = self.policy.min_level();
        match (&self.session, self.level_state) {
            (Some(session), Some(state)) => QuizProgress {
                questions_answered: session.total_questions(),
                correct_count: session.correct_count(),
                current_level: state.level(),
                start_level: session.start_level(),
                streak: state.consecutive_correct(),
            },
            _ => QuizProgress {
                questions_answered: 0,
                correct_count: 0,
                current_level: min,
                start_level: min,
                streak: 0,
            },
        }
    }

    #[must_use]
    pub fn view(&self) -> QuizView {
        QuizView {
            phase: self.phase,
            subject: self.session.as_ref().map(QuizSession::subject),
            question: self.current_question.clone(),
            is_loading: self.phase == QuizPhase::AwaitingQuestion,
            last_result: self.last_result.clone(),
            load_error: self.load_error.clone(),
            progress: self.progress(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::content::StaticQuestionSource;
    use crate::question_bank::QuestionBank;
    use quiz_core::time::fixed_clock;

    fn controller(source: StaticQuestionSource) -> QuizSessionController {
        let bank = Arc::new(QuestionBank::new(Arc::new(source)));
        QuizSessionController::new(
            QuizSettings::default(),
            QuestionSelector::with_seed(bank, 5),
            fixed_clock(),
        )
    }

    #[test]
    fn answer_without_question_is_neutral() {
        let mut quiz = controller(StaticQuestionSource::new());
        let result = quiz.submit_answer(0, 100);

        assert!(!result.is_correct);
        assert_eq!(
            result.level_change,
            LevelChangeResult::NoChange { level: 1, streak: 0 }
        );
        assert_eq!(result.explanation, None);
        assert!(result.correct_answer.is_empty());
        assert_eq!(quiz.phase(), QuizPhase::Idle);
    }

    #[test]
    fn idle_progress_reports_minimum_level() {
        let quiz = controller(StaticQuestionSource::new());
        let progress = quiz.progress();
        assert_eq!(progress.questions_answered, 0);
        assert_eq!(progress.current_level, 1);
        assert_eq!(progress.start_level, 1);
        assert!(progress.accuracy().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn answers_and_end_are_stamped_with_the_controller_clock() {
        let mut quiz = controller(StaticQuestionSource::new());
        quiz.start_session(Subject::Math, 4).await;
        let started = quiz.session().unwrap().started_at();

        quiz.clock_mut().advance(chrono::Duration::seconds(90));
        quiz.submit_answer(0, 90_000);
        quiz.clock_mut().advance(chrono::Duration::seconds(10));
        let session = quiz.end_session().unwrap();

        assert_eq!(
            session.answers()[0].answered_at(),
            started + chrono::Duration::seconds(90)
        );
        assert_eq!(session.ended_at(), Some(started + chrono::Duration::seconds(100)));
    }

    #[tokio::test]
    async fn empty_pool_serves_fallback_question() {
        let mut quiz = controller(StaticQuestionSource::new());
        let event = quiz.start_session(Subject::Grammar, 7).await;

        let QuizEvent::QuestionReady { question, selection } = event else {
            panic!("expected a question, got {event:?}");
        };
        assert_eq!(selection, Selection::Fallback);
        assert_eq!(question.correct_answer(), "2");

        let result = quiz.submit_answer(0, 900);
        assert!(result.is_correct);
        assert_eq!(result.explanation.as_deref(), Some("1 + 1 = 2"));
        assert_eq!(quiz.view().phase, QuizPhase::ResultShown);
    }

    #[tokio::test]
    async fn second_submit_is_ignored() {
        let mut quiz = controller(StaticQuestionSource::new());
        quiz.start_session(Subject::Math, 4).await;

        quiz.submit_answer(1, 500);
        let again = quiz.submit_answer(0, 500);
        assert_eq!(
            again.level_change,
            LevelChangeResult::NoChange { level: 1, streak: 0 }
        );
        assert_eq!(quiz.progress().questions_answered, 1);
    }

    #[tokio::test]
    async fn timeout_counts_as_incorrect() {
        let mut quiz = controller(StaticQuestionSource::new());
        quiz.start_session(Subject::Spelling, 5).await;

        let result = quiz.submit_timeout(10_000);
        assert!(!result.is_correct);
        assert_eq!(
            result.level_change,
            LevelChangeResult::LeveledDown { from: 5, to: 4 }
        );

        let session = quiz.end_session().unwrap();
        assert_eq!(session.answers()[0].selected_index(), None);
        assert_eq!(session.current_level(), 4);
        assert_eq!(quiz.phase(), QuizPhase::Idle);
    }

    #[tokio::test]
    async fn end_without_session_returns_none() {
        let mut quiz = controller(StaticQuestionSource::new());
        assert!(quiz.end_session().is_none());
        assert_eq!(quiz.load_question().await, QuizEvent::NoActiveSession);
    }
}
