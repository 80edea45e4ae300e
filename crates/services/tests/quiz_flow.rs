use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quiz_core::model::{
    LevelChangeResult, QuestionDraft, QuestionRecord, QuizSettings, Subject, UsedQuestionScope,
};
use quiz_core::time::fixed_clock;
use services::{
    ContentError, LOAD_ERROR_MESSAGE, QuestionBank, QuestionSelector, QuestionSource, QuizEvent,
    QuizPhase, QuizSessionController, Selection, StaticQuestionSource,
};

fn question(level: u32, n: usize) -> QuestionRecord {
    QuestionDraft {
        subject: Subject::Math,
        level,
        prompt: format!("level {level} question {n}"),
        options: vec!["a".into(), "b".into(), "c".into()],
        correct_index: n % 3,
        explanation: Some(format!("answer is option {}", n % 3)),
    }
    .validate()
    .unwrap()
}

fn math_pools(levels: std::ops::RangeInclusive<u32>, size: usize) -> StaticQuestionSource {
    levels.fold(StaticQuestionSource::new(), |source, level| {
        source.with_pool(
            Subject::Math,
            level,
            (0..size).map(|n| question(level, n)).collect(),
        )
    })
}

fn controller(source: impl QuestionSource + 'static, settings: QuizSettings) -> QuizSessionController {
    let bank = Arc::new(QuestionBank::new(Arc::new(source)));
    QuizSessionController::new(settings, QuestionSelector::with_seed(bank, 17), fixed_clock())
}

fn ready(event: QuizEvent) -> (QuestionRecord, Selection) {
    match event {
        QuizEvent::QuestionReady { question, selection } => (question, selection),
        other => panic!("expected a question, got {other:?}"),
    }
}

#[tokio::test]
async fn two_correct_level_up_then_one_wrong_levels_down() {
    let mut quiz = controller(math_pools(9..=12, 5), QuizSettings::default());

    let (q1, _) = ready(quiz.start_session(Subject::Math, 10).await);
    assert_eq!(q1.level(), 10);
    let first = quiz.submit_answer(q1.correct_index(), 1_200);
    assert!(first.is_correct);
    assert_eq!(first.level_change, LevelChangeResult::NoChange { level: 10, streak: 1 });
    assert_eq!(first.level_change.message().as_deref(), Some("1 in a row!"));

    let (q2, _) = ready(quiz.continue_after_result().await);
    let second = quiz.submit_answer(q2.correct_index(), 900);
    assert_eq!(second.level_change, LevelChangeResult::LeveledUp { from: 10, to: 11 });
    assert_eq!(
        second.level_change.message().as_deref(),
        Some("Level Up! Now at Level 11")
    );

    let (q3, _) = ready(quiz.continue_after_result().await);
    assert_eq!(q3.level(), 11);
    let wrong = (q3.correct_index() + 1) % q3.options().len();
    let third = quiz.submit_answer(wrong, 3_000);
    assert!(!third.is_correct);
    assert_eq!(third.level_change, LevelChangeResult::LeveledDown { from: 11, to: 10 });
    assert_eq!(third.correct_answer, q3.correct_answer());

    let progress = quiz.progress();
    assert_eq!(progress.questions_answered, 3);
    assert_eq!(progress.correct_count, 2);
    assert_eq!(progress.level_change(), 0);

    let session = quiz.end_session().expect("session");
    assert_eq!(session.current_level(), 10);
    assert_eq!(session.total_questions(), 3);
    assert_eq!(session.correct_count(), 2);
    assert_eq!(session.incorrect_count(), 1);
    assert!(!session.is_active());
    assert_eq!(quiz.phase(), QuizPhase::Idle);
}

#[tokio::test]
async fn session_serves_each_question_once_before_reusing() {
    let mut quiz = controller(math_pools(1..=1, 3), QuizSettings::default());

    let (first, selection) = ready(quiz.start_session(Subject::Math, 1).await);
    assert_eq!(selection, Selection::Fresh);
    let mut seen = vec![first.id()];

    // Timeouts at the bottom level keep the player on level 1.
    for _ in 0..2 {
        let result = quiz.submit_timeout(10_000);
        assert_eq!(result.level_change, LevelChangeResult::AtMinLevel { level: 1 });
        let (q, selection) = ready(quiz.continue_after_result().await);
        assert_eq!(selection, Selection::Fresh);
        assert!(!seen.contains(&q.id()));
        seen.push(q.id());
    }

    quiz.submit_timeout(10_000);
    let (q, selection) = ready(quiz.continue_after_result().await);
    assert_eq!(selection, Selection::Reused);
    assert!(seen.contains(&q.id()));
    assert_eq!(quiz.selector().ledger().len(), 3);
}

#[tokio::test]
async fn fifth_pick_from_four_questions_is_reused() {
    let bank = Arc::new(QuestionBank::new(Arc::new(math_pools(5..=5, 4))));
    let mut selector = QuestionSelector::with_seed(bank, 4);

    let mut seen = Vec::new();
    for _ in 0..4 {
        let picked = selector.select(Subject::Math, 5).await.unwrap();
        assert_eq!(picked.selection, Selection::Fresh);
        assert!(!seen.contains(&picked.question.id()));
        seen.push(picked.question.id());
    }

    let fifth = selector.select(Subject::Math, 5).await.unwrap();
    assert_eq!(fifth.selection, Selection::Reused);
    assert!(seen.contains(&fifth.question.id()));
}

#[tokio::test]
async fn missing_pool_serves_the_fallback_question() {
    let mut quiz = controller(StaticQuestionSource::new(), QuizSettings::default());

    let (question, selection) = ready(quiz.start_session(Subject::Math, 30).await);
    assert_eq!(selection, Selection::Fallback);
    assert_eq!(question.prompt(), "What is 1 + 1?");
    assert_eq!(question.options(), ["2", "3", "1", "4"]);
    assert_eq!(question.explanation(), Some("1 + 1 = 2"));
}

#[tokio::test]
async fn session_scope_resets_ledger_but_global_scope_keeps_it() {
    for (scope, expected) in [
        (UsedQuestionScope::Session, Selection::Fresh),
        (UsedQuestionScope::Global, Selection::Reused),
    ] {
        let settings = QuizSettings::default().with_used_scope(scope);
        let mut quiz = controller(math_pools(7..=7, 1), settings);

        let (_, first) = ready(quiz.start_session(Subject::Math, 7).await);
        assert_eq!(first, Selection::Fresh);
        quiz.end_session();

        let (_, second) = ready(quiz.start_session(Subject::Math, 7).await);
        assert_eq!(second, expected, "scope {scope}");
    }
}

struct FlakySource {
    calls: AtomicUsize,
}

#[async_trait]
impl QuestionSource for FlakySource {
    async fn generate(
        &self,
        subject: Subject,
        level: u32,
    ) -> Result<Vec<QuestionRecord>, ContentError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ContentError::Unavailable("warming up".to_owned()));
        }
        assert_eq!(subject, Subject::Math);
        Ok(vec![question(level, 0)])
    }
}

#[tokio::test]
async fn load_failure_is_surfaced_and_retry_succeeds() {
    let mut quiz = controller(
        FlakySource {
            calls: AtomicUsize::new(0),
        },
        QuizSettings::default(),
    );

    let event = quiz.start_session(Subject::Math, 3).await;
    assert_eq!(
        event,
        QuizEvent::LoadFailed {
            message: LOAD_ERROR_MESSAGE.to_owned()
        }
    );
    let view = quiz.view();
    assert_eq!(view.phase, QuizPhase::LoadFailed);
    assert_eq!(view.load_error.as_deref(), Some(LOAD_ERROR_MESSAGE));
    assert!(view.question.is_none());

    let (question, selection) = ready(quiz.load_question().await);
    assert_eq!(selection, Selection::Fresh);
    assert_eq!(question.level(), 3);
    assert!(quiz.view().load_error.is_none());
}
