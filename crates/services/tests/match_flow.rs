use std::sync::Arc;

use quiz_core::model::{LevelChangeResult, Placement, QuizSettings, Subject};
use quiz_core::time::fixed_clock;
use services::{
    AppServices, MatchError, MemoryBoard, MemoryMatch, SeatConfig, Selection,
    StaticQuestionSource, TurnAdvance,
};

fn services() -> AppServices {
    AppServices::in_memory(
        fixed_clock(),
        QuizSettings::default(),
        Arc::new(StaticQuestionSource::new()),
    )
}

#[tokio::test]
async fn match_rotates_turns_and_awards_trophies() {
    let app = services();
    let profiles = app.profiles();
    let ada = profiles.create_profile(Some("Ada")).await.unwrap();
    let bo = profiles.create_profile(Some("Bo")).await.unwrap();

    let mut game = app
        .multiplayer_match(
            Subject::Math,
            vec![
                SeatConfig::for_profile("Ada", ada.id(), 1),
                SeatConfig::for_profile("Bo", bo.id(), 3),
                SeatConfig::guest("Guest", 2),
            ],
            Some(9),
        )
        .unwrap();
    assert_eq!(game.total_questions(), 10);
    assert_eq!(game.turn_time_limit_secs(), 10);

    let mut turns = Vec::new();
    loop {
        let seat = game.current_seat();
        turns.push(seat);
        // Empty pools mean every turn gets the fallback question.
        let selected = game.load_turn_question().await.unwrap();
        assert_eq!(selected.selection, Selection::Fallback);

        let outcome = match seat {
            0 => game.answer(selected.question.correct_index()).unwrap(),
            1 => game.time_out().unwrap(),
            _ => game.answer(selected.question.correct_index() + 1).unwrap(),
        };
        assert_eq!(outcome.seat, seat);
        assert_eq!(outcome.correct_answer, "2");
        assert!(matches!(game.answer(0), Err(MatchError::AlreadyAnswered)));

        match game.advance().unwrap() {
            TurnAdvance::NextPlayer { seat: next } => assert_eq!(next, (seat + 1) % 3),
            TurnAdvance::Finished => break,
        }
    }

    assert_eq!(turns, [0, 1, 2, 0, 1, 2, 0, 1, 2, 0]);
    assert!(game.is_finished());
    assert!(matches!(game.advance(), Err(MatchError::Finished)));

    let seats = game.seats();
    assert_eq!(seats[0].score(), 4);
    assert_eq!(seats[0].level(), 3);
    assert_eq!(seats[1].score(), 0);
    assert_eq!(seats[1].level(), 1);
    assert_eq!(seats[2].level(), 1);

    let standings = game.standings();
    assert_eq!(standings[0].name, "Ada");
    assert_eq!(standings[0].placement, Some(Placement::Gold));
    // Bo and the guest tie on zero, so seat order decides.
    assert_eq!(standings[1].name, "Bo");
    assert_eq!(standings[2].name, "Guest");
    assert_eq!(standings[2].placement, Some(Placement::Bronze));

    let placements = game.placements();
    assert_eq!(
        placements,
        vec![(ada.id(), Placement::Gold), (bo.id(), Placement::Silver)]
    );
    profiles.award_placements(&placements).await.unwrap();

    let all = profiles.list_profiles().await.unwrap();
    let ada = all.iter().find(|p| p.id() == ada.id()).unwrap();
    let bo = all.iter().find(|p| p.id() == bo.id()).unwrap();
    assert_eq!(ada.trophies().gold, 1);
    assert_eq!(ada.total_wins(), 1);
    assert_eq!(bo.trophies().silver, 1);
    assert_eq!(bo.total_wins(), 0);
}

#[tokio::test]
async fn turn_rules_are_enforced() {
    let app = services();
    let mut game = app
        .multiplayer_match(
            Subject::Grammar,
            vec![SeatConfig::guest("A", 64), SeatConfig::guest("B", 5)],
            Some(1),
        )
        .unwrap();

    assert!(matches!(game.answer(0), Err(MatchError::NoQuestion)));
    assert!(matches!(game.advance(), Err(MatchError::TurnPending)));

    let selected = game.load_turn_question().await.unwrap();
    game.answer(selected.question.correct_index()).unwrap();
    game.advance().unwrap();
    game.advance().unwrap_err();

    let selected = game.load_turn_question().await.unwrap();
    let outcome = game.answer(selected.question.correct_index()).unwrap();
    assert_eq!(outcome.seat, 1);
    assert_eq!(outcome.level_change, LevelChangeResult::NoChange { level: 5, streak: 1 });
}

#[tokio::test]
async fn match_needs_two_to_four_players() {
    let app = services();
    let one = vec![SeatConfig::guest("Solo", 1)];
    assert!(matches!(
        app.multiplayer_match(Subject::Math, one, None),
        Err(MatchError::PlayerCount(1))
    ));

    let five = (0..5).map(|i| SeatConfig::guest(format!("P{i}"), 1)).collect();
    assert!(matches!(
        app.multiplayer_match(Subject::Math, five, None),
        Err(MatchError::PlayerCount(5))
    ));
}

#[tokio::test]
async fn solo_session_is_recorded_against_the_active_profile() {
    let app = services();
    let profiles = app.profiles();
    let player = profiles.active_profile().await.unwrap();
    assert_eq!(player.name(), "Player 1");

    let level = profiles.starting_level(player.id(), Subject::Math).await.unwrap();
    let mut quiz = app.quiz_controller(Some(3));
    quiz.start_session(Subject::Math, level).await;
    let question = quiz.current_question().unwrap().clone();
    quiz.submit_answer(question.correct_index(), 500);
    quiz.continue_after_result().await;
    let question = quiz.current_question().unwrap().clone();
    let result = quiz.submit_answer(question.correct_index(), 700);
    assert_eq!(result.level_change, LevelChangeResult::LeveledUp { from: 1, to: 2 });
    let session = quiz.end_session().unwrap();

    profiles.record_session(player.id(), &session).await.unwrap();
    assert_eq!(
        profiles.starting_level(player.id(), Subject::Math).await.unwrap(),
        2
    );

    let history = profiles.recent_sessions(player.id(), 5).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].summary.start_level(), 1);
    assert_eq!(history[0].summary.end_level(), 2);
    assert_eq!(history[0].summary.correct_count(), 2);
}

#[tokio::test]
async fn memory_match_winner_earns_a_trophy() {
    let app = services();
    let profiles = app.profiles();
    let ada = profiles.create_profile(Some("Ada")).await.unwrap();
    let bo = profiles.create_profile(Some("Bo")).await.unwrap();

    let board = MemoryBoard::from_layout(
        ["X", "Y", "Z", "X", "Y", "Z"].map(String::from).to_vec(),
    )
    .unwrap();
    let mut game = MemoryMatch::new(
        vec![
            SeatConfig::for_profile("Ada", ada.id(), 1),
            SeatConfig::for_profile("Bo", bo.id(), 1),
        ],
        board,
    )
    .unwrap();

    // Ada misses, Bo finds X then misses, Ada clears Y and Z.
    for (first, second, finder) in [(0, 1, 0), (0, 3, 1), (1, 2, 1), (1, 4, 0), (2, 5, 0)] {
        assert_eq!(game.current_seat(), finder);
        game.flip(first).unwrap();
        game.flip(second).unwrap();
        game.resolve().unwrap();
    }

    assert!(game.is_finished());
    assert_eq!(game.board().moves(), 5);
    assert_eq!(game.winner(), Some(0));
    profiles.award_placements(&game.placements()).await.unwrap();

    let all = profiles.list_profiles().await.unwrap();
    let ada = all.iter().find(|p| p.id() == ada.id()).unwrap();
    let bo = all.iter().find(|p| p.id() == bo.id()).unwrap();
    assert_eq!((ada.trophies().gold, ada.total_wins()), (1, 1));
    assert_eq!((bo.trophies().gold, bo.total_wins()), (0, 0));
}
