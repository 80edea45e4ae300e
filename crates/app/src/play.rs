use std::time::Instant;

use quiz_core::model::{QuestionRecord, Subject};
use services::{AppServices, QuizEvent, QuizSessionController};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub(crate) type Input = Lines<BufReader<Stdin>>;

enum Reply {
    Choice(usize),
    Quit,
}

async fn read_reply(input: &mut Input, options: usize) -> std::io::Result<Reply> {
    loop {
        let Some(line) = input.next_line().await? else {
            return Ok(Reply::Quit);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(Reply::Quit);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=options).contains(&n) => return Ok(Reply::Choice(n - 1)),
            _ => println!("Type a number from 1 to {options}, or q to stop."),
        }
    }
}

async fn confirm(input: &mut Input, prompt: &str) -> std::io::Result<bool> {
    println!("{prompt} [y/N]");
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn show_question(quiz: &QuizSessionController, question: &QuestionRecord) {
    let progress = quiz.progress();
    println!();
    println!(
        "[{} · Level {} · {} answered]",
        question.subject(),
        progress.current_level,
        progress.questions_answered
    );
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

/// Interactive solo quiz for the active profile. The finished session is
/// saved when at least one question was answered.
pub async fn run_quiz(
    services: &AppServices,
    subject: Subject,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let profiles = services.profiles();
    let player = profiles.active_profile().await?;
    let level = profiles.starting_level(player.id(), subject).await?;
    println!("{} is playing {subject} from level {level}. Type q to stop.", player.name());

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut quiz = services.quiz_controller(seed);
    let mut event = quiz.start_session(subject, level).await;

    loop {
        match event {
            QuizEvent::QuestionReady { question, .. } => {
                show_question(&quiz, &question);
                let started = Instant::now();
                let Reply::Choice(index) = read_reply(&mut input, question.options().len()).await?
                else {
                    break;
                };
                let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

                let result = quiz.submit_answer(index, elapsed);
                if result.is_correct {
                    println!("Correct!");
                } else {
                    println!("Not quite. The answer was: {}", result.correct_answer);
                }
                if let Some(explanation) = &result.explanation {
                    println!("{explanation}");
                }
                if let Some(message) = result.level_change.message() {
                    println!("{message}");
                }
                event = quiz.continue_after_result().await;
            }
            QuizEvent::LoadFailed { message } => {
                println!("{message}");
                if !confirm(&mut input, "Try again?").await? {
                    break;
                }
                event = quiz.load_question().await;
            }
            QuizEvent::NoActiveSession => break,
        }
    }

    let Some(session) = quiz.end_session() else {
        return Ok(());
    };
    if session.total_questions() == 0 {
        println!("No questions answered; nothing saved.");
        return Ok(());
    }

    profiles.record_session(player.id(), &session).await?;
    println!();
    println!(
        "{} of {} correct ({:.0}%). Level {} -> {}.",
        session.correct_count(),
        session.total_questions(),
        session.accuracy() * 100.0,
        session.start_level(),
        session.current_level()
    );
    Ok(())
}

pub async fn print_profiles(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let profiles = services.profiles();
    let active = profiles.active_profile().await?;

    for profile in profiles.list_profiles().await? {
        let marker = if profile.id() == active.id() { '*' } else { ' ' };
        let levels = profile.levels();
        let trophies = profile.trophies();
        println!(
            "{marker} {} {}  grammar {} · math {} · spelling {} · memory {}  accuracy {:.0}%  trophies {}/{}/{}",
            profile.avatar(),
            profile.name(),
            levels.grammar,
            levels.math,
            levels.spelling,
            levels.memory,
            profile.accuracy() * 100.0,
            trophies.gold,
            trophies.silver,
            trophies.bronze
        );
    }
    Ok(())
}

pub async fn print_history(
    services: &AppServices,
    limit: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let profiles = services.profiles();
    let player = profiles.active_profile().await?;
    let rows = profiles.recent_sessions(player.id(), limit).await?;

    if rows.is_empty() {
        println!("{} has no finished sessions yet.", player.name());
        return Ok(());
    }

    println!("Recent sessions for {}:", player.name());
    for row in rows {
        let s = &row.summary;
        println!(
            "  {}  {:<8}  level {:>2} -> {:>2}  {}/{} ({:.0}%)",
            s.ended_at().format("%Y-%m-%d %H:%M"),
            s.subject().display_name(),
            s.start_level(),
            s.end_level(),
            s.correct_count(),
            s.total_questions(),
            s.accuracy() * 100.0
        );
    }
    Ok(())
}
