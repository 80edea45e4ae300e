use std::time::{Duration, Instant};

use quiz_core::model::Subject;
use services::{
    AppServices, EmojiSet, Flip, MemoryBoard, MemoryError, MemoryMatch, SeatConfig, Standing,
    TurnAdvance, TurnOutcome, card_count_for_level,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::play::Input;

/// Card count offered to a group when `--cards` is not given.
const DEFAULT_GROUP_CARDS: usize = 16;

/// Seats for the named players. A name matching a saved profile plays on
/// that profile's level for `subject`; anyone else is a guest from level 1.
pub async fn resolve_seats(
    services: &AppServices,
    names: &[String],
    subject: Subject,
) -> Result<Vec<SeatConfig>, Box<dyn std::error::Error>> {
    let profiles = services.profiles();
    let saved = profiles.list_profiles().await?;

    let mut seats = Vec::with_capacity(names.len());
    for name in names {
        match saved.iter().find(|p| p.name().eq_ignore_ascii_case(name)) {
            Some(profile) => {
                let level = profiles.starting_level(profile.id(), subject).await?;
                seats.push(SeatConfig::for_profile(profile.name(), profile.id(), level));
            }
            None => seats.push(SeatConfig::guest(name.as_str(), 1)),
        }
    }
    Ok(seats)
}

fn print_standings(standings: &[Standing]) {
    println!();
    println!("Final standings:");
    for row in standings {
        let medal = match row.placement {
            Some(placement) => format!("  {placement:?}"),
            None => String::new(),
        };
        println!("  {:<12} {:>3}{medal}", row.name, row.score);
    }
}

// ─── QUIZ MATCH ────────────────────────────────────────────────────────────

fn print_outcome(outcome: &TurnOutcome) {
    if outcome.is_correct {
        println!("Correct!");
    } else {
        println!("Not quite. The answer was: {}", outcome.correct_answer);
    }
    if let Some(explanation) = &outcome.explanation {
        println!("{explanation}");
    }
    if let Some(message) = outcome.level_change.message() {
        println!("{message}");
    }
}

/// Pass-and-play quiz match. Each player answers in turn within the time
/// limit; an empty reply or a late one counts as a timeout.
pub async fn run_match(
    services: &AppServices,
    subject: Subject,
    names: &[String],
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let seats = resolve_seats(services, names, subject).await?;
    let mut game = services.multiplayer_match(subject, seats, seed)?;
    let limit = Duration::from_secs(u64::from(game.turn_time_limit_secs()));
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "{subject} match, {} questions. Press Enter to pass a turn.",
        game.total_questions()
    );

    loop {
        let selected = game.load_turn_question().await?;
        let question = selected.question;
        let player = game.current_player();
        println!();
        println!(
            "[{} · Level {} · question {} of {}]",
            player.name(),
            player.level(),
            game.questions_played() + 1,
            game.total_questions()
        );
        println!("{}", question.prompt());
        for (i, option) in question.options().iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        println!("You have {}s.", limit.as_secs());

        let started = Instant::now();
        let reply = match tokio::time::timeout(limit, input.next_line()).await {
            Ok(line) => line?,
            Err(_) => {
                println!("Time's up!");
                None
            }
        };
        let choice = reply
            .as_deref()
            .map(str::trim)
            .and_then(|line| line.parse::<usize>().ok())
            .filter(|n| (1..=question.options().len()).contains(n));

        let outcome = match choice {
            Some(n) if started.elapsed() <= limit => game.answer(n - 1)?,
            _ => game.time_out()?,
        };
        print_outcome(&outcome);

        if game.advance()? == TurnAdvance::Finished {
            break;
        }
    }

    print_standings(&game.standings());
    services.profiles().award_placements(&game.placements()).await?;
    Ok(())
}

// ─── MEMORY ────────────────────────────────────────────────────────────────

/// Grid width for a board of `card_count` cards.
fn columns_for(card_count: usize) -> usize {
    match card_count {
        8 => 4,
        48 => 12,
        64 => 16,
        _ => 8,
    }
}

fn print_board(board: &MemoryBoard) {
    let columns = columns_for(board.len());
    for row in (0..board.len()).collect::<Vec<_>>().chunks(columns) {
        let cells: Vec<String> = row
            .iter()
            .map(|&i| format!("{:>2}:{}", i + 1, board.visible_symbol(i).unwrap_or("??")))
            .collect();
        println!("  {}", cells.join("  "));
    }
}

/// Card index picked on stdin, or `None` when the player quits.
async fn read_card(input: &mut Input, board: &MemoryBoard) -> std::io::Result<Option<usize>> {
    loop {
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=board.len()).contains(&n) => {
                if board.visible_symbol(n - 1).is_some() {
                    println!("That card is already showing.");
                } else {
                    return Ok(Some(n - 1));
                }
            }
            _ => println!("Pick a card from 1 to {}, or q to stop.", board.len()),
        }
    }
}

/// A board that takes flips, alone or inside a match.
trait Table {
    fn board(&self) -> &MemoryBoard;
    fn flip(&mut self, index: usize) -> Result<Flip, MemoryError>;
}

impl Table for MemoryBoard {
    fn board(&self) -> &MemoryBoard {
        self
    }

    fn flip(&mut self, index: usize) -> Result<Flip, MemoryError> {
        MemoryBoard::flip(self, index)
    }
}

impl Table for MemoryMatch {
    fn board(&self) -> &MemoryBoard {
        MemoryMatch::board(self)
    }

    fn flip(&mut self, index: usize) -> Result<Flip, MemoryError> {
        MemoryMatch::flip(self, index)
    }
}

/// Flip two cards picked on stdin. `false` when the player quits.
async fn flip_pair(
    input: &mut Input,
    table: &mut impl Table,
) -> Result<bool, Box<dyn std::error::Error>> {
    for _ in 0..2 {
        print_board(table.board());
        let Some(index) = read_card(input, table.board()).await? else {
            return Ok(false);
        };
        table.flip(index)?;
    }
    print_board(table.board());
    Ok(true)
}

/// Memory game. One name (or none) plays solo with the active profile;
/// two to four names play pass-and-play for trophies.
pub async fn run_memory(
    services: &AppServices,
    names: &[String],
    cards: Option<usize>,
    set: EmojiSet,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if names.len() < 2 {
        let profiles = services.profiles();
        let player = profiles.active_profile().await?;
        let card_count = match cards {
            Some(n) => n,
            None => card_count_for_level(profiles.starting_level(player.id(), Subject::Memory).await?),
        };
        let mut board = MemoryBoard::deal(card_count, set, seed)?;
        println!("{} is playing {set} memory with {card_count} cards. Type q to stop.", player.name());

        while !board.is_complete() {
            if !flip_pair(&mut input, &mut board).await? {
                return Ok(());
            }
            let reveal = board.resolve()?;
            println!("{}", if reveal.is_match { "Match!" } else { "No match." });
        }
        println!("Board cleared in {} moves.", board.moves());
        return Ok(());
    }

    let seats = resolve_seats(services, names, Subject::Memory).await?;
    let board = MemoryBoard::deal(cards.unwrap_or(DEFAULT_GROUP_CARDS), set, seed)?;
    let mut game = MemoryMatch::new(seats, board)?;
    println!("{set} memory for {} players. Type q to stop.", game.seats().len());

    while !game.is_finished() {
        println!();
        println!("{}'s turn.", game.current_player().name());
        if !flip_pair(&mut input, &mut game).await? {
            return Ok(());
        }
        let turn = game.resolve()?;
        if turn.reveal.is_match {
            println!("Match! {} goes again.", game.seats()[turn.seat].name());
        } else {
            println!("No match.");
        }
    }

    print_standings(&game.standings());
    services.profiles().award_placements(&game.placements()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use services::{BuiltinQuestionSource, Clock};

    use super::*;

    #[test]
    fn grid_width_follows_board_size() {
        assert_eq!(columns_for(8), 4);
        assert_eq!(columns_for(16), 8);
        assert_eq!(columns_for(32), 8);
        assert_eq!(columns_for(48), 12);
        assert_eq!(columns_for(64), 16);
    }

    #[tokio::test]
    async fn known_names_are_linked_and_others_are_guests() {
        let services = AppServices::in_memory(
            Clock::default_clock(),
            Default::default(),
            Arc::new(BuiltinQuestionSource::seeded(1)),
        );
        let ada = services.profiles().create_profile(Some("Ada")).await.unwrap();

        let seats = resolve_seats(&services, &["ada".to_owned(), "Bo".to_owned()], Subject::Math)
            .await
            .unwrap();

        let mut game = services
            .multiplayer_match(Subject::Math, seats, Some(3))
            .unwrap();
        assert_eq!(game.seats()[0].name(), "Ada");
        assert_eq!(game.seats()[0].profile_id(), Some(ada.id()));
        assert_eq!(game.seats()[1].profile_id(), None);
        assert_eq!(game.seats()[1].level(), 1);
        assert!(game.load_turn_question().await.is_ok());
    }
}
