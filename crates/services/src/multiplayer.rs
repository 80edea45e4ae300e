//! Pass-and-play matches: players share one device and take turns.

use tracing::{debug, info};

use quiz_core::AdaptiveLevelPolicy;
use quiz_core::model::{
    LevelChangeResult, LevelState, Placement, ProfileId, QuestionRecord, QuizSettings, Subject,
};

use crate::error::MatchError;
use crate::selector::{QuestionSelector, SelectedQuestion};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// A player joining a match, either a saved profile or a guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatConfig {
    pub name: String,
    pub profile_id: Option<ProfileId>,
    pub level: u32,
}

impl SeatConfig {
    #[must_use]
    pub fn guest(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            profile_id: None,
            level,
        }
    }

    #[must_use]
    pub fn for_profile(name: impl Into<String>, profile_id: ProfileId, level: u32) -> Self {
        Self {
            name: name.into(),
            profile_id: Some(profile_id),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSeat {
    name: String,
    profile_id: Option<ProfileId>,
    level_state: LevelState,
    score: u32,
}

impl PlayerSeat {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    #[must_use]
    pub fn level_state(&self) -> LevelState {
        self.level_state
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level_state.level()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }
}

/// Result of one player's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub seat: usize,
    pub is_correct: bool,
    pub level_change: LevelChangeResult,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    NextPlayer { seat: usize },
    Finished,
}

/// One row of the final scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub seat: usize,
    pub name: String,
    pub profile_id: Option<ProfileId>,
    pub score: u32,
    pub placement: Option<Placement>,
}

/// Turn-based match over a fixed number of questions.
#[derive(Debug)]
pub struct MultiplayerMatch {
    subject: Subject,
    seats: Vec<PlayerSeat>,
    policy: AdaptiveLevelPolicy,
    selector: QuestionSelector,
    total_questions: u32,
    turn_time_limit_secs: u32,
    questions_played: u32,
    current_seat: usize,
    current_question: Option<QuestionRecord>,
    answered: bool,
    finished: bool,
}

impl MultiplayerMatch {
    /// # Errors
    ///
    /// Returns `MatchError::PlayerCount` unless 2 to 4 players are given.
    pub fn new(
        subject: Subject,
        players: Vec<SeatConfig>,
        settings: &QuizSettings,
        mut selector: QuestionSelector,
    ) -> Result<Self, MatchError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(MatchError::PlayerCount(players.len()));
        }

        let policy = AdaptiveLevelPolicy::new(settings.leveling());
        let seats = players
            .into_iter()
            .map(|p| PlayerSeat {
                name: p.name,
                profile_id: p.profile_id,
                level_state: policy.start(p.level),
                score: 0,
            })
            .collect::<Vec<_>>();
        selector.reset_used_questions();
        info!(%subject, players = seats.len(), "match started");

        Ok(Self {
            subject,
            seats,
            policy,
            selector,
            total_questions: settings.match_questions(),
            turn_time_limit_secs: settings.turn_time_limit_secs(),
            questions_played: 0,
            current_seat: 0,
            current_question: None,
            answered: false,
            finished: false,
        })
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn seats(&self) -> &[PlayerSeat] {
        &self.seats
    }

    #[must_use]
    pub fn current_seat(&self) -> usize {
        self.current_seat
    }

    #[must_use]
    pub fn current_player(&self) -> &PlayerSeat {
        &self.seats[self.current_seat]
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.current_question.as_ref()
    }

    #[must_use]
    pub fn questions_played(&self) -> u32 {
        self.questions_played
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn turn_time_limit_secs(&self) -> u32 {
        self.turn_time_limit_secs
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Load a question for the player whose turn it is, at their level.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Finished` after the last turn and
    /// `MatchError::Bank` if the pool cannot be loaded.
    pub async fn load_turn_question(&mut self) -> Result<SelectedQuestion, MatchError> {
        if self.finished {
            return Err(MatchError::Finished);
        }
        let level = self.current_player().level();
        let selected = self.selector.select(self.subject, level).await?;
        self.current_question = Some(selected.question.clone());
        self.answered = false;
        Ok(selected)
    }

    /// # Errors
    ///
    /// Returns `MatchError::NoQuestion` before a question is loaded and
    /// `MatchError::AlreadyAnswered` on a second answer for the same turn.
    pub fn answer(&mut self, selected_index: usize) -> Result<TurnOutcome, MatchError> {
        self.resolve_turn(Some(selected_index))
    }

    /// The turn timer expired; scored as an incorrect answer.
    ///
    /// # Errors
    ///
    /// See [`MultiplayerMatch::answer`].
    pub fn time_out(&mut self) -> Result<TurnOutcome, MatchError> {
        self.resolve_turn(None)
    }

    fn resolve_turn(&mut self, selected_index: Option<usize>) -> Result<TurnOutcome, MatchError> {
        if self.finished {
            return Err(MatchError::Finished);
        }
        if self.answered {
            return Err(MatchError::AlreadyAnswered);
        }
        let question = self.current_question.as_ref().ok_or(MatchError::NoQuestion)?;

        let is_correct = selected_index.is_some_and(|i| question.is_correct(i));
        let correct_answer = question.correct_answer().to_owned();
        let explanation = question.explanation().map(str::to_owned);

        let seat_index = self.current_seat;
        let seat = &mut self.seats[seat_index];
        let (next, level_change) = self.policy.record_answer(seat.level_state, is_correct);
        seat.level_state = next;
        if is_correct {
            seat.score += 1;
        }
        debug!(seat = seat_index, is_correct, level = next.level(), "turn resolved");

        self.answered = true;
        Ok(TurnOutcome {
            seat: seat_index,
            is_correct,
            level_change,
            correct_answer,
            explanation,
        })
    }

    /// Pass the device to the next player, or finish after the last question.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::TurnPending` while the current turn is
    /// unanswered and `MatchError::Finished` once the match is over.
    pub fn advance(&mut self) -> Result<TurnAdvance, MatchError> {
        if self.finished {
            return Err(MatchError::Finished);
        }
        if !self.answered {
            return Err(MatchError::TurnPending);
        }

        self.questions_played += 1;
        self.current_question = None;
        self.answered = false;

        if self.questions_played >= self.total_questions {
            self.finished = true;
            info!(subject = %self.subject, "match finished");
            return Ok(TurnAdvance::Finished);
        }

        self.current_seat = (self.current_seat + 1) % self.seats.len();
        Ok(TurnAdvance::NextPlayer {
            seat: self.current_seat,
        })
    }

    /// Seats ordered by score, highest first. Ties keep seat order.
    #[must_use]
    pub fn standings(&self) -> Vec<Standing> {
        let mut order: Vec<usize> = (0..self.seats.len()).collect();
        order.sort_by(|a, b| self.seats[*b].score.cmp(&self.seats[*a].score));

        order
            .into_iter()
            .enumerate()
            .map(|(rank, seat)| {
                let player = &self.seats[seat];
                Standing {
                    seat,
                    name: player.name.clone(),
                    profile_id: player.profile_id,
                    score: player.score,
                    placement: Placement::from_rank(rank),
                }
            })
            .collect()
    }

    /// Podium finishes for seats linked to a saved profile.
    #[must_use]
    pub fn placements(&self) -> Vec<(ProfileId, Placement)> {
        self.standings()
            .into_iter()
            .filter_map(|s| Some((s.profile_id?, s.placement?)))
            .collect()
    }
}
