//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::model::{ProfileError, ProfileId, QuestionError, QuizSessionError, Subject};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by question sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("failed to read content pack {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("content pack is not valid JSON")]
    Parse(#[from] serde_json::Error),
    #[error("content pack entry {index} is invalid")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error("question source unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `QuestionBank` when a pool cannot be materialised.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("failed to load {subject} questions for level {level}")]
    Source {
        subject: Subject,
        level: u32,
        #[source]
        source: ContentError,
    },
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error("profile {0} not found")]
    NotFound(ProfileId),
    #[error("the last remaining profile cannot be deleted")]
    LastProfile,
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `MultiplayerMatch`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MatchError {
    #[error("a match needs 2 to 4 players, got {0}")]
    PlayerCount(usize),
    #[error("match is already finished")]
    Finished,
    #[error("no question is waiting for an answer")]
    NoQuestion,
    #[error("the current turn was already answered")]
    AlreadyAnswered,
    #[error("the current turn has not been answered yet")]
    TurnPending,
    #[error(transparent)]
    Bank(#[from] QuestionBankError),
}

/// Errors emitted by the memory game.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MemoryError {
    #[error("card count must be an even number from 4 to 64, got {0}")]
    InvalidCardCount(usize),
    #[error("every symbol must appear exactly twice")]
    InvalidLayout,
    #[error("unknown emoji set: {0}")]
    UnknownEmojiSet(String),
    #[error("card {index} is not on a board of {len} cards")]
    OutOfRange { index: usize, len: usize },
    #[error("card {0} is already matched")]
    AlreadyMatched(usize),
    #[error("card {0} is already face up")]
    AlreadyFaceUp(usize),
    #[error("two cards are face up and must be resolved first")]
    PairPending,
    #[error("no pair is waiting to be resolved")]
    NoPairPending,
    #[error("every pair has been found")]
    Complete,
    #[error("a match needs 2 to 4 players, got {0}")]
    PlayerCount(usize),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Profiles(#[from] ProfileServiceError),
}
