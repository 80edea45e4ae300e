#![forbid(unsafe_code)]

pub mod app_services;
pub mod content;
pub mod error;
pub mod memory;
pub mod multiplayer;
pub mod profile_service;
pub mod question_bank;
pub mod quiz_session;
pub mod selector;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use content::{BuiltinQuestionSource, JsonQuestionSource, QuestionSource, StaticQuestionSource};
pub use error::{
    AppServicesError, ContentError, MatchError, MemoryError, ProfileServiceError,
    QuestionBankError,
};
pub use memory::{
    EmojiSet, Flip, MemoryBoard, MemoryMatch, MemorySeat, MemoryTurn, Reveal, card_count_for_level,
};
pub use multiplayer::{MultiplayerMatch, PlayerSeat, SeatConfig, Standing, TurnAdvance, TurnOutcome};
pub use profile_service::ProfileService;
pub use question_bank::QuestionBank;
pub use quiz_session::{
    AnswerResult, LOAD_ERROR_MESSAGE, QuizEvent, QuizPhase, QuizProgress, QuizSessionController,
    QuizView,
};
pub use selector::{QuestionSelector, SelectedQuestion, Selection, UsedQuestionLedger, select_from_pool};
