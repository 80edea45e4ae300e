use std::sync::Arc;

use quiz_core::model::{QuizSettings, Subject};
use storage::repository::Storage;

use crate::Clock;
use crate::content::QuestionSource;
use crate::error::{AppServicesError, MatchError};
use crate::multiplayer::{MultiplayerMatch, SeatConfig};
use crate::profile_service::ProfileService;
use crate::question_bank::QuestionBank;
use crate::quiz_session::QuizSessionController;
use crate::selector::QuestionSelector;

/// Assembles app-facing services around one shared `QuestionBank`.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: QuizSettings,
    bank: Arc<QuestionBank>,
    profiles: Arc<ProfileService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
        source: Arc<dyn QuestionSource>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, settings, source))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, settings: QuizSettings, source: Arc<dyn QuestionSource>) -> Self {
        Self::from_storage(Storage::in_memory(), clock, settings, source)
    }

    fn from_storage(
        storage: Storage,
        clock: Clock,
        settings: QuizSettings,
        source: Arc<dyn QuestionSource>,
    ) -> Self {
        let profiles = Arc::new(ProfileService::new(
            clock,
            settings.leveling(),
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.session_summaries),
        ));
        Self {
            clock,
            settings,
            bank: Arc::new(QuestionBank::new(source)),
            profiles,
        }
    }

    #[must_use]
    pub fn settings(&self) -> QuizSettings {
        self.settings
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    fn selector(&self, seed: Option<u64>) -> QuestionSelector {
        match seed {
            Some(seed) => QuestionSelector::with_seed(self.bank(), seed),
            None => QuestionSelector::new(self.bank()),
        }
    }

    /// A fresh solo controller. A seed makes question picks reproducible.
    #[must_use]
    pub fn quiz_controller(&self, seed: Option<u64>) -> QuizSessionController {
        QuizSessionController::new(self.settings, self.selector(seed), self.clock)
    }

    /// # Errors
    ///
    /// Returns `MatchError::PlayerCount` unless 2 to 4 players are given.
    pub fn multiplayer_match(
        &self,
        subject: Subject,
        players: Vec<SeatConfig>,
        seed: Option<u64>,
    ) -> Result<MultiplayerMatch, MatchError> {
        MultiplayerMatch::new(subject, players, &self.settings, self.selector(seed))
    }
}
