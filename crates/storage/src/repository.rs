use async_trait::async_trait;
use quiz_core::model::{PlayerProfile, ProfileId, SessionId, SessionSummary, Subject};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored session summary together with its row id.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummaryRow {
    pub id: i64,
    pub summary: SessionSummary,
}

impl SessionSummaryRow {
    #[must_use]
    pub fn new(id: i64, summary: SessionSummary) -> Self {
        Self { id, summary }
    }
}

/// Filter for listing session summaries. Empty fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryFilter {
    pub profile_id: Option<ProfileId>,
    pub subject: Option<Subject>,
}

impl SummaryFilter {
    #[must_use]
    pub fn for_profile(profile_id: ProfileId) -> Self {
        Self {
            profile_id: Some(profile_id),
            subject: None,
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    fn matches(&self, summary: &SessionSummary) -> bool {
        self.profile_id.is_none_or(|id| summary.profile_id() == Some(id))
            && self.subject.is_none_or(|s| summary.subject() == s)
    }
}

/// Repository contract for player profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError>;

    /// Fetch a profile by id, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_profile(&self, id: ProfileId) -> Result<Option<PlayerProfile>, StorageError>;

    /// All profiles, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_profiles(&self) -> Result<Vec<PlayerProfile>, StorageError>;

    /// Remove a profile and its session history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile does not exist.
    async fn delete_profile(&self, id: ProfileId) -> Result<(), StorageError>;
}

/// Repository contract for finished-session summaries.
#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    /// Append a summary and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the session was already stored.
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no row has this id.
    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError>;

    /// Most recently ended first, at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_summaries(
        &self,
        filter: SummaryFilter,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    profiles: Arc<Mutex<Vec<PlayerProfile>>>,
    summaries: Arc<Mutex<HashMap<i64, SessionSummary>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError> {
        let mut guard = self.profiles.lock().map_err(poisoned)?;
        match guard.iter_mut().find(|p| p.id() == profile.id()) {
            Some(existing) => *existing = profile.clone(),
            None => guard.push(profile.clone()),
        }
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<PlayerProfile>, StorageError> {
        let guard = self.profiles.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|p| p.id() == id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<PlayerProfile>, StorageError> {
        let guard = self.profiles.lock().map_err(poisoned)?;
        let mut out = guard.clone();
        out.sort_by_key(PlayerProfile::created_at);
        Ok(out)
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<(), StorageError> {
        {
            let mut guard = self.profiles.lock().map_err(poisoned)?;
            let before = guard.len();
            guard.retain(|p| p.id() != id);
            if guard.len() == before {
                return Err(StorageError::NotFound);
            }
        }
        let mut summaries = self.summaries.lock().map_err(poisoned)?;
        summaries.retain(|_, s| s.profile_id() != Some(id));
        Ok(())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let mut guard = self.summaries.lock().map_err(poisoned)?;
        let session_id: SessionId = summary.session_id();
        if guard.values().any(|s| s.session_id() == session_id) {
            return Err(StorageError::Conflict);
        }
        let id = guard.keys().max().map_or(1, |max| max + 1);
        guard.insert(id, summary.clone());
        Ok(id)
    }

    async fn get_summary(&self, id: i64) -> Result<SessionSummary, StorageError> {
        let guard = self.summaries.lock().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_summaries(
        &self,
        filter: SummaryFilter,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let guard = self.summaries.lock().map_err(poisoned)?;
        let mut rows: Vec<SessionSummaryRow> = guard
            .iter()
            .filter(|(_, s)| filter.matches(s))
            .map(|(id, s)| SessionSummaryRow::new(*id, s.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.summary
                .ended_at()
                .cmp(&a.summary.ended_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
    pub session_summaries: Arc<dyn SessionSummaryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let session_summaries: Arc<dyn SessionSummaryRepository> = Arc::new(repo);
        Self {
            profiles,
            session_summaries,
        }
    }
}
