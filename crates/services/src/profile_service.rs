use std::sync::Arc;

use tracing::info;

use quiz_core::Clock;
use quiz_core::model::{
    LevelingSettings, Placement, PlayerProfile, ProfileId, QuizSession, SessionSummary, Subject,
};
use storage::repository::{
    ProfileRepository, SessionSummaryRepository, SessionSummaryRow, SummaryFilter,
};

use crate::error::ProfileServiceError;

/// Profile lifecycle and session persistence.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    bounds: LevelingSettings,
    profiles: Arc<dyn ProfileRepository>,
    summaries: Arc<dyn SessionSummaryRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bounds: LevelingSettings,
        profiles: Arc<dyn ProfileRepository>,
        summaries: Arc<dyn SessionSummaryRepository>,
    ) -> Self {
        Self {
            clock,
            bounds,
            profiles,
            summaries,
        }
    }

    /// All profiles, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on repository failures.
    pub async fn list_profiles(&self) -> Result<Vec<PlayerProfile>, ProfileServiceError> {
        Ok(self.profiles.list_profiles().await?)
    }

    /// The active profile. Activates the oldest profile if none is active,
    /// and creates "Player 1" when there are no profiles at all.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError` on repository failures.
    pub async fn active_profile(&self) -> Result<PlayerProfile, ProfileServiceError> {
        let profiles = self.profiles.list_profiles().await?;
        if let Some(active) = profiles.iter().find(|p| p.is_active()) {
            return Ok(active.clone());
        }

        let mut profile = match profiles.into_iter().next() {
            Some(first) => first,
            None => {
                let created = PlayerProfile::new("Player 1", self.clock.now())?;
                info!(profile = %created.id(), "created first profile");
                created
            }
        };
        profile.set_active(true);
        self.profiles.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Create an inactive profile. Without a name it becomes "Player N",
    /// where N counts the new profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Profile` for an invalid name.
    pub async fn create_profile(
        &self,
        name: Option<&str>,
    ) -> Result<PlayerProfile, ProfileServiceError> {
        let name = match name {
            Some(name) => name.to_owned(),
            None => {
                let count = self.profiles.list_profiles().await?.len();
                format!("Player {}", count + 1)
            }
        };
        let profile = PlayerProfile::new(&name, self.clock.now())?;
        self.profiles.upsert_profile(&profile).await?;
        info!(profile = %profile.id(), "profile created");
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::NotFound` for an unknown id, or
    /// `ProfileServiceError::Profile` for an invalid name.
    pub async fn rename(
        &self,
        id: ProfileId,
        name: &str,
    ) -> Result<PlayerProfile, ProfileServiceError> {
        let mut profile = self.require(id).await?;
        profile.rename(name)?;
        self.profiles.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Make `id` the only active profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::NotFound` for an unknown id.
    pub async fn switch_to(&self, id: ProfileId) -> Result<PlayerProfile, ProfileServiceError> {
        let profiles = self.profiles.list_profiles().await?;
        if !profiles.iter().any(|p| p.id() == id) {
            return Err(ProfileServiceError::NotFound(id));
        }

        let mut selected = None;
        for mut profile in profiles {
            let active = profile.id() == id;
            if profile.is_active() != active {
                profile.set_active(active);
                self.profiles.upsert_profile(&profile).await?;
            }
            if active {
                selected = Some(profile);
            }
        }
        selected.ok_or(ProfileServiceError::NotFound(id))
    }

    /// Delete a profile and its history. The last profile cannot be deleted;
    /// deleting the active one activates the oldest remaining profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::LastProfile` or
    /// `ProfileServiceError::NotFound`.
    pub async fn delete(&self, id: ProfileId) -> Result<(), ProfileServiceError> {
        let profiles = self.profiles.list_profiles().await?;
        let Some(target) = profiles.iter().find(|p| p.id() == id) else {
            return Err(ProfileServiceError::NotFound(id));
        };
        if profiles.len() <= 1 {
            return Err(ProfileServiceError::LastProfile);
        }

        let was_active = target.is_active();
        self.profiles.delete_profile(id).await?;
        info!(profile = %id, "profile deleted");

        if was_active {
            if let Some(mut next) = profiles.into_iter().find(|p| p.id() != id) {
                next.set_active(true);
                self.profiles.upsert_profile(&next).await?;
            }
        }
        Ok(())
    }

    /// Level to start a new session at.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::NotFound` for an unknown id.
    pub async fn starting_level(
        &self,
        id: ProfileId,
        subject: Subject,
    ) -> Result<u32, ProfileServiceError> {
        Ok(self.bounds.clamp(self.require(id).await?.level_for(subject)))
    }

    /// Fold a finished session into the profile and store its summary.
    ///
    /// Returns the summary row id.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Session` for a session that has not
    /// ended, `ProfileServiceError::NotFound` for an unknown profile, and
    /// `ProfileServiceError::Storage` with `StorageError::Conflict` when the
    /// session was already recorded. The profile is left untouched on error.
    pub async fn record_session(
        &self,
        id: ProfileId,
        session: &QuizSession,
    ) -> Result<i64, ProfileServiceError> {
        let summary = SessionSummary::from_session(session, Some(id))?;
        let mut profile = self.require(id).await?;
        profile.apply_session(session, self.bounds)?;
        // The summary insert rejects a session recorded twice, so it goes
        // first and the profile totals are only counted once.
        let row_id = self.summaries.append_summary(&summary).await?;
        self.profiles.upsert_profile(&profile).await?;
        info!(
            profile = %id,
            subject = %summary.subject(),
            level = summary.end_level(),
            "session recorded"
        );
        Ok(row_id)
    }

    /// Most recent sessions for a profile, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on repository failures.
    pub async fn recent_sessions(
        &self,
        id: ProfileId,
        limit: u32,
    ) -> Result<Vec<SessionSummaryRow>, ProfileServiceError> {
        Ok(self
            .summaries
            .list_summaries(SummaryFilter::for_profile(id), limit)
            .await?)
    }

    /// Hand out match trophies. Unknown profiles are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on repository failures.
    pub async fn award_placements(
        &self,
        placements: &[(ProfileId, Placement)],
    ) -> Result<(), ProfileServiceError> {
        for (id, placement) in placements {
            let Some(mut profile) = self.profiles.get_profile(*id).await? else {
                continue;
            };
            profile.award_placement(*placement);
            self.profiles.upsert_profile(&profile).await?;
        }
        Ok(())
    }

    async fn require(&self, id: ProfileId) -> Result<PlayerProfile, ProfileServiceError> {
        self.profiles
            .get_profile(id)
            .await?
            .ok_or(ProfileServiceError::NotFound(id))
    }
}
