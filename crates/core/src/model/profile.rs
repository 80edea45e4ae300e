use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::session::ratio;
use crate::model::{LevelingSettings, ProfileId, QuizSession, Subject};

pub const DEFAULT_PROFILE_NAME: &str = "Player";
pub const DEFAULT_AVATAR: &str = "person.fill";
pub const MAX_PROFILE_NAME_LEN: usize = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("profile name cannot be empty")]
    EmptyName,

    #[error("profile name is longer than {MAX_PROFILE_NAME_LEN} characters")]
    NameTooLong,

    #[error("cannot apply a session that is still active")]
    SessionStillActive,
}

/// Podium position at the end of a pass-and-play match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    Gold,
    Silver,
    Bronze,
}

impl Placement {
    /// Placement for a zero-based finishing position; only the top three place.
    #[must_use]
    pub fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            0 => Some(Self::Gold),
            1 => Some(Self::Silver),
            2 => Some(Self::Bronze),
            _ => None,
        }
    }
}

/// Per-subject adventure levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubjectLevels {
    pub grammar: u32,
    pub memory: u32,
    pub math: u32,
    pub spelling: u32,
}

impl Default for SubjectLevels {
    fn default() -> Self {
        Self {
            grammar: 1,
            memory: 1,
            math: 1,
            spelling: 1,
        }
    }
}

impl SubjectLevels {
    #[must_use]
    pub fn get(&self, subject: Subject) -> u32 {
        match subject {
            Subject::Grammar => self.grammar,
            Subject::Memory => self.memory,
            Subject::Math => self.math,
            Subject::Spelling => self.spelling,
        }
    }

    fn set(&mut self, subject: Subject, level: u32) {
        match subject {
            Subject::Grammar => self.grammar = level,
            Subject::Memory => self.memory = level,
            Subject::Math => self.math = level,
            Subject::Spelling => self.spelling = level,
        }
    }
}

/// Trophy counts earned in multiplayer matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Trophies {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

/// Everything needed to rebuild a profile from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProfile {
    pub id: ProfileId,
    pub name: String,
    pub avatar: String,
    pub levels: SubjectLevels,
    pub total_correct: u32,
    pub total_answered: u32,
    pub total_wins: u32,
    pub trophies: Trophies,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_played_at: DateTime<Utc>,
}

/// A local player: saved levels per subject and lifetime stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerProfile {
    id: ProfileId,
    name: String,
    avatar: String,
    levels: SubjectLevels,
    total_correct: u32,
    total_answered: u32,
    total_wins: u32,
    trophies: Trophies,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_played_at: DateTime<Utc>,
}

impl PlayerProfile {
    /// Create a fresh profile at level 1 in every subject.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the name is blank or too long.
    pub fn new(name: &str, now: DateTime<Utc>) -> Result<Self, ProfileError> {
        Ok(Self {
            id: ProfileId::new_v4(),
            name: normalize_name(name)?,
            avatar: DEFAULT_AVATAR.to_owned(),
            levels: SubjectLevels::default(),
            total_correct: 0,
            total_answered: 0,
            total_wins: 0,
            trophies: Trophies::default(),
            is_active: false,
            created_at: now,
            last_played_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `ProfileError` if the stored name no longer validates.
    pub fn from_persisted(p: PersistedProfile) -> Result<Self, ProfileError> {
        let name = if p.name.trim().is_empty() {
            DEFAULT_PROFILE_NAME.to_owned()
        } else {
            normalize_name(&p.name)?
        };
        let avatar = if p.avatar.trim().is_empty() {
            DEFAULT_AVATAR.to_owned()
        } else {
            p.avatar
        };
        Ok(Self {
            id: p.id,
            name,
            avatar,
            levels: p.levels,
            total_correct: p.total_correct,
            total_answered: p.total_answered,
            total_wins: p.total_wins,
            trophies: p.trophies,
            is_active: p.is_active,
            created_at: p.created_at,
            last_played_at: p.last_played_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    #[must_use]
    pub fn levels(&self) -> SubjectLevels {
        self.levels
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn total_answered(&self) -> u32 {
        self.total_answered
    }

    #[must_use]
    pub fn total_wins(&self) -> u32 {
        self.total_wins
    }

    #[must_use]
    pub fn trophies(&self) -> Trophies {
        self.trophies
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn last_played_at(&self) -> DateTime<Utc> {
        self.last_played_at
    }

    /// # Errors
    ///
    /// Returns `ProfileError` if the name is blank or too long.
    pub fn rename(&mut self, name: &str) -> Result<(), ProfileError> {
        self.name = normalize_name(name)?;
        Ok(())
    }

    pub fn set_avatar(&mut self, avatar: impl Into<String>) {
        let avatar = avatar.into();
        if !avatar.trim().is_empty() {
            self.avatar = avatar;
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    #[must_use]
    pub fn level_for(&self, subject: Subject) -> u32 {
        self.levels.get(subject)
    }

    /// Store a subject level, clamped into `bounds`.
    pub fn set_level(&mut self, subject: Subject, level: u32, bounds: LevelingSettings) {
        self.levels.set(subject, bounds.clamp(level));
    }

    /// Fold a finished session into the profile: totals and the subject level.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::SessionStillActive` for a running session.
    pub fn apply_session(
        &mut self,
        session: &QuizSession,
        bounds: LevelingSettings,
    ) -> Result<(), ProfileError> {
        let ended_at = session.ended_at().ok_or(ProfileError::SessionStillActive)?;
        let correct = u32::try_from(session.correct_count()).unwrap_or(u32::MAX);
        let answered = u32::try_from(session.total_questions()).unwrap_or(u32::MAX);
        self.total_correct = self.total_correct.saturating_add(correct);
        self.total_answered = self.total_answered.saturating_add(answered);
        self.set_level(session.subject(), session.current_level(), bounds);
        self.last_played_at = self.last_played_at.max(ended_at);
        Ok(())
    }

    /// Record a podium finish. Gold also counts as a win.
    pub fn award_placement(&mut self, placement: Placement) {
        match placement {
            Placement::Gold => {
                self.trophies.gold = self.trophies.gold.saturating_add(1);
                self.total_wins = self.total_wins.saturating_add(1);
            }
            Placement::Silver => self.trophies.silver = self.trophies.silver.saturating_add(1),
            Placement::Bronze => self.trophies.bronze = self.trophies.bronze.saturating_add(1),
        }
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.total_correct as usize, self.total_answered as usize)
    }

    /// Integer mean of the grammar, memory and math levels.
    #[must_use]
    pub fn overall_level(&self) -> u32 {
        (self.levels.grammar + self.levels.memory + self.levels.math) / 3
    }

    #[must_use]
    pub fn highest_level(&self) -> u32 {
        self.levels
            .grammar
            .max(self.levels.memory)
            .max(self.levels.math)
    }

    /// Subject with the highest level among grammar, memory and math. Later
    /// subjects win ties, so equal levels report Math.
    #[must_use]
    pub fn highest_level_subject(&self) -> Subject {
        [
            (Subject::Grammar, self.levels.grammar),
            (Subject::Memory, self.levels.memory),
            (Subject::Math, self.levels.math),
        ]
        .into_iter()
        .fold((Subject::Math, 0), |best, candidate| {
            if candidate.1 >= best.1 { candidate } else { best }
        })
        .0
    }
}

fn normalize_name(name: &str) -> Result<String, ProfileError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::EmptyName);
    }
    if trimmed.chars().count() > MAX_PROFILE_NAME_LEN {
        return Err(ProfileError::NameTooLong);
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnsweredQuestion, QuestionRecord};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn profile() -> PlayerProfile {
        PlayerProfile::new("  Ada ", fixed_now()).unwrap()
    }

    #[test]
    fn new_profile_defaults() {
        let p = profile();
        assert_eq!(p.name(), "Ada");
        assert_eq!(p.avatar(), DEFAULT_AVATAR);
        assert_eq!(p.level_for(Subject::Spelling), 1);
        assert_eq!(p.accuracy(), 0.0);
    }

    #[test]
    fn name_validation() {
        assert_eq!(
            PlayerProfile::new("   ", fixed_now()).unwrap_err(),
            ProfileError::EmptyName
        );
        let long = "x".repeat(MAX_PROFILE_NAME_LEN + 1);
        assert_eq!(
            PlayerProfile::new(&long, fixed_now()).unwrap_err(),
            ProfileError::NameTooLong
        );
    }

    #[test]
    fn set_level_clamps() {
        let mut p = profile();
        p.set_level(Subject::Math, 99, LevelingSettings::default());
        assert_eq!(p.level_for(Subject::Math), 65);
        p.set_level(Subject::Math, 0, LevelingSettings::default());
        assert_eq!(p.level_for(Subject::Math), 1);
    }

    #[test]
    fn apply_session_updates_totals_and_level() {
        let bounds = LevelingSettings::default();
        let q = QuestionRecord::fallback(Subject::Grammar, 4);
        let session = QuizSession::new(Subject::Grammar, 4, bounds, fixed_now())
            .record_answer(AnsweredQuestion::new(q.clone(), Some(0), fixed_now(), 900), 4)
            .unwrap()
            .record_answer(AnsweredQuestion::new(q, Some(1), fixed_now(), 900), 3)
            .unwrap();

        let mut p = profile();
        assert_eq!(
            p.apply_session(&session, bounds).unwrap_err(),
            ProfileError::SessionStillActive
        );

        let ended = session.end(fixed_now() + Duration::minutes(2)).unwrap();
        p.apply_session(&ended, bounds).unwrap();
        assert_eq!(p.total_answered(), 2);
        assert_eq!(p.total_correct(), 1);
        assert_eq!(p.level_for(Subject::Grammar), 3);
        assert_eq!(p.last_played_at(), fixed_now() + Duration::minutes(2));
    }

    #[test]
    fn gold_counts_as_win() {
        let mut p = profile();
        p.award_placement(Placement::Gold);
        p.award_placement(Placement::Bronze);
        assert_eq!(p.total_wins(), 1);
        assert_eq!(p.trophies(), Trophies { gold: 1, silver: 0, bronze: 1 });
    }

    #[test]
    fn highest_level_subject_prefers_later_on_ties() {
        let bounds = LevelingSettings::default();
        let mut p = profile();
        assert_eq!(p.highest_level_subject(), Subject::Math);
        p.set_level(Subject::Grammar, 9, bounds);
        assert_eq!(p.highest_level_subject(), Subject::Grammar);
        p.set_level(Subject::Memory, 9, bounds);
        assert_eq!(p.highest_level_subject(), Subject::Memory);
        p.set_level(Subject::Math, 12, bounds);
        assert_eq!(p.highest_level_subject(), Subject::Math);
        assert_eq!(p.highest_level(), 12);
        assert_eq!(p.overall_level(), 10);
    }

    #[test]
    fn placement_ranks() {
        assert_eq!(Placement::from_rank(0), Some(Placement::Gold));
        assert_eq!(Placement::from_rank(2), Some(Placement::Bronze));
        assert_eq!(Placement::from_rank(3), None);
    }
}
