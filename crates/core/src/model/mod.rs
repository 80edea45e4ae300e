mod ids;
mod level;
mod profile;
mod question;
mod session;
mod settings;
mod subject;

pub use ids::{ParseIdError, ProfileId, QuestionId, SessionId};
pub use level::{LevelChangeResult, LevelState};
pub use profile::{
    DEFAULT_AVATAR, DEFAULT_PROFILE_NAME, MAX_PROFILE_NAME_LEN, PersistedProfile, Placement,
    PlayerProfile, ProfileError, SubjectLevels, Trophies,
};
pub use question::{QuestionDraft, QuestionError, QuestionRecord};
pub use session::{AnsweredQuestion, QuizSession, QuizSessionError, SessionSummary, ratio};
pub use settings::{
    DEFAULT_CORRECT_TO_LEVEL_UP, DEFAULT_MATCH_QUESTIONS, DEFAULT_MAX_LEVEL, DEFAULT_MIN_LEVEL,
    DEFAULT_TURN_TIME_LIMIT_SECS, LevelingSettings, QuizSettings, SettingsError,
    UsedQuestionScope,
};
pub use subject::{ParseSubjectError, Subject};
