use chrono::NaiveDate;
use serde_json::Error as JsonError;
use thiserror::Error;

use resilience_types::{
    Badge, BadgeId, NewRitual, NewSession, NewUser, NotificationSettings, Ritual,
    RitualCategory, RitualId, RitualPatch, Session, SessionWithRitual, User, UserBadge, UserId,
    UserPatch,
};

/// Failure reported by a persistence backend.
///
/// A missing row on *read* is not an error (`Ok(None)`); a missing row on
/// *update* is [`BackendError::NotFound`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("no {table} row with id {id}")]
    NotFound { table: &'static str, id: String },
    #[error("column {table}.{column} holds unreadable value {value:?}")]
    Corrupt {
        table: &'static str,
        column: &'static str,
        value: String,
    },
    #[error("failed to encode {column}: {source}")]
    Encode {
        column: &'static str,
        #[source]
        source: JsonError,
    },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Aggregates over a user's completed sessions and active rituals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UserStats {
    pub total_sessions: u32,
    pub total_rituals: u32,
    /// Sum of `points_earned` across completed sessions.
    pub total_points: u32,
    /// Mean of `mood_after - mood_before` over sessions that recorded both,
    /// rounded to two decimals. Zero when no session has both.
    pub average_mood_improvement: f64,
}

/// The table-oriented store behind the profile and catalog stores.
///
/// Implementations are used from a single thread; every call runs to
/// completion before the next one starts.
pub trait Backend {
    // Users

    fn create_user(&self, user: &NewUser) -> Result<User, BackendError>;

    fn get_user(&self, id: &UserId) -> Result<Option<User>, BackendError>;

    fn update_user(&self, id: &UserId, patch: &UserPatch) -> Result<User, BackendError>;

    // Rituals

    /// Insert with `completed_today = false` and `is_active = true`.
    fn create_ritual(&self, ritual: &NewRitual) -> Result<Ritual, BackendError>;

    fn get_ritual(&self, id: &RitualId) -> Result<Option<Ritual>, BackendError>;

    /// Active rituals only, newest first.
    fn rituals_for_user(&self, user: &UserId) -> Result<Vec<Ritual>, BackendError>;

    fn update_ritual(&self, id: &RitualId, patch: &RitualPatch) -> Result<Ritual, BackendError>;

    /// Reset `completed_today` on rituals whose latest completed session is
    /// older than `today` (UTC). Returns the number of rituals reset.
    fn clear_stale_completions(&self, user: &UserId, today: NaiveDate)
    -> Result<usize, BackendError>;

    // Sessions

    fn create_session(&self, session: &NewSession) -> Result<Session, BackendError>;

    /// Newest first, joined with ritual name and category. `None` means no limit.
    fn sessions_for_user(
        &self,
        user: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<SessionWithRitual>, BackendError>;

    /// Completed sessions, optionally restricted to rituals of one category.
    fn completed_session_count(
        &self,
        user: &UserId,
        category: Option<RitualCategory>,
    ) -> Result<u32, BackendError>;

    // Badges

    /// Ordered by name.
    fn all_badges(&self) -> Result<Vec<Badge>, BackendError>;

    /// Newest unlock first.
    fn user_badges(&self, user: &UserId) -> Result<Vec<UserBadge>, BackendError>;

    /// Record an unlock. Awarding a held badge returns the original unlock.
    fn award_badge(&self, user: &UserId, badge: &BadgeId) -> Result<UserBadge, BackendError>;

    // Analytics and settings

    fn user_stats(&self, user: &UserId) -> Result<UserStats, BackendError>;

    fn notification_settings(
        &self,
        user: &UserId,
    ) -> Result<Option<NotificationSettings>, BackendError>;

    fn save_notification_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings, BackendError>;
}
