use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BadgeId, RitualId, UserId};

/// The authenticated user's progression state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub farcaster_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub active_rituals: Vec<RitualId>,
    pub streak_count: u32,
    /// Set semantics: never contains duplicates.
    pub badges_earned: Vec<BadgeId>,
    pub total_points: u32,
    pub last_active_date: Option<DateTime<Utc>>,
    pub premium_features: bool,
}

impl User {
    #[must_use]
    pub fn has_badge(&self, badge: &BadgeId) -> bool {
        self.badges_earned.contains(badge)
    }
}

/// Initial data for provisioning a profile. Counters start at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_id: UserId,
    pub farcaster_id: Option<String>,
    pub active_rituals: Vec<RitualId>,
}

impl NewUser {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            farcaster_id: None,
            active_rituals: Vec::new(),
        }
    }
}

/// Partial update of a user profile. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    /// `Some(None)` unlinks the Farcaster account.
    pub farcaster_id: Option<Option<String>>,
    pub active_rituals: Option<Vec<RitualId>>,
    pub streak_count: Option<u32>,
    pub badges_earned: Option<Vec<BadgeId>>,
    pub total_points: Option<u32>,
    pub last_active_date: Option<DateTime<Utc>>,
    pub premium_features: Option<bool>,
}

impl UserPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
