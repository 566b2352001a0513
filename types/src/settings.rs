use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{ReminderTime, UserId};

/// Per-user reminder and sharing preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub user_id: UserId,
    pub daily_reminders: bool,
    pub reminder_time: ReminderTime,
    pub streak_reminders: bool,
    pub badge_notifications: bool,
    pub social_sharing: bool,
}

impl NotificationSettings {
    /// Defaults for a user who never saved settings: reminders at 09:00, sharing off.
    #[must_use]
    pub fn defaults_for(user_id: UserId) -> Self {
        Self {
            user_id,
            daily_reminders: true,
            reminder_time: ReminderTime::from_time(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            ),
            streak_reminders: true,
            badge_notifications: true,
            social_sharing: false,
        }
    }
}
