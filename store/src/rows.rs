//! Wire rows and the snake_case ⇄ domain mapping.
//!
//! Each `*Row` struct mirrors one table exactly as stored (text timestamps,
//! integer flags, JSON-encoded arrays). Conversions into domain types
//! validate every column and report the first unreadable one as
//! [`BackendError::Corrupt`].

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Value;

use resilience_types::{
    Badge, BadgeCategory, BadgeId, BadgeRarity, BadgeRule, Difficulty, Frequency, MoodLevel,
    NonEmptyString, NotificationSettings, ReminderTime, Ritual, RitualCategory, RitualId,
    RitualPatch, Session, SessionId, SessionNotes, User, UserBadge, UserId, UserPatch,
};

use crate::BackendError;

/// Table names of the remote store.
pub mod tables {
    pub const USERS: &str = "users";
    pub const RITUALS: &str = "rituals";
    pub const SESSIONS: &str = "sessions";
    pub const BADGES: &str = "badges";
    pub const USER_BADGES: &str = "user_badges";
    pub const NOTIFICATION_SETTINGS: &str = "notification_settings";
}

// ── Scalars ─────────────────────────────────────────────────────────────

pub(crate) fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_time(
    table: &'static str,
    column: &'static str,
    raw: &str,
) -> Result<DateTime<Utc>, BackendError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| corrupt(table, column, raw))
}

pub(crate) fn decode_count(table: &'static str, column: &'static str, raw: i64) -> Result<u32, BackendError> {
    u32::try_from(raw).map_err(|_| corrupt(table, column, &raw.to_string()))
}

fn decode_mood(
    table: &'static str,
    column: &'static str,
    raw: Option<i64>,
) -> Result<Option<MoodLevel>, BackendError> {
    raw.map(|value| {
        u8::try_from(value)
            .ok()
            .and_then(|value| MoodLevel::new(value).ok())
            .ok_or_else(|| corrupt(table, column, &value.to_string()))
    })
    .transpose()
}

fn decode_uuid_id<T>(
    table: &'static str,
    column: &'static str,
    raw: &str,
    wrap: fn(uuid::Uuid) -> T,
) -> Result<T, BackendError> {
    uuid::Uuid::parse_str(raw)
        .map(wrap)
        .map_err(|_| corrupt(table, column, raw))
}

fn decode_user_id(table: &'static str, raw: String) -> Result<UserId, BackendError> {
    UserId::new(raw.clone()).map_err(|_| corrupt(table, "user_id", &raw))
}

fn decode_json<T: serde::de::DeserializeOwned>(
    table: &'static str,
    column: &'static str,
    raw: &str,
) -> Result<T, BackendError> {
    serde_json::from_str(raw).map_err(|_| corrupt(table, column, raw))
}

pub(crate) fn encode_json<T: serde::Serialize>(
    column: &'static str,
    value: &T,
) -> Result<String, BackendError> {
    serde_json::to_string(value).map_err(|source| BackendError::Encode { column, source })
}

fn corrupt(table: &'static str, column: &'static str, value: &str) -> BackendError {
    BackendError::Corrupt {
        table,
        column,
        value: value.to_string(),
    }
}

fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

// ── users ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct UserRow {
    user_id: String,
    farcaster_id: Option<String>,
    created_at: String,
    active_rituals: String,
    streak_count: i64,
    badges_earned: String,
    total_points: i64,
    last_active_date: Option<String>,
    premium_features: bool,
}

impl UserRow {
    pub(crate) const COLUMNS: &'static str = "user_id, farcaster_id, created_at, active_rituals, \
         streak_count, badges_earned, total_points, last_active_date, premium_features";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            farcaster_id: row.get(1)?,
            created_at: row.get(2)?,
            active_rituals: row.get(3)?,
            streak_count: row.get(4)?,
            badges_earned: row.get(5)?,
            total_points: row.get(6)?,
            last_active_date: row.get(7)?,
            premium_features: row.get(8)?,
        })
    }

    pub(crate) fn into_user(self) -> Result<User, BackendError> {
        const T: &str = tables::USERS;
        let active_rituals: Vec<RitualId> =
            decode_json(T, "active_rituals", &self.active_rituals)?;
        let mut badges_earned: Vec<BadgeId> = decode_json(T, "badges_earned", &self.badges_earned)?;
        let mut seen = Vec::with_capacity(badges_earned.len());
        badges_earned.retain(|badge| {
            if seen.contains(badge) {
                false
            } else {
                seen.push(badge.clone());
                true
            }
        });

        Ok(User {
            user_id: decode_user_id(T, self.user_id)?,
            farcaster_id: self.farcaster_id,
            created_at: decode_time(T, "created_at", &self.created_at)?,
            active_rituals,
            streak_count: decode_count(T, "streak_count", self.streak_count)?,
            badges_earned,
            total_points: decode_count(T, "total_points", self.total_points)?,
            last_active_date: self
                .last_active_date
                .as_deref()
                .map(|raw| decode_time(T, "last_active_date", raw))
                .transpose()?,
            premium_features: self.premium_features,
        })
    }
}

/// Column assignments for a user patch, in declaration order.
pub(crate) fn user_patch_columns(
    patch: &UserPatch,
) -> Result<Vec<(&'static str, Value)>, BackendError> {
    let mut columns = Vec::new();
    if let Some(farcaster_id) = &patch.farcaster_id {
        let value = farcaster_id.clone().map_or(Value::Null, Value::Text);
        columns.push(("farcaster_id", value));
    }
    if let Some(active_rituals) = &patch.active_rituals {
        columns.push((
            "active_rituals",
            Value::Text(encode_json("active_rituals", active_rituals)?),
        ));
    }
    if let Some(streak_count) = patch.streak_count {
        columns.push(("streak_count", Value::Integer(i64::from(streak_count))));
    }
    if let Some(badges) = &patch.badges_earned {
        columns.push((
            "badges_earned",
            Value::Text(encode_json("badges_earned", badges)?),
        ));
    }
    if let Some(total_points) = patch.total_points {
        columns.push(("total_points", Value::Integer(i64::from(total_points))));
    }
    if let Some(last_active_date) = patch.last_active_date {
        columns.push(("last_active_date", Value::Text(encode_time(last_active_date))));
    }
    if let Some(premium) = patch.premium_features {
        columns.push(("premium_features", flag(premium)));
    }
    Ok(columns)
}

// ── rituals ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct RitualRow {
    ritual_id: String,
    user_id: String,
    name: String,
    description: String,
    frequency: String,
    start_time: Option<String>,
    completed_today: bool,
    created_at: String,
    is_active: bool,
    category: String,
    difficulty: String,
    estimated_duration: i64,
}

impl RitualRow {
    pub(crate) const COLUMNS: &'static str = "ritual_id, user_id, name, description, frequency, \
         start_time, completed_today, created_at, is_active, category, difficulty, \
         estimated_duration";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ritual_id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            frequency: row.get(4)?,
            start_time: row.get(5)?,
            completed_today: row.get(6)?,
            created_at: row.get(7)?,
            is_active: row.get(8)?,
            category: row.get(9)?,
            difficulty: row.get(10)?,
            estimated_duration: row.get(11)?,
        })
    }

    pub(crate) fn into_ritual(self) -> Result<Ritual, BackendError> {
        const T: &str = tables::RITUALS;
        Ok(Ritual {
            ritual_id: decode_uuid_id(T, "ritual_id", &self.ritual_id, RitualId::from_uuid)?,
            user_id: decode_user_id(T, self.user_id)?,
            name: NonEmptyString::new(self.name.clone()).map_err(|_| corrupt(T, "name", &self.name))?,
            description: self.description,
            frequency: Frequency::parse(&self.frequency)
                .ok_or_else(|| corrupt(T, "frequency", &self.frequency))?,
            start_time: self
                .start_time
                .as_deref()
                .map(|raw| ReminderTime::parse(raw).map_err(|_| corrupt(T, "start_time", raw)))
                .transpose()?,
            completed_today: self.completed_today,
            created_at: decode_time(T, "created_at", &self.created_at)?,
            is_active: self.is_active,
            category: RitualCategory::parse(&self.category)
                .ok_or_else(|| corrupt(T, "category", &self.category))?,
            difficulty: Difficulty::parse(&self.difficulty)
                .ok_or_else(|| corrupt(T, "difficulty", &self.difficulty))?,
            estimated_duration: decode_count(T, "estimated_duration", self.estimated_duration)?,
        })
    }
}

pub(crate) fn ritual_patch_columns(patch: &RitualPatch) -> Vec<(&'static str, Value)> {
    let mut columns = Vec::new();
    if let Some(name) = &patch.name {
        columns.push(("name", Value::Text(name.as_str().to_string())));
    }
    if let Some(description) = &patch.description {
        columns.push(("description", Value::Text(description.clone())));
    }
    if let Some(frequency) = patch.frequency {
        columns.push(("frequency", Value::Text(frequency.as_str().to_string())));
    }
    if let Some(start_time) = patch.start_time {
        let value = start_time.map_or(Value::Null, |time| Value::Text(time.to_string()));
        columns.push(("start_time", value));
    }
    if let Some(completed_today) = patch.completed_today {
        columns.push(("completed_today", flag(completed_today)));
    }
    if let Some(is_active) = patch.is_active {
        columns.push(("is_active", flag(is_active)));
    }
    if let Some(category) = patch.category {
        columns.push(("category", Value::Text(category.as_str().to_string())));
    }
    if let Some(difficulty) = patch.difficulty {
        columns.push(("difficulty", Value::Text(difficulty.as_str().to_string())));
    }
    if let Some(minutes) = patch.estimated_duration {
        columns.push(("estimated_duration", Value::Integer(i64::from(minutes))));
    }
    columns
}

// ── sessions ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct SessionRow {
    session_id: String,
    user_id: String,
    ritual_id: String,
    timestamp: String,
    mood_before: Option<i64>,
    mood_after: Option<i64>,
    notes: Option<String>,
    points_earned: i64,
    completed: bool,
}

impl SessionRow {
    pub(crate) const COLUMNS: &'static str = "session_id, user_id, ritual_id, timestamp, \
         mood_before, mood_after, notes, points_earned, completed";

    /// Number of columns consumed by [`SessionRow::from_row`].
    pub(crate) const WIDTH: usize = 9;

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            session_id: row.get(0)?,
            user_id: row.get(1)?,
            ritual_id: row.get(2)?,
            timestamp: row.get(3)?,
            mood_before: row.get(4)?,
            mood_after: row.get(5)?,
            notes: row.get(6)?,
            points_earned: row.get(7)?,
            completed: row.get(8)?,
        })
    }

    pub(crate) fn into_session(self) -> Result<Session, BackendError> {
        const T: &str = tables::SESSIONS;
        Ok(Session {
            session_id: decode_uuid_id(T, "session_id", &self.session_id, SessionId::from_uuid)?,
            user_id: decode_user_id(T, self.user_id)?,
            ritual_id: decode_uuid_id(T, "ritual_id", &self.ritual_id, RitualId::from_uuid)?,
            timestamp: decode_time(T, "timestamp", &self.timestamp)?,
            mood_before: decode_mood(T, "mood_before", self.mood_before)?,
            mood_after: decode_mood(T, "mood_after", self.mood_after)?,
            notes: self
                .notes
                .map(|raw| SessionNotes::new(raw.clone()).map_err(|_| corrupt(T, "notes", &raw)))
                .transpose()?,
            points_earned: decode_count(T, "points_earned", self.points_earned)?,
            completed: self.completed,
        })
    }
}

pub(crate) fn decode_category(raw: &str) -> Result<RitualCategory, BackendError> {
    RitualCategory::parse(raw).ok_or_else(|| corrupt(tables::RITUALS, "category", raw))
}

// ── badges ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct BadgeRow {
    pub(crate) badge_id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) image_url: Option<String>,
    pub(crate) category: String,
    pub(crate) rarity: String,
    pub(crate) requirement: String,
    pub(crate) points_required: Option<i64>,
    pub(crate) streak_required: Option<i64>,
    pub(crate) completions_required: Option<i64>,
    pub(crate) completion_category: Option<String>,
}

impl BadgeRow {
    pub(crate) const COLUMNS: &'static str = "badge_id, name, description, image_url, category, \
         rarity, requirement, points_required, streak_required, completions_required, \
         completion_category";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            badge_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            image_url: row.get(3)?,
            category: row.get(4)?,
            rarity: row.get(5)?,
            requirement: row.get(6)?,
            points_required: row.get(7)?,
            streak_required: row.get(8)?,
            completions_required: row.get(9)?,
            completion_category: row.get(10)?,
        })
    }

    pub(crate) fn from_badge(badge: &Badge) -> Self {
        let (points_required, streak_required, completions_required, completion_category) =
            match badge.rule {
                BadgeRule::Points { total } => (Some(i64::from(total)), None, None, None),
                BadgeRule::Streak { days } => (None, Some(i64::from(days)), None, None),
                BadgeRule::Completions { count, category } => (
                    None,
                    None,
                    Some(i64::from(count)),
                    category.map(|c| c.as_str().to_string()),
                ),
            };
        Self {
            badge_id: badge.badge_id.as_str().to_string(),
            name: badge.name.clone(),
            description: badge.description.clone(),
            image_url: Some(badge.icon.clone()),
            category: badge.category.as_str().to_string(),
            rarity: badge.rarity.as_str().to_string(),
            requirement: badge.requirement.clone(),
            points_required,
            streak_required,
            completions_required,
            completion_category,
        }
    }

    pub(crate) fn into_badge(self) -> Result<Badge, BackendError> {
        const T: &str = tables::BADGES;
        let rule = match (
            self.streak_required,
            self.points_required,
            self.completions_required,
        ) {
            (Some(days), _, _) => BadgeRule::Streak {
                days: decode_count(T, "streak_required", days)?,
            },
            (None, Some(total), _) => BadgeRule::Points {
                total: decode_count(T, "points_required", total)?,
            },
            (None, None, Some(count)) => BadgeRule::Completions {
                count: decode_count(T, "completions_required", count)?,
                category: self
                    .completion_category
                    .as_deref()
                    .map(|raw| {
                        RitualCategory::parse(raw)
                            .ok_or_else(|| corrupt(T, "completion_category", raw))
                    })
                    .transpose()?,
            },
            (None, None, None) => return Err(corrupt(T, "requirement", &self.requirement)),
        };

        Ok(Badge {
            badge_id: BadgeId::new(self.badge_id),
            name: self.name,
            description: self.description,
            icon: self.image_url.unwrap_or_default(),
            category: BadgeCategory::parse(&self.category)
                .ok_or_else(|| corrupt(T, "category", &self.category))?,
            rarity: BadgeRarity::parse(&self.rarity)
                .ok_or_else(|| corrupt(T, "rarity", &self.rarity))?,
            requirement: self.requirement,
            rule,
        })
    }
}

#[derive(Debug)]
pub(crate) struct UserBadgeRow {
    user_id: String,
    badge_id: String,
    unlocked_at: String,
}

impl UserBadgeRow {
    pub(crate) const COLUMNS: &'static str = "user_id, badge_id, unlocked_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            badge_id: row.get(1)?,
            unlocked_at: row.get(2)?,
        })
    }

    pub(crate) fn into_user_badge(self) -> Result<UserBadge, BackendError> {
        const T: &str = tables::USER_BADGES;
        Ok(UserBadge {
            user_id: decode_user_id(T, self.user_id)?,
            badge_id: BadgeId::new(self.badge_id),
            unlocked_at: decode_time(T, "unlocked_at", &self.unlocked_at)?,
        })
    }
}

// ── notification_settings ───────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct SettingsRow {
    user_id: String,
    daily_reminders: bool,
    reminder_time: String,
    streak_reminders: bool,
    badge_notifications: bool,
    social_sharing: bool,
}

impl SettingsRow {
    pub(crate) const COLUMNS: &'static str = "user_id, daily_reminders, reminder_time, \
         streak_reminders, badge_notifications, social_sharing";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            daily_reminders: row.get(1)?,
            reminder_time: row.get(2)?,
            streak_reminders: row.get(3)?,
            badge_notifications: row.get(4)?,
            social_sharing: row.get(5)?,
        })
    }

    pub(crate) fn into_settings(self) -> Result<NotificationSettings, BackendError> {
        const T: &str = tables::NOTIFICATION_SETTINGS;
        Ok(NotificationSettings {
            user_id: decode_user_id(T, self.user_id)?,
            daily_reminders: self.daily_reminders,
            reminder_time: ReminderTime::parse(&self.reminder_time)
                .map_err(|_| corrupt(T, "reminder_time", &self.reminder_time))?,
            streak_reminders: self.streak_reminders,
            badge_notifications: self.badge_notifications,
            social_sharing: self.social_sharing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_patch_maps_to_snake_case_columns() {
        let patch = UserPatch {
            streak_count: Some(4),
            badges_earned: Some(vec![BadgeId::from("week_warrior")]),
            premium_features: Some(true),
            ..UserPatch::default()
        };
        let columns = user_patch_columns(&patch).unwrap();
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["streak_count", "badges_earned", "premium_features"]);
        assert_eq!(columns[1].1, Value::Text("[\"week_warrior\"]".to_string()));
        assert_eq!(columns[2].1, Value::Integer(1));
    }

    #[test]
    fn ritual_patch_skips_absent_fields() {
        let columns = ritual_patch_columns(&RitualPatch::completed_today(true));
        assert_eq!(columns, vec![("completed_today", Value::Integer(1))]);
        assert!(ritual_patch_columns(&RitualPatch::default()).is_empty());
    }

    #[test]
    fn cleared_fields_become_null() {
        let user = UserPatch {
            farcaster_id: Some(None),
            ..UserPatch::default()
        };
        assert_eq!(
            user_patch_columns(&user).unwrap(),
            vec![("farcaster_id", Value::Null)]
        );

        let ritual = RitualPatch {
            start_time: Some(None),
            ..RitualPatch::default()
        };
        assert_eq!(ritual_patch_columns(&ritual), vec![("start_time", Value::Null)]);
    }

    #[test]
    fn times_are_utc_millis() {
        let time = DateTime::parse_from_rfc3339("2026-03-01T08:15:00+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(encode_time(time), "2026-03-01T06:15:00.000Z");
        assert_eq!(decode_time("t", "c", "2026-03-01T06:15:00.000Z").unwrap(), time);
        assert!(decode_time("t", "c", "yesterday").is_err());
    }

    #[test]
    fn badge_row_round_trips_every_rule_kind() {
        for badge in resilience_types::badge_catalog() {
            let decoded = BadgeRow::from_badge(badge).into_badge().unwrap();
            assert_eq!(&decoded, badge);
        }
    }

    #[test]
    fn out_of_range_mood_is_corrupt() {
        let err = decode_mood("sessions", "mood_after", Some(9)).unwrap_err();
        assert!(matches!(
            err,
            BackendError::Corrupt {
                column: "mood_after",
                ..
            }
        ));
        assert_eq!(decode_mood("sessions", "mood_after", None).unwrap(), None);
    }
}
