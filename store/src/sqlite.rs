//! SQLite implementation of [`Backend`].

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::debug;

use resilience_types::{
    Badge, BadgeId, NewRitual, NewSession, NewUser, NotificationSettings, Ritual, RitualCategory,
    RitualId, RitualPatch, Session, SessionId, SessionWithRitual, User, UserBadge, UserId,
    UserPatch, badge_catalog,
};

use crate::rows::{
    BadgeRow, RitualRow, SessionRow, SettingsRow, UserBadgeRow, UserRow, decode_category,
    decode_count, encode_json, encode_time, ritual_patch_columns, tables, user_patch_columns,
};
use crate::sqlite_util::open_secure_db;
use crate::{Backend, BackendError, UserStats};

/// A [`Backend`] over a single SQLite connection.
pub struct SqliteBackend {
    db: Connection,
}

impl SqliteBackend {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            farcaster_id TEXT,
            created_at TEXT NOT NULL,
            active_rituals TEXT NOT NULL DEFAULT '[]',
            streak_count INTEGER NOT NULL DEFAULT 0,
            badges_earned TEXT NOT NULL DEFAULT '[]',
            total_points INTEGER NOT NULL DEFAULT 0,
            last_active_date TEXT,
            premium_features INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS rituals (
            ritual_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            frequency TEXT NOT NULL,
            start_time TEXT,
            completed_today INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            category TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            estimated_duration INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS sessions (
            session_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            ritual_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            mood_before INTEGER CHECK (mood_before BETWEEN 1 AND 5),
            mood_after INTEGER CHECK (mood_after BETWEEN 1 AND 5),
            notes TEXT,
            points_earned INTEGER NOT NULL DEFAULT 0,
            completed INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE,
            FOREIGN KEY (ritual_id) REFERENCES rituals(ritual_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS badges (
            badge_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            image_url TEXT,
            category TEXT NOT NULL,
            rarity TEXT NOT NULL,
            requirement TEXT NOT NULL,
            points_required INTEGER,
            streak_required INTEGER,
            completions_required INTEGER,
            completion_category TEXT
        );

        CREATE TABLE IF NOT EXISTS user_badges (
            user_id TEXT NOT NULL,
            badge_id TEXT NOT NULL,
            unlocked_at TEXT NOT NULL,
            PRIMARY KEY (user_id, badge_id),
            FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE,
            FOREIGN KEY (badge_id) REFERENCES badges(badge_id)
        );

        CREATE TABLE IF NOT EXISTS notification_settings (
            user_id TEXT PRIMARY KEY,
            daily_reminders INTEGER NOT NULL,
            reminder_time TEXT NOT NULL,
            streak_reminders INTEGER NOT NULL,
            badge_notifications INTEGER NOT NULL,
            social_sharing INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_rituals_user
        ON rituals(user_id, is_active);

        CREATE INDEX IF NOT EXISTS idx_sessions_user_time
        ON sessions(user_id, timestamp);

        CREATE INDEX IF NOT EXISTS idx_sessions_ritual
        ON sessions(ritual_id);
    ";

    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = open_secure_db(path)?;
        debug!(path = %path.display(), "Opened resilience database");
        Self::initialize(db)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::initialize(db)
    }

    fn initialize(mut db: Connection) -> Result<Self> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )
        .context("Failed to set database pragmas")?;
        db.execute_batch(Self::SCHEMA)
            .context("Failed to create database schema")?;
        Self::seed_badges(&mut db).context("Failed to seed badge catalog")?;
        Ok(Self { db })
    }

    /// Upsert the static badge catalog so renamed or re-described badges
    /// propagate on the next open.
    fn seed_badges(db: &mut Connection) -> rusqlite::Result<()> {
        let tx = db.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO badges (badge_id, name, description, image_url, category, rarity,
                                     requirement, points_required, streak_required,
                                     completions_required, completion_category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(badge_id) DO UPDATE SET
                     name = excluded.name,
                     description = excluded.description,
                     image_url = excluded.image_url,
                     category = excluded.category,
                     rarity = excluded.rarity,
                     requirement = excluded.requirement,
                     points_required = excluded.points_required,
                     streak_required = excluded.streak_required,
                     completions_required = excluded.completions_required,
                     completion_category = excluded.completion_category",
            )?;
            for badge in badge_catalog() {
                let row = BadgeRow::from_badge(badge);
                stmt.execute(params![
                    row.badge_id,
                    row.name,
                    row.description,
                    row.image_url,
                    row.category,
                    row.rarity,
                    row.requirement,
                    row.points_required,
                    row.streak_required,
                    row.completions_required,
                    row.completion_category,
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = badge_catalog().len(), "Seeded badge catalog");
        Ok(())
    }

    /// Run `UPDATE {table} SET ... WHERE {key} = id`. Fails with `NotFound`
    /// when no row matched.
    fn update_columns(
        &self,
        table: &'static str,
        key: &'static str,
        id: &str,
        columns: Vec<(&'static str, Value)>,
    ) -> Result<(), BackendError> {
        if columns.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE {table} SET {} WHERE {key} = ?{}",
            assignments.join(", "),
            columns.len() + 1
        );

        let mut values: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Text(id.to_string()));

        let changed = self.db.execute(&sql, params_from_iter(values.iter()))?;
        if changed == 0 {
            return Err(BackendError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<u32, BackendError> {
        let raw: i64 = self.db.query_row(sql, params, |row| row.get(0))?;
        decode_count(tables::SESSIONS, "count", raw)
    }
}

impl Backend for SqliteBackend {
    fn create_user(&self, user: &NewUser) -> Result<User, BackendError> {
        self.db.execute(
            "INSERT INTO users (user_id, farcaster_id, created_at, active_rituals)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.user_id.as_str(),
                user.farcaster_id,
                encode_time(Utc::now()),
                encode_json("active_rituals", &user.active_rituals)?,
            ],
        )?;
        debug!(user = %user.user_id, "Created user");
        self.get_user(&user.user_id)?
            .ok_or_else(|| BackendError::NotFound {
                table: tables::USERS,
                id: user.user_id.to_string(),
            })
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>, BackendError> {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?1", UserRow::COLUMNS);
        self.db
            .query_row(&sql, params![id.as_str()], UserRow::from_row)
            .optional()?
            .map(UserRow::into_user)
            .transpose()
    }

    fn update_user(&self, id: &UserId, patch: &UserPatch) -> Result<User, BackendError> {
        self.update_columns(
            tables::USERS,
            "user_id",
            id.as_str(),
            user_patch_columns(patch)?,
        )?;
        self.get_user(id)?.ok_or_else(|| BackendError::NotFound {
            table: tables::USERS,
            id: id.to_string(),
        })
    }

    fn create_ritual(&self, ritual: &NewRitual) -> Result<Ritual, BackendError> {
        let id = RitualId::generate();
        self.db.execute(
            "INSERT INTO rituals (ritual_id, user_id, name, description, frequency, start_time,
                                  completed_today, created_at, is_active, category, difficulty,
                                  estimated_duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, 1, ?8, ?9, ?10)",
            params![
                id.to_string(),
                ritual.user_id.as_str(),
                ritual.name.as_str(),
                ritual.description,
                ritual.frequency.as_str(),
                ritual.start_time.map(|time| time.to_string()),
                encode_time(Utc::now()),
                ritual.category.as_str(),
                ritual.difficulty.as_str(),
                i64::from(ritual.estimated_duration),
            ],
        )?;
        debug!(ritual = %id, user = %ritual.user_id, "Created ritual");
        self.get_ritual(&id)?.ok_or_else(|| BackendError::NotFound {
            table: tables::RITUALS,
            id: id.to_string(),
        })
    }

    fn get_ritual(&self, id: &RitualId) -> Result<Option<Ritual>, BackendError> {
        let sql = format!(
            "SELECT {} FROM rituals WHERE ritual_id = ?1",
            RitualRow::COLUMNS
        );
        self.db
            .query_row(&sql, params![id.to_string()], RitualRow::from_row)
            .optional()?
            .map(RitualRow::into_ritual)
            .transpose()
    }

    fn rituals_for_user(&self, user: &UserId) -> Result<Vec<Ritual>, BackendError> {
        let sql = format!(
            "SELECT {} FROM rituals
             WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at DESC, rowid DESC",
            RitualRow::COLUMNS
        );
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user.as_str()], RitualRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(RitualRow::into_ritual).collect()
    }

    fn update_ritual(&self, id: &RitualId, patch: &RitualPatch) -> Result<Ritual, BackendError> {
        let key = id.to_string();
        self.update_columns(
            tables::RITUALS,
            "ritual_id",
            &key,
            ritual_patch_columns(patch),
        )?;
        self.get_ritual(id)?.ok_or(BackendError::NotFound {
            table: tables::RITUALS,
            id: key,
        })
    }

    fn clear_stale_completions(
        &self,
        user: &UserId,
        today: NaiveDate,
    ) -> Result<usize, BackendError> {
        let cleared = self.db.execute(
            "UPDATE rituals SET completed_today = 0
             WHERE user_id = ?1
               AND completed_today = 1
               AND NOT EXISTS (
                   SELECT 1 FROM sessions s
                   WHERE s.ritual_id = rituals.ritual_id
                     AND s.completed = 1
                     AND substr(s.timestamp, 1, 10) >= ?2
               )",
            params![user.as_str(), today.format("%Y-%m-%d").to_string()],
        )?;
        if cleared > 0 {
            debug!(user = %user, cleared, "Cleared stale completions");
        }
        Ok(cleared)
    }

    fn create_session(&self, session: &NewSession) -> Result<Session, BackendError> {
        let id = SessionId::generate();
        self.db.execute(
            "INSERT INTO sessions (session_id, user_id, ritual_id, timestamp, mood_before,
                                   mood_after, notes, points_earned, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id.to_string(),
                session.user_id.as_str(),
                session.ritual_id.to_string(),
                encode_time(Utc::now()),
                session.mood_before.map(|mood| i64::from(mood.value())),
                session.mood_after.map(|mood| i64::from(mood.value())),
                session.notes.as_ref().map(|notes| notes.as_str().to_string()),
                i64::from(session.points_earned),
                session.completed,
            ],
        )?;
        debug!(session = %id, ritual = %session.ritual_id, "Recorded session");

        let sql = format!(
            "SELECT {} FROM sessions WHERE session_id = ?1",
            SessionRow::COLUMNS
        );
        self.db
            .query_row(&sql, params![id.to_string()], SessionRow::from_row)?
            .into_session()
    }

    fn sessions_for_user(
        &self,
        user: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<SessionWithRitual>, BackendError> {
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = self.db.prepare(
            "SELECT s.session_id, s.user_id, s.ritual_id, s.timestamp, s.mood_before,
                    s.mood_after, s.notes, s.points_earned, s.completed,
                    r.name, r.category
             FROM sessions s
             JOIN rituals r ON r.ritual_id = s.ritual_id
             WHERE s.user_id = ?1
             ORDER BY s.timestamp DESC, s.rowid DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![user.as_str(), limit], |row| {
                Ok((
                    SessionRow::from_row(row)?,
                    row.get::<_, String>(SessionRow::WIDTH)?,
                    row.get::<_, String>(SessionRow::WIDTH + 1)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(session, ritual_name, category)| {
                Ok(SessionWithRitual {
                    session: session.into_session()?,
                    ritual_name,
                    ritual_category: decode_category(&category)?,
                })
            })
            .collect()
    }

    fn completed_session_count(
        &self,
        user: &UserId,
        category: Option<RitualCategory>,
    ) -> Result<u32, BackendError> {
        match category {
            None => self.count(
                "SELECT COUNT(*) FROM sessions WHERE user_id = ?1 AND completed = 1",
                params![user.as_str()],
            ),
            Some(category) => self.count(
                "SELECT COUNT(*) FROM sessions s
                 JOIN rituals r ON r.ritual_id = s.ritual_id
                 WHERE s.user_id = ?1 AND s.completed = 1 AND r.category = ?2",
                params![user.as_str(), category.as_str()],
            ),
        }
    }

    fn all_badges(&self) -> Result<Vec<Badge>, BackendError> {
        let sql = format!("SELECT {} FROM badges ORDER BY name", BadgeRow::COLUMNS);
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map([], BadgeRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(BadgeRow::into_badge).collect()
    }

    fn user_badges(&self, user: &UserId) -> Result<Vec<UserBadge>, BackendError> {
        let sql = format!(
            "SELECT {} FROM user_badges WHERE user_id = ?1
             ORDER BY unlocked_at DESC, rowid DESC",
            UserBadgeRow::COLUMNS
        );
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user.as_str()], UserBadgeRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(UserBadgeRow::into_user_badge).collect()
    }

    fn award_badge(&self, user: &UserId, badge: &BadgeId) -> Result<UserBadge, BackendError> {
        let inserted = self.db.execute(
            "INSERT OR IGNORE INTO user_badges (user_id, badge_id, unlocked_at)
             VALUES (?1, ?2, ?3)",
            params![user.as_str(), badge.as_str(), encode_time(Utc::now())],
        )?;
        if inserted > 0 {
            debug!(user = %user, badge = %badge, "Awarded badge");
        }

        let sql = format!(
            "SELECT {} FROM user_badges WHERE user_id = ?1 AND badge_id = ?2",
            UserBadgeRow::COLUMNS
        );
        self.db
            .query_row(&sql, params![user.as_str(), badge.as_str()], UserBadgeRow::from_row)?
            .into_user_badge()
    }

    fn user_stats(&self, user: &UserId) -> Result<UserStats, BackendError> {
        let total_sessions = self.completed_session_count(user, None)?;
        let total_rituals = self.count(
            "SELECT COUNT(*) FROM rituals WHERE user_id = ?1 AND is_active = 1",
            params![user.as_str()],
        )?;
        let total_points = self.count(
            "SELECT COALESCE(SUM(points_earned), 0) FROM sessions
             WHERE user_id = ?1 AND completed = 1",
            params![user.as_str()],
        )?;
        let average: Option<f64> = self.db.query_row(
            "SELECT AVG(mood_after - mood_before) FROM sessions
             WHERE user_id = ?1 AND completed = 1
               AND mood_before IS NOT NULL AND mood_after IS NOT NULL",
            params![user.as_str()],
            |row| row.get(0),
        )?;

        Ok(UserStats {
            total_sessions,
            total_rituals,
            total_points,
            average_mood_improvement: average.map_or(0.0, |avg| (avg * 100.0).round() / 100.0),
        })
    }

    fn notification_settings(
        &self,
        user: &UserId,
    ) -> Result<Option<NotificationSettings>, BackendError> {
        let sql = format!(
            "SELECT {} FROM notification_settings WHERE user_id = ?1",
            SettingsRow::COLUMNS
        );
        self.db
            .query_row(&sql, params![user.as_str()], SettingsRow::from_row)
            .optional()?
            .map(SettingsRow::into_settings)
            .transpose()
    }

    fn save_notification_settings(
        &self,
        settings: &NotificationSettings,
    ) -> Result<NotificationSettings, BackendError> {
        self.db.execute(
            "INSERT INTO notification_settings (user_id, daily_reminders, reminder_time,
                                                streak_reminders, badge_notifications,
                                                social_sharing)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                 daily_reminders = excluded.daily_reminders,
                 reminder_time = excluded.reminder_time,
                 streak_reminders = excluded.streak_reminders,
                 badge_notifications = excluded.badge_notifications,
                 social_sharing = excluded.social_sharing",
            params![
                settings.user_id.as_str(),
                settings.daily_reminders,
                settings.reminder_time.to_string(),
                settings.streak_reminders,
                settings.badge_notifications,
                settings.social_sharing,
            ],
        )?;
        self.notification_settings(&settings.user_id)?
            .ok_or_else(|| BackendError::NotFound {
                table: tables::NOTIFICATION_SETTINGS,
                id: settings.user_id.to_string(),
            })
    }
}
