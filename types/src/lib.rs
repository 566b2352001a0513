//! Core domain types for Resilience Rituals.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod badge;
mod ids;
mod ritual;
mod session;
mod settings;
mod user;

pub use badge::{
    Badge, BadgeCategory, BadgeRarity, BadgeRule, UserBadge, badge_catalog, find_badge,
};
pub use ids::{BadgeId, RitualId, SessionId, UserId};
pub use ritual::{
    Difficulty, Frequency, NewRitual, Ritual, RitualCategory, RitualPatch, RitualTemplate,
    ReminderTime, find_template, ritual_templates,
};
pub use session::{
    MAX_NOTES_CHARS, MoodLevel, NewSession, Session, SessionInput, SessionNotes,
    SessionWithRitual,
};
pub use settings::NotificationSettings;
pub use user::{NewUser, User, UserPatch};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Validation
// ============================================================================

/// Rejected input at a domain-type construction boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user id must not be empty")]
    EmptyUserId,
    #[error("{field} must not be empty")]
    EmptyText { field: &'static str },
    #[error("mood must be between 1 and 5 (got {0})")]
    MoodOutOfRange(u8),
    #[error("notes are limited to 500 characters (got {0})")]
    NotesTooLong(usize),
    #[error("time must be formatted as HH:MM (got {0:?})")]
    InvalidTime(String),
    #[error("unknown frequency {0:?} (expected daily, weekly or custom)")]
    UnknownFrequency(String),
    #[error("unknown ritual category {0:?}")]
    UnknownCategory(String),
    #[error("unknown difficulty {0:?} (expected easy, medium or hard)")]
    UnknownDifficulty(String),
    #[error("estimated duration must be at least one minute")]
    ZeroDuration,
}

// ============================================================================
// NonEmpty String Types
// ============================================================================

/// A string guaranteed to be non-empty (after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("value must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
