//! Completion sessions and the mood scale.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RitualCategory, RitualId, SessionId, UserId, ValidationError};

pub const MAX_NOTES_CHARS: usize = 500;

/// Self-reported mood on a 1 (very low) to 5 (excellent) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoodLevel(u8);

impl MoodLevel {
    pub const LABELS: [&'static str; 5] = ["Very Low", "Low", "Neutral", "Good", "Excellent"];

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::MoodOutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        Self::LABELS[usize::from(self.0 - 1)]
    }
}

impl TryFrom<u8> for MoodLevel {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MoodLevel> for u8 {
    fn from(value: MoodLevel) -> Self {
        value.0
    }
}

impl fmt::Display for MoodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

/// Free-text reflection attached to a session, at most 500 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionNotes(String);

impl SessionNotes {
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        let chars = text.chars().count();
        if chars > MAX_NOTES_CHARS {
            return Err(ValidationError::NotesTooLong(chars));
        }
        Ok(Self(text))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionNotes {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionNotes> for String {
    fn from(value: SessionNotes) -> Self {
        value.0
    }
}

/// What the user reports when finishing a ritual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInput {
    pub mood_before: Option<MoodLevel>,
    pub mood_after: Option<MoodLevel>,
    pub notes: Option<SessionNotes>,
}

impl SessionInput {
    #[must_use]
    pub fn with_moods(before: MoodLevel, after: MoodLevel) -> Self {
        Self {
            mood_before: Some(before),
            mood_after: Some(after),
            notes: None,
        }
    }
}

/// A session ready to be written; points are already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: UserId,
    pub ritual_id: RitualId,
    pub mood_before: Option<MoodLevel>,
    pub mood_after: Option<MoodLevel>,
    pub notes: Option<SessionNotes>,
    pub points_earned: u32,
    pub completed: bool,
}

/// One completion event of a ritual. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub ritual_id: RitualId,
    pub timestamp: DateTime<Utc>,
    pub mood_before: Option<MoodLevel>,
    pub mood_after: Option<MoodLevel>,
    pub notes: Option<SessionNotes>,
    pub points_earned: u32,
    pub completed: bool,
}

impl Session {
    /// `after - before` when both moods were recorded.
    #[must_use]
    pub fn mood_delta(&self) -> Option<i32> {
        match (self.mood_before, self.mood_after) {
            (Some(before), Some(after)) => Some(i32::from(after.0) - i32::from(before.0)),
            _ => None,
        }
    }
}

/// A session joined with the name and category of its ritual, for history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWithRitual {
    pub session: Session,
    pub ritual_name: String,
    pub ritual_category: RitualCategory,
}
