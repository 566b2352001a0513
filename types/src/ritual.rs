//! Rituals, their enumerations, and the built-in template catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NonEmptyString, RitualId, UserId, ValidationError};

/// How often a ritual is meant to be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Custom,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Custom => "custom",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::UnknownFrequency(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RitualCategory {
    Mindfulness,
    Gratitude,
    Physical,
    Social,
    Creative,
    Learning,
}

impl RitualCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mindfulness => "mindfulness",
            Self::Gratitude => "gratitude",
            Self::Physical => "physical",
            Self::Social => "social",
            Self::Creative => "creative",
            Self::Learning => "learning",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
    }

    #[must_use]
    pub fn all() -> &'static [RitualCategory] {
        &[
            Self::Mindfulness,
            Self::Gratitude,
            Self::Physical,
            Self::Social,
            Self::Creative,
            Self::Learning,
        ]
    }
}

impl FromStr for RitualCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for RitualCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::UnknownDifficulty(s.to_string()))
    }
}

/// Optional wall-clock reminder, always rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| ValidationError::InvalidTime(raw.to_string()))
    }

    #[must_use]
    pub fn from_time(time: NaiveTime) -> Self {
        Self(time)
    }

    #[must_use]
    pub fn time(self) -> NaiveTime {
        self.0
    }
}

impl TryFrom<String> for ReminderTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReminderTime> for String {
    fn from(value: ReminderTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// A user-defined recurring self-care activity.
///
/// `is_active == false` marks a soft-deleted ritual; such rituals are kept in
/// storage but never returned by catalog listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ritual {
    pub ritual_id: RitualId,
    pub user_id: UserId,
    pub name: NonEmptyString,
    pub description: String,
    pub frequency: Frequency,
    pub start_time: Option<ReminderTime>,
    pub completed_today: bool,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub category: RitualCategory,
    pub difficulty: Difficulty,
    /// Minutes.
    pub estimated_duration: u32,
}

impl Ritual {
    /// Apply a patch in place, field by field.
    pub fn apply(&mut self, patch: &RitualPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(frequency) = patch.frequency {
            self.frequency = frequency;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(completed_today) = patch.completed_today {
            self.completed_today = completed_today;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(estimated_duration) = patch.estimated_duration {
            self.estimated_duration = estimated_duration;
        }
    }
}

/// Input for creating a ritual. Storage assigns id, timestamps and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRitual {
    pub user_id: UserId,
    pub name: NonEmptyString,
    pub description: String,
    pub frequency: Frequency,
    pub start_time: Option<ReminderTime>,
    pub category: RitualCategory,
    pub difficulty: Difficulty,
    pub estimated_duration: u32,
}

impl NewRitual {
    pub fn new(
        user_id: UserId,
        name: &str,
        category: RitualCategory,
    ) -> Result<Self, ValidationError> {
        let name = NonEmptyString::new(name.trim())
            .map_err(|_| ValidationError::EmptyText { field: "name" })?;
        Ok(Self {
            user_id,
            name,
            description: String::new(),
            frequency: Frequency::Daily,
            start_time: None,
            category,
            difficulty: Difficulty::Easy,
            estimated_duration: 5,
        })
    }

    /// Build a ritual from one of the built-in templates.
    #[must_use]
    pub fn from_template(user_id: UserId, template: &RitualTemplate) -> Self {
        Self {
            user_id,
            name: NonEmptyString(template.name.to_string()),
            description: template.description.to_string(),
            frequency: Frequency::Daily,
            start_time: None,
            category: template.category,
            difficulty: template.difficulty,
            estimated_duration: template.estimated_duration,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Result<Self, ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        self.estimated_duration = minutes;
        Ok(self)
    }
}

/// Partial update of a ritual. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RitualPatch {
    pub name: Option<NonEmptyString>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    /// `Some(None)` removes the reminder time.
    pub start_time: Option<Option<ReminderTime>>,
    pub completed_today: Option<bool>,
    pub is_active: Option<bool>,
    pub category: Option<RitualCategory>,
    pub difficulty: Option<Difficulty>,
    pub estimated_duration: Option<u32>,
}

impl RitualPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn completed_today(done: bool) -> Self {
        Self {
            completed_today: Some(done),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Self::default()
        }
    }
}

/// A predefined ritual offered when creating a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RitualTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RitualCategory,
    pub difficulty: Difficulty,
    pub estimated_duration: u32,
    pub instructions: &'static [&'static str],
    pub benefits: &'static [&'static str],
    pub icon: &'static str,
}

const TEMPLATES: &[RitualTemplate] = &[
    RitualTemplate {
        id: "gratitude_journal",
        name: "Gratitude Journal",
        description: "Write down three things you're grateful for today",
        category: RitualCategory::Gratitude,
        difficulty: Difficulty::Easy,
        estimated_duration: 5,
        instructions: &[
            "Find a quiet space",
            "Think about your day",
            "Write down 3 specific things you're grateful for",
            "Reflect on why each one matters to you",
        ],
        benefits: &[
            "Improved mood and outlook",
            "Better sleep quality",
            "Increased life satisfaction",
            "Reduced stress and anxiety",
        ],
        icon: "📝",
    },
    RitualTemplate {
        id: "mindful_breathing",
        name: "Mindful Breathing",
        description: "Practice deep, conscious breathing for 5 minutes",
        category: RitualCategory::Mindfulness,
        difficulty: Difficulty::Easy,
        estimated_duration: 5,
        instructions: &[
            "Sit comfortably with your back straight",
            "Close your eyes or soften your gaze",
            "Breathe in slowly for 4 counts",
            "Hold for 4 counts",
            "Exhale slowly for 6 counts",
            "Repeat for 5 minutes",
        ],
        benefits: &[
            "Reduced stress and anxiety",
            "Improved focus and clarity",
            "Better emotional regulation",
            "Lower blood pressure",
        ],
        icon: "🫁",
    },
    RitualTemplate {
        id: "positive_affirmations",
        name: "Positive Affirmations",
        description: "Speak or write positive statements about yourself",
        category: RitualCategory::Mindfulness,
        difficulty: Difficulty::Easy,
        estimated_duration: 3,
        instructions: &[
            "Choose 3-5 positive affirmations",
            "Look at yourself in the mirror",
            "Say each affirmation out loud with conviction",
            "Feel the positive energy as you speak",
        ],
        benefits: &[
            "Increased self-confidence",
            "Better self-image",
            "Reduced negative self-talk",
            "Improved motivation",
        ],
        icon: "💪",
    },
    RitualTemplate {
        id: "nature_walk",
        name: "Nature Walk",
        description: "Take a mindful walk in nature for 15 minutes",
        category: RitualCategory::Physical,
        difficulty: Difficulty::Medium,
        estimated_duration: 15,
        instructions: &[
            "Find a natural outdoor space",
            "Walk at a comfortable pace",
            "Notice the sights, sounds, and smells",
            "Take deep breaths of fresh air",
            "Leave your phone in your pocket",
        ],
        benefits: &[
            "Improved physical health",
            "Reduced stress hormones",
            "Enhanced creativity",
            "Better vitamin D levels",
        ],
        icon: "🌳",
    },
    RitualTemplate {
        id: "creative_expression",
        name: "Creative Expression",
        description: "Spend 10 minutes on any creative activity",
        category: RitualCategory::Creative,
        difficulty: Difficulty::Medium,
        estimated_duration: 10,
        instructions: &[
            "Choose a creative medium (drawing, writing, music, etc.)",
            "Set a timer for 10 minutes",
            "Create without judgment or expectation",
            "Focus on the process, not the outcome",
        ],
        benefits: &[
            "Improved emotional expression",
            "Enhanced problem-solving skills",
            "Reduced stress",
            "Increased self-awareness",
        ],
        icon: "🎨",
    },
    RitualTemplate {
        id: "social_connection",
        name: "Social Connection",
        description: "Reach out to someone you care about",
        category: RitualCategory::Social,
        difficulty: Difficulty::Easy,
        estimated_duration: 10,
        instructions: &[
            "Think of someone you haven't spoken to recently",
            "Send them a thoughtful message or call",
            "Ask how they're doing and really listen",
            "Share something positive from your day",
        ],
        benefits: &[
            "Stronger relationships",
            "Reduced feelings of loneliness",
            "Improved social support",
            "Enhanced empathy",
        ],
        icon: "💬",
    },
];

#[must_use]
pub fn ritual_templates() -> &'static [RitualTemplate] {
    TEMPLATES
}

#[must_use]
pub fn find_template(id: &str) -> Option<&'static RitualTemplate> {
    TEMPLATES.iter().find(|template| template.id == id.trim())
}
