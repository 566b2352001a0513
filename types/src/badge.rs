//! Badge reference data.
//!
//! Badges are static: "earned" is a relation between a user and a badge
//! ([`UserBadge`]), never a mutation of the badge itself.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BadgeId, RitualCategory, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Streak,
    Completion,
    Milestone,
    Special,
}

impl BadgeCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Streak => "streak",
            Self::Completion => "completion",
            Self::Milestone => "milestone",
            Self::Special => "special",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streak" => Some(Self::Streak),
            "completion" => Some(Self::Completion),
            "milestone" => Some(Self::Milestone),
            "special" => Some(Self::Special),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Some(Self::Common),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }
}

/// What unlocks a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BadgeRule {
    /// Streak reaches exactly this value.
    Streak { days: u32 },
    /// Total points at or above this value.
    Points { total: u32 },
    /// Completed sessions, optionally restricted to one ritual category.
    Completions {
        count: u32,
        category: Option<RitualCategory>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub badge_id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    /// Human-readable unlock requirement.
    pub requirement: String,
    pub rule: BadgeRule,
}

impl Badge {
    #[must_use]
    pub fn points_required(&self) -> Option<u32> {
        match self.rule {
            BadgeRule::Points { total } => Some(total),
            _ => None,
        }
    }

    #[must_use]
    pub fn streak_required(&self) -> Option<u32> {
        match self.rule {
            BadgeRule::Streak { days } => Some(days),
            _ => None,
        }
    }
}

/// A badge unlocked by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub unlocked_at: DateTime<Utc>,
}

struct BadgeSpec {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: BadgeCategory,
    rarity: BadgeRarity,
    requirement: &'static str,
    rule: BadgeRule,
}

const BADGES: &[BadgeSpec] = &[
    BadgeSpec {
        id: "first_steps",
        name: "First Steps",
        description: "Complete your first ritual",
        icon: "🌱",
        category: BadgeCategory::Completion,
        rarity: BadgeRarity::Common,
        requirement: "Complete 1 ritual",
        rule: BadgeRule::Completions {
            count: 1,
            category: None,
        },
    },
    BadgeSpec {
        id: "week_warrior",
        name: "Week Warrior",
        description: "Maintain a 7-day streak",
        icon: "🔥",
        category: BadgeCategory::Streak,
        rarity: BadgeRarity::Rare,
        requirement: "Complete 7 days in a row",
        rule: BadgeRule::Streak { days: 7 },
    },
    BadgeSpec {
        id: "month_master",
        name: "Month Master",
        description: "Maintain a 30-day streak",
        icon: "🏆",
        category: BadgeCategory::Streak,
        rarity: BadgeRarity::Epic,
        requirement: "Complete 30 days in a row",
        rule: BadgeRule::Streak { days: 30 },
    },
    BadgeSpec {
        id: "century_champion",
        name: "Century Champion",
        description: "Maintain a 100-day streak",
        icon: "👑",
        category: BadgeCategory::Streak,
        rarity: BadgeRarity::Legendary,
        requirement: "Complete 100 days in a row",
        rule: BadgeRule::Streak { days: 100 },
    },
    BadgeSpec {
        id: "point_collector",
        name: "Point Collector",
        description: "Earn 100 points",
        icon: "💎",
        category: BadgeCategory::Milestone,
        rarity: BadgeRarity::Common,
        requirement: "Reach 100 total points",
        rule: BadgeRule::Points { total: 100 },
    },
    BadgeSpec {
        id: "point_master",
        name: "Point Master",
        description: "Earn 500 points",
        icon: "⭐",
        category: BadgeCategory::Milestone,
        rarity: BadgeRarity::Rare,
        requirement: "Reach 500 total points",
        rule: BadgeRule::Points { total: 500 },
    },
    BadgeSpec {
        id: "gratitude_guru",
        name: "Gratitude Guru",
        description: "Complete 30 gratitude rituals",
        icon: "🙏",
        category: BadgeCategory::Completion,
        rarity: BadgeRarity::Epic,
        requirement: "Complete 30 gratitude rituals",
        rule: BadgeRule::Completions {
            count: 30,
            category: Some(RitualCategory::Gratitude),
        },
    },
    BadgeSpec {
        id: "mindful_master",
        name: "Mindful Master",
        description: "Complete 50 mindfulness rituals",
        icon: "🧘",
        category: BadgeCategory::Completion,
        rarity: BadgeRarity::Epic,
        requirement: "Complete 50 mindfulness rituals",
        rule: BadgeRule::Completions {
            count: 50,
            category: Some(RitualCategory::Mindfulness),
        },
    },
];

static CATALOG: LazyLock<Vec<Badge>> = LazyLock::new(|| {
    BADGES
        .iter()
        .map(|spec| Badge {
            badge_id: BadgeId::from(spec.id),
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            icon: spec.icon.to_string(),
            category: spec.category,
            rarity: spec.rarity,
            requirement: spec.requirement.to_string(),
            rule: spec.rule,
        })
        .collect()
});

/// Every badge the application knows how to award.
#[must_use]
pub fn badge_catalog() -> &'static [Badge] {
    &CATALOG
}

#[must_use]
pub fn find_badge(id: &BadgeId) -> Option<&'static Badge> {
    CATALOG.iter().find(|badge| &badge.badge_id == id)
}
