//! Gamification rules: points per session and badge thresholds.
//!
//! Every threshold comes from the static badge catalog, so adding a badge
//! with a streak, points or completions rule needs no change here.

use resilience_types::{Badge, BadgeRule, MoodLevel, RitualCategory, badge_catalog};

/// Points for a completion with no mood pair.
pub const BASE_POINTS: u32 = 10;
/// Floor applied after the mood adjustment.
pub const MIN_POINTS: u32 = 5;
const MOOD_DELTA_WEIGHT: i32 = 2;

/// `max(10 + (after - before) * 2, 5)` when both moods are given, else 10.
#[must_use]
pub fn points_for_session(before: Option<MoodLevel>, after: Option<MoodLevel>) -> u32 {
    let (Some(before), Some(after)) = (before, after) else {
        return BASE_POINTS;
    };
    let delta = i32::from(after.value()) - i32::from(before.value());
    let adjusted = BASE_POINTS as i32 + delta * MOOD_DELTA_WEIGHT;
    u32::try_from(adjusted).map_or(MIN_POINTS, |points| points.max(MIN_POINTS))
}

/// The streak badge unlocked by reaching exactly `streak` days.
#[must_use]
pub fn streak_badge(streak: u32) -> Option<&'static Badge> {
    badge_catalog()
        .iter()
        .find(|badge| badge.streak_required() == Some(streak))
}

/// Point badges whose threshold `total` has reached, lowest first.
pub fn point_badges(total: u32) -> impl Iterator<Item = &'static Badge> {
    let mut reached: Vec<&'static Badge> = badge_catalog()
        .iter()
        .filter(|badge| badge.points_required().is_some_and(|needed| total >= needed))
        .collect();
    reached.sort_by_key(|badge| badge.points_required());
    reached.into_iter()
}

/// A completion-count requirement from the catalog.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRule {
    pub badge: &'static Badge,
    pub count: u32,
    pub category: Option<RitualCategory>,
}

pub fn completion_rules() -> impl Iterator<Item = CompletionRule> {
    badge_catalog().iter().filter_map(|badge| match badge.rule {
        BadgeRule::Completions { count, category } => Some(CompletionRule {
            badge,
            count,
            category,
        }),
        BadgeRule::Streak { .. } | BadgeRule::Points { .. } => None,
    })
}

#[must_use]
pub fn unlock_message(badge: &Badge) -> String {
    format!("{} {} badge unlocked!", badge.icon, badge.name)
}
