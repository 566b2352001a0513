//! Completion workflow across both stores on an on-disk database.

use chrono::{Duration, Utc};
use resilience_store::Backend;
use resilience_types::{BadgeId, MoodLevel, RitualCategory, SessionInput};

use crate::common::TestHome;

fn moods(before: u8, after: u8) -> SessionInput {
    SessionInput::with_moods(MoodLevel::new(before).unwrap(), MoodLevel::new(after).unwrap())
}

#[test]
fn seven_completions_earn_week_warrior() {
    let home = TestHome::new();
    let mut stores = home.stores();
    let user = stores.sign_up("alice");
    let ritual = stores.add_ritual(&user, "Morning pages", RitualCategory::Creative);

    let mut unlocked = Vec::new();
    for _ in 0..7 {
        let completion = stores
            .catalog
            .complete_ritual(ritual.ritual_id, SessionInput::default(), &mut stores.profile)
            .unwrap();
        unlocked.extend(completion.badges);
    }

    let week_warrior = BadgeId::from("week_warrior");
    assert!(unlocked.contains(&week_warrior));
    let profile = stores.profile.user().unwrap();
    assert_eq!(profile.streak_count, 7);
    assert_eq!(profile.total_points, 70);
    assert!(profile.has_badge(&week_warrior));
    assert!(profile.has_badge(&BadgeId::from("first_steps")));

    let stored = stores.backend.user_badges(&user.user_id).unwrap();
    assert_eq!(
        stored.iter().filter(|b| b.badge_id == week_warrior).count(),
        1
    );
}

#[test]
fn point_collector_is_awarded_once() {
    let home = TestHome::new();
    let mut stores = home.stores();
    let user = stores.sign_up("bob");
    let ritual = stores.add_ritual(&user, "Breathing", RitualCategory::Mindfulness);

    for _ in 0..12 {
        stores
            .catalog
            .complete_ritual(ritual.ritual_id, SessionInput::default(), &mut stores.profile)
            .unwrap();
    }

    let profile = stores.profile.user().unwrap();
    assert_eq!(profile.total_points, 120);
    let collector = BadgeId::from("point_collector");
    assert_eq!(
        profile.badges_earned.iter().filter(|b| **b == collector).count(),
        1
    );
    assert!(!profile.has_badge(&BadgeId::from("point_master")));
}

#[test]
fn mood_lift_earns_bonus_points_and_shows_in_stats() {
    let home = TestHome::new();
    let mut stores = home.stores();
    let user = stores.sign_up("carol");
    let ritual = stores.add_ritual(&user, "Walk", RitualCategory::Physical);

    let lifted = stores
        .catalog
        .complete_ritual(ritual.ritual_id, moods(1, 5), &mut stores.profile)
        .unwrap();
    let dipped = stores
        .catalog
        .complete_ritual(ritual.ritual_id, moods(4, 2), &mut stores.profile)
        .unwrap();
    assert_eq!(lifted.points, 18);
    assert_eq!(dipped.points, 6);

    let stats = stores.backend.user_stats(&user.user_id).unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_rituals, 1);
    assert_eq!(stats.total_points, 24);
    assert!((stats.average_mood_improvement - 1.0).abs() < 1e-9);
}

#[test]
fn deleted_ritual_leaves_history_intact() {
    let home = TestHome::new();
    let mut stores = home.stores();
    let user = stores.sign_up("dana");
    let ritual = stores.add_ritual(&user, "Call a friend", RitualCategory::Social);
    stores
        .catalog
        .complete_ritual(ritual.ritual_id, SessionInput::default(), &mut stores.profile)
        .unwrap();

    stores
        .catalog
        .delete_ritual(ritual.ritual_id, &mut stores.profile)
        .unwrap();

    assert!(stores.catalog.fetch_rituals(&user.user_id).unwrap().is_empty());
    assert!(stores.profile.user().unwrap().active_rituals.is_empty());
    let history = stores.backend.sessions_for_user(&user.user_id, None).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].ritual_name, "Call a friend");
    assert_eq!(history[0].ritual_category, RitualCategory::Social);
}

#[test]
fn completed_flag_rolls_over_at_the_next_day() {
    let home = TestHome::new();
    let mut stores = home.stores();
    let user = stores.sign_up("erin");
    let ritual = stores.add_ritual(&user, "Journal", RitualCategory::Gratitude);
    stores
        .catalog
        .complete_ritual(ritual.ritual_id, SessionInput::default(), &mut stores.profile)
        .unwrap();

    let today = Utc::now().date_naive();
    let rituals = stores.catalog.fetch_rituals_as_of(&user.user_id, today).unwrap();
    assert!(rituals[0].completed_today);

    let rituals = stores
        .catalog
        .fetch_rituals_as_of(&user.user_id, today + Duration::days(1))
        .unwrap();
    assert!(!rituals[0].completed_today);

    let stored = stores.backend.get_ritual(&ritual.ritual_id).unwrap().unwrap();
    assert!(!stored.completed_today);
}
