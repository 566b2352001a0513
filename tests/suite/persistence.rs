//! State surviving a restart: the database file and the config file.

use resilience_config::{ResilienceConfig, clear_session, persist_session};
use resilience_store::Backend;
use resilience_types::{
    MoodLevel, NotificationSettings, ReminderTime, RitualCategory, RitualPatch, SessionInput,
    SessionNotes, UserId,
};

use crate::common::{Stores, TestHome};

#[test]
fn progress_survives_reopening_the_database() {
    let home = TestHome::new();
    let ritual_id = {
        let mut stores = home.stores();
        let user = stores.sign_up("alice");
        let ritual = stores.add_ritual(&user, "Gratitude list", RitualCategory::Gratitude);
        let input = SessionInput {
            mood_before: Some(MoodLevel::new(3).unwrap()),
            mood_after: Some(MoodLevel::new(4).unwrap()),
            notes: Some(SessionNotes::new("Sunny morning").unwrap()),
        };
        stores
            .catalog
            .complete_ritual(ritual.ritual_id, input, &mut stores.profile)
            .unwrap();
        ritual.ritual_id
    };

    let mut stores = Stores::open(&home.database_path());
    let user = stores.sign_in("alice");
    assert_eq!(user.total_points, 12);
    assert_eq!(user.streak_count, 1);
    assert_eq!(user.active_rituals, vec![ritual_id]);

    let rituals = stores.catalog.fetch_rituals(&user.user_id).unwrap();
    assert_eq!(rituals.len(), 1);
    assert!(rituals[0].completed_today);

    let history = stores.backend.sessions_for_user(&user.user_id, Some(5)).unwrap();
    assert_eq!(
        history[0].session.notes.as_ref().map(SessionNotes::as_str),
        Some("Sunny morning")
    );
}

#[test]
fn ritual_patch_round_trips_through_storage() {
    let home = TestHome::new();
    let mut stores = home.stores();
    let user = stores.sign_up("bob");
    let ritual = stores.add_ritual(&user, "Stretch", RitualCategory::Physical);
    stores.catalog.fetch_rituals(&user.user_id).unwrap();

    let patch = RitualPatch {
        description: Some("Hamstrings and hips".to_string()),
        start_time: Some(Some(ReminderTime::parse("06:45").unwrap())),
        estimated_duration: Some(12),
        ..RitualPatch::default()
    };
    let updated = stores.catalog.update_ritual(ritual.ritual_id, &patch).unwrap();

    let mut reopened = Stores::open(&home.database_path());
    let stored = reopened
        .backend
        .get_ritual(&ritual.ritual_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, updated);
    assert_eq!(stored.start_time.unwrap().to_string(), "06:45");
    assert_eq!(stored.name.as_str(), "Stretch");

    let listed = reopened.catalog.fetch_rituals(&user.user_id).unwrap();
    assert_eq!(listed[0].description, "Hamstrings and hips");
}

#[test]
fn notification_settings_are_saved_per_user() {
    let home = TestHome::new();
    let mut stores = home.stores();
    let user = stores.sign_up("carol");
    assert!(stores.backend.notification_settings(&user.user_id).unwrap().is_none());

    let settings = NotificationSettings {
        social_sharing: true,
        reminder_time: ReminderTime::parse("20:15").unwrap(),
        ..NotificationSettings::defaults_for(user.user_id.clone())
    };
    stores.backend.save_notification_settings(&settings).unwrap();

    let reopened = Stores::open(&home.database_path());
    let stored = reopened
        .backend
        .notification_settings(&UserId::new("carol").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored, settings);
}

#[test]
fn session_is_recorded_in_and_cleared_from_config() {
    let home = TestHome::new();
    home.write_config("# personal setup\n[share]\nclipboard = false\n");
    let path = home.config_path();

    persist_session(&path, "did:privy:abc", Some("4242")).unwrap();
    let config = ResilienceConfig::load_from(&path).unwrap().unwrap();
    assert_eq!(config.session_user(), Some("did:privy:abc"));
    assert_eq!(config.session_farcaster_id(), Some("4242"));
    assert!(!config.clipboard_enabled());

    clear_session(&path).unwrap();
    let config = ResilienceConfig::load_from(&path).unwrap().unwrap();
    assert!(config.session_user().is_none());
    assert!(home.read_config().starts_with("# personal setup"));
}
