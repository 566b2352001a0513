//! End-to-end runs of the `resilience` binary.

use crate::common::{TestHome, first_token};

fn signed_in_home() -> TestHome {
    let home = TestHome::new();
    home.write_config("[share]\nclipboard = false\n");
    home.run_ok(&["login", "did:privy:alice", "--farcaster-id", "777"]);
    home
}

#[test]
fn help_lists_every_command() {
    let home = TestHome::new();
    let stdout = home.run_ok(&["--help"]);
    for command in [
        "login",
        "logout",
        "profile",
        "templates",
        "ritual",
        "history",
        "badges",
        "stats",
        "reset-streak",
        "share",
        "settings",
    ] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
    assert!(stdout.contains("--database"));
    assert!(stdout.contains("--config"));
}

#[test]
fn commands_require_login() {
    let home = TestHome::new();
    let output = home.run(&["profile"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not signed in"), "stderr: {stderr}");
}

#[test]
fn login_provisions_once_and_records_the_session() {
    let home = signed_in_home();
    assert!(home.read_config().contains("did:privy:alice"));
    assert!(home.read_config().contains("clipboard = false"));

    let again = home.run_ok(&["login", "did:privy:alice"]);
    assert!(again.contains("Welcome back"));
    assert!(again.contains("Farcaster:      777"));
}

#[test]
fn first_login_shows_the_welcome_toast() {
    let home = TestHome::new();
    let stdout = home.run_ok(&["login", "did:privy:new"]);
    assert!(stdout.contains("Welcome to Resilience Rituals! 🎉"));
    assert!(stdout.contains("Points:         0"));
}

#[test]
fn complete_awards_points_and_records_history() {
    let home = signed_in_home();
    let added = home.run_ok(&["ritual", "add", "Box breathing", "--category", "mindfulness"]);
    assert!(added.contains("Box breathing ritual created! 🎉"));
    let id = first_token(&added);

    let done = home.run_ok(&[
        "ritual", "complete", &id, "--before", "2", "--after", "4", "--notes", "calmer",
    ]);
    assert!(done.contains("Ritual completed! +14 points 🎉"), "stdout: {done}");
    assert!(done.contains("First Steps badge unlocked!"));

    let profile = home.run_ok(&["profile"]);
    assert!(profile.contains("Points:         14"));
    assert!(profile.contains("Streak:         1 days"));
    assert!(profile.contains("first_steps"));

    let history = home.run_ok(&["history", "--limit", "5"]);
    assert!(history.contains("Box breathing"));
    assert!(history.contains("mood 2 -> 4"));
    assert!(history.contains("calmer"));
    assert!(history.contains("Average mood change over these sessions: +2.00"));

    let list = home.run_ok(&["ritual", "list"]);
    assert!(list.contains("[x]"));
}

#[test]
fn completing_an_unknown_ritual_fails() {
    let home = signed_in_home();
    let output = home.run(&[
        "ritual",
        "complete",
        "00000000-0000-4000-8000-000000000000",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("is not in the catalog"));
}

#[test]
fn mood_outside_the_scale_is_rejected_by_the_parser() {
    let home = signed_in_home();
    let output = home.run(&[
        "ritual",
        "complete",
        "00000000-0000-4000-8000-000000000000",
        "--after",
        "6",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn templates_create_rituals_and_unknown_ids_fail() {
    let home = signed_in_home();
    assert!(home.run_ok(&["templates"]).contains("nature_walk"));

    home.run_ok(&["ritual", "from-template", "nature_walk"]);
    let list = home.run_ok(&["ritual", "list"]);
    assert!(list.contains("Nature Walk"));
    assert!(list.contains("physical"));

    let output = home.run(&["ritual", "from-template", "cold_plunge"]);
    assert!(!output.status.success());
}

#[test]
fn update_and_delete_change_the_listing() {
    let home = signed_in_home();
    let id = first_token(&home.run_ok(&["ritual", "add", "Walk", "--category", "physical"]));

    let updated = home.run_ok(&["ritual", "update", &id, "--name", "Long walk", "--duration", "30"]);
    assert!(updated.contains("Long walk"));
    assert!(updated.contains("30 min"));
    assert!(updated.contains("Ritual updated successfully"));

    let nothing = home.run(&["ritual", "update", &id]);
    assert!(!nothing.status.success());

    let timed = home.run_ok(&["ritual", "update", &id, "--start-time", "06:30"]);
    assert!(timed.contains("06:30"));
    let untimed = home.run_ok(&["ritual", "update", &id, "--clear-start-time"]);
    assert!(!untimed.contains("06:30"));
    let both = home.run(&["ritual", "update", &id, "--start-time", "07:00", "--clear-start-time"]);
    assert_eq!(both.status.code(), Some(2));

    let deleted = home.run_ok(&["ritual", "delete", &id]);
    assert!(deleted.contains("Ritual deleted successfully"));
    assert!(home.run_ok(&["ritual", "list"]).contains("No rituals yet"));
}

#[test]
fn reset_streak_and_share_without_clipboard() {
    let home = signed_in_home();
    let id = first_token(&home.run_ok(&["ritual", "add", "Journal", "--category", "gratitude"]));
    home.run_ok(&["ritual", "complete", &id]);

    let shared = home.run_ok(&["share"]);
    assert!(shared.contains("🔥 1 day streak on Resilience Rituals!"));

    let reset = home.run_ok(&["reset-streak"]);
    assert!(reset.contains("Streak reset."));
    assert!(home.run_ok(&["share"]).contains("🔥 0 day streak"));
}

#[test]
fn settings_show_defaults_and_persist_changes() {
    let home = signed_in_home();
    let defaults = home.run_ok(&["settings", "show"]);
    assert!(defaults.contains("reminder-time:       09:00"));
    assert!(defaults.contains("social-sharing:      false"));

    home.run_ok(&[
        "settings",
        "set",
        "--reminder-time",
        "07:30",
        "--social-sharing",
        "true",
    ]);
    let shown = home.run_ok(&["settings", "show"]);
    assert!(shown.contains("reminder-time:       07:30"));
    assert!(shown.contains("social-sharing:      true"));
    assert!(shown.contains("daily-reminders:     true"));
}

#[test]
fn badges_and_stats_reflect_progress() {
    let home = signed_in_home();
    let id = first_token(&home.run_ok(&["ritual", "add", "Sketch", "--category", "creative"]));
    home.run_ok(&["ritual", "complete", &id, "--before", "3", "--after", "3"]);

    let badges = home.run_ok(&["badges"]);
    let first_steps = badges
        .lines()
        .find(|line| line.contains("First Steps"))
        .unwrap();
    assert!(first_steps.contains("unlocked"));
    let week = badges
        .lines()
        .find(|line| line.contains("Week Warrior"))
        .unwrap();
    assert!(week.contains("Complete 7 days in a row"));
    for badge in resilience_types::badge_catalog() {
        assert!(badges.contains(&badge.name), "badges is missing {}", badge.name);
    }

    let stats = home.run_ok(&["stats"]);
    assert!(stats.contains("Completed sessions:     1"));
    assert!(stats.contains("Consecutive active days: 1"));
    assert!(stats.contains("Average mood change:    +0.00"));
}

#[test]
fn logout_forgets_the_session() {
    let home = signed_in_home();
    let stdout = home.run_ok(&["logout"]);
    assert!(stdout.contains("Logged out successfully"));
    assert!(!home.read_config().contains("did:privy:alice"));
    assert!(!home.run(&["profile"]).status.success());
}
