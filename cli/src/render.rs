//! Plain-text output for command results.

use chrono::NaiveDate;

use resilience_core::{Toast, ToastLevel, stats};
use resilience_store::UserStats;
use resilience_types::{
    Badge, BadgeId, NotificationSettings, Ritual, RitualTemplate, Session, SessionWithRitual, User,
    UserBadge,
};

pub fn toasts(toasts: &[Toast]) {
    for toast in toasts {
        let marker = match toast.level {
            ToastLevel::Success => "✓",
            ToastLevel::Info => "•",
            ToastLevel::Error => "✗",
        };
        if toast.is_error() {
            eprintln!("{marker} {}", toast.message);
        } else {
            println!("{marker} {}", toast.message);
        }
    }
}

pub fn profile(user: &User) {
    println!("User:           {}", user.user_id);
    if let Some(fid) = &user.farcaster_id {
        println!("Farcaster:      {fid}");
    }
    println!("Member since:   {}", user.created_at.format("%Y-%m-%d"));
    progress(user);
    println!("Active rituals: {}", user.active_rituals.len());
    if !user.badges_earned.is_empty() {
        let ids: Vec<&str> = user.badges_earned.iter().map(BadgeId::as_str).collect();
        println!("Badges:         {}", ids.join(", "));
    }
}

pub fn progress(user: &User) {
    println!("Streak:         {} days", user.streak_count);
    println!("Points:         {}", user.total_points);
}

pub fn rituals(rituals: &[Ritual]) {
    if rituals.is_empty() {
        println!("No rituals yet. Try `resilience templates` for ideas.");
        return;
    }
    for ritual in rituals {
        let done = if ritual.completed_today { "[x]" } else { "[ ]" };
        println!(
            "{done} {}  {} ({}, {}, {} min)",
            ritual.ritual_id,
            ritual.name.as_str(),
            ritual.category,
            ritual.difficulty.as_str(),
            ritual.estimated_duration,
        );
        if let Some(start) = ritual.start_time {
            println!("      reminder at {start}, {}", ritual.frequency.as_str());
        }
    }
}

pub fn ritual_created(ritual: &Ritual) {
    println!("{}  {}", ritual.ritual_id, ritual.name.as_str());
}

pub fn templates(templates: &[RitualTemplate]) {
    for template in templates {
        println!(
            "{} {:<20} {} ({}, {} min)",
            template.icon,
            template.id,
            template.name,
            template.category,
            template.estimated_duration,
        );
        println!("     {}", template.description);
    }
}

pub fn history(sessions: &[SessionWithRitual], today: NaiveDate) {
    if sessions.is_empty() {
        println!("No completions yet.");
        return;
    }
    for entry in sessions {
        let session = &entry.session;
        let mood = match (session.mood_before, session.mood_after) {
            (Some(before), Some(after)) => format!("  mood {} -> {}", before.value(), after.value()),
            _ => String::new(),
        };
        println!(
            "{:<7} {:<24} +{:<3}{mood}",
            stats::format_day(session.timestamp.date_naive(), today),
            entry.ritual_name,
            session.points_earned,
        );
        if let Some(notes) = &session.notes {
            println!("        {}", notes.as_str());
        }
    }

    let shown: Vec<Session> = sessions.iter().map(|entry| entry.session.clone()).collect();
    if shown.iter().any(|session| session.mood_delta().is_some()) {
        println!(
            "Average mood change over these sessions: {:+.2}",
            stats::average_mood_improvement(&shown)
        );
    }
}

pub fn badges(catalog: &[Badge], unlocked: &[UserBadge]) {
    for badge in catalog {
        let unlock = unlocked.iter().find(|u| u.badge_id == badge.badge_id);
        let status = match unlock {
            Some(u) => format!("unlocked {}", u.unlocked_at.format("%Y-%m-%d")),
            None => badge.requirement.clone(),
        };
        println!(
            "{} {:<18} {:<9} {status}",
            badge.icon,
            badge.name,
            badge.rarity.as_str(),
        );
    }
}

pub struct StatsView<'a> {
    pub user: &'a User,
    pub totals: UserStats,
    pub day_streak: u32,
    pub completion_rate: u32,
}

pub fn stats(view: &StatsView<'_>) {
    println!("Current streak:         {} days", view.user.streak_count);
    println!("Consecutive active days: {}", view.day_streak);
    println!("Total points:           {}", view.user.total_points);
    println!("Completed sessions:     {}", view.totals.total_sessions);
    println!("Rituals:                {}", view.totals.total_rituals);
    println!(
        "Average mood change:    {:+.2}",
        view.totals.average_mood_improvement
    );
    println!("Days with a ritual:     {}%", view.completion_rate);
    println!("Badges:                 {}", view.user.badges_earned.len());
}

pub fn settings(settings: &NotificationSettings) {
    println!("daily-reminders:     {}", settings.daily_reminders);
    println!("reminder-time:       {}", settings.reminder_time);
    println!("streak-reminders:    {}", settings.streak_reminders);
    println!("badge-notifications: {}", settings.badge_notifications);
    println!("social-sharing:      {}", settings.social_sharing);
}
