//! Progress summaries derived from the session log.

use chrono::{DateTime, NaiveDate, Utc};

use resilience_types::Session;

/// Consecutive days, ending today, with at least one session.
///
/// A log whose latest session is before today has a streak of zero.
#[must_use]
pub fn consecutive_day_streak(timestamps: &[DateTime<Utc>], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = timestamps.iter().map(DateTime::date_naive).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut streak = 0u32;
    for day in days {
        let behind = (today - day).num_days();
        if behind < 0 {
            continue;
        }
        if behind == i64::from(streak) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Mean mood change over sessions that recorded both moods, rounded to two
/// decimals. Zero when no session qualifies.
#[must_use]
pub fn average_mood_improvement(sessions: &[Session]) -> f64 {
    let deltas: Vec<i32> = sessions.iter().filter_map(Session::mood_delta).collect();
    if deltas.is_empty() {
        return 0.0;
    }
    let mean = f64::from(deltas.iter().sum::<i32>()) / deltas.len() as f64;
    (mean * 100.0).round() / 100.0
}

/// Whole-number percentage of days completed.
#[must_use]
pub fn completion_rate(total_days: u32, completed_days: u32) -> u32 {
    if total_days == 0 {
        return 0;
    }
    (f64::from(completed_days) / f64::from(total_days) * 100.0).round() as u32
}

/// `"Today"` for today, otherwise a short month and day such as `"Mar 4"`.
#[must_use]
pub fn format_day(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}
