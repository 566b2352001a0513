//! Copying a progress summary to the clipboard.

use thiserror::Error;
use tracing::{info, warn};

use crate::{ProfileStore, StoreError};

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Somewhere to put shared text.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        arboard::Clipboard::new()
            .and_then(|mut cb| cb.set_text(text.to_string()))
            .map_err(|err| ClipboardError(err.to_string()))
    }
}

#[must_use]
pub fn progress_text(streak: u32) -> String {
    format!(
        "🔥 {streak} day streak on Resilience Rituals! Building unbreakable emotional \
         resilience, one ritual at a time. 💪 #ResilienceRituals #MentalHealth"
    )
}

/// Copy the loaded profile's progress text to `clipboard` and return it.
///
/// A clipboard failure is reported as an error toast on the profile store
/// and returned as `Ok(None)`; only a missing profile is an error.
pub fn share_progress(
    profile: &mut ProfileStore,
    clipboard: &mut dyn Clipboard,
) -> Result<Option<String>, StoreError> {
    let Some(user) = profile.user() else {
        return Err(StoreError::NoProfile);
    };
    let streak = user.streak_count;
    let text = progress_text(streak);

    match clipboard.set_text(&text) {
        Ok(()) => {
            info!(streak, "Shared progress");
            profile.toasts_mut().success("Progress copied to clipboard! 📋");
            Ok(Some(text))
        }
        Err(err) => {
            warn!(error = %err, "Failed to share progress");
            profile.toasts_mut().error("Failed to share progress");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use resilience_store::SqliteBackend;
    use resilience_types::{NewUser, UserId};

    use super::*;
    use crate::ToastLevel;

    #[derive(Default)]
    struct MemoryClipboard {
        text: Option<String>,
        broken: bool,
    }

    impl Clipboard for MemoryClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError("no display".to_string()));
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    fn profile_with_streak(days: u32) -> ProfileStore {
        let mut profile = ProfileStore::new(Rc::new(SqliteBackend::open_in_memory().unwrap()));
        profile
            .create_user(&NewUser::new(UserId::new("alice").unwrap()))
            .unwrap();
        for _ in 0..days {
            profile.increment_streak().unwrap();
        }
        profile.drain_toasts();
        profile
    }

    #[test]
    fn progress_text_names_the_streak() {
        assert_eq!(
            progress_text(12),
            "🔥 12 day streak on Resilience Rituals! Building unbreakable emotional resilience, \
             one ritual at a time. 💪 #ResilienceRituals #MentalHealth"
        );
    }

    #[test]
    fn share_copies_text_and_confirms() {
        let mut profile = profile_with_streak(3);
        let mut clipboard = MemoryClipboard::default();
        let shared = share_progress(&mut profile, &mut clipboard).unwrap();

        assert_eq!(shared, clipboard.text);
        assert!(clipboard.text.unwrap().starts_with("🔥 3 day streak"));
        let toasts = profile.drain_toasts();
        assert_eq!(toasts[0].level, ToastLevel::Success);
        assert_eq!(toasts[0].message, "Progress copied to clipboard! 📋");
    }

    #[test]
    fn clipboard_failure_becomes_an_error_toast() {
        let mut profile = profile_with_streak(1);
        let mut clipboard = MemoryClipboard {
            broken: true,
            ..MemoryClipboard::default()
        };
        assert_eq!(share_progress(&mut profile, &mut clipboard).unwrap(), None);
        let toasts = profile.drain_toasts();
        assert_eq!(toasts[0].message, "Failed to share progress");
        assert!(toasts[0].is_error());
    }

    #[test]
    fn sharing_needs_a_profile() {
        let mut profile = ProfileStore::new(Rc::new(SqliteBackend::open_in_memory().unwrap()));
        let mut clipboard = MemoryClipboard::default();
        assert!(matches!(
            share_progress(&mut profile, &mut clipboard),
            Err(StoreError::NoProfile)
        ));
    }
}
