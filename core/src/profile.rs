//! The signed-in user's profile and progression.
//!
//! Every mutation writes to the backend first and replaces the in-memory
//! profile with the stored result only after the write succeeded. A failed
//! write leaves the profile exactly as it was.

use std::rc::Rc;

use chrono::Utc;
use tracing::{error, info, warn};

use resilience_store::{Backend, BackendError};
use resilience_types::{BadgeId, NewUser, RitualId, User, UserId, UserPatch, find_badge};

use crate::notifications::{Toast, ToastQueue};
use crate::rules;
use crate::StoreError;

pub struct ProfileStore {
    backend: Rc<dyn Backend>,
    user: Option<User>,
    error: Option<String>,
    toasts: ToastQueue,
}

impl ProfileStore {
    #[must_use]
    pub fn new(backend: Rc<dyn Backend>) -> Self {
        Self {
            backend,
            user: None,
            error: None,
            toasts: ToastQueue::new(),
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Message of the last failed action, if it has not been cleared.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        self.toasts.drain()
    }

    pub(crate) fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Load the profile for `id`. A missing profile is `Ok(None)` and
    /// leaves no profile loaded; provisioning is up to the caller.
    pub fn fetch_user(&mut self, id: &UserId) -> Result<Option<&User>, StoreError> {
        self.error = None;
        let fetched = self.backend.get_user(id);
        match fetched {
            Ok(user) => {
                if user.is_none() {
                    info!(user = %id, "No profile found");
                }
                self.user = user;
                Ok(self.user.as_ref())
            }
            Err(err) => Err(self.fail("load profile", "Failed to load profile", err)),
        }
    }

    /// Provision a fresh profile: no points, no streak, no badges.
    pub fn create_user(&mut self, new: &NewUser) -> Result<&User, StoreError> {
        self.error = None;
        let user = self
            .backend
            .create_user(new)
            .map_err(|err| self.fail("create profile", "Failed to create account", err))?;
        info!(user = %user.user_id, "Created profile");
        self.toasts.success("Welcome to Resilience Rituals! 🎉");
        Ok(&*self.user.insert(user))
    }

    /// Merge `patch` into the stored profile. The loaded profile is replaced
    /// by what the backend stored, so it always matches the next fetch.
    pub fn update_user(&mut self, patch: &UserPatch) -> Result<&User, StoreError> {
        let id = self.require_user()?.user_id.clone();
        self.error = None;
        let stored = self
            .backend
            .update_user(&id, patch)
            .map_err(|err| self.fail("update profile", "Failed to update profile", err))?;
        Ok(&*self.user.insert(stored))
    }

    /// Add one day to the streak and stamp the user active now. Reaching a
    /// streak milestone exactly unlocks its badge. Returns the badges
    /// unlocked by this call.
    pub fn increment_streak(&mut self) -> Result<Vec<BadgeId>, StoreError> {
        let streak = self.require_user()?.streak_count.saturating_add(1);
        self.update_user(&UserPatch {
            streak_count: Some(streak),
            last_active_date: Some(Utc::now()),
            ..UserPatch::default()
        })?;

        let mut unlocked = Vec::new();
        if let Some(badge) = rules::streak_badge(streak)
            && self.add_badge(&badge.badge_id)?
        {
            unlocked.push(badge.badge_id.clone());
        }
        Ok(unlocked)
    }

    /// Add `points` to the total and unlock every point badge the new total
    /// has reached and the user does not hold yet.
    pub fn add_points(&mut self, points: u32) -> Result<Vec<BadgeId>, StoreError> {
        let total = self.require_user()?.total_points.saturating_add(points);
        self.update_user(&UserPatch {
            total_points: Some(total),
            ..UserPatch::default()
        })?;

        let mut unlocked = Vec::new();
        for badge in rules::point_badges(total) {
            if self.add_badge(&badge.badge_id)? {
                unlocked.push(badge.badge_id.clone());
            }
        }
        Ok(unlocked)
    }

    /// Zero the streak. Points and badges are kept.
    pub fn reset_streak(&mut self) -> Result<(), StoreError> {
        self.update_user(&UserPatch {
            streak_count: Some(0),
            ..UserPatch::default()
        })?;
        info!("Streak reset");
        self.toasts.info("Streak reset. Don't worry, you've got this! 💪");
        Ok(())
    }

    /// Unlock `badge`. Returns `false` without touching anything when the
    /// user already holds it.
    pub fn add_badge(&mut self, badge: &BadgeId) -> Result<bool, StoreError> {
        let user = self.require_user()?;
        if user.has_badge(badge) {
            return Ok(false);
        }
        let id = user.user_id.clone();
        let mut earned = user.badges_earned.clone();
        earned.push(badge.clone());

        self.error = None;
        self.backend
            .award_badge(&id, badge)
            .map_err(|err| self.fail("unlock badge", "Failed to unlock badge", err))?;
        self.update_user(&UserPatch {
            badges_earned: Some(earned),
            ..UserPatch::default()
        })?;

        info!(user = %id, badge = %badge, "Badge unlocked");
        match find_badge(badge) {
            Some(known) => self.toasts.success(rules::unlock_message(known)),
            None => self.toasts.success(format!("{badge} badge unlocked!")),
        }
        Ok(true)
    }

    /// Forget the loaded profile. Nothing is written to the backend.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user = %user.user_id, "Logged out");
        }
        self.error = None;
        self.toasts.success("Logged out successfully");
    }

    pub(crate) fn add_active_ritual(&mut self, ritual: RitualId) -> Result<(), StoreError> {
        let mut active = self.require_user()?.active_rituals.clone();
        if active.contains(&ritual) {
            return Ok(());
        }
        active.push(ritual);
        self.update_user(&UserPatch {
            active_rituals: Some(active),
            ..UserPatch::default()
        })
        .map(|_| ())
    }

    pub(crate) fn remove_active_ritual(&mut self, ritual: RitualId) -> Result<(), StoreError> {
        let current = &self.require_user()?.active_rituals;
        if !current.contains(&ritual) {
            return Ok(());
        }
        let active: Vec<RitualId> = current.iter().copied().filter(|id| *id != ritual).collect();
        self.update_user(&UserPatch {
            active_rituals: Some(active),
            ..UserPatch::default()
        })
        .map(|_| ())
    }

    fn require_user(&self) -> Result<&User, StoreError> {
        self.user.as_ref().ok_or_else(|| {
            warn!("Profile action attempted with no profile loaded");
            StoreError::NoProfile
        })
    }

    fn fail(&mut self, action: &'static str, toast: &str, source: BackendError) -> StoreError {
        error!(action, error = %source, "Profile action failed");
        self.error = Some(source.to_string());
        self.toasts.error(toast);
        StoreError::Backend { action, source }
    }
}

#[cfg(test)]
mod tests {
    use resilience_store::SqliteBackend;

    use super::*;

    fn signed_in() -> ProfileStore {
        let backend = Rc::new(SqliteBackend::open_in_memory().unwrap());
        let mut store = ProfileStore::new(backend);
        store
            .create_user(&NewUser::new(UserId::new("alice").unwrap()))
            .unwrap();
        store.drain_toasts();
        store
    }

    #[test]
    fn create_user_starts_from_zero_and_welcomes() {
        let backend = Rc::new(SqliteBackend::open_in_memory().unwrap());
        let mut store = ProfileStore::new(backend);
        let user = store
            .create_user(&NewUser::new(UserId::new("bob").unwrap()))
            .unwrap();
        assert_eq!(user.total_points, 0);
        assert_eq!(user.streak_count, 0);
        assert!(user.badges_earned.is_empty());

        let toasts = store.drain_toasts();
        assert_eq!(toasts[0].message, "Welcome to Resilience Rituals! 🎉");
    }

    #[test]
    fn fetch_missing_user_is_not_an_error() {
        let mut store = signed_in();
        let found = store.fetch_user(&UserId::new("nobody").unwrap()).unwrap();
        assert!(found.is_none());
        assert!(store.user().is_none());
        assert!(store.error().is_none());
    }

    #[test]
    fn actions_without_profile_report_no_profile() {
        let backend = Rc::new(SqliteBackend::open_in_memory().unwrap());
        let mut store = ProfileStore::new(backend);
        assert!(matches!(store.add_points(10), Err(StoreError::NoProfile)));
        assert!(matches!(store.increment_streak(), Err(StoreError::NoProfile)));
        assert!(matches!(store.reset_streak(), Err(StoreError::NoProfile)));
    }

    #[test]
    fn streak_badge_is_awarded_on_the_exact_day() {
        let mut store = signed_in();
        for day in 1..=6 {
            assert!(store.increment_streak().unwrap().is_empty(), "day {day}");
        }
        assert_eq!(
            store.increment_streak().unwrap(),
            vec![BadgeId::from("week_warrior")]
        );
        assert!(store.increment_streak().unwrap().is_empty());

        let user = store.user().unwrap();
        assert_eq!(user.streak_count, 8);
        assert!(user.last_active_date.is_some());
        assert_eq!(user.badges_earned, vec![BadgeId::from("week_warrior")]);
    }

    #[test]
    fn revisiting_a_streak_milestone_does_not_award_twice() {
        let mut store = signed_in();
        for _ in 0..7 {
            store.increment_streak().unwrap();
        }
        store.reset_streak().unwrap();
        for _ in 0..6 {
            store.increment_streak().unwrap();
        }
        assert!(store.increment_streak().unwrap().is_empty());
        assert_eq!(store.user().unwrap().badges_earned.len(), 1);
    }

    #[test]
    fn point_badge_is_awarded_once_when_crossing() {
        let mut store = signed_in();
        assert!(store.add_points(95).unwrap().is_empty());
        assert_eq!(
            store.add_points(10).unwrap(),
            vec![BadgeId::from("point_collector")]
        );
        assert!(store.add_points(10).unwrap().is_empty());
        assert_eq!(
            store.add_points(400).unwrap(),
            vec![BadgeId::from("point_master")]
        );
        assert_eq!(store.user().unwrap().total_points, 515);
    }

    #[test]
    fn jumping_past_both_point_thresholds_awards_both() {
        let mut store = signed_in();
        let unlocked = store.add_points(600).unwrap();
        assert_eq!(
            unlocked,
            vec![BadgeId::from("point_collector"), BadgeId::from("point_master")]
        );
    }

    #[test]
    fn adding_a_held_badge_is_a_no_op() {
        let mut store = signed_in();
        let badge = BadgeId::from("first_steps");
        assert!(store.add_badge(&badge).unwrap());
        let toasts = store.drain_toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].message, "🌱 First Steps badge unlocked!");

        assert!(!store.add_badge(&badge).unwrap());
        assert!(store.drain_toasts().is_empty());
        assert_eq!(store.user().unwrap().badges_earned, vec![badge]);
    }

    #[test]
    fn reset_streak_keeps_points_and_badges() {
        let mut store = signed_in();
        store.add_points(120).unwrap();
        store.increment_streak().unwrap();
        store.reset_streak().unwrap();

        let user = store.user().unwrap();
        assert_eq!(user.streak_count, 0);
        assert_eq!(user.total_points, 120);
        assert_eq!(user.badges_earned, vec![BadgeId::from("point_collector")]);
    }

    #[test]
    fn update_round_trips_through_the_backend() {
        let mut store = signed_in();
        let ritual = RitualId::generate();
        let patch = UserPatch {
            farcaster_id: Some(Some("4242".to_string())),
            active_rituals: Some(vec![ritual]),
            streak_count: Some(3),
            badges_earned: Some(vec![BadgeId::from("first_steps")]),
            total_points: Some(42),
            last_active_date: Some(Utc::now()),
            premium_features: Some(true),
        };
        let local = store.update_user(&patch).unwrap().clone();

        let fetched = store.fetch_user(&local.user_id).unwrap().unwrap().clone();
        assert_eq!(fetched, local);
        assert_eq!(fetched.farcaster_id.as_deref(), Some("4242"));
        assert_eq!(fetched.active_rituals, vec![ritual]);
        assert_eq!(fetched.total_points, 42);
        assert!(fetched.premium_features);
    }

    #[test]
    fn loaded_profile_matches_storage_after_a_streak() {
        let mut store = signed_in();
        store.increment_streak().unwrap();
        let local = store.user().unwrap().clone();

        let fetched = store.fetch_user(&local.user_id).unwrap().unwrap();
        assert_eq!(fetched.last_active_date, local.last_active_date);
        assert_eq!(*fetched, local);
    }

    #[test]
    fn farcaster_id_can_be_cleared() {
        let mut store = signed_in();
        store
            .update_user(&UserPatch {
                farcaster_id: Some(Some("4242".to_string())),
                ..UserPatch::default()
            })
            .unwrap();
        let cleared = store
            .update_user(&UserPatch {
                farcaster_id: Some(None),
                ..UserPatch::default()
            })
            .unwrap()
            .clone();
        assert!(cleared.farcaster_id.is_none());

        let fetched = store.fetch_user(&cleared.user_id).unwrap().unwrap();
        assert!(fetched.farcaster_id.is_none());
    }

    #[test]
    fn logout_clears_profile_without_touching_backend() {
        let mut store = signed_in();
        store.add_points(30).unwrap();
        store.logout();
        assert!(store.user().is_none());

        let id = UserId::new("alice").unwrap();
        assert_eq!(store.fetch_user(&id).unwrap().unwrap().total_points, 30);
    }
}
