//! The user's ritual catalog and the completion workflow.
//!
//! Ritual writes go to the backend first; the local list is updated only
//! after the write succeeded. Changes to the owner's active-ritual list and
//! progression are made through the [`ProfileStore`] passed to each call.

use std::rc::Rc;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

use resilience_store::{Backend, BackendError};
use resilience_types::{
    BadgeId, NewRitual, NewSession, Ritual, RitualId, RitualPatch, Session, SessionId,
    SessionInput, UserId, find_template,
};

use crate::errors::CompletionStage;
use crate::notifications::{Toast, ToastQueue};
use crate::{ProfileStore, StoreError, rules};

/// Outcome of a successful ritual completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub session: Session,
    pub points: u32,
    /// Badges unlocked by this completion, in unlock order.
    pub badges: Vec<BadgeId>,
}

pub struct RitualCatalog {
    backend: Rc<dyn Backend>,
    /// Active rituals, newest first.
    rituals: Vec<Ritual>,
    active: Option<RitualId>,
    error: Option<String>,
    toasts: ToastQueue,
}

impl RitualCatalog {
    #[must_use]
    pub fn new(backend: Rc<dyn Backend>) -> Self {
        Self {
            backend,
            rituals: Vec::new(),
            active: None,
            error: None,
            toasts: ToastQueue::new(),
        }
    }

    #[must_use]
    pub fn rituals(&self) -> &[Ritual] {
        &self.rituals
    }

    #[must_use]
    pub fn ritual(&self, id: RitualId) -> Option<&Ritual> {
        self.rituals.iter().find(|ritual| ritual.ritual_id == id)
    }

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

    /// The ritual the user has selected, if it is still in the catalog.
    #[must_use]
    pub fn active_ritual(&self) -> Option<&Ritual> {
        self.active.and_then(|id| self.ritual(id))
    }

    /// Select a ritual, or clear the selection with `None`.
    pub fn set_active_ritual(&mut self, id: Option<RitualId>) -> Result<(), StoreError> {
        if let Some(id) = id
            && self.ritual(id).is_none()
        {
            return Err(StoreError::UnknownRitual(id));
        }
        self.active = id;
        Ok(())
    }

    /// Load the user's active rituals for the current UTC day.
    pub fn fetch_rituals(&mut self, user: &UserId) -> Result<&[Ritual], StoreError> {
        self.fetch_rituals_as_of(user, Utc::now().date_naive())
    }

    /// Load the user's active rituals, first clearing `completed_today` on
    /// every ritual not completed on `today`.
    pub fn fetch_rituals_as_of(
        &mut self,
        user: &UserId,
        today: NaiveDate,
    ) -> Result<&[Ritual], StoreError> {
        self.error = None;
        let cleared = self.backend.clear_stale_completions(user, today);
        let cleared =
            cleared.map_err(|err| self.fail("roll over completions", "Failed to load rituals", err))?;
        if cleared > 0 {
            info!(user = %user, cleared, %today, "Rolled over completed rituals");
        }

        let fetched = self.backend.rituals_for_user(user);
        let rituals = fetched.map_err(|err| self.fail("load rituals", "Failed to load rituals", err))?;
        self.rituals = rituals;
        if self.active.is_some_and(|id| self.ritual(id).is_none()) {
            self.active = None;
        }
        Ok(&self.rituals)
    }

    /// Persist a new ritual and add it to the owner's active-ritual list.
    ///
    /// If the ritual was stored but the list update failed, the ritual is
    /// still listed locally and [`StoreError::ActiveListNotUpdated`] is
    /// returned.
    pub fn create_ritual(
        &mut self,
        new: &NewRitual,
        profile: &mut ProfileStore,
    ) -> Result<&Ritual, StoreError> {
        self.error = None;
        let created = self.backend.create_ritual(new);
        let ritual =
            created.map_err(|err| self.fail("create ritual", "Failed to create ritual", err))?;
        info!(ritual = %ritual.ritual_id, name = %ritual.name, "Created ritual");

        let id = ritual.ritual_id;
        let linked = if profile.user().is_some_and(|owner| owner.user_id == ritual.user_id) {
            profile.add_active_ritual(id)
        } else {
            Ok(())
        };
        self.rituals.insert(0, ritual);
        if let Err(err) = linked {
            return Err(self.stale_active_list(id, "Failed to create ritual", err));
        }

        self.toasts
            .success(format!("{} ritual created! 🎉", self.rituals[0].name));
        Ok(&self.rituals[0])
    }

    /// Create a ritual from a built-in template for `user`.
    pub fn create_from_template(
        &mut self,
        user: &UserId,
        template_id: &str,
        profile: &mut ProfileStore,
    ) -> Result<&Ritual, StoreError> {
        let Some(template) = find_template(template_id) else {
            warn!(template = template_id, "Unknown ritual template");
            return Err(StoreError::UnknownTemplate(template_id.to_string()));
        };
        let new = NewRitual::from_template(user.clone(), template);
        self.create_ritual(&new, profile)
    }

    /// Merge `patch` into the stored ritual, then into the local copy.
    pub fn update_ritual(
        &mut self,
        id: RitualId,
        patch: &RitualPatch,
    ) -> Result<Ritual, StoreError> {
        self.error = None;
        let updated = self.backend.update_ritual(&id, patch);
        let remote =
            updated.map_err(|err| self.fail("update ritual", "Failed to update ritual", err))?;

        let ritual = match self.rituals.iter_mut().find(|r| r.ritual_id == id) {
            Some(local) => {
                local.apply(patch);
                local.clone()
            }
            None => remote,
        };
        self.rituals.retain(|r| r.is_active);
        info!(ritual = %id, "Updated ritual");
        self.toasts.success("Ritual updated successfully");
        Ok(ritual)
    }

    /// Soft-delete: the ritual is deactivated, dropped from the catalog and
    /// removed from the owner's active-ritual list. A failure on the last
    /// step returns [`StoreError::ActiveListNotUpdated`] with the ritual
    /// already deactivated.
    pub fn delete_ritual(
        &mut self,
        id: RitualId,
        profile: &mut ProfileStore,
    ) -> Result<(), StoreError> {
        self.error = None;
        let deactivated = self.backend.update_ritual(&id, &RitualPatch::deactivate());
        let ritual =
            deactivated.map_err(|err| self.fail("delete ritual", "Failed to delete ritual", err))?;

        self.rituals.retain(|r| r.ritual_id != id);
        if self.active == Some(id) {
            self.active = None;
        }
        if profile.user().is_some_and(|owner| owner.user_id == ritual.user_id)
            && let Err(err) = profile.remove_active_ritual(id)
        {
            return Err(self.stale_active_list(id, "Failed to delete ritual", err));
        }

        info!(ritual = %id, "Deleted ritual");
        self.toasts.success("Ritual deleted successfully");
        Ok(())
    }

    /// Record a completion of `id` for the loaded profile.
    ///
    /// Steps, in order: write the session, mark the ritual completed today,
    /// add the session's points, extend the streak, then check completion
    /// badges. The steps are not atomic. A failure after the session was
    /// written returns [`StoreError::PartialCompletion`] and leaves the
    /// session in place.
    pub fn complete_ritual(
        &mut self,
        id: RitualId,
        input: SessionInput,
        profile: &mut ProfileStore,
    ) -> Result<Completion, StoreError> {
        let Some(user_id) = profile.user().map(|user| user.user_id.clone()) else {
            warn!(ritual = %id, "Completion attempted with no profile loaded");
            return Err(StoreError::NoProfile);
        };
        if self.ritual(id).is_none() {
            return Err(StoreError::UnknownRitual(id));
        }
        self.error = None;

        let points = rules::points_for_session(input.mood_before, input.mood_after);
        let recorded = self.backend.create_session(&NewSession {
            user_id: user_id.clone(),
            ritual_id: id,
            mood_before: input.mood_before,
            mood_after: input.mood_after,
            notes: input.notes,
            points_earned: points,
            completed: true,
        });
        let session = recorded
            .map_err(|err| self.fail("record session", "Failed to complete ritual", err))?;
        let session_id = session.session_id;

        if let Err(source) = self
            .backend
            .update_ritual(&id, &RitualPatch::completed_today(true))
        {
            let source = StoreError::Backend {
                action: "mark ritual completed",
                source,
            };
            return Err(self.partial(session_id, CompletionStage::MarkCompleted, source));
        }
        if let Some(local) = self.rituals.iter_mut().find(|r| r.ritual_id == id) {
            local.completed_today = true;
        }

        let mut badges = profile
            .add_points(points)
            .map_err(|err| self.partial(session_id, CompletionStage::AwardPoints, err))?;
        badges.extend(
            profile
                .increment_streak()
                .map_err(|err| self.partial(session_id, CompletionStage::IncrementStreak, err))?,
        );
        badges.extend(
            self.award_completion_badges(&user_id, profile)
                .map_err(|err| self.partial(session_id, CompletionStage::CompletionBadges, err))?,
        );

        info!(ritual = %id, session = %session_id, points, "Completed ritual");
        self.toasts.success(format!("Ritual completed! +{points} points 🎉"));
        Ok(Completion {
            session,
            points,
            badges,
        })
    }

    fn award_completion_badges(
        &self,
        user: &UserId,
        profile: &mut ProfileStore,
    ) -> Result<Vec<BadgeId>, StoreError> {
        let mut unlocked = Vec::new();
        for rule in rules::completion_rules() {
            if profile
                .user()
                .is_some_and(|owner| owner.has_badge(&rule.badge.badge_id))
            {
                continue;
            }
            let count = self
                .backend
                .completed_session_count(user, rule.category)
                .map_err(|source| StoreError::Backend {
                    action: "count completed sessions",
                    source,
                })?;
            if count >= rule.count && profile.add_badge(&rule.badge.badge_id)? {
                unlocked.push(rule.badge.badge_id.clone());
            }
        }
        Ok(unlocked)
    }

    fn fail(&mut self, action: &'static str, toast: &str, source: BackendError) -> StoreError {
        error!(action, error = %source, "Ritual action failed");
        self.error = Some(source.to_string());
        self.toasts.error(toast);
        StoreError::Backend { action, source }
    }

    fn stale_active_list(
        &mut self,
        ritual: RitualId,
        toast: &str,
        source: StoreError,
    ) -> StoreError {
        error!(
            ritual = %ritual,
            error = %source,
            "Ritual saved but the active-ritual list was not updated"
        );
        self.error = Some(source.to_string());
        self.toasts.error(toast);
        StoreError::ActiveListNotUpdated {
            ritual,
            source: Box::new(source),
        }
    }

    fn partial(
        &mut self,
        session: SessionId,
        stage: CompletionStage,
        source: StoreError,
    ) -> StoreError {
        error!(
            session = %session,
            %stage,
            error = %source,
            "Ritual completion stopped after the session was recorded"
        );
        self.error = Some(source.to_string());
        self.toasts.error("Failed to complete ritual");
        StoreError::PartialCompletion {
            session,
            stage,
            source: Box::new(source),
        }
    }
}
