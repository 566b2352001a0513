//! Domain state and gamification rules for Resilience Rituals.
//!
//! Two stores hold the signed-in user's state:
//! - [`ProfileStore`]: identity, points, streak and unlocked badges
//! - [`RitualCatalog`]: the user's rituals and the completion workflow
//!
//! Both talk to a shared [`resilience_store::Backend`] and report results as
//! [`Toast`]s that front ends drain after each action. Completing a ritual
//! is the one flow that crosses stores: the catalog records the session and
//! then calls into the profile store for points, streak and badges.

mod catalog;
pub mod errors;
pub mod notifications;
mod profile;
pub mod rules;
pub mod share;
pub mod stats;


pub use catalog::{Completion, RitualCatalog};
pub use errors::{CompletionStage, StoreError};
pub use notifications::{Toast, ToastLevel, ToastQueue};
pub use profile::ProfileStore;
pub use share::{Clipboard, ClipboardError, SystemClipboard, progress_text, share_progress};
