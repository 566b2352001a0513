//! Errors returned by store actions.

use std::fmt;

use thiserror::Error;

use resilience_store::BackendError;
use resilience_types::{RitualId, SessionId, ValidationError};

/// The step of a ritual completion that failed after the session row was
/// already written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStage {
    MarkCompleted,
    AwardPoints,
    IncrementStreak,
    CompletionBadges,
}

impl CompletionStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarkCompleted => "mark ritual completed",
            Self::AwardPoints => "award points",
            Self::IncrementStreak => "increment streak",
            Self::CompletionBadges => "award completion badges",
        }
    }
}

impl fmt::Display for CompletionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no profile is loaded")]
    NoProfile,
    #[error("ritual {0} is not in the catalog")]
    UnknownRitual(RitualId),
    #[error("unknown ritual template: {0}")]
    UnknownTemplate(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to {action}: {source}")]
    Backend {
        action: &'static str,
        #[source]
        source: BackendError,
    },
    /// The session was recorded but a later step failed. The session is not
    /// rolled back.
    #[error("session {session} was recorded but the completion failed to {stage}: {source}")]
    PartialCompletion {
        session: SessionId,
        stage: CompletionStage,
        #[source]
        source: Box<StoreError>,
    },
    /// The ritual write succeeded but the owner's active-ritual list could
    /// not be brought in line with it.
    #[error("ritual {ritual} was saved but the active-ritual list was not updated: {source}")]
    ActiveListNotUpdated {
        ritual: RitualId,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// The underlying backend failure, looking through partial completions.
    #[must_use]
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Backend { source, .. } => Some(source),
            Self::PartialCompletion { source, .. } | Self::ActiveListNotUpdated { source, .. } => {
                source.backend_error()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_completion_names_the_failed_stage() {
        let session = SessionId::generate();
        let err = StoreError::PartialCompletion {
            session,
            stage: CompletionStage::AwardPoints,
            source: Box::new(StoreError::Backend {
                action: "update profile",
                source: BackendError::Unavailable("offline".to_string()),
            }),
        };
        let message = err.to_string();
        assert!(message.contains(&session.to_string()));
        assert!(message.contains("award points"));
        assert!(matches!(
            err.backend_error(),
            Some(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn stale_active_list_names_the_ritual() {
        let ritual = RitualId::generate();
        let err = StoreError::ActiveListNotUpdated {
            ritual,
            source: Box::new(StoreError::NoProfile),
        };
        assert!(err.to_string().contains(&ritual.to_string()));
        assert!(err.to_string().contains("active-ritual list"));
        assert!(err.backend_error().is_none());
    }

    #[test]
    fn validation_errors_are_transparent() {
        let err = StoreError::from(ValidationError::ZeroDuration);
        assert_eq!(err.to_string(), ValidationError::ZeroDuration.to_string());
        assert!(err.backend_error().is_none());
    }
}
