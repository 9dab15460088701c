//! Domain error kinds surfaced to API callers.
//!
//! Every failure mode of the lifecycle engine is a distinct variant with a
//! user-readable message. Nothing here is retried automatically; the caller
//! sees each error exactly once per request.

use std::fmt;

use crate::role::ActorRole;
use crate::status::ProjectStatus;

/// All domain-level failures of the review lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field or structural rule was violated (e.g. no primary
    /// student designated at submission time).
    Validation { message: String },

    /// The requested status transition is not permitted from the current state.
    InvalidTransition {
        from: ProjectStatus,
        action: &'static str,
    },

    /// A deny decision was issued without any feedback text.
    MissingFeedback,

    /// Feedback text was blank.
    EmptyFeedback,

    /// Grade value was not parseable or out of range.
    InvalidGrade { value: String },

    /// No project with the given id exists.
    NotFound { id: String },

    /// The actor's role does not permit the requested action.
    Authorization {
        role: ActorRole,
        action: &'static str,
    },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Stable machine-readable kind name, used as the `error` field of API
    /// error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::MissingFeedback => "missing_feedback",
            Self::EmptyFeedback => "empty_feedback",
            Self::InvalidGrade { .. } => "invalid_grade",
            Self::NotFound { .. } => "not_found",
            Self::Authorization { .. } => "authorization_error",
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message } => write!(f, "validation failed: {}", message),
            Self::InvalidTransition { from, action } => {
                write!(f, "cannot {} a project in status '{}'", action, from)
            }
            Self::MissingFeedback => {
                write!(f, "denying a project requires feedback for the authors")
            }
            Self::EmptyFeedback => write!(f, "feedback text must not be blank"),
            Self::InvalidGrade { value } => {
                write!(
                    f,
                    "'{}' is not a valid grade (expected a number in 0-100 or a letter grade)",
                    value
                )
            }
            Self::NotFound { id } => write!(f, "no project found with id {}", id),
            Self::Authorization { role, action } => {
                write!(f, "role '{}' is not permitted to {}", role, action)
            }
        }
    }
}

impl std::error::Error for DomainError {}
