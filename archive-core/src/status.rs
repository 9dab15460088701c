//! Project lifecycle status.
//!
//! The status enum is the backbone of the review state machine. Only the
//! transitions in `transition.rs` can move a project between these values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a project.
///
/// `Approved` and `Rejected` are terminal: the status never changes again,
/// though reviewers may still append feedback or update the grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    UnderReview,
    Approved,
    Rejected,
}

impl ProjectStatus {
    /// Returns true if no further status transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Canonical wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Label shown in advisor-facing views. The source system displays
    /// approved projects as "Completed"; the underlying state is the same.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::UnderReview => "Under Review",
            Self::Approved => "Completed",
            Self::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "under_review" => Some(Self::UnderReview),
            // "completed" is accepted as an alias for the approved state.
            "approved" | "completed" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
