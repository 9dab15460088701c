//! The status transition engine.
//!
//! Pure functions over a `Project`: each operation checks the actor's role,
//! the current status, and the submission invariants, then applies the
//! transition in place. No IO happens here; persistence is the caller's job
//! and is expected to write the whole record atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::grade::Grade;
use crate::project::Project;
use crate::role::Actor;
use crate::status::ProjectStatus;

/// The two review decisions available from `UnderReview`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Deny,
}

impl ReviewDecision {
    /// Map a requested target status onto a decision.
    ///
    /// Only the two terminal statuses are reachable via a status PATCH;
    /// anything else is not a reviewer decision.
    pub fn from_target(status: ProjectStatus) -> Option<Self> {
        match status {
            ProjectStatus::Approved => Some(Self::Approve),
            ProjectStatus::Rejected => Some(Self::Deny),
            ProjectStatus::Draft | ProjectStatus::UnderReview => None,
        }
    }

    fn action_name(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Deny => "deny",
        }
    }
}

/// Check that the actor may edit this project as its owner.
///
/// Edits are a student action and only while the project is a draft. The
/// actor must appear among the project's student members, except for
/// projects with no student members listed (single-author drafts created
/// without a roster).
pub fn ensure_owner_edit(project: &Project, actor: &Actor) -> Result<(), DomainError> {
    if actor.role.can_review() {
        // Reviewers interact through the review operations, not draft edits.
        return Err(DomainError::Authorization {
            role: actor.role,
            action: "edit a project draft",
        });
    }
    if project.status != ProjectStatus::Draft {
        return Err(DomainError::InvalidTransition {
            from: project.status,
            action: "edit",
        });
    }
    if project.student_members().next().is_some() && !project.has_student(&actor.identity) {
        return Err(DomainError::Authorization {
            role: actor.role,
            action: "edit another team's project",
        });
    }
    Ok(())
}

/// Record a draft save: owner check plus a `last_modified` bump.
///
/// Field changes themselves are applied by the caller before this runs.
pub fn save_draft(project: &mut Project, actor: &Actor, now: DateTime<Utc>) -> Result<(), DomainError> {
    ensure_owner_edit(project, actor)?;
    project.last_modified = now;
    Ok(())
}

/// Submit a project for review: Draft -> UnderReview.
///
/// Requires exactly one primary student among student members; projects
/// with no student members are exempt (single-author projects). On success
/// sets `submitted_at` and `last_modified`.
pub fn submit(project: &mut Project, actor: &Actor, now: DateTime<Utc>) -> Result<(), DomainError> {
    ensure_owner_edit(project, actor)?;
    validate_submission(project)?;

    project.status = ProjectStatus::UnderReview;
    project.submitted_at = Some(now);
    project.last_modified = now;
    Ok(())
}

/// Structural checks that must hold before a project leaves Draft.
pub fn validate_submission(project: &Project) -> Result<(), DomainError> {
    if project.title.trim().is_empty() {
        return Err(DomainError::validation("project title is required"));
    }

    let student_count = project.student_members().count();
    if student_count > 0 {
        match project.primary_student_count() {
            1 => {}
            0 => {
                return Err(DomainError::validation(
                    "a primary student must be designated before submission",
                ))
            }
            n => {
                return Err(DomainError::validation(format!(
                    "only one primary student is allowed, found {}",
                    n
                )))
            }
        }
    }
    Ok(())
}

/// Apply a review decision: UnderReview -> Approved or Rejected.
///
/// Only advisors and coordinators may review. A deny must carry feedback
/// for the authors; the text is recorded under the denying actor's role.
/// Feedback on approval is optional.
pub fn review(
    project: &mut Project,
    actor: &Actor,
    decision: ReviewDecision,
    feedback: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if !actor.role.can_review() {
        return Err(DomainError::Authorization {
            role: actor.role,
            action: "review projects",
        });
    }
    if project.status != ProjectStatus::UnderReview {
        return Err(DomainError::InvalidTransition {
            from: project.status,
            action: decision.action_name(),
        });
    }

    match decision {
        ReviewDecision::Approve => {
            if let Some(text) = feedback {
                project.feedback.append(actor.role, text, now)?;
            }
            project.status = ProjectStatus::Approved;
            project.completed_at = Some(now);
        }
        ReviewDecision::Deny => {
            let text = feedback.map(str::trim).filter(|t| !t.is_empty());
            let Some(text) = text else {
                return Err(DomainError::MissingFeedback);
            };
            project.feedback.append(actor.role, text, now)?;
            project.status = ProjectStatus::Rejected;
        }
    }
    project.last_modified = now;
    Ok(())
}

/// Append reviewer feedback outside a status transition.
///
/// Allowed for any submitted project, including terminal states: approved
/// and rejected projects still accept additional feedback.
pub fn add_feedback(
    project: &mut Project,
    actor: &Actor,
    text: &str,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if !actor.role.can_review() {
        return Err(DomainError::Authorization {
            role: actor.role,
            action: "give feedback",
        });
    }
    if project.status == ProjectStatus::Draft {
        return Err(DomainError::InvalidTransition {
            from: project.status,
            action: "give feedback on",
        });
    }
    project.feedback.append(actor.role, text, now)?;
    project.last_modified = now;
    Ok(())
}

/// Set (overwrite) the project grade.
///
/// Reviewer-only, and only once the project has been submitted. The value
/// may be a JSON number, a numeric string, or a letter grade.
pub fn set_grade(
    project: &mut Project,
    actor: &Actor,
    value: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if !actor.role.can_review() {
        return Err(DomainError::Authorization {
            role: actor.role,
            action: "grade projects",
        });
    }
    if project.status == ProjectStatus::Draft {
        return Err(DomainError::InvalidTransition {
            from: project.status,
            action: "grade",
        });
    }
    let grade = Grade::parse(value)?;
    project.grade = Some(grade);
    project.last_modified = now;
    Ok(())
}
