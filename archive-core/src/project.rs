//! The project entity.
//!
//! A project is a single archived piece of student work: capstone,
//! competition entry, publication, or social-service project. The
//! type-specific details live in a tagged `ProjectKind` variant rather than
//! a bag of all-optional fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackLog;
use crate::grade::Grade;
use crate::status::ProjectStatus;

/// Newtype for project identifiers (UUID strings minted by the server).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What kind of work the project is, with the kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectKind {
    Capstone,
    Competition {
        competition: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        award: Option<String>,
    },
    Publication {
        venue: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        doi: Option<String>,
    },
    SocialService {
        beneficiary: String,
    },
    Other,
}

/// Role of a team member within the project (distinct from the actor roles
/// used for authorization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Student,
    Lecturer,
}

/// A member of the project team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    #[serde(default)]
    pub is_primary: bool,
}

/// Summary of an uploaded file. The bytes themselves live in external
/// object storage; the archive only records what was uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

/// A project record as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(flatten)]
    pub kind: ProjectKind,
    pub status: ProjectStatus,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    #[serde(default)]
    pub feedback: FeedbackLog,
}

impl Project {
    /// Team members with the student role.
    pub fn student_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members
            .iter()
            .filter(|m| m.role == MemberRole::Student)
    }

    /// Number of student members flagged as primary.
    pub fn primary_student_count(&self) -> usize {
        self.student_members().filter(|m| m.is_primary).count()
    }

    /// Whether the given identity (email) is one of the project's students.
    ///
    /// This is the ownership test for draft edits and the visibility test
    /// for student listings. Email comparison is case-insensitive.
    pub fn has_student(&self, identity: &str) -> bool {
        self.student_members()
            .any(|m| m.email.eq_ignore_ascii_case(identity))
    }

    /// Whether free text matches this project: case-insensitive substring
    /// search over title, description, and course code.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self
                .course_code
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    pub fn student(email: &str, is_primary: bool) -> TeamMember {
        TeamMember {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            role: MemberRole::Student,
            is_primary,
        }
    }

    pub fn lecturer(email: &str) -> TeamMember {
        TeamMember {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            role: MemberRole::Lecturer,
            is_primary: false,
        }
    }

    pub fn project(id: &str, status: ProjectStatus, members: Vec<TeamMember>) -> Project {
        Project {
            id: ProjectId::from(id),
            title: format!("Project {}", id),
            kind: ProjectKind::Capstone,
            status,
            description: "A capstone project".to_string(),
            keywords: vec!["rust".to_string()],
            course_code: Some("CS4901".to_string()),
            team_name: "Team".to_string(),
            members,
            links: vec![],
            files: vec![],
            submitted_at: if status == ProjectStatus::Draft {
                None
            } else {
                Some(fixed_time())
            },
            completed_at: None,
            last_modified: fixed_time(),
            grade: None,
            feedback: FeedbackLog::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;
    use crate::status::ProjectStatus;

    #[test]
    fn test_primary_student_count_ignores_lecturers() {
        let mut lecturer_flagged = lecturer("prof@uni.edu");
        lecturer_flagged.is_primary = true;

        let project = project(
            "p1",
            ProjectStatus::Draft,
            vec![student("ana@uni.edu", false), lecturer_flagged],
        );
        assert_eq!(project.primary_student_count(), 0);
    }

    #[test]
    fn test_has_student_case_insensitive() {
        let project = project(
            "p1",
            ProjectStatus::Draft,
            vec![student("Ana@Uni.edu", true)],
        );
        assert!(project.has_student("ana@uni.edu"));
        assert!(!project.has_student("bob@uni.edu"));
    }

    #[test]
    fn test_matches_search_over_title_description_course() {
        let project = project("p1", ProjectStatus::Draft, vec![]);
        assert!(project.matches_search("PROJECT"));
        assert!(project.matches_search("capstone"));
        assert!(project.matches_search("cs49"));
        assert!(!project.matches_search("robotics"));
        assert!(project.matches_search(""));
    }

    #[test]
    fn test_kind_serializes_tagged() {
        let kind = ProjectKind::Competition {
            competition: "ACM ICPC".to_string(),
            award: Some("Silver".to_string()),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "competition");
        assert_eq!(json["competition"], "ACM ICPC");
    }
}
