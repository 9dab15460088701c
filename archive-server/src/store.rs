//! Coordination layer between HTTP handlers and the repository.
//!
//! Every mutation follows the same shape: load the record, run the pure
//! lifecycle operation from `archive-core`, then write the whole record back
//! with a version check. A concurrent writer makes the version check fail,
//! which is surfaced to the client instead of silently losing a review
//! decision.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use archive_core::{
    transition, view, Actor, ActorRole, DomainError, FeedbackLog, FileSummary, Project, ProjectId,
    ProjectKind, ProjectStatus, ReviewDecision, TeamMember,
};

use crate::repository::{ProjectRepository, RepositoryError, StoredProject};

/// Failures of a store operation: domain rule or storage backend.
#[derive(Debug)]
pub enum StoreError {
    Domain(DomainError),
    Repository(RepositoryError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{}", e),
            Self::Repository(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<DomainError> for StoreError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}

impl From<RepositoryError> for StoreError {
    fn from(e: RepositoryError) -> Self {
        Self::Repository(e)
    }
}

/// Fields accepted when creating a project.
#[derive(Debug, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(flatten)]
    pub kind: ProjectKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileSummary>,
}

/// Field changes accepted while a project is a draft. Absent fields are
/// left untouched.
#[derive(Debug, Default)]
pub struct DraftUpdate {
    pub title: Option<String>,
    pub kind: Option<ProjectKind>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub course_code: Option<Option<String>>,
    pub team_name: Option<String>,
    pub members: Option<Vec<TeamMember>>,
    pub links: Option<Vec<String>>,
    pub files: Option<Vec<FileSummary>>,
}

impl DraftUpdate {
    /// Parse a PATCH body. The kind payload is tagged by a top-level
    /// `type` field and is only replaced when that tag is present.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Fields {
            title: Option<String>,
            description: Option<String>,
            keywords: Option<Vec<String>>,
            #[serde(default, deserialize_with = "double_option")]
            course_code: Option<Option<String>>,
            team_name: Option<String>,
            members: Option<Vec<TeamMember>>,
            links: Option<Vec<String>>,
            files: Option<Vec<FileSummary>>,
        }

        let kind = if value.get("type").is_some() {
            Some(serde_json::from_value::<ProjectKind>(value.clone())?)
        } else {
            None
        };
        let fields: Fields = serde_json::from_value(value.clone())?;

        Ok(Self {
            title: fields.title,
            kind,
            description: fields.description,
            keywords: fields.keywords,
            course_code: fields.course_code,
            team_name: fields.team_name,
            members: fields.members,
            links: fields.links,
            files: fields.files,
        })
    }
    fn apply(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(kind) = self.kind {
            project.kind = kind;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(keywords) = self.keywords {
            project.keywords = keywords;
        }
        if let Some(course_code) = self.course_code {
            project.course_code = course_code;
        }
        if let Some(team_name) = self.team_name {
            project.team_name = team_name;
        }
        if let Some(members) = self.members {
            project.members = members;
        }
        if let Some(links) = self.links {
            project.links = links;
        }
        if let Some(files) = self.files {
            project.files = files;
        }
    }
}

/// Distinguish "field absent" from "field set to null": absent leaves the
/// stored value alone, an explicit null clears it.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Some(Option::<String>::deserialize(deserializer)?))
}

/// Thread-safe store applying lifecycle operations against a repository.
pub struct ProjectStore {
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectStore {
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    async fn load(&self, id: &ProjectId) -> Result<StoredProject, StoreError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| StoreError::Domain(DomainError::NotFound { id: id.0.clone() }))
    }

    /// Create a project, as a draft or submitted immediately.
    pub async fn create(
        &self,
        actor: &Actor,
        new: NewProject,
        submit: bool,
    ) -> Result<Project, StoreError> {
        if actor.role != ActorRole::Student {
            return Err(StoreError::Domain(DomainError::Authorization {
                role: actor.role,
                action: "create projects",
            }));
        }

        let now = Utc::now();
        let mut project = Project {
            id: ProjectId(Uuid::new_v4().to_string()),
            title: new.title,
            kind: new.kind,
            status: ProjectStatus::Draft,
            description: new.description,
            keywords: new.keywords,
            course_code: new.course_code,
            team_name: new.team_name,
            members: new.members,
            links: new.links,
            files: new.files,
            submitted_at: None,
            completed_at: None,
            last_modified: now,
            grade: None,
            feedback: FeedbackLog::new(),
        };

        if submit {
            transition::submit(&mut project, actor, now)?;
        } else if project.title.trim().is_empty() {
            return Err(StoreError::Domain(DomainError::validation(
                "project title is required",
            )));
        }

        self.repository
            .insert(StoredProject::new(project.clone()))
            .await?;

        info!(
            "Created project {} ({}) for {}",
            project.id, project.status, actor.identity
        );
        Ok(project)
    }

    /// Edit a draft, optionally submitting it after the changes apply.
    pub async fn edit(
        &self,
        actor: &Actor,
        id: &ProjectId,
        changes: DraftUpdate,
        submit: bool,
    ) -> Result<Project, StoreError> {
        let stored = self.load(id).await?;
        let mut project = stored.project;
        let now = Utc::now();

        // Owner/status check happens before any change is applied.
        transition::ensure_owner_edit(&project, actor)?;
        changes.apply(&mut project);
        if submit {
            transition::submit(&mut project, actor, now)?;
        } else {
            transition::save_draft(&mut project, actor, now)?;
        }

        let updated = self.repository.update(project, stored.version).await?;
        info!("Updated project {} ({})", id, updated.project.status);
        Ok(updated.project)
    }

    /// Apply a review decision (approve or deny).
    pub async fn decide(
        &self,
        actor: &Actor,
        id: &ProjectId,
        decision: ReviewDecision,
        feedback: Option<&str>,
    ) -> Result<Project, StoreError> {
        let stored = self.load(id).await?;
        let mut project = stored.project;

        transition::review(&mut project, actor, decision, feedback, Utc::now())?;

        let updated = self.repository.update(project, stored.version).await?;
        info!(
            "Project {} reviewed by {} ({}): now {}",
            id, actor.identity, actor.role, updated.project.status
        );
        Ok(updated.project)
    }

    /// Append feedback under the caller's role.
    pub async fn add_feedback(
        &self,
        actor: &Actor,
        id: &ProjectId,
        text: &str,
    ) -> Result<Project, StoreError> {
        let stored = self.load(id).await?;
        let mut project = stored.project;

        transition::add_feedback(&mut project, actor, text, Utc::now())?;

        let updated = self.repository.update(project, stored.version).await?;
        Ok(updated.project)
    }

    /// Set (overwrite) the grade.
    pub async fn set_grade(
        &self,
        actor: &Actor,
        id: &ProjectId,
        value: &serde_json::Value,
    ) -> Result<Project, StoreError> {
        let stored = self.load(id).await?;
        let mut project = stored.project;

        transition::set_grade(&mut project, actor, value, Utc::now())?;

        let updated = self.repository.update(project, stored.version).await?;
        Ok(updated.project)
    }

    /// Fetch a single project, subject to the caller's visibility.
    pub async fn get_visible(&self, actor: &Actor, id: &ProjectId) -> Result<Project, StoreError> {
        let stored = self.load(id).await?;
        let project = stored.project;

        // Students only see their own projects; a foreign id reads as absent
        // rather than forbidden, to avoid leaking its existence.
        if actor.role == ActorRole::Student && !project.has_student(&actor.identity) {
            return Err(StoreError::Domain(DomainError::NotFound {
                id: id.0.clone(),
            }));
        }
        Ok(project)
    }

    /// Role-projected project listing with optional free-text search.
    pub async fn list_visible(
        &self,
        actor: &Actor,
        search: Option<&str>,
    ) -> Result<Vec<Project>, StoreError> {
        let all = self.sorted_projects().await?;
        let visible = view::list_visible(actor.role, &actor.identity, &all);
        let visible = view::apply_search(visible, search);
        Ok(visible.into_iter().cloned().collect())
    }

    /// The approved-project archive with optional search.
    pub async fn archive(&self, search: Option<&str>) -> Result<Vec<Project>, StoreError> {
        let all = self.sorted_projects().await?;
        let approved = view::archive_view(&all);
        let approved = view::apply_search(approved, search);
        Ok(approved.into_iter().cloned().collect())
    }

    /// Listing order is deterministic regardless of backend: oldest
    /// activity first, ties broken by id.
    async fn sorted_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut all: Vec<Project> = self
            .repository
            .list_all()
            .await?
            .into_iter()
            .map(|s| s.project)
            .collect();
        all.sort_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(all)
    }

    /// All stored records, for the operator status endpoint.
    pub async fn all_stored(&self) -> Result<Vec<StoredProject>, StoreError> {
        Ok(self.repository.list_all().await?)
    }
}
