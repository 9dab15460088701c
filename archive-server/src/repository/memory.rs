//! In-memory implementation of `ProjectRepository`.
//!
//! Used by tests and ephemeral deployments. All state is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use archive_core::{Project, ProjectId};

use super::{ProjectRepository, RepositoryError, StoredProject};

/// Projects in a `HashMap` behind a `RwLock`.
pub struct InMemoryRepository {
    projects: RwLock<HashMap<ProjectId, StoredProject>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn get(&self, id: &ProjectId) -> Result<Option<StoredProject>, RepositoryError> {
        let projects = self.projects.read().await;
        Ok(projects.get(id).cloned())
    }

    async fn insert(&self, stored: StoredProject) -> Result<(), RepositoryError> {
        let mut projects = self.projects.write().await;
        let id = stored.project.id.clone();
        if projects.contains_key(&id) {
            return Err(RepositoryError::DuplicateId { id: id.0 });
        }
        projects.insert(id, stored);
        Ok(())
    }

    async fn update(
        &self,
        project: Project,
        expected_version: i64,
    ) -> Result<StoredProject, RepositoryError> {
        let mut projects = self.projects.write().await;
        let id = project.id.clone();
        match projects.get_mut(&id) {
            Some(existing) if existing.version == expected_version => {
                existing.project = project;
                existing.version += 1;
                Ok(existing.clone())
            }
            Some(_) | None => Err(RepositoryError::Conflict { id: id.0 }),
        }
    }

    async fn list_all(&self) -> Result<Vec<StoredProject>, RepositoryError> {
        let projects = self.projects.read().await;
        Ok(projects.values().cloned().collect())
    }

    async fn delete(&self, id: &ProjectId) -> Result<Option<StoredProject>, RepositoryError> {
        let mut projects = self.projects.write().await;
        Ok(projects.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_core::{FeedbackLog, ProjectKind, ProjectStatus};
    use chrono::{TimeZone, Utc};

    fn sample_project(id: &str) -> Project {
        Project {
            id: ProjectId::from(id),
            title: "Sample".to_string(),
            kind: ProjectKind::Other,
            status: ProjectStatus::Draft,
            description: String::new(),
            keywords: vec![],
            course_code: None,
            team_name: "Team".to_string(),
            members: vec![],
            links: vec![],
            files: vec![],
            submitted_at: None,
            completed_at: None,
            last_modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            grade: None,
            feedback: FeedbackLog::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = InMemoryRepository::new();
        repo.insert(StoredProject::new(sample_project("p1")))
            .await
            .unwrap();

        let stored = repo.get(&ProjectId::from("p1")).await.unwrap().unwrap();
        assert_eq!(stored.version, StoredProject::INITIAL_VERSION);
        assert_eq!(stored.project.title, "Sample");

        assert!(repo.get(&ProjectId::from("p2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = InMemoryRepository::new();
        repo.insert(StoredProject::new(sample_project("p1")))
            .await
            .unwrap();
        assert!(matches!(
            repo.insert(StoredProject::new(sample_project("p1"))).await,
            Err(RepositoryError::DuplicateId { .. })
        ));
    }

    #[tokio::test]
    async fn test_versioned_update() {
        let repo = InMemoryRepository::new();
        repo.insert(StoredProject::new(sample_project("p1")))
            .await
            .unwrap();

        let mut changed = sample_project("p1");
        changed.title = "Renamed".to_string();
        let updated = repo.update(changed.clone(), 1).await.unwrap();
        assert_eq!(updated.version, 2);

        // Writing against the stale version must fail.
        assert!(matches!(
            repo.update(changed, 1).await,
            Err(RepositoryError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryRepository::new();
        repo.insert(StoredProject::new(sample_project("p1")))
            .await
            .unwrap();
        assert!(repo.delete(&ProjectId::from("p1")).await.unwrap().is_some());
        assert!(repo.delete(&ProjectId::from("p1")).await.unwrap().is_none());
    }
}
