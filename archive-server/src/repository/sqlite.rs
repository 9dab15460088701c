//! SQLite implementation of `ProjectRepository`.
//!
//! Persistent storage that survives service restarts. Projects are stored
//! as a JSON document column plus indexed status/version columns.
//!
//! # Schema Versioning
//!
//! A `schema_version` table tracks the schema version. When the schema
//! changes, increment `CURRENT_SCHEMA_VERSION` and add a migration in
//! `run_migrations()`; migrations run sequentially up to the target.
//! New `Project` fields should carry `#[serde(default)]` so old rows keep
//! deserializing.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use archive_core::{Project, ProjectId};

use super::{ProjectRepository, RepositoryError, StoredProject};

/// Current schema version. Increment together with `run_migrations()`.
const CURRENT_SCHEMA_VERSION: i64 = 1;

/// SQLite-backed project repository.
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Open (or create) the database at the given path and run migrations.
    ///
    /// The database uses WAL journal mode and a busy timeout so concurrent
    /// request handlers queue rather than fail.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path_ref = path.as_ref();

        let path_str = path_ref.to_string_lossy();
        if path_str != ":memory:" && !path_str.is_empty() {
            if let Some(parent) = path_ref.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        RepositoryError::storage(
                            "create database directory",
                            format!("{}: {}", parent.display(), e),
                        )
                    })?;
                }
            }
        }

        let conn = Connection::open(path_ref)
            .map_err(|e| RepositoryError::storage("open database", e.to_string()))?;

        // journal_mode is a query pragma: it returns the resulting mode.
        let _journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| RepositoryError::storage("set journal_mode", e.to_string()))?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")
            .map_err(|e| RepositoryError::storage("configure pragmas", e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| RepositoryError::storage("create schema_version table", e.to_string()))?;

        let current_version: i64 = conn
            .query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get schema version", e.to_string()))?
            .unwrap_or(0);

        Self::run_migrations(&conn, current_version)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn run_migrations(conn: &Connection, from_version: i64) -> Result<(), RepositoryError> {
        if from_version > CURRENT_SCHEMA_VERSION {
            return Err(RepositoryError::storage(
                "schema version",
                format!(
                    "Database schema version {} is newer than supported version {}. \
                     Please upgrade the application.",
                    from_version, CURRENT_SCHEMA_VERSION
                ),
            ));
        }

        if from_version < 1 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    project_json TEXT NOT NULL,
                    status TEXT NOT NULL,
                    version INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);
                "#,
            )
            .map_err(|e| RepositoryError::storage("migration v1", e.to_string()))?;
        }

        conn.execute(
            "INSERT INTO schema_version (id, version) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET version = ?1",
            params![CURRENT_SCHEMA_VERSION],
        )
        .map_err(|e| RepositoryError::storage("record schema version", e.to_string()))?;

        Ok(())
    }

    fn row_to_stored(json: String, version: i64) -> Result<StoredProject, RepositoryError> {
        let project: Project = serde_json::from_str(&json)
            .map_err(|e| RepositoryError::storage("deserialize project", e.to_string()))?;
        Ok(StoredProject { project, version })
    }

    fn serialize(project: &Project) -> Result<String, RepositoryError> {
        serde_json::to_string(project)
            .map_err(|e| RepositoryError::storage("serialize project", e.to_string()))
    }
}

#[async_trait]
impl ProjectRepository for SqliteRepository {
    async fn get(&self, id: &ProjectId) -> Result<Option<StoredProject>, RepositoryError> {
        let conn = self.conn.lock().expect("repository mutex poisoned");
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT project_json, version FROM projects WHERE id = ?1",
                params![id.0],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get project", e.to_string()))?;

        row.map(|(json, version)| Self::row_to_stored(json, version))
            .transpose()
    }

    async fn insert(&self, stored: StoredProject) -> Result<(), RepositoryError> {
        let json = Self::serialize(&stored.project)?;
        let conn = self.conn.lock().expect("repository mutex poisoned");
        let result = conn.execute(
            "INSERT INTO projects (id, project_json, status, version, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                stored.project.id.0,
                json,
                stored.project.status.as_str(),
                stored.version,
                stored.project.last_modified.timestamp(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(RepositoryError::DuplicateId {
                    id: stored.project.id.0.clone(),
                })
            }
            Err(e) => Err(RepositoryError::storage("insert project", e.to_string())),
        }
    }

    async fn update(
        &self,
        project: Project,
        expected_version: i64,
    ) -> Result<StoredProject, RepositoryError> {
        let json = Self::serialize(&project)?;
        let conn = self.conn.lock().expect("repository mutex poisoned");
        let changed = conn
            .execute(
                "UPDATE projects
                 SET project_json = ?1, status = ?2, version = version + 1, last_modified = ?3
                 WHERE id = ?4 AND version = ?5",
                params![
                    json,
                    project.status.as_str(),
                    project.last_modified.timestamp(),
                    project.id.0,
                    expected_version,
                ],
            )
            .map_err(|e| RepositoryError::storage("update project", e.to_string()))?;

        if changed == 0 {
            // Either a concurrent writer bumped the version or the row was
            // deleted underneath us; both surface as a conflict.
            return Err(RepositoryError::Conflict {
                id: project.id.0.clone(),
            });
        }

        Ok(StoredProject {
            project,
            version: expected_version + 1,
        })
    }

    async fn list_all(&self) -> Result<Vec<StoredProject>, RepositoryError> {
        let conn = self.conn.lock().expect("repository mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT project_json, version FROM projects")
            .map_err(|e| RepositoryError::storage("prepare list", e.to_string()))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| RepositoryError::storage("list projects", e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let (json, version) =
                row.map_err(|e| RepositoryError::storage("read project row", e.to_string()))?;
            out.push(Self::row_to_stored(json, version)?);
        }
        Ok(out)
    }

    async fn delete(&self, id: &ProjectId) -> Result<Option<StoredProject>, RepositoryError> {
        let conn = self.conn.lock().expect("repository mutex poisoned");
        let existing: Option<(String, i64)> = conn
            .query_row(
                "SELECT project_json, version FROM projects WHERE id = ?1",
                params![id.0],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get project", e.to_string()))?;

        let Some((json, version)) = existing else {
            return Ok(None);
        };

        conn.execute("DELETE FROM projects WHERE id = ?1", params![id.0])
            .map_err(|e| RepositoryError::storage("delete project", e.to_string()))?;

        Ok(Some(Self::row_to_stored(json, version)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_core::{FeedbackLog, ProjectKind, ProjectStatus};
    use chrono::{TimeZone, Utc};

    fn sample_project(id: &str, status: ProjectStatus) -> Project {
        Project {
            id: ProjectId::from(id),
            title: "Persisted".to_string(),
            kind: ProjectKind::Capstone,
            status,
            description: "desc".to_string(),
            keywords: vec!["k".to_string()],
            course_code: Some("CS1".to_string()),
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

    fn temp_repo() -> (tempfile::TempDir, SqliteRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepository::new(dir.path().join("test.db")).unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn test_roundtrip_through_disk() {
        let (_dir, repo) = temp_repo();
        let project = sample_project("p1", ProjectStatus::Draft);
        repo.insert(StoredProject::new(project.clone()))
            .await
            .unwrap();

        let stored = repo.get(&ProjectId::from("p1")).await.unwrap().unwrap();
        assert_eq!(stored.project, project);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db");

        {
            let repo = SqliteRepository::new(&db_path).unwrap();
            repo.insert(StoredProject::new(sample_project(
                "p1",
                ProjectStatus::UnderReview,
            )))
            .await
            .unwrap();
        }

        let repo = SqliteRepository::new(&db_path).unwrap();
        let stored = repo.get(&ProjectId::from("p1")).await.unwrap().unwrap();
        assert_eq!(stored.project.status, ProjectStatus::UnderReview);
    }

    #[tokio::test]
    async fn test_version_check_detects_concurrent_write() {
        let (_dir, repo) = temp_repo();
        repo.insert(StoredProject::new(sample_project(
            "p1",
            ProjectStatus::UnderReview,
        )))
        .await
        .unwrap();

        // First reviewer wins.
        let mut approved = sample_project("p1", ProjectStatus::Approved);
        let updated = repo.update(approved.clone(), 1).await.unwrap();
        assert_eq!(updated.version, 2);

        // Second reviewer raced on the same version and loses.
        approved.status = ProjectStatus::Rejected;
        assert!(matches!(
            repo.update(approved, 1).await,
            Err(RepositoryError::Conflict { .. })
        ));

        let stored = repo.get(&ProjectId::from("p1")).await.unwrap().unwrap();
        assert_eq!(stored.project.status, ProjectStatus::Approved);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let (_dir, repo) = temp_repo();
        repo.insert(StoredProject::new(sample_project("p1", ProjectStatus::Draft)))
            .await
            .unwrap();
        assert!(matches!(
            repo.insert(StoredProject::new(sample_project("p1", ProjectStatus::Draft)))
                .await,
            Err(RepositoryError::DuplicateId { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_all_and_delete() {
        let (_dir, repo) = temp_repo();
        repo.insert(StoredProject::new(sample_project("p1", ProjectStatus::Draft)))
            .await
            .unwrap();
        repo.insert(StoredProject::new(sample_project(
            "p2",
            ProjectStatus::Approved,
        )))
        .await
        .unwrap();

        assert_eq!(repo.list_all().await.unwrap().len(), 2);

        let removed = repo.delete(&ProjectId::from("p1")).await.unwrap();
        assert!(removed.is_some());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }
}
