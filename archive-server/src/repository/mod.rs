//! Repository abstraction for project persistence.
//!
//! The `ProjectRepository` trait abstracts the storage backend. Writes are
//! whole-record and version-checked: each successful mutation writes the
//! complete project document and bumps its version, so readers never see a
//! partial update and concurrent writers are detected instead of silently
//! overwriting each other.

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

use std::fmt;

use async_trait::async_trait;

use archive_core::{Project, ProjectId};

/// A project record together with its storage version.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProject {
    pub project: Project,
    pub version: i64,
}

impl StoredProject {
    /// Version assigned to freshly inserted projects.
    pub const INITIAL_VERSION: i64 = 1;

    pub fn new(project: Project) -> Self {
        Self {
            project,
            version: Self::INITIAL_VERSION,
        }
    }
}

/// Failures of the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backend failed while performing `operation`.
    Storage { operation: String, message: String },
    /// A version-checked update lost a race with a concurrent writer.
    Conflict { id: String },
    /// An insert collided with an existing id.
    DuplicateId { id: String },
}

impl RepositoryError {
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { operation, message } => {
                write!(f, "storage failure during {}: {}", operation, message)
            }
            Self::Conflict { id } => {
                write!(f, "project {} was modified concurrently, please retry", id)
            }
            Self::DuplicateId { id } => write!(f, "project {} already exists", id),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Storage backend for project records.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Fetch a project by id, returning None if unknown.
    async fn get(&self, id: &ProjectId) -> Result<Option<StoredProject>, RepositoryError>;

    /// Insert a new project at `INITIAL_VERSION`.
    async fn insert(&self, stored: StoredProject) -> Result<(), RepositoryError>;

    /// Replace a project's record, but only if its stored version still
    /// equals `expected_version`. On success the version is incremented.
    async fn update(
        &self,
        project: Project,
        expected_version: i64,
    ) -> Result<StoredProject, RepositoryError>;

    /// All projects, in unspecified order.
    async fn list_all(&self) -> Result<Vec<StoredProject>, RepositoryError>;

    /// Remove a project, returning the removed record if it existed.
    async fn delete(&self, id: &ProjectId) -> Result<Option<StoredProject>, RepositoryError>;
}
