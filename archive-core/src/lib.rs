//! Domain model and review lifecycle for the university project archive.
//!
//! This crate is pure logic: the project entity, the role-gated status
//! transition engine, feedback/grade accumulation, and the role-dependent
//! view projection. Persistence and HTTP live in `archive-server`.

pub mod error;
pub mod feedback;
pub mod grade;
pub mod project;
pub mod role;
pub mod status;
pub mod transition;
pub mod view;

pub use error::DomainError;
pub use feedback::FeedbackLog;
pub use grade::Grade;
pub use project::{FileSummary, MemberRole, Project, ProjectId, ProjectKind, TeamMember};
pub use role::{Actor, ActorRole};
pub use status::ProjectStatus;
pub use transition::ReviewDecision;
