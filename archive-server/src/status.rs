//! Types for the operator status endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use archive_core::ProjectStatus;

use crate::repository::StoredProject;

/// Summary statistics for the status page.
#[derive(Debug, Default, Serialize)]
pub struct StatusSummary {
    pub total_projects: usize,
    pub draft: usize,
    pub under_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub graded: usize,
}

/// A project entry for display on the status page.
#[derive(Debug, Serialize)]
pub struct ProjectStatusEntry {
    pub id: String,
    pub title: String,
    pub status: &'static str,
    pub display_label: &'static str,
    pub team_name: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub grade: Option<String>,
    pub version: i64,
}

/// Full status data for the endpoint.
#[derive(Debug, Serialize)]
pub struct StatusData {
    pub version: String,
    pub summary: StatusSummary,
    pub projects: Vec<ProjectStatusEntry>,
}

impl StatusData {
    /// Build status data from the stored records.
    pub fn from_stored(stored: Vec<StoredProject>, version: String) -> Self {
        let mut summary = StatusSummary {
            total_projects: stored.len(),
            ..Default::default()
        };

        let mut projects = Vec::with_capacity(stored.len());
        for record in stored {
            let project = record.project;
            match project.status {
                ProjectStatus::Draft => summary.draft += 1,
                ProjectStatus::UnderReview => summary.under_review += 1,
                ProjectStatus::Approved => summary.approved += 1,
                ProjectStatus::Rejected => summary.rejected += 1,
            }
            if project.grade.is_some() {
                summary.graded += 1;
            }

            projects.push(ProjectStatusEntry {
                id: project.id.0,
                title: project.title,
                status: project.status.as_str(),
                display_label: project.status.display_label(),
                team_name: project.team_name,
                submitted_at: project.submitted_at,
                grade: project.grade.map(|g| g.to_string()),
                version: record.version,
            });
        }

        Self {
            version,
            summary,
            projects,
        }
    }
}
