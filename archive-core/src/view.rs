//! Role-dependent projection of the project list.
//!
//! Pure functions: the projection is computed fresh from the full list on
//! every call, with no cached state. Students see their own projects,
//! advisors see everything with pending reviews first, coordinators see
//! everything unfiltered.

use crate::project::Project;
use crate::role::ActorRole;
use crate::status::ProjectStatus;

/// Filter and order projects for display to the given actor.
pub fn list_visible<'a>(
    role: ActorRole,
    identity: &str,
    projects: &'a [Project],
) -> Vec<&'a Project> {
    match role {
        ActorRole::Student => projects
            .iter()
            .filter(|p| p.has_student(identity))
            .collect(),
        ActorRole::Advisor => {
            // Pending reviews first; the sort is stable so relative order
            // within each group is preserved.
            let mut visible: Vec<&Project> = projects.iter().collect();
            visible.sort_by_key(|p| p.status != ProjectStatus::UnderReview);
            visible
        }
        ActorRole::Coordinator => projects.iter().collect(),
    }
}

/// Apply a free-text search filter after role projection.
pub fn apply_search<'a>(projects: Vec<&'a Project>, query: Option<&str>) -> Vec<&'a Project> {
    match query {
        Some(q) if !q.trim().is_empty() => projects
            .into_iter()
            .filter(|p| p.matches_search(q.trim()))
            .collect(),
        _ => projects,
    }
}

/// The public archive: approved projects only.
pub fn archive_view(projects: &[Project]) -> Vec<&Project> {
    projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Approved)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_fixtures::*;
    use proptest::prelude::*;

    #[test]
    fn test_advisor_sees_under_review_first_in_original_order() {
        let projects = vec![
            project("p1", ProjectStatus::UnderReview, vec![]),
            project("p2", ProjectStatus::Approved, vec![]),
            project("p3", ProjectStatus::UnderReview, vec![]),
        ];
        let visible = list_visible(ActorRole::Advisor, "prof@uni.edu", &projects);
        let ids: Vec<&str> = visible.iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3", "p2"]);
    }

    #[test]
    fn test_student_sees_only_own_projects() {
        let projects = vec![
            project("p1", ProjectStatus::Draft, vec![student("ana@uni.edu", true)]),
            project("p2", ProjectStatus::Draft, vec![student("bob@uni.edu", true)]),
            project(
                "p3",
                ProjectStatus::UnderReview,
                vec![student("ana@uni.edu", true), student("bob@uni.edu", false)],
            ),
        ];
        let visible = list_visible(ActorRole::Student, "ana@uni.edu", &projects);
        let ids: Vec<&str> = visible.iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[test]
    fn test_coordinator_sees_everything() {
        let projects = vec![
            project("p1", ProjectStatus::Draft, vec![student("ana@uni.edu", true)]),
            project("p2", ProjectStatus::Rejected, vec![]),
        ];
        let visible = list_visible(ActorRole::Coordinator, "coord@uni.edu", &projects);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut p1 = project("p1", ProjectStatus::Approved, vec![]);
        p1.title = "Flood Prediction Model".to_string();
        let mut p2 = project("p2", ProjectStatus::Approved, vec![]);
        p2.title = "Campus Navigation".to_string();
        p2.course_code = None;
        p2.description = "wayfinding".to_string();
        let projects = vec![p1, p2];

        let all: Vec<&Project> = projects.iter().collect();
        let hits = apply_search(all, Some("flood"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.0, "p1");

        let all: Vec<&Project> = projects.iter().collect();
        assert_eq!(apply_search(all, Some("  ")).len(), 2);
    }

    #[test]
    fn test_archive_view_only_approved() {
        let projects = vec![
            project("p1", ProjectStatus::Approved, vec![]),
            project("p2", ProjectStatus::UnderReview, vec![]),
            project("p3", ProjectStatus::Rejected, vec![]),
        ];
        let archive = archive_view(&projects);
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].id.0, "p1");
    }

    proptest! {
        /// The advisor projection is a permutation that keeps the relative
        /// order of pending and non-pending projects intact.
        #[test]
        fn prop_advisor_projection_is_stable(statuses in prop::collection::vec(0u8..4, 0..32)) {
            let statuses: Vec<ProjectStatus> = statuses
                .into_iter()
                .map(|s| match s {
                    0 => ProjectStatus::Draft,
                    1 => ProjectStatus::UnderReview,
                    2 => ProjectStatus::Approved,
                    _ => ProjectStatus::Rejected,
                })
                .collect();
            let projects: Vec<Project> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| project(&format!("p{}", i), *s, vec![]))
                .collect();

            let visible = list_visible(ActorRole::Advisor, "prof@uni.edu", &projects);
            prop_assert_eq!(visible.len(), projects.len());

            // Pending block comes first.
            let first_settled = visible
                .iter()
                .position(|p| p.status != ProjectStatus::UnderReview)
                .unwrap_or(visible.len());
            for p in &visible[first_settled..] {
                prop_assert_ne!(p.status, ProjectStatus::UnderReview);
            }

            // Relative order within each block matches the input order.
            let pending_in: Vec<&str> = projects
                .iter()
                .filter(|p| p.status == ProjectStatus::UnderReview)
                .map(|p| p.id.0.as_str())
                .collect();
            let pending_out: Vec<&str> = visible
                .iter()
                .filter(|p| p.status == ProjectStatus::UnderReview)
                .map(|p| p.id.0.as_str())
                .collect();
            prop_assert_eq!(pending_in, pending_out);

            let settled_in: Vec<&str> = projects
                .iter()
                .filter(|p| p.status != ProjectStatus::UnderReview)
                .map(|p| p.id.0.as_str())
                .collect();
            let settled_out: Vec<&str> = visible
                .iter()
                .filter(|p| p.status != ProjectStatus::UnderReview)
                .map(|p| p.id.0.as_str())
                .collect();
            prop_assert_eq!(settled_in, settled_out);
        }
    }
}
