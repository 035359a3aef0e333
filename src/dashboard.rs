//! Dashboard aggregation: the counts and headline figures the overview
//! screen renders, computed from one remote read per collection plus the
//! local meeting list.

use crate::models::{Category, Project};

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub project_count: usize,
    pub category_count: usize,
    pub meeting_count: usize,
    /// The project with the maximum `created_at`, if any exist.
    pub latest_project: Option<Project>,
}

/// Builds the summary from already-fetched data. "Latest" follows the same
/// definition the checker uses: maximum `created_at`.
#[must_use]
pub fn summarize(
    projects: &[Project],
    categories: &[Category],
    meeting_count: usize,
) -> DashboardSummary {
    let latest_project = projects
        .iter()
        .max_by_key(|p| p.created_at)
        .cloned();
    DashboardSummary {
        project_count: projects.len(),
        category_count: categories.len(),
        meeting_count,
        latest_project,
    }
}
