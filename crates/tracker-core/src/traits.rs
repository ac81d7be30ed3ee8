use crate::context::CallContext;
use crate::error::Result;
use crate::models::*;
use crate::pagination::Pagination;

/// Operations every tracker adapter provides.
///
/// Adapters are stateless between calls: the tracker (URL, type and
/// credentials) is passed with every operation, and the context bounds all
/// requests the operation issues. Any failure in any constituent request
/// fails the whole operation; partial results are never returned.
pub trait TrackerClient: Send + Sync {
    // ========== Project Operations ==========

    /// List projects visible to the tracker account, with the total count
    fn projects(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        page: Pagination,
    ) -> Result<Page<Project>>;

    /// Get one project, enriched with activity types and its link
    fn project(&self, ctx: &CallContext, tracker: &Tracker, id: ProjectId) -> Result<Project>;

    /// Issues of a project assigned to the tracker account, with full details
    fn project_issues(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        page: Pagination,
    ) -> Result<Page<Issue>>;

    // ========== User Operations ==========

    /// The user the credentials belong to
    fn user_info(&self, ctx: &CallContext, tracker: &Tracker) -> Result<User>;

    // ========== Issue Operations ==========

    /// Get an issue by id
    fn issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        issue_id: IssueId,
    ) -> Result<Issue>;

    /// Get an issue by its page URL on the tracker
    fn issue_by_url(&self, ctx: &CallContext, tracker: &Tracker, url: &str) -> Result<Issue>;

    /// Create an issue in a project, assigned to the tracker account
    fn create_issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        issue: &NewIssue,
        project_id: ProjectId,
    ) -> Result<Issue>;

    /// Set the completion percentage of an issue
    fn update_issue_progress(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        issue_id: IssueId,
        progress: Progress,
    ) -> Result<()>;

    /// Update an issue and return its state after the write
    fn update_issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        issue: &Issue,
    ) -> Result<Issue>;

    // ========== Report Operations ==========

    /// Seconds reported by the tracker account on the day containing `date`
    fn total_reports(&self, ctx: &CallContext, tracker: &Tracker, date: i64) -> Result<i64>;

    /// Record a time entry
    fn create_report(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        report: &Report,
    ) -> Result<()>;
}
