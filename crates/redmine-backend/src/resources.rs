//! Redmine REST resource paths, relative to the tracker base URL.

use tracker_core::{IssueId, Pagination, ProjectId};

use crate::convert::seconds_to_date;

/// Projects visible to the current user, with their trackers
pub const PROJECTS: &str = "/projects.json?include=trackers";
pub const CURRENT_USER: &str = "/users/current.json";
pub const TIME_ENTRIES: &str = "/time_entries.json";
pub const TIME_ENTRY_ACTIVITIES: &str = "/enumerations/time_entry_activities.json";

/// Reports of one user-day; entries past the first 100 are not fetched.
const TIME_ENTRIES_LIMIT: u32 = 100;

pub fn project(id: ProjectId) -> String {
    format!("/projects/{}.json?include=trackers", id)
}

/// Project page, used to build `Project::link`
pub fn project_link(id: ProjectId) -> String {
    format!("/projects/{}", id)
}

/// Issues of a project assigned to the current user
pub fn project_issues(id: ProjectId, page: Pagination) -> String {
    let page = page.or_default_page();
    format!(
        "/projects/{}/issues.json?offset={}&limit={}&assigned_to_id=me",
        id, page.offset, page.limit
    )
}

pub fn create_issue(project_id: ProjectId) -> String {
    format!("/projects/{}/issues.json", project_id)
}

/// Issue page, used to build `Issue::url`
pub fn issue_link(id: IssueId) -> String {
    format!("/issues/{}", id)
}

pub fn issue(id: IssueId) -> String {
    format!("{}.json", issue_link(id))
}

/// Current user's time entries for the day containing `date` (unix seconds)
pub fn time_entries(date: i64) -> String {
    format!(
        "{}?user_id=me&spent_on={}&limit={}",
        TIME_ENTRIES,
        seconds_to_date(date),
        TIME_ENTRIES_LIMIT
    )
}
