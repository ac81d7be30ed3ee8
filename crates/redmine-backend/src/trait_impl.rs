//! Implementation of tracker-core traits for RedmineClient

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracker_core::{
    CallContext, Issue, IssueId, NewIssue, Page, Pagination, Progress, Project, ProjectId,
    Report, Result, Tracker, TrackerClient, TrackerError, TypeId, User,
};

use crate::client::RedmineClient;
use crate::convert::{
    enrich_project, id_names_to_types, issue_id_from_url, issue_to_payload, progress_payload,
    redmine_issue_to_core, report_to_payload, sum_report_seconds,
};
use crate::error::RedmineError;
use crate::models::RedmineIssue;

/// Map a pipeline error, giving 404 the meaning it has for this call site.
fn classify(
    err: RedmineError,
    not_found: fn(String) -> TrackerError,
    context: String,
) -> TrackerError {
    match err {
        RedmineError::NotFound => not_found(context),
        other => TrackerError::from(other).with_context(context),
    }
}

fn on_tracker(tracker: &Tracker) -> String {
    format!("tracker ID {}, URL {}", tracker.id, tracker.url)
}

impl RedmineClient {
    fn activity_types(&self, ctx: &CallContext, tracker: &Tracker) -> Result<Vec<TypeId>> {
        let root = self.get_activities(ctx, tracker).map_err(|e| {
            classify(
                e,
                TrackerError::InvalidTrackerUrl,
                format!("failed to load activities from {}", on_tracker(tracker)),
            )
        })?;
        Ok(id_names_to_types(root.time_entry_activities))
    }

    /// Fetch one issue in full. A response without an issue counts as not found.
    fn fetch_issue(&self, ctx: &CallContext, tracker: &Tracker, id: IssueId) -> Result<Issue> {
        let root = self.get_issue(ctx, tracker, id).map_err(|e| {
            classify(
                e,
                TrackerError::IssueNotFound,
                format!("failed to load issue {} from {}", id, on_tracker(tracker)),
            )
        })?;
        let issue = root.issue.ok_or_else(|| {
            TrackerError::IssueNotFound(format!("issue {} on {}", id, on_tracker(tracker)))
        })?;
        Ok(redmine_issue_to_core(issue, tracker))
    }

    /// Fetch full details for every id with at most `max_parallel` requests in flight.
    ///
    /// Every started request is waited for, even after a failure. The result
    /// keeps the order of `ids`; on any failure the first error observed is
    /// returned and nothing else.
    fn parallel_full_issues(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        ids: &[IssueId],
    ) -> Result<Vec<Issue>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.max_parallel().min(ids.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(&id) = ids.get(index) else {
                        break;
                    };
                    if tx.send((index, self.fetch_issue(ctx, tracker, id))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<Issue>> = vec![None; ids.len()];
        let mut first_error = None;
        for (index, result) in rx {
            match result {
                Ok(issue) => slots[index] = Some(issue),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        slots.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
            TrackerError::IssueNotFound(format!("issue details missing on {}", on_tracker(tracker)))
        })
    }

    fn created_issue(issue: Option<RedmineIssue>, tracker: &Tracker) -> Result<Issue> {
        issue
            .map(|i| redmine_issue_to_core(i, tracker))
            .ok_or_else(|| {
                TrackerError::Internal(format!(
                    "create issue response has no issue on {}",
                    on_tracker(tracker)
                ))
            })
    }
}

impl TrackerClient for RedmineClient {
    fn projects(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        _page: Pagination,
    ) -> Result<Page<Project>> {
        let root = self.get_projects(ctx, tracker).map_err(|e| {
            classify(
                e,
                TrackerError::InvalidTrackerUrl,
                format!("failed to load projects from {}", on_tracker(tracker)),
            )
        })?;
        let activities = self.activity_types(ctx, tracker)?;

        let projects = root
            .projects
            .into_iter()
            .map(|p| {
                let mut project = Project::from(p);
                enrich_project(&mut project, &activities, tracker);
                project
            })
            .collect();
        Ok(Page::new(projects, root.total_count))
    }

    fn project(&self, ctx: &CallContext, tracker: &Tracker, id: ProjectId) -> Result<Project> {
        let root = self.get_project(ctx, tracker, id).map_err(|e| {
            classify(
                e,
                TrackerError::ProjectNotFound,
                format!("failed to load project {} from {}", id, on_tracker(tracker)),
            )
        })?;
        let activities = self.activity_types(ctx, tracker)?;

        let mut project = Project::from(root.project);
        enrich_project(&mut project, &activities, tracker);
        Ok(project)
    }

    fn project_issues(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        page: Pagination,
    ) -> Result<Page<Issue>> {
        let root = self
            .get_project_issues(ctx, tracker, project_id, page)
            .map_err(|e| {
                classify(
                    e,
                    TrackerError::ProjectNotFound,
                    format!(
                        "failed to load issues of project {} from {}",
                        project_id,
                        on_tracker(tracker)
                    ),
                )
            })?;

        let ids: Vec<IssueId> = root.issues.iter().map(|i| IssueId(i.id)).collect();
        let issues = self.parallel_full_issues(ctx, tracker, &ids)?;
        Ok(Page::new(issues, root.total_count))
    }

    fn user_info(&self, ctx: &CallContext, tracker: &Tracker) -> Result<User> {
        let root = self.get_current_user(ctx, tracker).map_err(|e| {
            classify(
                e,
                TrackerError::InvalidTrackerUrl,
                format!("failed to load user info from {}", on_tracker(tracker)),
            )
        })?;
        Ok(root.user.into())
    }

    fn issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        _project_id: ProjectId,
        issue_id: IssueId,
    ) -> Result<Issue> {
        self.fetch_issue(ctx, tracker, issue_id)
    }

    fn issue_by_url(&self, ctx: &CallContext, tracker: &Tracker, url: &str) -> Result<Issue> {
        let id = issue_id_from_url(url)?;
        self.fetch_issue(ctx, tracker, id)
    }

    fn create_issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        issue: &NewIssue,
        project_id: ProjectId,
    ) -> Result<Issue> {
        // Redmine needs an explicit assignee on create.
        let user = self.user_info(ctx, tracker)?;

        let mut payload = issue_to_payload(&issue.to_issue());
        payload.assigned_to_id = Some(user.id);

        let root = self
            .post_issue(ctx, tracker, project_id, payload)
            .map_err(|e| {
                classify(
                    e,
                    TrackerError::ProjectNotFound,
                    format!(
                        "failed to create issue in project {} on {}",
                        project_id,
                        on_tracker(tracker)
                    ),
                )
            })?;
        Self::created_issue(root.issue, tracker)
    }

    fn update_issue_progress(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        _project_id: ProjectId,
        issue_id: IssueId,
        progress: Progress,
    ) -> Result<()> {
        self.put_issue(ctx, tracker, issue_id, progress_payload(issue_id, progress))
            .map_err(|e| {
                classify(
                    e,
                    TrackerError::IssueNotFound,
                    format!(
                        "failed to update progress of issue {} on {}",
                        issue_id,
                        on_tracker(tracker)
                    ),
                )
            })
    }

    fn update_issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        _project_id: ProjectId,
        issue: &Issue,
    ) -> Result<Issue> {
        self.put_issue(ctx, tracker, issue.id, issue_to_payload(issue))
            .map_err(|e| {
                classify(
                    e,
                    TrackerError::IssueNotFound,
                    format!("failed to update issue {} on {}", issue.id, on_tracker(tracker)),
                )
            })?;
        self.fetch_issue(ctx, tracker, issue.id)
    }

    fn total_reports(&self, ctx: &CallContext, tracker: &Tracker, date: i64) -> Result<i64> {
        let root = self.get_time_entries(ctx, tracker, date).map_err(|e| {
            classify(
                e,
                TrackerError::InvalidTrackerUrl,
                format!(
                    "failed to load total reports for date {} from {}",
                    date,
                    on_tracker(tracker)
                ),
            )
        })?;
        Ok(sum_report_seconds(&root.time_entries))
    }

    fn create_report(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        _project_id: ProjectId,
        report: &Report,
    ) -> Result<()> {
        self.create_time_entry(ctx, tracker, report_to_payload(report))
            .map_err(|e| {
                classify(
                    e,
                    TrackerError::IssueNotFound,
                    format!(
                        "failed to create report for issue {} on {}",
                        report.issue_id,
                        on_tracker(tracker)
                    ),
                )
            })
    }
}
