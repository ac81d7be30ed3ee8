use super::{parse_day, Session};
use crate::cli::{IssueCommands, OutputFormat};
use crate::output::{output_page, output_result, output_success};
use anyhow::{Context, Result};
use redmine_backend::hours_to_seconds;
use tracker_core::{IssueId, NewIssue, Pagination, Progress, ProjectId};

pub fn handle_issue(session: &Session<'_>, action: &IssueCommands, format: OutputFormat) -> Result<()> {
    match action {
        IssueCommands::List {
            project,
            offset,
            limit,
        } => handle_list(session, ProjectId(*project), Pagination::new(*offset, *limit), format),
        IssueCommands::Get { id } => handle_get(session, IssueId(*id), format),
        IssueCommands::Url { url } => handle_url(session, url, format),
        IssueCommands::Create {
            project,
            title,
            description,
            type_id,
            estimate,
            due,
            done,
        } => {
            let issue = NewIssue {
                title: title.clone(),
                description: description.clone(),
                type_id: *type_id,
                estimate: estimate.map(hours_to_seconds).unwrap_or(0),
                due_date: match due {
                    Some(day) => parse_day(Some(day.as_str()))?,
                    None => 0,
                },
                done: Progress(*done),
            };
            handle_create(session, ProjectId(*project), &issue, format)
        }
        IssueCommands::Progress { id, percent } => {
            handle_progress(session, IssueId(*id), Progress(*percent), format)
        }
    }
}

fn handle_list(
    session: &Session<'_>,
    project: ProjectId,
    page: Pagination,
    format: OutputFormat,
) -> Result<()> {
    let issues = session
        .client
        .project_issues(session.ctx, session.tracker, project, page)
        .with_context(|| format!("Failed to list issues of project {}", project))?;

    output_page(&issues, format);
    Ok(())
}

fn handle_get(session: &Session<'_>, id: IssueId, format: OutputFormat) -> Result<()> {
    let issue = session
        .client
        .issue(session.ctx, session.tracker, ProjectId::default(), id)
        .with_context(|| format!("Failed to fetch issue {}", id))?;

    output_result(&issue, format);
    Ok(())
}

fn handle_url(session: &Session<'_>, url: &str, format: OutputFormat) -> Result<()> {
    let issue = session
        .client
        .issue_by_url(session.ctx, session.tracker, url)
        .with_context(|| format!("Failed to fetch issue at '{}'", url))?;

    output_result(&issue, format);
    Ok(())
}

fn handle_create(
    session: &Session<'_>,
    project: ProjectId,
    issue: &NewIssue,
    format: OutputFormat,
) -> Result<()> {
    let created = session
        .client
        .create_issue(session.ctx, session.tracker, issue, project)
        .with_context(|| format!("Failed to create issue in project {}", project))?;

    output_result(&created, format);
    Ok(())
}

fn handle_progress(
    session: &Session<'_>,
    id: IssueId,
    progress: Progress,
    format: OutputFormat,
) -> Result<()> {
    session
        .client
        .update_issue_progress(session.ctx, session.tracker, ProjectId::default(), id, progress)
        .with_context(|| format!("Failed to update progress of issue {}", id))?;

    output_success(&format!("Issue {} set to {}", id, progress), format);
    Ok(())
}
