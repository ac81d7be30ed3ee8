use super::Session;
use crate::cli::{OutputFormat, ProjectCommands};
use crate::output::{output_page, output_result};
use anyhow::{Context, Result};
use tracker_core::{Pagination, ProjectId};

pub fn handle_project(
    session: &Session<'_>,
    action: &ProjectCommands,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ProjectCommands::List => handle_list(session, format),
        ProjectCommands::Get { id } => handle_get(session, ProjectId(*id), format),
    }
}

fn handle_list(session: &Session<'_>, format: OutputFormat) -> Result<()> {
    let page = session
        .client
        .projects(session.ctx, session.tracker, Pagination::default())
        .context("Failed to list projects")?;

    output_page(&page, format);
    Ok(())
}

fn handle_get(session: &Session<'_>, id: ProjectId, format: OutputFormat) -> Result<()> {
    let project = session
        .client
        .project(session.ctx, session.tracker, id)
        .with_context(|| format!("Failed to fetch project {}", id))?;

    output_result(&project, format);
    Ok(())
}
