use super::{parse_day, Session};
use crate::cli::{OutputFormat, ReportCommands};
use crate::output::{output_result, output_success, Displayable};
use anyhow::{Context, Result};
use colored::Colorize;
use redmine_backend::{hours_to_seconds, seconds_to_date, seconds_to_hours};
use serde::Serialize;
use tracker_core::{IssueId, ProjectId, Report};

/// Time reported on one day
#[derive(Serialize)]
pub struct DayTotal {
    pub date: String,
    /// Seconds
    pub total: i64,
}

impl Displayable for DayTotal {
    fn display(&self) -> String {
        format!(
            "{}: {}",
            self.date.dimmed(),
            format!("{:.2}h", seconds_to_hours(self.total)).white().bold()
        )
    }
}

pub fn handle_report(
    session: &Session<'_>,
    action: &ReportCommands,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ReportCommands::Create {
            issue,
            activity,
            duration,
            started,
            comment,
        } => {
            let report = Report {
                issue_id: IssueId(*issue),
                activity_id: *activity,
                comments: comment.clone(),
                duration: hours_to_seconds(*duration),
                started: parse_day(started.as_deref())?,
            };
            handle_create(session, &report, format)
        }
        ReportCommands::Total { date } => handle_total(session, parse_day(date.as_deref())?, format),
    }
}

fn handle_create(session: &Session<'_>, report: &Report, format: OutputFormat) -> Result<()> {
    session
        .client
        .create_report(session.ctx, session.tracker, ProjectId::default(), report)
        .with_context(|| format!("Failed to report time on issue {}", report.issue_id))?;

    output_success(
        &format!(
            "Reported {:.2}h on issue {}",
            seconds_to_hours(report.duration),
            report.issue_id
        ),
        format,
    );
    Ok(())
}

fn handle_total(session: &Session<'_>, day: i64, format: OutputFormat) -> Result<()> {
    let total = session
        .client
        .total_reports(session.ctx, session.tracker, day)
        .context("Failed to fetch reported time")?;

    output_result(
        &DayTotal {
            date: seconds_to_date(day),
            total,
        },
        format,
    );
    Ok(())
}
