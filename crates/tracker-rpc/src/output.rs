use crate::cli::OutputFormat;
use colored::Colorize;
use redmine_backend::{seconds_to_date, seconds_to_hours};
use serde::Serialize;
use tracker_core::{Issue, Page, Project, TrackerError, TypeId, User};

pub fn output_result<T: Serialize + Displayable>(result: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(result) {
                println!("{}", json);
            }
        }
        OutputFormat::Text => {
            println!("{}", result.display());
        }
    }
}

pub fn output_list<T: Serialize + Displayable>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&items) {
                println!("{}", json);
            }
        }
        OutputFormat::Text => {
            for item in items {
                println!("{}", item.display());
                println!();
            }
        }
    }
}

/// Like [`output_list`], plus the tracker's total count
pub fn output_page<T: Serialize + Displayable>(page: &Page<T>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(page) {
                println!("{}", json);
            }
        }
        OutputFormat::Text => {
            output_list(&page.items, format);
            println!(
                "{}",
                format!("{} of {} shown", page.items.len(), page.total).dimmed()
            );
        }
    }
}

pub fn output_success(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(r#"{{"success": true}}"#),
        OutputFormat::Text => println!("{}", message.green()),
    }
}

#[derive(Serialize)]
pub struct JsonError {
    pub error: bool,
    pub code: String,
    pub message: String,
}

/// Error code for the CLI: the tracker error name when there is one
fn error_code(err: &anyhow::Error) -> &'static str {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TrackerError>())
        .map(|e| e.code().name)
        .unwrap_or("error")
}

pub fn output_error(err: &anyhow::Error, format: OutputFormat) {
    let message = match format {
        OutputFormat::Json => {
            let json_err = JsonError {
                error: true,
                code: error_code(err).to_string(),
                message: format!("{:#}", err),
            };
            serde_json::to_string_pretty(&json_err).unwrap_or_else(|_| {
                format!(r#"{{"error": true, "message": "{}"}}"#, err)
            })
        }
        OutputFormat::Text => format!("{}: {:#}", "Error".red().bold(), err),
    };
    eprintln!("{}", message);
}

pub trait Displayable {
    fn display(&self) -> String;
}

impl Displayable for Project {
    fn display(&self) -> String {
        let mut output = format!(
            "{} - {}",
            self.id.to_string().cyan().bold(),
            self.title.white().bold()
        );
        if !self.link.is_empty() {
            output.push_str(&format!("\n  {}: {}", "Link".dimmed(), self.link));
        }
        if !self.description.is_empty() {
            output.push_str(&format!("\n  {}: {}", "Description".dimmed(), self.description));
        }
        if !self.issue_types.is_empty() {
            output.push_str(&format!(
                "\n  {}: {}",
                "Issue types".dimmed(),
                join_types(&self.issue_types)
            ));
        }
        if !self.activity_types.is_empty() {
            output.push_str(&format!(
                "\n  {}: {}",
                "Activities".dimmed(),
                join_types(&self.activity_types)
            ));
        }
        output
    }
}

fn join_types(types: &[TypeId]) -> String {
    types
        .iter()
        .map(|t| format!("{} ({})", t.name.magenta(), t.id.to_string().dimmed()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Displayable for Issue {
    fn display(&self) -> String {
        let done = if self.done.0 >= 100 {
            self.done.to_string().green().to_string()
        } else if self.done.0 > 0 {
            self.done.to_string().yellow().to_string()
        } else {
            self.done.to_string()
        };

        let mut output = format!(
            "{} - {}\n  {}: {}\n  {}: {}",
            format!("#{}", self.id).cyan().bold(),
            self.title.white().bold(),
            "Type".dimmed(),
            self.issue_type.name.magenta(),
            "Done".dimmed(),
            done
        );

        if self.estimate > 0 {
            output.push_str(&format!(
                "\n  {}: {:.2}h",
                "Estimate".dimmed(),
                seconds_to_hours(self.estimate)
            ));
        }
        if self.spent > 0 {
            output.push_str(&format!(
                "\n  {}: {:.2}h",
                "Spent".dimmed(),
                seconds_to_hours(self.spent)
            ));
        }
        if self.due_date != 0 {
            output.push_str(&format!(
                "\n  {}: {}",
                "Due".dimmed(),
                seconds_to_date(self.due_date)
            ));
        }
        if !self.url.is_empty() {
            output.push_str(&format!("\n  {}: {}", "URL".dimmed(), self.url.dimmed()));
        }
        if !self.description.is_empty() {
            output.push_str(&format!("\n  {}: {}", "Description".dimmed(), self.description));
        }

        output
    }
}

impl Displayable for User {
    fn display(&self) -> String {
        let mut output = format!(
            "{} ({})",
            self.name.white().bold(),
            self.id.to_string().dimmed()
        );
        if !self.mail.is_empty() {
            output.push_str(&format!("\n  {}: {}", "Mail".dimmed(), self.mail));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use tracker_core::{IssueId, ProjectId};

    #[test]
    fn error_code_uses_tracker_error_name() {
        let err = Err::<(), _>(TrackerError::IssueNotFound("issue 4".into()))
            .context("Failed to get issue")
            .unwrap_err();
        assert_eq!(error_code(&err), "ISSUE_NOT_FOUND");

        let plain = anyhow::anyhow!("Tracker URL not configured");
        assert_eq!(error_code(&plain), "error");
    }

    #[test]
    fn issue_display_skips_unset_fields() {
        colored::control::set_override(false);
        let issue = Issue {
            id: IssueId(42),
            project_id: ProjectId(1),
            title: "Fix login".into(),
            estimate: 5400,
            ..Issue::default()
        };
        let text = issue.display();
        assert!(text.starts_with("#42 - Fix login"));
        assert!(text.contains("Estimate: 1.50h"));
        assert!(!text.contains("Due"));
        assert!(!text.contains("Spent"));
    }

    #[test]
    fn project_display_lists_types() {
        colored::control::set_override(false);
        let project = Project {
            id: ProjectId(3),
            title: "Website".into(),
            issue_types: vec![TypeId {
                id: 1,
                name: "Bug".into(),
            }],
            ..Project::default()
        };
        let text = project.display();
        assert!(text.contains("3 - Website"));
        assert!(text.contains("Issue types: Bug (1)"));
        assert!(!text.contains("Activities"));
    }
}
