//! Model conversions between Redmine wire types and tracker-core types

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use tracker_core::{
    Issue, IssueId, Progress, Project, ProjectId, Report, Tracker, TrackerError, TypeId, User,
};

use crate::models::*;
use crate::resources;

/// Date format Redmine uses for `due_date`, `spent_on`, ...
const DATE_FORMAT: &str = "%Y-%m-%d";

const SECONDS_PER_HOUR: f64 = 3600.0;

static ISSUE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/issues/([0-9]+)").expect("issue id pattern is valid"));

pub fn seconds_to_hours(seconds: i64) -> f64 {
    seconds as f64 / SECONDS_PER_HOUR
}

/// Truncates toward zero; fractions of a second are dropped.
pub fn hours_to_seconds(hours: f64) -> i64 {
    (hours * SECONDS_PER_HOUR) as i64
}

/// Unix seconds to a `YYYY-MM-DD` UTC date; 0 maps to an empty string.
pub fn seconds_to_date(seconds: i64) -> String {
    if seconds == 0 {
        return String::new();
    }
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// `YYYY-MM-DD` to unix seconds at midnight UTC.
///
/// An empty string maps to 0. So does a malformed one, after logging it.
pub fn date_to_seconds(date: &str) -> i64 {
    if date.is_empty() {
        return 0;
    }
    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(day) => day
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp())
            .unwrap_or(0),
        Err(e) => {
            warn!(date, expected = DATE_FORMAT, error = %e, "failed to parse tracker date");
            0
        }
    }
}

pub(crate) fn remove_last_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Absolute URL of `resource` on the tracker
pub(crate) fn full_url(tracker: &Tracker, resource: &str) -> String {
    format!("{}{}", remove_last_slash(&tracker.url), resource)
}

/// Extract the issue id from an issue page URL such as `https://rm/issues/42`.
pub(crate) fn issue_id_from_url(url: &str) -> Result<IssueId, TrackerError> {
    let digits = ISSUE_ID_PATTERN
        .captures(url)
        .and_then(|c| c.get(1))
        .ok_or_else(|| TrackerError::InvalidIssueUrl(format!("invalid issue URL {}", url)))?;
    digits
        .as_str()
        .parse::<i64>()
        .map(IssueId)
        .map_err(|_| TrackerError::InvalidIssueUrl(format!("failed to parse id from URL {}", url)))
}

/// Convert a Redmine issue to a tracker-core Issue.
///
/// Missing nested references leave the matching fields at their zero value.
pub(crate) fn redmine_issue_to_core(issue: RedmineIssue, tracker: &Tracker) -> Issue {
    let id = IssueId(issue.id);
    Issue {
        id,
        project_id: issue
            .project
            .map(|p| ProjectId(p.id))
            .unwrap_or_default(),
        issue_type: issue.tracker.map(TypeId::from).unwrap_or_default(),
        title: issue.subject,
        description: issue.description.unwrap_or_default(),
        estimate: hours_to_seconds(issue.estimated_hours.unwrap_or_default()),
        due_date: date_to_seconds(issue.due_date.as_deref().unwrap_or_default()),
        done: Progress(issue.done_ratio.unwrap_or_default()),
        spent: hours_to_seconds(issue.spent_hours.unwrap_or_default()),
        url: full_url(tracker, &resources::issue_link(id)),
    }
}

/// Fields of an issue sent on create/update. Zero values are left out.
pub(crate) fn issue_to_payload(issue: &Issue) -> IssuePayload {
    IssuePayload {
        id: non_zero(issue.id.0),
        subject: non_empty(issue.title.clone()),
        due_date: non_empty(seconds_to_date(issue.due_date)),
        done_ratio: (issue.done.0 != 0).then_some(issue.done.0),
        estimated_hours: (issue.estimate != 0).then(|| seconds_to_hours(issue.estimate)),
        tracker_id: non_zero(issue.issue_type.id),
        assigned_to_id: None,
    }
}

/// Progress-only update; `done_ratio` is always sent so 0% can be set.
pub(crate) fn progress_payload(id: IssueId, progress: Progress) -> IssuePayload {
    IssuePayload {
        id: Some(id.0),
        done_ratio: Some(progress.0),
        ..IssuePayload::default()
    }
}

pub(crate) fn report_to_payload(report: &Report) -> TimeEntryPayload {
    TimeEntryPayload {
        issue_id: non_zero(report.issue_id.0),
        activity_id: non_zero(report.activity_id),
        hours: (report.duration != 0).then(|| seconds_to_hours(report.duration)),
        comments: non_empty(report.comments.clone()),
        spent_on: non_empty(seconds_to_date(report.started)),
    }
}

/// Total reported seconds, converting each entry separately
pub(crate) fn sum_report_seconds(entries: &[RedmineTimeEntry]) -> i64 {
    entries.iter().map(|e| hours_to_seconds(e.hours)).sum()
}

pub(crate) fn id_names_to_types(items: Vec<IdName>) -> Vec<TypeId> {
    items.into_iter().map(TypeId::from).collect()
}

/// Attach the tracker-wide activity list and the project page link.
pub(crate) fn enrich_project(project: &mut Project, activities: &[TypeId], tracker: &Tracker) {
    project.activity_types = activities.to_vec();
    project.link = full_url(tracker, &resources::project_link(project.id));
}

impl From<IdName> for TypeId {
    fn from(item: IdName) -> Self {
        Self {
            id: item.id,
            name: item.name,
        }
    }
}

impl From<RedmineProject> for Project {
    fn from(p: RedmineProject) -> Self {
        Self {
            id: ProjectId(p.id),
            title: p.name,
            link: String::new(),
            description: p.description.unwrap_or_default(),
            issue_types: id_names_to_types(p.trackers),
            activity_types: Vec::new(),
        }
    }
}

impl From<RedmineUser> for User {
    fn from(u: RedmineUser) -> Self {
        Self {
            id: u.id,
            name: format!("{} {}", u.lastname, u.firstname).trim().to_string(),
            mail: u.mail,
        }
    }
}

fn non_zero(value: i64) -> Option<i64> {
    (value != 0).then_some(value)
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::Credentials;

    fn tracker(url: &str) -> Tracker {
        Tracker {
            id: 1,
            url: url.to_string(),
            kind: "REDMINE".to_string(),
            credentials: Credentials::default(),
        }
    }

    #[test]
    fn hours_round_trip_within_a_second() {
        for seconds in [0_i64, 1, 59, 3599, 3600, 5400, 86_399, 1_234_567, 9_999_999] {
            let back = hours_to_seconds(seconds_to_hours(seconds));
            assert!(
                (back - seconds).abs() <= 1,
                "{} came back as {}",
                seconds,
                back
            );
        }
    }

    #[test]
    fn hours_to_seconds_truncates() {
        assert_eq!(hours_to_seconds(1.5), 5400);
        // 0.0001h = 0.36s
        assert_eq!(hours_to_seconds(0.0001), 0);
        assert_eq!(hours_to_seconds(0.99999), 3599);
    }

    #[test]
    fn date_conversions() {
        assert_eq!(seconds_to_date(0), "");
        assert_eq!(date_to_seconds(""), 0);
        assert_eq!(seconds_to_date(1_489_492_800), "2017-03-14");
        assert_eq!(date_to_seconds("2017-03-14"), 1_489_449_600);
        assert_eq!(date_to_seconds("14.03.2017"), 0);
    }

    #[test]
    fn date_round_trip_is_midnight_of_same_day() {
        for seconds in [1_i64, 86_399, 1_489_492_800, 1_705_320_000] {
            let midnight = date_to_seconds(&seconds_to_date(seconds));
            assert_eq!(midnight % 86_400, 0);
            assert!(midnight <= seconds && seconds - midnight < 86_400);
        }
    }

    #[test]
    fn remove_last_slash_cases() {
        assert_eq!(remove_last_slash(""), "");
        assert_eq!(remove_last_slash("a/"), "a");
        assert_eq!(remove_last_slash("a"), "a");
        let once = remove_last_slash("http://rm//");
        assert_eq!(remove_last_slash(once), once);
    }

    #[test]
    fn issue_id_from_valid_url() {
        assert_eq!(
            issue_id_from_url("https://x/issues/80193").unwrap(),
            IssueId(80193)
        );
        assert_eq!(
            issue_id_from_url("https://x/issues/12?tab=history").unwrap(),
            IssueId(12)
        );
    }

    #[test]
    fn issue_id_from_invalid_urls() {
        for url in [
            "https://x/issues/",
            "https://x/123",
            "https://x/issues/abc",
            "https://x/issues/99999999999999999999999",
        ] {
            let err = issue_id_from_url(url).unwrap_err();
            assert!(
                matches!(err, TrackerError::InvalidIssueUrl(_)),
                "{} gave {:?}",
                url,
                err
            );
        }
    }

    #[test]
    fn issue_conversion_builds_absolute_url() {
        let issue = RedmineIssue {
            id: 42,
            project: Some(IdName {
                id: 3,
                name: "Site".into(),
            }),
            tracker: Some(IdName {
                id: 1,
                name: "Bug".into(),
            }),
            subject: "Broken link".into(),
            description: Some("404 on /about".into()),
            due_date: Some("2017-03-14".into()),
            done_ratio: Some(30),
            spent_hours: Some(1.5),
            estimated_hours: Some(2.0),
            ..RedmineIssue::default()
        };

        let core = redmine_issue_to_core(issue, &tracker("http://rm.example/"));

        assert_eq!(core.id, IssueId(42));
        assert_eq!(core.project_id, ProjectId(3));
        assert_eq!(core.issue_type.name, "Bug");
        assert_eq!(core.estimate, 7200);
        assert_eq!(core.spent, 5400);
        assert_eq!(core.due_date, 1_489_449_600);
        assert_eq!(core.done, Progress(30));
        assert_eq!(core.url, "http://rm.example/issues/42");
    }

    #[test]
    fn issue_conversion_tolerates_missing_references() {
        let core = redmine_issue_to_core(
            RedmineIssue {
                id: 5,
                ..RedmineIssue::default()
            },
            &tracker("http://rm"),
        );
        assert_eq!(core.project_id, ProjectId(0));
        assert_eq!(core.issue_type, TypeId::default());
        assert_eq!(core.due_date, 0);
    }

    #[test]
    fn payload_omits_zero_fields() {
        let payload = issue_to_payload(&Issue {
            id: IssueId(8),
            title: "Title".into(),
            description: "never sent".into(),
            ..Issue::default()
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"id": 8, "subject": "Title"}));
    }

    #[test]
    fn progress_payload_sends_zero() {
        let value = serde_json::to_value(progress_payload(IssueId(8), Progress(0))).unwrap();
        assert_eq!(value, serde_json::json!({"id": 8, "done_ratio": 0}));
    }

    #[test]
    fn report_payload_converts_units() {
        let payload = report_to_payload(&Report {
            issue_id: IssueId(11),
            activity_id: 9,
            comments: "review".into(),
            duration: 5400,
            started: 1_489_492_800,
        });
        assert_eq!(payload.hours, Some(1.5));
        assert_eq!(payload.spent_on.as_deref(), Some("2017-03-14"));
        assert_eq!(payload.activity_id, Some(9));
        assert_eq!(payload.issue_id, Some(11));
    }

    #[test]
    fn report_payload_omits_zero_fields() {
        let payload = report_to_payload(&Report {
            activity_id: 9,
            duration: 3600,
            ..Report::default()
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"activity_id": 9, "hours": 1.0}));
    }

    #[test]
    fn sums_each_entry_separately() {
        let entries = vec![
            RedmineTimeEntry {
                hours: 0.5,
                ..RedmineTimeEntry::default()
            },
            RedmineTimeEntry {
                hours: 1.25,
                ..RedmineTimeEntry::default()
            },
        ];
        assert_eq!(sum_report_seconds(&entries), 1800 + 4500);
    }

    #[test]
    fn user_name_is_last_then_first() {
        let user: User = RedmineUser {
            id: 4,
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            mail: "ada@example.com".into(),
            ..RedmineUser::default()
        }
        .into();
        assert_eq!(user.name, "Lovelace Ada");

        let only_first: User = RedmineUser {
            firstname: "Ada".into(),
            ..RedmineUser::default()
        }
        .into();
        assert_eq!(only_first.name, "Ada");
    }

    #[test]
    fn enrich_sets_activities_and_link() {
        let mut project: Project = RedmineProject {
            id: 12,
            name: "Infra".into(),
            trackers: vec![IdName {
                id: 1,
                name: "Bug".into(),
            }],
            ..RedmineProject::default()
        }
        .into();
        let activities = vec![TypeId {
            id: 9,
            name: "Development".into(),
        }];

        enrich_project(&mut project, &activities, &tracker("http://rm/"));

        assert_eq!(project.link, "http://rm/projects/12");
        assert_eq!(project.activity_types, activities);
        assert_eq!(project.issue_types.len(), 1);
    }
}
