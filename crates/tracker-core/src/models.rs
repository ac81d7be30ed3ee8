use serde::{Deserialize, Serialize};
use std::fmt;

/// Project identifier on a tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

/// Issue identifier on a tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub i64);

/// Issue completion in percent (0-100), passed through as reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(pub i32);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Supported tracker backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerKind {
    Redmine,
}

impl TrackerKind {
    pub const REDMINE: &'static str = "REDMINE";

    /// Parse the wire discriminator. Matching is exact.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            Self::REDMINE => Some(TrackerKind::Redmine),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::Redmine => Self::REDMINE,
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Login and password for HTTP Basic Auth against a tracker
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An external tracker instance and the account used to reach it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: i64,
    pub url: String,
    /// Type discriminator, e.g. "REDMINE"
    #[serde(rename = "type")]
    pub kind: String,
    pub credentials: Credentials,
}

impl Tracker {
    pub fn kind(&self) -> Option<TrackerKind> {
        TrackerKind::parse(&self.kind)
    }
}

/// Tracker-specific numeric id with its display name (issue types, activities)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeId {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    /// Absolute URL of the project page on the tracker
    pub link: String,
    pub description: String,
    pub issue_types: Vec<TypeId>,
    pub activity_types: Vec<TypeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    #[serde(skip)]
    pub project_id: ProjectId,
    #[serde(rename = "type", default)]
    pub issue_type: TypeId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Estimated effort in seconds
    #[serde(default)]
    pub estimate: i64,
    /// Unix seconds, 0 when unset
    #[serde(default)]
    pub due_date: i64,
    #[serde(default)]
    pub done: Progress,
    /// Time spent in seconds
    #[serde(default)]
    pub spent: i64,
    #[serde(default)]
    pub url: String,
}

/// Issue creation payload.
///
/// The type is a bare id here because resolving it to a [`TypeId`] needs a
/// lookup the caller may not have done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub type_id: i64,
    #[serde(default)]
    pub estimate: i64,
    #[serde(default)]
    pub due_date: i64,
    #[serde(default)]
    pub done: Progress,
}

impl NewIssue {
    /// View this payload as an [`Issue`] whose type carries only the id.
    pub fn to_issue(&self) -> Issue {
        Issue {
            issue_type: TypeId {
                id: self.type_id,
                name: String::new(),
            },
            title: self.title.clone(),
            description: self.description.clone(),
            estimate: self.estimate,
            due_date: self.due_date,
            done: self.done,
            ..Issue::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub mail: String,
}

/// A single time-tracking entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub issue_id: IssueId,
    pub activity_id: i64,
    #[serde(default)]
    pub comments: String,
    /// Seconds
    pub duration: i64,
    /// Unix seconds
    pub started: i64,
}

/// One page of results plus the total count reported by the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_kind_parse_is_exact() {
        assert_eq!(TrackerKind::parse("REDMINE"), Some(TrackerKind::Redmine));
        assert_eq!(TrackerKind::parse("redmine"), None);
        assert_eq!(TrackerKind::parse("JIRA"), None);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            login: "alice".to_string(),
            password: "s3cret".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn tracker_uses_type_key() {
        let json = r#"{"id":3,"url":"http://rm","type":"REDMINE","credentials":{"login":"a","password":"b"}}"#;
        let tracker: Tracker = serde_json::from_str(json).unwrap();
        assert_eq!(tracker.kind(), Some(TrackerKind::Redmine));
        assert_eq!(tracker.credentials.login, "a");
    }

    #[test]
    fn issue_project_id_is_not_serialized() {
        let issue = Issue {
            id: IssueId(9),
            project_id: ProjectId(4),
            ..Issue::default()
        };
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["id"], 9);
        assert!(value.get("project_id").is_none());
        assert!(value.get("type").is_some());
    }

    #[test]
    fn new_issue_to_issue_keeps_type_id() {
        let new_issue = NewIssue {
            title: "Write docs".to_string(),
            type_id: 2,
            estimate: 7200,
            ..NewIssue::default()
        };
        let issue = new_issue.to_issue();
        assert_eq!(issue.issue_type.id, 2);
        assert!(issue.issue_type.name.is_empty());
        assert_eq!(issue.estimate, 7200);
        assert_eq!(issue.id, IssueId(0));
    }
}
