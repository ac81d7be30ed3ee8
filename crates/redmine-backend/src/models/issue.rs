use serde::{Deserialize, Serialize};

use super::IdName;

/// Redmine issue as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedmineIssue {
    pub id: i64,
    pub project: Option<IdName>,
    pub tracker: Option<IdName>,
    pub status: Option<IdName>,
    pub priority: Option<IdName>,
    pub author: Option<IdName>,
    pub assigned_to: Option<IdName>,
    pub fixed_version: Option<IdName>,
    #[serde(default)]
    pub subject: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub done_ratio: Option<i32>,
    pub spent_hours: Option<f64>,
    pub estimated_hours: Option<f64>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
}

/// `GET /issues/{id}.json` and `POST /projects/{id}/issues.json` response.
///
/// The issue is optional: a body without it means the issue is gone.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRoot {
    pub issue: Option<RedmineIssue>,
}

/// `GET /projects/{id}/issues.json` response
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesRoot {
    #[serde(default)]
    pub issues: Vec<RedmineIssue>,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

/// Issue fields sent on create and update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssuePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_ratio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<i64>,
}

/// Request envelope: `{"issue": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct IssuePayloadRoot {
    pub issue: IssuePayload,
}
