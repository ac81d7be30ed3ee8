use serde::{Deserialize, Serialize};

use super::IdName;

/// Redmine time entry as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedmineTimeEntry {
    #[serde(default)]
    pub id: i64,
    pub project: Option<IdName>,
    pub issue: Option<IdName>,
    pub user: Option<IdName>,
    pub activity: Option<IdName>,
    #[serde(default)]
    pub hours: f64,
    pub comments: Option<String>,
    pub spent_on: Option<String>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeEntriesRoot {
    #[serde(default)]
    pub time_entries: Vec<RedmineTimeEntry>,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

/// Time entry fields sent on create
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeEntryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_on: Option<String>,
}

/// Request envelope: `{"time_entry": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryPayloadRoot {
    pub time_entry: TimeEntryPayload,
}
