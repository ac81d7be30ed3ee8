use serde::Deserialize;

use super::IdName;

/// Redmine project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedmineProject {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    pub description: Option<String>,
    /// Issue types enabled for the project (`include=trackers`)
    #[serde(default)]
    pub trackers: Vec<IdName>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRoot {
    pub project: RedmineProject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectsRoot {
    #[serde(default)]
    pub projects: Vec<RedmineProject>,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

/// `GET /enumerations/time_entry_activities.json` response
#[derive(Debug, Clone, Deserialize)]
pub struct TimeEntryActivitiesRoot {
    #[serde(default)]
    pub time_entry_activities: Vec<IdName>,
}
