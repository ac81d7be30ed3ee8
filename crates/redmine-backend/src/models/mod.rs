mod issue;
mod project;
mod time_entry;
mod user;

pub use issue::*;
pub use project::*;
pub use time_entry::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Redmine `{id, name}` reference (tracker, project, status, activity, ...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IdName {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Body of a 422 response
#[derive(Debug, Clone, Deserialize)]
pub struct RedmineErrors {
    pub errors: Vec<String>,
}
