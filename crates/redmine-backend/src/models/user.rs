use serde::Deserialize;

/// Redmine user (`GET /users/current.json`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedmineUser {
    pub id: i64,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub mail: String,
    pub created_on: Option<String>,
    pub last_login_on: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRoot {
    pub user: RedmineUser,
}
