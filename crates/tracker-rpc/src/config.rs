use anyhow::{anyhow, Result};
use directories::{BaseDirs, ProjectDirs};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use redmine_backend::{RedmineClient, DEFAULT_MAX_PARALLEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracker_core::{CallContext, Credentials, Tracker, TrackerKind};

const APP_NAME: &str = "tracker-rpc";
const LOCAL_CONFIG_FILE: &str = "tracker-rpc.toml";

/// Service configuration: the default tracker plus HTTP and RPC settings
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub url: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    /// Tracker ID reported in error context
    pub tracker_id: i64,
    pub tracker_type: String,
    /// Log filter used when RUST_LOG is not set
    pub log_level: Option<String>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_parallel: usize,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RpcConfig {
    /// Shared token callers must present; any token is accepted when unset
    pub token: Option<String>,
    /// Deadline for a single call, covering all tracker requests it makes
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            login: None,
            password: None,
            tracker_id: 0,
            tracker_type: TrackerKind::REDMINE.to_string(),
            log_level: None,
            http: HttpConfig::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let explicit_path = config_path.as_deref();
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        for path in config_paths(explicit_path) {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // TRACKER_HTTP__TIMEOUT_SECS -> http.timeout_secs
        figment = figment.merge(Env::prefixed("TRACKER_").split("__"));

        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| anyhow!("Failed to load config: {}", e))
    }

    pub fn merge_with_cli(
        &mut self,
        cli_url: Option<String>,
        cli_login: Option<String>,
        cli_password: Option<String>,
    ) {
        if let Some(url) = cli_url {
            self.url = Some(url);
        }
        if let Some(login) = cli_login {
            self.login = Some(login);
        }
        if let Some(password) = cli_password {
            self.password = Some(password);
        }
    }

    /// Check that a default tracker is configured.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_none() {
            return Err(anyhow!(
                "Tracker URL not configured. Set via --url, TRACKER_URL env var, or config file"
            ));
        }
        if self.login.is_none() {
            return Err(anyhow!(
                "Tracker login not configured. Set via --login, TRACKER_LOGIN env var, or config file"
            ));
        }
        Ok(())
    }

    /// The configured tracker. Call [`Config::validate`] first.
    pub fn tracker(&self) -> Tracker {
        Tracker {
            id: self.tracker_id,
            url: self.url.clone().unwrap_or_default(),
            kind: self.tracker_type.clone(),
            credentials: Credentials {
                login: self.login.clone().unwrap_or_default(),
                password: self.password.clone().unwrap_or_default(),
            },
        }
    }

    pub fn client(&self) -> RedmineClient {
        RedmineClient::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_parallel(self.http.max_parallel)
            .build()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.rpc.request_timeout_secs.map(Duration::from_secs)
    }

    /// A fresh context bounded by the configured call deadline
    pub fn call_context(&self) -> CallContext {
        match self.request_timeout() {
            Some(timeout) => CallContext::with_timeout(timeout),
            None => CallContext::background(),
        }
    }
}

fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(path) = explicit {
        paths.push(path.to_path_buf());
        return paths;
    }

    if let Some(path) = get_project_config_path() {
        push_unique(&mut paths, path);
    }
    if let Some(path) = get_xdg_config_path() {
        push_unique(&mut paths, path);
    }
    if let Some(path) = get_local_config_path() {
        push_unique(&mut paths, path);
    }

    paths
}

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}

fn get_project_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|d| d.config_dir().join("config.toml"))
}

fn get_xdg_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join(APP_NAME).join("config.toml"));
    }

    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join(APP_NAME)
            .join("config.toml")
    })
}

fn get_local_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(LOCAL_CONFIG_FILE))
}
