use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;
use tracker_core::{CallContext, IssueId, Pagination, ProjectId, Tracker};
use ureq::Agent;

use crate::convert::full_url;
use crate::error::{snippet, RedmineError, Result};
use crate::models::*;
use crate::resources;

/// Per-request HTTP timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue detail requests in flight at once during `project_issues`
pub const DEFAULT_MAX_PARALLEL: usize = 10;

const MAX_REDIRECTS: u32 = 10;

/// How often a waiting request re-checks its call context
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        };
        f.write_str(name)
    }
}

/// Status and body of a completed HTTP exchange
struct Exchange {
    status: u16,
    body: std::result::Result<String, ureq::Error>,
}

/// Redmine REST API client.
///
/// The client holds no tracker state: URL and credentials come with every
/// call, so one instance serves any number of trackers and threads.
pub struct RedmineClient {
    agent: Agent,
    timeout: Duration,
    max_parallel: usize,
}

/// Builder for [`RedmineClient`]
#[derive(Debug, Clone)]
pub struct RedmineClientBuilder {
    timeout: Duration,
    max_parallel: usize,
}

impl Default for RedmineClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl RedmineClientBuilder {
    /// Upper bound for each HTTP request, on top of the call deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limit of concurrent issue detail fetches; 0 is treated as 1
    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn build(self) -> RedmineClient {
        // Credentials follow redirects only within the same host.
        let agent = Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .http_status_as_error(false)
            .max_redirects(MAX_REDIRECTS)
            .max_redirects_will_error(true)
            .redirect_auth_headers(ureq::config::RedirectAuthHeaders::SameHost)
            .build()
            .into();

        RedmineClient {
            agent,
            timeout: self.timeout,
            max_parallel: self.max_parallel,
        }
    }
}

impl Default for RedmineClient {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RedmineClient {
    /// Create a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::builder().timeout(timeout).build()
    }

    pub fn builder() -> RedmineClientBuilder {
        RedmineClientBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Reject trackers this backend cannot talk to, before any I/O.
    pub(crate) fn check_tracker(&self, tracker: &Tracker) -> Result<()> {
        match tracker.kind() {
            Some(_) => Ok(()),
            None => Err(RedmineError::TrackerType(tracker.kind.clone())),
        }
    }

    fn basic_auth(tracker: &Tracker) -> String {
        let pair = format!(
            "{}:{}",
            tracker.credentials.login, tracker.credentials.password
        );
        format!("Basic {}", STANDARD.encode(pair))
    }

    /// Time this request may take: the client timeout capped by the call deadline
    fn request_timeout(&self, ctx: &CallContext) -> Duration {
        match ctx.remaining() {
            Some(remaining) => remaining.min(self.timeout),
            None => self.timeout,
        }
    }

    fn ctx_error(ctx: &CallContext, url: &str) -> Option<RedmineError> {
        ctx.err().map(|e| RedmineError::Timeout {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Send a request and read the whole response body.
    fn exchange(
        agent: &Agent,
        method: Method,
        url: &str,
        auth: &str,
        timeout: Duration,
        body: &[u8],
    ) -> std::result::Result<Exchange, ureq::Error> {
        let mut response = match method {
            Method::Get => agent
                .get(url)
                .config()
                .timeout_global(Some(timeout))
                .build()
                .header("Authorization", auth)
                .header("Accept", "application/json")
                .call()?,
            Method::Post => agent
                .post(url)
                .config()
                .timeout_global(Some(timeout))
                .build()
                .header("Authorization", auth)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .send(body)?,
            Method::Put => agent
                .put(url)
                .config()
                .timeout_global(Some(timeout))
                .build()
                .header("Authorization", auth)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .send(body)?,
        };

        Ok(Exchange {
            status: response.status().as_u16(),
            body: response.body_mut().read_to_string(),
        })
    }

    /// Run the exchange on a helper thread and wait for it while the context
    /// stays live.
    ///
    /// On cancellation or deadline the wait ends at once; the abandoned
    /// request is still bounded by its own timeout.
    fn send(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Vec<u8>,
        auth: String,
    ) -> Result<std::result::Result<Exchange, ureq::Error>> {
        let (tx, rx) = mpsc::channel();
        let agent = self.agent.clone();
        let request_url = url.to_string();
        let timeout = self.request_timeout(ctx);

        thread::spawn(move || {
            let outcome = Self::exchange(&agent, method, &request_url, &auth, timeout, &body);
            // The caller may have stopped waiting.
            let _ = tx.send(outcome);
        });

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(outcome) => return Ok(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(err) = Self::ctx_error(ctx, url) {
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RedmineError::Aborted {
                        url: url.to_string(),
                    })
                }
            }
        }
    }

    /// Run one request and classify the outcome.
    ///
    /// Returns the response body when the status equals `expected`.
    pub(crate) fn execute(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        method: Method,
        resource: &str,
        body: Option<Vec<u8>>,
        expected: u16,
    ) -> Result<String> {
        self.check_tracker(tracker)?;

        let url = full_url(tracker, resource);
        if let Some(err) = Self::ctx_error(ctx, &url) {
            return Err(err);
        }

        let tracing_id = ctx.tracing_id().unwrap_or_default();
        debug!(%method, %url, tracker_id = tracker.id, tracing_id, "redmine request");

        let started = Instant::now();
        let sent = self.send(
            ctx,
            method,
            &url,
            body.unwrap_or_default(),
            Self::basic_auth(tracker),
        )?;

        // A cancelled or expired call wins over whatever the request produced.
        if let Some(err) = Self::ctx_error(ctx, &url) {
            return Err(err);
        }

        let exchange = match sent {
            Ok(exchange) => exchange,
            Err(ureq::Error::Timeout(timeout)) => {
                return Err(RedmineError::Timeout {
                    url,
                    reason: format!("http request timeout ({})", timeout),
                })
            }
            Err(source) => return Err(RedmineError::Transport { url, source }),
        };

        let status = exchange.status;
        debug!(
            %method,
            %url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            tracing_id,
            "redmine response"
        );

        match status {
            404 => return Err(RedmineError::NotFound),
            401 => return Err(RedmineError::Unauthorized),
            403 => return Err(RedmineError::Forbidden),
            _ => {}
        }

        let body = exchange.body.map_err(|source| RedmineError::Body {
            url: url.clone(),
            source,
        })?;

        match status {
            422 => Err(validation_error(status, &body)),
            500 => Err(RedmineError::RemoteServer {
                body: snippet(&body),
            }),
            s if s != expected => Err(RedmineError::UnexpectedStatus {
                expected,
                actual: s,
                body: snippet(&body),
            }),
            _ => Ok(body),
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        resource: &str,
    ) -> Result<T> {
        let body = self.execute(ctx, tracker, Method::Get, resource, None, 200)?;
        decode(200, &body)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        resource: &str,
        payload: &B,
    ) -> Result<T> {
        let body = self.execute(
            ctx,
            tracker,
            Method::Post,
            resource,
            Some(encode(payload)?),
            201,
        )?;
        decode(201, &body)
    }

    fn post<B: Serialize>(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        resource: &str,
        payload: &B,
    ) -> Result<()> {
        self.execute(
            ctx,
            tracker,
            Method::Post,
            resource,
            Some(encode(payload)?),
            201,
        )?;
        Ok(())
    }

    fn put<B: Serialize>(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        resource: &str,
        payload: &B,
    ) -> Result<()> {
        self.execute(
            ctx,
            tracker,
            Method::Put,
            resource,
            Some(encode(payload)?),
            200,
        )?;
        Ok(())
    }

    // ==================== Project Operations ====================

    /// Projects as the tracker pages them by default
    pub fn get_projects(&self, ctx: &CallContext, tracker: &Tracker) -> Result<ProjectsRoot> {
        self.get_json(ctx, tracker, resources::PROJECTS)
    }

    pub fn get_project(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        id: ProjectId,
    ) -> Result<ProjectRoot> {
        self.get_json(ctx, tracker, &resources::project(id))
    }

    /// Tracker-wide time entry activity enumeration
    pub fn get_activities(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
    ) -> Result<TimeEntryActivitiesRoot> {
        self.get_json(ctx, tracker, resources::TIME_ENTRY_ACTIVITIES)
    }

    /// Issue summaries of a project assigned to the current user
    pub fn get_project_issues(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        page: Pagination,
    ) -> Result<IssuesRoot> {
        self.get_json(ctx, tracker, &resources::project_issues(project_id, page))
    }

    // ==================== Issue Operations ====================

    pub fn get_issue(&self, ctx: &CallContext, tracker: &Tracker, id: IssueId) -> Result<IssueRoot> {
        self.get_json(ctx, tracker, &resources::issue(id))
    }

    pub fn post_issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        project_id: ProjectId,
        payload: IssuePayload,
    ) -> Result<IssueRoot> {
        self.post_json(
            ctx,
            tracker,
            &resources::create_issue(project_id),
            &IssuePayloadRoot { issue: payload },
        )
    }

    pub fn put_issue(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        id: IssueId,
        payload: IssuePayload,
    ) -> Result<()> {
        self.put(
            ctx,
            tracker,
            &resources::issue(id),
            &IssuePayloadRoot { issue: payload },
        )
    }

    // ==================== User Operations ====================

    pub fn get_current_user(&self, ctx: &CallContext, tracker: &Tracker) -> Result<UserRoot> {
        self.get_json(ctx, tracker, resources::CURRENT_USER)
    }

    // ==================== Time Entry Operations ====================

    /// Current user's time entries for the day containing `date`
    pub fn get_time_entries(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        date: i64,
    ) -> Result<TimeEntriesRoot> {
        self.get_json(ctx, tracker, &resources::time_entries(date))
    }

    pub fn create_time_entry(
        &self,
        ctx: &CallContext,
        tracker: &Tracker,
        payload: TimeEntryPayload,
    ) -> Result<()> {
        self.post(
            ctx,
            tracker,
            resources::TIME_ENTRIES,
            &TimeEntryPayloadRoot {
                time_entry: payload,
            },
        )
    }
}

fn encode<B: Serialize>(payload: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(payload).map_err(RedmineError::Encode)
}

fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| RedmineError::Decode {
        status,
        body: snippet(body),
        source,
    })
}

/// Turn a 422 body `{"errors": [...]}` into a validation error.
fn validation_error(status: u16, body: &str) -> RedmineError {
    match serde_json::from_str::<RedmineErrors>(body) {
        Ok(parsed) => RedmineError::Validation {
            message: parsed.errors.join(". "),
            body: snippet(body),
        },
        Err(source) => RedmineError::Decode {
            status,
            body: snippet(body),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::Credentials;

    fn tracker(kind: &str) -> Tracker {
        Tracker {
            id: 1,
            url: "http://rm".to_string(),
            kind: kind.to_string(),
            credentials: Credentials {
                login: "alice".to_string(),
                password: "s3cret".to_string(),
            },
        }
    }

    #[test]
    fn basic_auth_header() {
        // base64("alice:s3cret")
        assert_eq!(
            RedmineClient::basic_auth(&tracker("REDMINE")),
            "Basic YWxpY2U6czNjcmV0"
        );
    }

    #[test]
    fn rejects_unknown_tracker_type() {
        let client = RedmineClient::default();
        assert!(client.check_tracker(&tracker("REDMINE")).is_ok());
        assert!(matches!(
            client.check_tracker(&tracker("redmine")),
            Err(RedmineError::TrackerType(_))
        ));
    }

    #[test]
    fn request_timeout_is_capped_by_deadline() {
        let client = RedmineClient::new(Duration::from_secs(30));
        let ctx = CallContext::with_timeout(Duration::from_secs(2));
        assert!(client.request_timeout(&ctx) <= Duration::from_secs(2));
        assert_eq!(
            client.request_timeout(&CallContext::background()),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn validation_error_joins_messages() {
        match validation_error(422, r#"{"errors":["err1","err2"]}"#) {
            RedmineError::Validation { message, .. } => assert_eq!(message, "err1. err2"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            validation_error(422, "<html>"),
            RedmineError::Decode { status: 422, .. }
        ));
    }

    #[test]
    fn builder_clamps_parallelism() {
        let client = RedmineClient::builder().max_parallel(0).build();
        assert_eq!(client.max_parallel(), 1);
        assert_eq!(RedmineClient::default().max_parallel(), DEFAULT_MAX_PARALLEL);
    }
}
