//! JSON-RPC 2.0 surface over a [`TrackerClient`].
//!
//! Every tracker method takes its params as an object carrying a `context`
//! (`token`, `tracing_id`), the `tracker` to call and the method's own
//! fields. Method names may be given with or without the `API.` prefix.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use tracker_core::{
    CallContext, ContextError, Issue, IssueId, NewIssue, Pagination, Progress, Project,
    ProjectId, Report, Tracker, TrackerClient, TrackerError, User,
};

pub const JSONRPC_VERSION: &str = "2.0";
const API_PREFIX: &str = "API.";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

// ==================== Wire types ====================

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// Error object returned to callers: a stable code and name, never internals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    fn new(code: i64, message: &str, data: Option<String>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: data.map(Value::String),
        }
    }

    pub fn parse_error(detail: String) -> Self {
        Self::new(PARSE_ERROR, "Parse error", Some(detail))
    }

    pub fn invalid_request(detail: String) -> Self {
        Self::new(INVALID_REQUEST, "Invalid request", Some(detail))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found", Some(method.to_string()))
    }

    pub fn invalid_params(detail: String) -> Self {
        Self::new(INVALID_PARAMS, "Invalid params", Some(detail))
    }
}

impl From<&TrackerError> for RpcError {
    fn from(err: &TrackerError) -> Self {
        let code = err.code();
        Self::new(
            code.code,
            code.name,
            err.public_message().map(str::to_string),
        )
    }
}

/// Caller identity carried in every request
#[derive(Debug, Default, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub tracing_id: String,
}

#[derive(Deserialize)]
struct Envelope<P> {
    #[serde(default)]
    context: RequestContext,
    #[serde(flatten)]
    params: P,
}

// ==================== Method params and results ====================

#[derive(Deserialize)]
struct ProjectsParams {
    tracker: Tracker,
    #[serde(flatten)]
    page: Pagination,
}

#[derive(Serialize)]
struct ProjectsResult {
    projects: Vec<Project>,
    amount: i64,
}

#[derive(Deserialize)]
struct ProjectDetailsParams {
    tracker: Tracker,
    project_id: ProjectId,
}

#[derive(Serialize)]
struct ProjectDetailsResult {
    project: Project,
}

#[derive(Deserialize)]
struct TrackerParams {
    tracker: Tracker,
}

#[derive(Serialize)]
struct CurrentUserResult {
    user: User,
}

#[derive(Deserialize)]
struct ProjectIssuesParams {
    tracker: Tracker,
    project_id: ProjectId,
    #[serde(flatten)]
    page: Pagination,
}

#[derive(Serialize)]
struct IssuesResult {
    issues: Vec<Issue>,
    amount: i64,
}

#[derive(Deserialize)]
struct CreateIssueParams {
    tracker: Tracker,
    project_id: ProjectId,
    issue: NewIssue,
}

#[derive(Serialize)]
struct IssueResult {
    issue: Issue,
}

#[derive(Deserialize)]
struct GetIssueParams {
    tracker: Tracker,
    issue_id: IssueId,
    #[serde(default)]
    project_id: ProjectId,
}

#[derive(Deserialize)]
struct IssueByUrlParams {
    tracker: Tracker,
    issue_url: String,
}

#[derive(Serialize)]
struct IssueByUrlResult {
    issue: Issue,
    project_id: ProjectId,
}

#[derive(Deserialize)]
struct UpdateProgressParams {
    tracker: Tracker,
    issue_id: IssueId,
    #[serde(default)]
    project_id: ProjectId,
    progress: Progress,
}

#[derive(Deserialize)]
struct UpdateIssueParams {
    tracker: Tracker,
    #[serde(default)]
    project_id: ProjectId,
    issue: Issue,
}

#[derive(Deserialize)]
struct CreateReportParams {
    tracker: Tracker,
    #[serde(default)]
    project_id: ProjectId,
    report: Report,
}

#[derive(Deserialize)]
struct TotalReportsParams {
    tracker: Tracker,
    date: i64,
}

#[derive(Serialize)]
struct TotalReportsResult {
    total: i64,
}

#[derive(Serialize)]
struct Empty {}

// ==================== Token verification ====================

/// Decides whether a caller token may use the service.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> bool;
}

/// Accepts every token
pub struct AllowAll;

impl TokenVerifier for AllowAll {
    fn verify(&self, _token: &str) -> bool {
        true
    }
}

/// Accepts only the configured token
pub struct SharedToken {
    token: String,
}

impl SharedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenVerifier for SharedToken {
    fn verify(&self, token: &str) -> bool {
        !token.is_empty() && token == self.token
    }
}

pub fn verifier_for(token: Option<&str>) -> Box<dyn TokenVerifier> {
    match token {
        Some(token) => Box::new(SharedToken::new(token)),
        None => Box::new(AllowAll),
    }
}

// ==================== Dispatcher ====================

/// Routes JSON-RPC calls to a tracker client.
pub struct Dispatcher<'a> {
    client: &'a dyn TrackerClient,
    verifier: Box<dyn TokenVerifier + 'a>,
    request_timeout: Option<Duration>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(client: &'a dyn TrackerClient, verifier: Box<dyn TokenVerifier + 'a>) -> Self {
        Self {
            client,
            verifier,
            request_timeout: None,
        }
    }

    /// Bound every call by this deadline
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Handle one raw request line.
    pub fn handle_line(&self, line: &str) -> RpcResponse {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle(request),
            Err(e) => RpcResponse::failure(Value::Null, RpcError::parse_error(e.to_string())),
        }
    }

    pub fn handle(&self, request: RpcRequest) -> RpcResponse {
        if let Some(version) = request.jsonrpc.as_deref() {
            if version != JSONRPC_VERSION {
                return RpcResponse::failure(
                    request.id,
                    RpcError::invalid_request(format!("unsupported jsonrpc version {}", version)),
                );
            }
        }
        match self.call(&request.method, request.params) {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(error) => RpcResponse::failure(request.id, error),
        }
    }

    pub fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let name = method.strip_prefix(API_PREFIX).unwrap_or(method);
        debug!(method = name, "rpc call");

        match name {
            "Version" => Ok(Value::String(env!("CARGO_PKG_VERSION").to_string())),
            "GetProjects" => self.invoke(name, params, |c, ctx, p: ProjectsParams| {
                let page = c.projects(ctx, &p.tracker, p.page)?;
                Ok(ProjectsResult {
                    projects: page.items,
                    amount: page.total,
                })
            }),
            "GetProjectDetails" => self.invoke(name, params, |c, ctx, p: ProjectDetailsParams| {
                let project = c.project(ctx, &p.tracker, p.project_id)?;
                Ok(ProjectDetailsResult { project })
            }),
            "GetCurrentUser" => self.invoke(name, params, |c, ctx, p: TrackerParams| {
                let user = c.user_info(ctx, &p.tracker)?;
                Ok(CurrentUserResult { user })
            }),
            "GetProjectIssues" => self.invoke(name, params, |c, ctx, p: ProjectIssuesParams| {
                let page = c.project_issues(ctx, &p.tracker, p.project_id, p.page)?;
                Ok(IssuesResult {
                    issues: page.items,
                    amount: page.total,
                })
            }),
            "CreateIssue" => self.invoke(name, params, |c, ctx, p: CreateIssueParams| {
                let issue = c.create_issue(ctx, &p.tracker, &p.issue, p.project_id)?;
                Ok(IssueResult { issue })
            }),
            "GetIssue" => self.invoke(name, params, |c, ctx, p: GetIssueParams| {
                let issue = c.issue(ctx, &p.tracker, p.project_id, p.issue_id)?;
                Ok(IssueResult { issue })
            }),
            "GetIssueByURL" => self.invoke(name, params, |c, ctx, p: IssueByUrlParams| {
                let issue = c.issue_by_url(ctx, &p.tracker, &p.issue_url)?;
                Ok(IssueByUrlResult {
                    project_id: issue.project_id,
                    issue,
                })
            }),
            "UpdateIssueProgress" => {
                self.invoke(name, params, |c, ctx, p: UpdateProgressParams| {
                    c.update_issue_progress(ctx, &p.tracker, p.project_id, p.issue_id, p.progress)?;
                    Ok(Empty {})
                })
            }
            "UpdateIssue" => self.invoke(name, params, |c, ctx, p: UpdateIssueParams| {
                let issue = c.update_issue(ctx, &p.tracker, p.project_id, &p.issue)?;
                Ok(IssueResult { issue })
            }),
            "CreateReport" => self.invoke(name, params, |c, ctx, p: CreateReportParams| {
                c.create_report(ctx, &p.tracker, p.project_id, &p.report)?;
                Ok(Empty {})
            }),
            "GetTotalReports" => self.invoke(name, params, |c, ctx, p: TotalReportsParams| {
                let total = c.total_reports(ctx, &p.tracker, p.date)?;
                Ok(TotalReportsResult { total })
            }),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn invoke<P, R, F>(&self, method: &str, params: Value, op: F) -> Result<Value, RpcError>
    where
        P: DeserializeOwned,
        R: Serialize,
        F: FnOnce(&dyn TrackerClient, &CallContext, P) -> tracker_core::Result<R>,
    {
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };
        let envelope: Envelope<P> =
            serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))?;

        let ctx = self.call_context(&envelope.context);
        if !self.verifier.verify(&envelope.context.token) {
            let err = TrackerError::Forbidden("caller token rejected".to_string());
            return Err(self.fail(method, &ctx, err));
        }

        let result = op(self.client, &ctx, envelope.params).map_err(|e| self.fail(method, &ctx, e))?;
        serde_json::to_value(result).map_err(|e| {
            self.fail(
                method,
                &ctx,
                TrackerError::Internal(format!("failed to encode result: {}", e)),
            )
        })
    }

    fn call_context(&self, context: &RequestContext) -> CallContext {
        let ctx = match self.request_timeout {
            Some(timeout) => CallContext::with_timeout(timeout),
            None => CallContext::background(),
        };
        ctx.traced(context.tracing_id.clone())
    }

    /// Log the full error with the caller's tracing id and reduce it to its code.
    fn fail(&self, method: &str, ctx: &CallContext, err: TrackerError) -> RpcError {
        let err = match (ctx.err(), &err) {
            (_, TrackerError::Timeout(_)) => err,
            (Some(ContextError::DeadlineExceeded), _) => {
                TrackerError::Timeout(format!("{}: {}", ContextError::DeadlineExceeded, err))
            }
            _ => err,
        };
        error!(
            tracing_id = ctx.tracing_id().unwrap_or_default(),
            method,
            code = err.code().name,
            error = %err,
            "rpc call failed"
        );
        RpcError::from(&err)
    }
}
