use thiserror::Error;
use tracker_core::TrackerError;

/// Longest response body kept inside an error, in characters.
const BODY_SNIPPET_LEN: usize = 1024;

/// Outcome classes of a single tracker request.
///
/// `NotFound` is deliberately context-free: what a 404 means depends on which
/// resource was requested, so operations translate it themselves.
#[derive(Error, Debug)]
pub enum RedmineError {
    #[error("unsupported tracker type '{0}'")]
    TrackerType(String),

    #[error("{reason} on {url}")]
    Timeout { url: String, reason: String },

    #[error("HTTP request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("resource not found")]
    NotFound,

    #[error("authentication failed")]
    Unauthorized,

    #[error("access forbidden")]
    Forbidden,

    #[error("invalid object passed to redmine: {message}, response body: {body}")]
    Validation { message: String, body: String },

    #[error("redmine internal error, body: {body}")]
    RemoteServer { body: String },

    #[error("expected status code {expected}, actual {actual}, body: {body}")]
    UnexpectedStatus {
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("status code {status}, failed to decode response: {source}, body: {body}")]
    Decode {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("request to {url} stopped without a response")]
    Aborted { url: String },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: ureq::Error,
    },
}

pub type Result<T> = std::result::Result<T, RedmineError>;

/// Cut a response body down to something fit for logs.
pub(crate) fn snippet(body: &str) -> String {
    if body.chars().count() <= BODY_SNIPPET_LEN {
        body.to_string()
    } else {
        let cut: String = body.chars().take(BODY_SNIPPET_LEN).collect();
        format!("{}...", cut)
    }
}

impl From<RedmineError> for TrackerError {
    fn from(err: RedmineError) -> Self {
        match err {
            RedmineError::TrackerType(kind) => {
                TrackerError::InvalidTrackerType(format!("invalid type: {}", kind))
            }
            e @ RedmineError::Timeout { .. } => TrackerError::Timeout(e.to_string()),
            e @ RedmineError::Transport { .. } => TrackerError::InvalidTrackerUrl(e.to_string()),
            RedmineError::NotFound => {
                TrackerError::InvalidTrackerUrl("resource not found".to_string())
            }
            RedmineError::Unauthorized => {
                TrackerError::InvalidCredentials("authentication failed".to_string())
            }
            RedmineError::Forbidden => TrackerError::Forbidden("access forbidden".to_string()),
            RedmineError::Validation { message, body } => TrackerError::Validation {
                message,
                context: format!("response body: {}", body),
            },
            e @ RedmineError::RemoteServer { .. } => {
                TrackerError::RemoteServerUnavailable(e.to_string())
            }
            e @ (RedmineError::UnexpectedStatus { .. }
            | RedmineError::Decode { .. }
            | RedmineError::Encode(_)
            | RedmineError::Body { .. }
            | RedmineError::Aborted { .. }) => TrackerError::Internal(e.to_string()),
        }
    }
}
