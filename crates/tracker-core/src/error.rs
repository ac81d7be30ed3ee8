use thiserror::Error;

/// Closed error taxonomy surfaced by every tracker adapter.
///
/// Each variant carries a human-readable detail used for server-side logs.
/// Only the stable [`ErrorCode`] (and the validation message) may cross the
/// RPC boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid tracker credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unsupported tracker type: {0}")]
    InvalidTrackerType(String),

    #[error("Tracker URL unreachable: {0}")]
    InvalidTrackerUrl(String),

    #[error("Invalid issue URL: {0}")]
    InvalidIssueUrl(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    #[error("Remote server unavailable: {0}")]
    RemoteServerUnavailable(String),

    #[error("Tracker validation error: {message} ({context})")]
    Validation { message: String, context: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Stable, caller-visible identity of a [`TrackerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: i64,
    pub name: &'static str,
}

impl ErrorCode {
    pub const TIMEOUT: ErrorCode = ErrorCode::new(0, "TIMEOUT");
    pub const FORBIDDEN: ErrorCode = ErrorCode::new(3, "FORBIDDEN");
    pub const REMOTE_SERVER_UNAVAILABLE: ErrorCode =
        ErrorCode::new(5, "REMOTE_SERVER_UNAVAILABLE");
    pub const TRACKER_VALIDATION: ErrorCode = ErrorCode::new(101, "TRACKER_VALIDATION_ERROR");
    pub const INVALID_CREDENTIALS: ErrorCode = ErrorCode::new(102, "INVALID_CREDENTIALS");
    pub const INVALID_TRACKER_TYPE: ErrorCode = ErrorCode::new(103, "INVALID_TRACKER_TYPE");
    pub const INVALID_TRACKER_URL: ErrorCode = ErrorCode::new(104, "INVALID_TRACKER_URL");
    pub const INVALID_ISSUE_URL: ErrorCode = ErrorCode::new(105, "INVALID_ISSUE_URL");
    pub const PROJECT_NOT_FOUND: ErrorCode = ErrorCode::new(106, "PROJECT_NOT_FOUND");
    pub const ISSUE_NOT_FOUND: ErrorCode = ErrorCode::new(107, "ISSUE_NOT_FOUND");
    pub const INTERNAL: ErrorCode = ErrorCode::new(-32603, "INTERNAL_ERROR");

    const fn new(code: i64, name: &'static str) -> Self {
        Self { code, name }
    }
}

impl TrackerError {
    /// The stable code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            TrackerError::Timeout(_) => ErrorCode::TIMEOUT,
            TrackerError::Forbidden(_) => ErrorCode::FORBIDDEN,
            TrackerError::InvalidCredentials(_) => ErrorCode::INVALID_CREDENTIALS,
            TrackerError::InvalidTrackerType(_) => ErrorCode::INVALID_TRACKER_TYPE,
            TrackerError::InvalidTrackerUrl(_) => ErrorCode::INVALID_TRACKER_URL,
            TrackerError::InvalidIssueUrl(_) => ErrorCode::INVALID_ISSUE_URL,
            TrackerError::ProjectNotFound(_) => ErrorCode::PROJECT_NOT_FOUND,
            TrackerError::IssueNotFound(_) => ErrorCode::ISSUE_NOT_FOUND,
            TrackerError::RemoteServerUnavailable(_) => ErrorCode::REMOTE_SERVER_UNAVAILABLE,
            TrackerError::Validation { .. } => ErrorCode::TRACKER_VALIDATION,
            TrackerError::Internal(_) => ErrorCode::INTERNAL,
        }
    }

    /// Message that may be shown to a remote caller, if any.
    ///
    /// Only validation errors carry one: it is the tracker's own explanation
    /// of why the submitted object was rejected.
    pub fn public_message(&self) -> Option<&str> {
        match self {
            TrackerError::Validation { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Prefix the error detail with operation context, keeping the class.
    pub fn with_context(self, context: impl AsRef<str>) -> Self {
        let context = context.as_ref();
        let wrap = |detail: String| {
            if detail.is_empty() {
                context.to_string()
            } else {
                format!("{}: {}", context, detail)
            }
        };
        match self {
            TrackerError::Timeout(d) => TrackerError::Timeout(wrap(d)),
            TrackerError::Forbidden(d) => TrackerError::Forbidden(wrap(d)),
            TrackerError::InvalidCredentials(d) => TrackerError::InvalidCredentials(wrap(d)),
            TrackerError::InvalidTrackerType(d) => TrackerError::InvalidTrackerType(wrap(d)),
            TrackerError::InvalidTrackerUrl(d) => TrackerError::InvalidTrackerUrl(wrap(d)),
            TrackerError::InvalidIssueUrl(d) => TrackerError::InvalidIssueUrl(wrap(d)),
            TrackerError::ProjectNotFound(d) => TrackerError::ProjectNotFound(wrap(d)),
            TrackerError::IssueNotFound(d) => TrackerError::IssueNotFound(wrap(d)),
            TrackerError::RemoteServerUnavailable(d) => {
                TrackerError::RemoteServerUnavailable(wrap(d))
            }
            TrackerError::Validation {
                message,
                context: inner,
            } => TrackerError::Validation {
                message,
                context: wrap(inner),
            },
            TrackerError::Internal(d) => TrackerError::Internal(wrap(d)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(TrackerError::Timeout(String::new()).code().code, 0);
        assert_eq!(TrackerError::Forbidden(String::new()).code().code, 3);
        assert_eq!(
            TrackerError::RemoteServerUnavailable(String::new()).code(),
            ErrorCode::REMOTE_SERVER_UNAVAILABLE
        );
        assert_eq!(
            TrackerError::ProjectNotFound("1".into()).code().name,
            "PROJECT_NOT_FOUND"
        );
        assert_eq!(TrackerError::IssueNotFound("1".into()).code().code, 107);
        assert_eq!(TrackerError::InvalidIssueUrl("x".into()).code().code, 105);
    }

    #[test]
    fn context_keeps_the_class() {
        let err = TrackerError::IssueNotFound("issue 5".to_string())
            .with_context("tracker 2, URL http://redmine");
        assert_eq!(err.code(), ErrorCode::ISSUE_NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "Issue not found: tracker 2, URL http://redmine: issue 5"
        );
    }

    #[test]
    fn validation_message_survives_context() {
        let err = TrackerError::Validation {
            message: "Subject cannot be blank".to_string(),
            context: String::new(),
        }
        .with_context("create issue");
        assert_eq!(err.public_message(), Some("Subject cannot be blank"));
        assert!(err.to_string().contains("create issue"));
    }

    #[test]
    fn non_validation_errors_have_no_public_message() {
        assert!(TrackerError::Internal("boom".into()).public_message().is_none());
        assert!(TrackerError::Timeout("deadline".into())
            .public_message()
            .is_none());
    }
}
