//! Per-call cancellation and deadline handling.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a [`CallContext`] is no longer usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Cancelled => write!(f, "context canceled"),
            ContextError::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Cancellation-bearing context shared by every request of one logical call.
///
/// Clones share the cancellation flag, so cancelling any clone cancels all
/// in-flight work bound to the same call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
    tracing_id: Option<String>,
}

impl CallContext {
    /// A context that never expires on its own.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    /// Attach the caller's tracing id, used to correlate log lines.
    pub fn traced(mut self, tracing_id: impl Into<String>) -> Self {
        let id = tracing_id.into();
        self.tracing_id = if id.is_empty() { None } else { Some(id) };
        self
    }

    pub fn tracing_id(&self) -> Option<&str> {
        self.tracing_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns the reason this context is done, if it is.
    ///
    /// Cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_never_done() {
        let ctx = CallContext::background();
        assert!(ctx.err().is_none());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = CallContext::background();
        let clone = ctx.clone();
        clone.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn expired_deadline_is_reported() {
        let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn cancellation_wins_over_deadline() {
        let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(1));
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn empty_tracing_id_is_dropped() {
        assert!(CallContext::background().traced("").tracing_id().is_none());
        assert_eq!(
            CallContext::background().traced("req-7").tracing_id(),
            Some("req-7")
        );
    }
}
