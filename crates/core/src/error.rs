//! Per-job dispatch failures.
//!
//! A [`DispatchError`] is scoped to the single job that produced it. It is
//! delivered to the caller alongside successful results and never aborts
//! the session.

use crate::job::JobId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The worker could not be reached (refused, reset, process gone).
    #[error("Connection to worker failed: {0}")]
    Connection(String),

    /// No response arrived within the configured request timeout.
    #[error("Worker did not respond within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The worker answered with a non-success status code.
    #[error("Worker returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not a valid `{ID, URL, result}` document.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// The response carries an identifier other than the one dispatched.
    #[error("Protocol violation: expected result for job {expected}, received {received}")]
    ProtocolViolation { expected: JobId, received: String },

    /// Any other transport-level failure while building or sending the request.
    #[error("Request failed: {0}")]
    Request(String),

    /// The session was shut down before the job resolved.
    #[error("Dispatch cancelled")]
    Cancelled,
}

impl DispatchError {
    /// Whether the failure was caused by the worker being unreachable
    /// rather than by what it returned.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout { .. } | Self::Request(_)
        )
    }
}
