use pagecast_worker::WorkerError;

/// Errors that prevent a session from being created.
///
/// Returned synchronously from [`Session::start`](crate::Session::start).
/// Per-job failures are never reported here; they arrive on the
/// completion channel as [`Completion::Failed`](crate::Completion::Failed).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Port selection, launch, stream attachment or readiness failed.
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The HTTP client for the loopback endpoint could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
