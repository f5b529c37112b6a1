use crate::output::OutputStream;

/// Errors raised while creating or managing a worker process.
///
/// All of these are fatal to the session being created; none of them are
/// produced by individual jobs.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// No ephemeral loopback port could be acquired.
    #[error("No local port available: {0}")]
    Port(#[source] std::io::Error),

    /// The worker executable is missing or could not be started.
    #[error("Failed to launch worker `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An output pipe could not be attached to the spawned process.
    #[error("Could not attach to worker {0}")]
    Stream(OutputStream),

    /// The worker did not start accepting connections in time.
    #[error("Worker on port {port} not ready after {waited_ms}ms")]
    NotReady { port: u16, waited_ms: u64 },

    /// The worker exited while we were waiting for it to become ready.
    #[error("Worker exited before becoming ready ({0})")]
    Exited(std::process::ExitStatus),

    /// Signalling or reaping the process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
