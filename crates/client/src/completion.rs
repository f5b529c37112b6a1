//! Completion events delivered to callers.
//!
//! Every dispatched job produces exactly one [`Completion`]. Successes and
//! failures share one channel so a caller waiting for N jobs can simply
//! receive N events.

use pagecast_core::error::DispatchError;
use pagecast_core::job::{JobId, JobResult};
use tokio::sync::mpsc;

/// Sending half shared by all dispatch tasks.
pub type CompletionSender = mpsc::UnboundedSender<Completion>;

/// Receiving half owned by the caller.
pub type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

/// Create a completion channel. Unbounded so that publishing never blocks
/// a dispatch task.
pub fn channel() -> (CompletionSender, CompletionReceiver) {
    mpsc::unbounded_channel()
}

/// The outcome of one dispatched job.
#[derive(Debug, Clone)]
pub enum Completion {
    /// The worker rendered the page.
    Completed(JobResult),
    /// The job failed; only this job is affected.
    Failed(JobFailure),
}

/// A failed job together with the reason.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Job {id} ({url}) failed: {error}")]
pub struct JobFailure {
    pub id: JobId,
    pub url: String,
    #[source]
    pub error: DispatchError,
}

impl Completion {
    /// Identifier of the job this event resolves.
    pub fn id(&self) -> JobId {
        match self {
            Self::Completed(result) => result.id,
            Self::Failed(failure) => failure.id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_result(self) -> Result<JobResult, JobFailure> {
        match self {
            Self::Completed(result) => Ok(result),
            Self::Failed(failure) => Err(failure),
        }
    }
}
