//! Fire-and-forget job submission.
//!
//! [`Dispatcher::submit`] returns immediately. Each job is posted to the
//! worker from its own Tokio task, and that task publishes exactly one
//! [`Completion`] on the shared channel when the request resolves. Results
//! may therefore arrive in any order; correlate them by [`JobId`].

use std::sync::Arc;

use pagecast_core::error::DispatchError;
use pagecast_core::job::{Job, JobId};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::api::RenderApi;
use crate::completion::{self, Completion, CompletionReceiver, CompletionSender, JobFailure};

/// Cheaply cloneable handle for submitting jobs to one worker.
///
/// Clones share the same completion channel, in-flight tracking and
/// cancellation, so any number of tasks may submit concurrently.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<RenderApi>,
    completions: CompletionSender,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Create a dispatcher and the receiving half of its completion channel.
    pub fn new(api: RenderApi) -> (Self, CompletionReceiver) {
        let (completions, rx) = completion::channel();
        let dispatcher = Self {
            api: Arc::new(api),
            completions,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        };
        (dispatcher, rx)
    }

    /// Submit a job without waiting for it.
    ///
    /// Must be called from within a Tokio runtime. The job's outcome is
    /// published on the completion channel; a failure affects this job
    /// only.
    pub fn submit(&self, job: Job) -> JobId {
        let id = job.id();
        let api = Arc::clone(&self.api);
        let tx = self.completions.clone();
        let cancel = self.cancel.clone();

        tracing::debug!(job_id = %id, url = %job.url(), "Dispatching job");

        self.tracker.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(DispatchError::Cancelled),
                result = api.render(&job) => result,
            };

            let completion = match outcome {
                Ok(result) => {
                    tracing::info!(
                        job_id = %id,
                        url = %result.url,
                        bytes = result.result.len(),
                        "Job completed",
                    );
                    Completion::Completed(result)
                }
                Err(error) => {
                    tracing::warn!(job_id = %id, url = %job.url(), error = %error, "Job failed");
                    Completion::Failed(JobFailure {
                        id,
                        url: job.url().to_string(),
                        error,
                    })
                }
            };

            if tx.send(completion).is_err() {
                tracing::debug!(job_id = %id, "Completion receiver dropped, discarding outcome");
            }
        });

        id
    }

    /// Number of submitted jobs whose completion has not been published yet.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Resolve every in-flight job, and any job submitted later, with
    /// [`DispatchError::Cancelled`].
    pub fn cancel_all(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(in_flight = self.in_flight(), "Cancelling in-flight jobs");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until no job is in flight.
    ///
    /// Jobs may still be submitted afterwards; they are tracked as usual.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
