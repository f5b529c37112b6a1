//! One worker process paired with one dispatcher.
//!
//! [`Session::start`] launches the worker on a fresh ephemeral port and
//! points a [`Dispatcher`] at the same port. The caller owns the session
//! explicitly; [`Session::shutdown`] cancels outstanding jobs and kills the
//! worker. Dropping a session without shutting it down still kills the
//! worker.

use std::fmt;

use pagecast_core::job::{Job, JobId};
use pagecast_worker::{forward_output, WorkerProcess};
use tokio::task::JoinHandle;

use crate::api::RenderApi;
use crate::completion::{Completion, CompletionReceiver};
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::SessionError;

pub struct Session {
    worker: WorkerProcess,
    dispatcher: Dispatcher,
    completions: CompletionReceiver,
    forwarders: Vec<JoinHandle<()>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("worker", &self.worker)
            .field("in_flight", &self.dispatcher.in_flight())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Launch a worker and connect a dispatcher to it.
    ///
    /// Fails if no port is available, the worker cannot be launched, its
    /// output streams cannot be attached, or it does not start accepting
    /// connections within `config.ready_timeout`. A worker that was
    /// launched is killed before the error is returned.
    pub async fn start(config: &ClientConfig) -> Result<Self, SessionError> {
        let mut worker = WorkerProcess::spawn(&config.worker, config.settings).await?;

        let mut forwarders = Vec::new();
        if config.forward_output {
            let pid = worker.pid();
            if let Some(stdout) = worker.take_stdout() {
                forwarders.push(forward_output(stdout, pid));
            }
            if let Some(stderr) = worker.take_stderr() {
                forwarders.push(forward_output(stderr, pid));
            }
        }

        if let Some(timeout) = config.ready_timeout {
            if let Err(e) = worker.wait_ready(timeout).await {
                tracing::error!(port = worker.port(), error = %e, "Worker failed to become ready");
                discard_worker(&mut worker, &forwarders).await;
                return Err(e.into());
            }
        }

        let api = match RenderApi::new(worker.port(), config.request_timeout) {
            Ok(api) => api,
            Err(e) => {
                discard_worker(&mut worker, &forwarders).await;
                return Err(e.into());
            }
        };
        let (dispatcher, completions) = Dispatcher::new(api);

        tracing::info!(
            pid = worker.pid(),
            port = worker.port(),
            request_timeout_ms = config.request_timeout.as_millis() as u64,
            "Render session started",
        );

        Ok(Self {
            worker,
            dispatcher,
            completions,
            forwarders,
        })
    }

    /// Submit a job; its outcome arrives via [`next_completion`](Self::next_completion).
    pub fn submit(&self, job: Job) -> JobId {
        self.dispatcher.submit(job)
    }

    /// Create a job for `url` and submit it.
    pub fn submit_url(&self, url: impl Into<String>) -> JobId {
        self.submit(Job::new(url))
    }

    /// Wait for the next job to resolve, in whatever order jobs finish.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions.recv().await
    }

    /// The next already-resolved job, if any, without waiting.
    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// A dispatcher handle for submitting from other tasks.
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    pub fn port(&self) -> u16 {
        self.worker.port()
    }

    /// The worker process, e.g. to watch for it exiting.
    pub fn worker_mut(&mut self) -> &mut WorkerProcess {
        &mut self.worker
    }

    /// Cancel every in-flight job and kill the worker.
    ///
    /// Every job submitted before shutdown has resolved by the time this
    /// returns. The returned receiver yields their completions; it closes
    /// once they are consumed and no other [`Dispatcher`] clone is alive.
    pub async fn shutdown(mut self) -> CompletionReceiver {
        tracing::info!(
            port = self.worker.port(),
            in_flight = self.dispatcher.in_flight(),
            "Shutting down render session",
        );

        self.dispatcher.cancel_all();
        self.dispatcher.drain().await;

        if let Err(e) = self.worker.terminate().await {
            tracing::error!(pid = self.worker.pid(), error = %e, "Failed to terminate worker");
        }
        for handle in &self.forwarders {
            handle.abort();
        }

        tracing::info!("Render session shut down");
        self.completions
    }
}

/// Kill a worker whose session could not be completed.
async fn discard_worker(worker: &mut WorkerProcess, forwarders: &[JoinHandle<()>]) {
    if let Err(e) = worker.terminate().await {
        tracing::warn!(pid = worker.pid(), error = %e, "Failed to terminate worker");
    }
    for handle in forwarders {
        handle.abort();
    }
}
