//! HTTP client for the worker's loopback render endpoint.
//!
//! Wraps the single worker endpoint (`POST /` with a `{"ID", "URL"}` body)
//! using [`reqwest`], and maps every failure mode onto a per-job
//! [`DispatchError`].

use std::time::Duration;

use pagecast_core::error::DispatchError;
use pagecast_core::job::{parse_response, Job, JobResult};

/// Request path served by the worker script.
const RENDER_PATH: &str = "/";

/// HTTP client for a single worker instance.
pub struct RenderApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RenderApi {
    /// Create a client for the worker listening on `127.0.0.1:<port>`.
    ///
    /// Every request is bounded by `timeout`, so a worker that dies or
    /// stalls mid-request cannot leave a job pending forever.
    pub fn new(port: u16, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            base_url: format!("http://127.0.0.1:{port}"),
            timeout,
        })
    }

    /// Base URL (e.g. `http://127.0.0.1:40123`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the worker to render `job` and wait for its result.
    ///
    /// The response must be a `200 OK` with a `{"ID", "URL", "result"}`
    /// body whose `ID` matches the job.
    pub async fn render(&self, job: &Job) -> Result<JobResult, DispatchError> {
        let response = self
            .client
            .post(format!("{}{RENDER_PATH}", self.base_url))
            .json(&job.request())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        let reply =
            parse_response(&body).map_err(|e| DispatchError::MalformedBody(e.to_string()))?;

        let result = reply.correlate(job).map_err(|response| {
            tracing::error!(
                job_id = %job.id(),
                received = %response.id,
                "Worker answered with an unknown job identifier",
            );
            DispatchError::ProtocolViolation {
                expected: job.id(),
                received: response.id,
            }
        })?;

        Ok(result)
    }

    // ---- private helpers ----

    /// Return the response unchanged on `200 OK`, or a
    /// [`DispatchError::Status`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DispatchError> {
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn classify(&self, err: reqwest::Error) -> DispatchError {
        if err.is_timeout() {
            DispatchError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            DispatchError::Connection(error_chain(&err))
        } else if err.is_decode() || err.is_body() {
            DispatchError::MalformedBody(error_chain(&err))
        } else {
            DispatchError::Request(error_chain(&err))
        }
    }
}

/// Render an error and its sources as `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_targets_loopback_port() {
        let api = RenderApi::new(40123, Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://127.0.0.1:40123");
        assert_eq!(api.timeout(), Duration::from_secs(1));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Inner;

    #[test]
    fn error_chain_joins_sources() {
        assert_eq!(
            error_chain(&Outer(Inner)),
            "error sending request: connection refused"
        );
    }
}
