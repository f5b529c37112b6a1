//! Render jobs and their wire representation.
//!
//! A [`Job`] is created by the caller, serialized as `{"ID", "URL"}` and
//! posted to the worker. The worker answers with a [`JobResponse`]
//! (`{"ID", "URL", "result"}`) which is correlated back to the job by its
//! [`JobId`] alone, yielding a [`JobResult`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a job, a random (v4) UUID.
///
/// Serialized as the hyphenated lowercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A unit of work: one URL to render.
///
/// Immutable once created; the identifier is assigned by [`Job::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    url: String,
}

impl Job {
    /// Create a job for `url` with a freshly generated identifier.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Borrowed wire form posted to the worker.
    pub fn request(&self) -> JobRequest<'_> {
        JobRequest {
            id: self.id,
            url: &self.url,
        }
    }
}

/// Request body sent to the worker: `{"ID": "...", "URL": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobRequest<'a> {
    #[serde(rename = "ID")]
    pub id: JobId,
    #[serde(rename = "URL")]
    pub url: &'a str,
}

/// Response body as sent by the worker: `{"ID", "URL", "result"}`.
///
/// The `ID` is kept as an opaque string so that a well-formed response
/// carrying an identifier we never issued can be told apart from a body
/// that is not a response at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "result")]
    pub result: String,
}

impl JobResponse {
    /// Correlate the response with the job it answers.
    ///
    /// Returns the response back unchanged when its `ID` is not exactly
    /// the job's identifier.
    pub fn correlate(self, job: &Job) -> Result<JobResult, Self> {
        if self.id != job.id.to_string() {
            return Err(self);
        }
        Ok(JobResult {
            id: job.id,
            url: self.url,
            result: self.result,
        })
    }
}

/// Rendered output for one job, correlated to its [`JobId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Identifier of the originating job.
    #[serde(rename = "ID")]
    pub id: JobId,
    /// URL echoed back by the worker.
    #[serde(rename = "URL")]
    pub url: String,
    /// Opaque render output (typically the page HTML).
    #[serde(rename = "result")]
    pub result: String,
}

impl JobResult {
    /// Whether this result belongs to `job`.
    pub fn answers(&self, job: &Job) -> bool {
        self.id == job.id
    }
}

/// Parse a worker response body.
///
/// Fails only for invalid JSON or missing fields; the identifier is
/// checked by [`JobResponse::correlate`].
pub fn parse_response(body: &[u8]) -> Result<JobResponse, serde_json::Error> {
    serde_json::from_slice(body)
}
