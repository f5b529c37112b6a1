//! Job dispatch client for the headless-browser render worker.
//!
//! A [`Session`] pairs one worker process with one [`Dispatcher`]. Jobs
//! are posted to the worker over loopback HTTP from independent
//! background tasks, and every job resolves to exactly one
//! [`Completion`] (a result or a per-job error) on the session's
//! completion channel.

pub mod api;
pub mod completion;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod session;

pub use api::RenderApi;
pub use completion::{Completion, CompletionReceiver, JobFailure};
pub use config::{ClientConfig, ConfigError};
pub use dispatcher::Dispatcher;
pub use error::SessionError;
pub use session::Session;

pub use pagecast_core::error::DispatchError;
pub use pagecast_core::job::{Job, JobId, JobResult};
pub use pagecast_core::settings::Settings;
