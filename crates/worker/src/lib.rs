//! Lifecycle management for the headless-browser worker process.
//!
//! The worker is an external executable that serves render requests over
//! loopback HTTP. This crate picks an ephemeral port, launches the worker
//! bound to it, exposes its stdout/stderr as line streams, and kills it
//! on request. Nothing here knows about the job protocol.

pub mod error;
pub mod output;
pub mod port;
pub mod process;

pub use error::WorkerError;
pub use output::{forward_output, OutputLines, OutputStream};
pub use port::reserve_port;
pub use process::{WorkerCommand, WorkerProcess};
