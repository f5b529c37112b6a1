//! Shared domain types for the pagecast render client.
//!
//! Pure data with no I/O: worker launch [`settings`], the [`job`] model and
//! its wire contract, and the per-job [`error`] type carried back to callers
//! through the completion channel.

pub mod error;
pub mod job;
pub mod settings;
