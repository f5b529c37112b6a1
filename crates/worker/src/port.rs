//! Ephemeral port selection.
//!
//! Each session asks the OS for a free loopback port instead of using a
//! fixed one, so any number of sessions can run side by side.

use std::net::Ipv4Addr;

use tokio::net::TcpListener;

use crate::error::WorkerError;

/// Ask the OS for a free loopback port.
///
/// The temporary listener is closed before returning so the worker can bind
/// the port itself.
pub async fn reserve_port() -> Result<u16, WorkerError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .map_err(WorkerError::Port)?;
    let port = listener.local_addr().map_err(WorkerError::Port)?.port();
    drop(listener);

    tracing::debug!(port, "Reserved ephemeral port");
    Ok(port)
}
