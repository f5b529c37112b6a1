//! Shared helpers for pagecast-client integration tests.
//!
//! The headless browser is replaced by an in-process axum server that
//! speaks the worker's wire protocol, and, where a real child process is
//! needed, by a `/bin/sh` script that just sleeps.

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use pagecast_client::ClientConfig;
use pagecast_worker::WorkerCommand;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

/// Serve `app` on a fresh loopback port and return the port.
pub async fn start_fake_worker(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    serve_on(listener, app);
    port
}

/// Serve `app` on an already-bound listener.
pub fn serve_on(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

/// A well-behaved worker: echoes `ID` and `URL` and renders `<p>URL</p>`.
pub fn echo_worker() -> Router {
    Router::new().route("/", post(echo))
}

async fn echo(headers: HeaderMap, Json(job): Json<Value>) -> (StatusCode, Json<Value>) {
    if headers
        .get(header::CONTENT_TYPE)
        .map_or(true, |v| v != "application/json")
    {
        return (StatusCode::BAD_REQUEST, Json(json!("Bad Request")));
    }
    let url = job["URL"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::OK,
        Json(json!({
            "ID": job["ID"],
            "URL": url,
            "result": format!("<p>{url}</p>"),
        })),
    )
}

/// A worker that accepts requests but never answers within `delay`.
pub fn stalled_worker(delay: Duration) -> Router {
    Router::new().route(
        "/",
        post(move || async move {
            tokio::time::sleep(delay).await;
            StatusCode::OK
        }),
    )
}

/// A port with nothing listening on it.
pub async fn dead_port() -> u16 {
    pagecast_worker::reserve_port().await.unwrap()
}

/// Config whose worker is a shell script running `body`.
///
/// The readiness wait and output forwarding are disabled; tests stand in
/// for the worker's HTTP listener themselves.
pub fn sh_worker_config(body: &str) -> (NamedTempFile, ClientConfig) {
    let mut file = NamedTempFile::new().expect("temp script should be created");
    file.write_all(body.as_bytes()).expect("script should be written");
    file.flush().expect("script should be flushed");

    let config = ClientConfig {
        worker: WorkerCommand::new("sh", file.path().to_string_lossy().into_owned()),
        ready_timeout: None,
        forward_output: false,
        request_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    };
    (file, config)
}
