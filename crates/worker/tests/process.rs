//! Integration tests for [`WorkerProcess`] lifecycle management.
//!
//! The real worker is a headless browser; here it is stood in for by
//! small `/bin/sh` scripts so the launch contract, output streams and
//! termination can be observed directly.

use std::io::Write;
use std::time::Duration;

use assert_matches::assert_matches;
use pagecast_core::settings::Settings;
use pagecast_worker::{reserve_port, WorkerCommand, WorkerError, WorkerProcess};
use tempfile::NamedTempFile;

/// Write `body` to a temporary shell script and return a command running it.
fn sh_worker(body: &str) -> (NamedTempFile, WorkerCommand) {
    let mut file = NamedTempFile::new().expect("temp script should be created");
    file.write_all(body.as_bytes()).expect("script should be written");
    file.flush().expect("script should be flushed");
    let path = file.path().to_string_lossy().into_owned();
    (file, WorkerCommand::new("sh", path))
}

// ---------------------------------------------------------------------------
// Test: worker receives port and settings flags as arguments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn worker_receives_port_and_flags() {
    let (_script, command) = sh_worker("echo \"$@\"\n");
    let port = reserve_port().await.unwrap();

    let mut worker = WorkerProcess::start(&command, Settings::default(), port).unwrap();
    let mut stdout = worker.take_stdout().expect("stdout available once");

    let line = stdout.next_line().await.unwrap().expect("one line of output");
    assert_eq!(
        line,
        format!("{port} --load-images=false --ignore-ssl-errors=true")
    );

    worker.wait().await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: stdout and stderr are separate line streams
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stdout_and_stderr_are_exposed_separately() {
    let (_script, command) = sh_worker("echo out-1\necho err-1 >&2\necho out-2\n");
    let mut worker = WorkerProcess::spawn(&command, Settings::default())
        .await
        .unwrap();

    let mut stdout = worker.take_stdout().unwrap();
    let mut stderr = worker.take_stderr().unwrap();
    assert!(worker.take_stdout().is_none());
    assert!(worker.take_stderr().is_none());

    assert_eq!(stdout.next_line().await.unwrap().as_deref(), Some("out-1"));
    assert_eq!(stdout.next_line().await.unwrap().as_deref(), Some("out-2"));
    assert_eq!(stdout.next_line().await.unwrap(), None);
    assert_eq!(stderr.next_line().await.unwrap().as_deref(), Some("err-1"));
    assert_eq!(stderr.next_line().await.unwrap(), None);

    let status = worker.wait().await.unwrap();
    assert!(status.success());
}

// ---------------------------------------------------------------------------
// Test: missing executable is a launch error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_executable_is_launch_error() {
    let command = WorkerCommand::new("pagecast-no-such-worker-binary", "phantom.js");
    let result = WorkerProcess::spawn(&command, Settings::default()).await;

    assert_matches!(
        result,
        Err(WorkerError::Launch { ref program, .. }) if program == "pagecast-no-such-worker-binary"
    );
}

// ---------------------------------------------------------------------------
// Test: terminate kills a long-running worker and is idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminate_is_forceful_and_idempotent() {
    let (_script, command) = sh_worker("sleep 30\n");
    let mut worker = WorkerProcess::spawn(&command, Settings::default())
        .await
        .unwrap();
    assert!(worker.is_running());

    tokio::time::timeout(Duration::from_secs(5), worker.terminate())
        .await
        .expect("terminate should not wait for the worker to finish")
        .unwrap();
    assert!(!worker.is_running());

    worker.terminate().await.unwrap();
    let status = worker.try_exit_status().unwrap().expect("already reaped");
    assert!(!status.success());
}

// ---------------------------------------------------------------------------
// Test: terminate after a natural exit is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminate_after_exit_is_noop() {
    let (_script, command) = sh_worker("exit 3\n");
    let mut worker = WorkerProcess::spawn(&command, Settings::default())
        .await
        .unwrap();

    let status = worker.wait().await.unwrap();
    assert_eq!(status.code(), Some(3));
    worker.terminate().await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: readiness wait
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wait_ready_succeeds_once_port_accepts() {
    let (_script, command) = sh_worker("sleep 30\n");
    let mut worker = WorkerProcess::spawn(&command, Settings::default())
        .await
        .unwrap();

    // Stand in for the worker's HTTP listener.
    let _listener = tokio::net::TcpListener::bind(("127.0.0.1", worker.port()))
        .await
        .unwrap();

    worker.wait_ready(Duration::from_secs(2)).await.unwrap();
    worker.terminate().await.unwrap();
}

#[tokio::test]
async fn wait_ready_times_out_when_nothing_listens() {
    let (_script, command) = sh_worker("sleep 30\n");
    let mut worker = WorkerProcess::spawn(&command, Settings::default())
        .await
        .unwrap();

    let result = worker.wait_ready(Duration::from_millis(200)).await;
    assert_matches!(result, Err(WorkerError::NotReady { port, .. }) if port == worker.port());
    worker.terminate().await.unwrap();
}

#[tokio::test]
async fn wait_ready_reports_early_exit() {
    let (_script, command) = sh_worker("exit 1\n");
    let mut worker = WorkerProcess::spawn(&command, Settings::default())
        .await
        .unwrap();

    let result = worker.wait_ready(Duration::from_secs(5)).await;
    assert_matches!(result, Err(WorkerError::Exited(status)) if status.code() == Some(1));
}
