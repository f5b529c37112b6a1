//! Worker process launch and termination.
//!
//! [`WorkerProcess`] exclusively owns the spawned child. The process is
//! started with `kill_on_drop(true)` so a session that is dropped without
//! an explicit [`WorkerProcess::terminate`] still does not leak it.

use std::fmt;
use std::net::Ipv4Addr;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use pagecast_core::settings::Settings;
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::error::WorkerError;
use crate::output::{OutputLines, OutputStream};
use crate::port::reserve_port;

/// Delay between connection attempts in [`WorkerProcess::wait_ready`].
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How to invoke the worker executable.
///
/// The final command line is `<program> <script> <port> <settings flags...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    /// Executable to run, resolved through `PATH` when not absolute.
    pub program: String,
    /// Script handed to the program as its first argument.
    pub script: String,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
        }
    }

    /// Arguments passed after the program name.
    pub fn args(&self, settings: Settings, port: u16) -> Vec<String> {
        let mut args = vec![self.script.clone(), port.to_string()];
        args.extend(settings.to_args());
        args
    }
}

/// A running worker bound to a loopback port.
pub struct WorkerProcess {
    child: Child,
    pid: Option<u32>,
    port: u16,
    stdout: Option<OutputLines<ChildStdout>>,
    stderr: Option<OutputLines<ChildStderr>>,
}

impl fmt::Debug for WorkerProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerProcess")
            .field("pid", &self.pid)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl WorkerProcess {
    /// Reserve an ephemeral port and launch the worker on it.
    pub async fn spawn(command: &WorkerCommand, settings: Settings) -> Result<Self, WorkerError> {
        let port = reserve_port().await?;
        Self::start(command, settings, port)
    }

    /// Launch the worker bound to `port`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        command: &WorkerCommand,
        settings: Settings,
        port: u16,
    ) -> Result<Self, WorkerError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(command.args(settings, port))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| WorkerError::Launch {
            program: command.program.clone(),
            source,
        })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.start_kill();
            return Err(WorkerError::Stream(OutputStream::Stdout));
        };
        let Some(stderr) = child.stderr.take() else {
            let _ = child.start_kill();
            return Err(WorkerError::Stream(OutputStream::Stderr));
        };

        let pid = child.id();
        tracing::info!(
            pid,
            port,
            program = %command.program,
            script = %command.script,
            load_images = settings.load_images,
            ignore_tls_errors = settings.ignore_tls_errors,
            "Worker process started",
        );

        Ok(Self {
            child,
            pid,
            port,
            stdout: Some(OutputLines::new(OutputStream::Stdout, stdout)),
            stderr: Some(OutputLines::new(OutputStream::Stderr, stderr)),
        })
    }

    /// Loopback port the worker was told to listen on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// OS process id captured at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the stdout line stream. Returns `None` after the first call.
    pub fn take_stdout(&mut self) -> Option<OutputLines<ChildStdout>> {
        self.stdout.take()
    }

    /// Take the stderr line stream. Returns `None` after the first call.
    pub fn take_stderr(&mut self) -> Option<OutputLines<ChildStderr>> {
        self.stderr.take()
    }

    /// Exit status if the process has already exited, without blocking.
    pub fn try_exit_status(&mut self) -> Result<Option<ExitStatus>, WorkerError> {
        Ok(self.child.try_wait()?)
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for the process to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus, WorkerError> {
        let status = self.child.wait().await?;
        tracing::info!(pid = self.pid, %status, "Worker process finished");
        Ok(status)
    }

    /// Wait until the worker accepts TCP connections on its port.
    ///
    /// Fails with [`WorkerError::Exited`] if the process dies first, or
    /// [`WorkerError::NotReady`] once `timeout` has elapsed.
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<(), WorkerError> {
        let start = Instant::now();

        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(WorkerError::Exited(status));
            }

            let accepted = match TcpStream::connect((Ipv4Addr::LOCALHOST, self.port)).await {
                Ok(stream) => !is_self_connection(&stream),
                Err(_) => false,
            };
            if accepted {
                tracing::debug!(
                    port = self.port,
                    waited_ms = start.elapsed().as_millis() as u64,
                    "Worker is accepting connections",
                );
                return Ok(());
            }

            if start.elapsed() >= timeout {
                return Err(WorkerError::NotReady {
                    port: self.port,
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Forcefully kill the worker and reap it.
    ///
    /// No graceful drain. Calling this on a process that already exited
    /// (or was already terminated) is a no-op.
    pub async fn terminate(&mut self) -> Result<(), WorkerError> {
        if let Some(status) = self.child.try_wait()? {
            tracing::debug!(pid = self.pid, %status, "Worker already exited");
            return Ok(());
        }

        self.child.kill().await?;
        tracing::info!(pid = self.pid, port = self.port, "Worker process terminated");
        Ok(())
    }
}

/// Whether a readiness connection landed on its own socket.
///
/// Connecting to an unbound port in the ephemeral range can pick that same
/// port as the local end and complete via TCP simultaneous open.
fn is_self_connection(stream: &TcpStream) -> bool {
    matches!(
        (stream.local_addr(), stream.peer_addr()),
        (Ok(local), Ok(peer)) if local == peer
    )
}
