//! Line-oriented access to the worker's stdout and stderr.

use std::fmt;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::task::JoinHandle;

/// Which standard stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A readable, line-oriented view of one worker output stream.
///
/// Not part of the job protocol; intended for logging and diagnostics.
pub struct OutputLines<R> {
    stream: OutputStream,
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> OutputLines<R> {
    pub fn new(stream: OutputStream, reader: R) -> Self {
        Self {
            stream,
            lines: BufReader::new(reader).lines(),
        }
    }

    pub fn stream(&self) -> OutputStream {
        self.stream
    }

    /// Next line without its terminator, or `None` once the worker closes
    /// the stream (normally because it exited).
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Spawn a task that logs every line of `lines` until the stream closes.
///
/// Stdout lines are logged at `info`, stderr lines at `warn`.
pub fn forward_output<R>(mut lines: OutputLines<R>, pid: Option<u32>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let stream = lines.stream();
        tracing::debug!(pid, stream = %stream, "Forwarding worker output");

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match stream {
                    OutputStream::Stdout => tracing::info!(pid, stream = "stdout", "{line}"),
                    OutputStream::Stderr => tracing::warn!(pid, stream = "stderr", "{line}"),
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(pid, stream = %stream, error = %e, "Worker output unreadable");
                    break;
                }
            }
        }

        tracing::debug!(pid, stream = %stream, "Worker output closed");
    })
}
