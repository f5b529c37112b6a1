//! `pagecast` -- render pages through a headless-browser worker.
//!
//! Launches the worker, submits every URL given on the command line,
//! prints each rendered page as it completes, then shuts the worker down.
//!
//! # Environment variables
//!
//! | Variable                        | Default      | Description                         |
//! |---------------------------------|--------------|-------------------------------------|
//! | `PAGECAST_WORKER_PROGRAM`       | `phantomjs`  | Worker executable                   |
//! | `PAGECAST_WORKER_SCRIPT`        | `phantom.js` | Script passed to the worker         |
//! | `PAGECAST_LOAD_IMAGES`          | `false`      | Load images while rendering         |
//! | `PAGECAST_IGNORE_SSL_ERRORS`    | `true`       | Ignore TLS certificate errors       |
//! | `PAGECAST_REQUEST_TIMEOUT_SECS` | `30`         | Per-job request timeout             |
//! | `PAGECAST_READY_TIMEOUT_SECS`   | `10`         | Worker startup wait (`0` disables)  |
//! | `PAGECAST_FORWARD_OUTPUT`       | `true`       | Log the worker's stdout/stderr      |

use std::collections::HashSet;
use std::process::ExitCode;

use pagecast_client::{ClientConfig, Completion, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rendered when no URL is given.
const DEFAULT_URL: &str = "http://google.ca";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pagecast=info,pagecast_client=info,pagecast_worker=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(1);
        }
    };

    let mut urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        urls.push(DEFAULT_URL.to_string());
    }

    tracing::info!(
        program = %config.worker.program,
        script = %config.worker.script,
        jobs = urls.len(),
        "Starting pagecast",
    );

    let mut session = match Session::start(&config).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start render session");
            return ExitCode::from(1);
        }
    };

    let mut pending: HashSet<_> = urls.into_iter().map(|url| session.submit_url(url)).collect();
    let mut failed = 0usize;

    while !pending.is_empty() {
        let Some(completion) = session.next_completion().await else {
            break;
        };
        if !pending.remove(&completion.id()) {
            tracing::warn!(job_id = %completion.id(), "Completion for unknown job");
            continue;
        }

        match completion {
            Completion::Completed(result) => {
                println!("ID: {}", result.id);
                println!("URL: {}", result.url);
                println!("BYTES: {}", result.result.len());
                println!("BODY: {}", result.result);
            }
            Completion::Failed(failure) => {
                failed += 1;
                tracing::error!(job_id = %failure.id, url = %failure.url, error = %failure.error, "Render failed");
            }
        }
    }

    session.shutdown().await;

    if failed > 0 {
        tracing::warn!(failed, "Some pages could not be rendered");
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
