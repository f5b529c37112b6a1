use std::time::Duration;

use pagecast_core::settings::Settings;
use pagecast_worker::WorkerCommand;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local `phantomjs` install.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Worker executable and script.
    pub worker: WorkerCommand,
    /// Worker launch flags.
    pub settings: Settings,
    /// Upper bound on each render request.
    pub request_timeout: Duration,
    /// How long to wait for the worker to accept connections after launch.
    /// `None` skips the wait.
    pub ready_timeout: Option<Duration>,
    /// Log the worker's stdout/stderr through `tracing`.
    pub forward_output: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            worker: WorkerCommand::new("phantomjs", "phantom.js"),
            settings: Settings::default(),
            request_timeout: Duration::from_secs(30),
            ready_timeout: Some(Duration::from_secs(10)),
            forward_output: true,
        }
    }
}

/// An environment variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{name} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub name: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default      |
    /// |---------------------------------|--------------|
    /// | `PAGECAST_WORKER_PROGRAM`       | `phantomjs`  |
    /// | `PAGECAST_WORKER_SCRIPT`        | `phantom.js` |
    /// | `PAGECAST_LOAD_IMAGES`          | `false`      |
    /// | `PAGECAST_IGNORE_SSL_ERRORS`    | `true`       |
    /// | `PAGECAST_REQUEST_TIMEOUT_SECS` | `30`         |
    /// | `PAGECAST_READY_TIMEOUT_SECS`   | `10` (`0` disables the wait) |
    /// | `PAGECAST_FORWARD_OUTPUT`       | `true`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading values through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let program = lookup("PAGECAST_WORKER_PROGRAM").unwrap_or(defaults.worker.program);
        let script = lookup("PAGECAST_WORKER_SCRIPT").unwrap_or(defaults.worker.script);

        let load_images = parse_bool(
            &lookup,
            "PAGECAST_LOAD_IMAGES",
            defaults.settings.load_images,
        )?;
        let ignore_tls_errors = parse_bool(
            &lookup,
            "PAGECAST_IGNORE_SSL_ERRORS",
            defaults.settings.ignore_tls_errors,
        )?;

        let request_timeout_secs = parse_secs(
            &lookup,
            "PAGECAST_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError {
                name: "PAGECAST_REQUEST_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: "0".into(),
            });
        }

        let ready_timeout_secs = parse_secs(
            &lookup,
            "PAGECAST_READY_TIMEOUT_SECS",
            defaults.ready_timeout.map_or(0, |d| d.as_secs()),
        )?;

        let forward_output = parse_bool(
            &lookup,
            "PAGECAST_FORWARD_OUTPUT",
            defaults.forward_output,
        )?;

        Ok(Self {
            worker: WorkerCommand::new(program, script),
            settings: Settings {
                load_images,
                ignore_tls_errors,
            },
            request_timeout: Duration::from_secs(request_timeout_secs),
            ready_timeout: (ready_timeout_secs > 0)
                .then(|| Duration::from_secs(ready_timeout_secs)),
            forward_output,
        })
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            name,
            expected: "a boolean",
            value,
        }),
    }
}

fn parse_secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            name,
            expected: "a whole number of seconds",
            value,
        }),
    }
}
