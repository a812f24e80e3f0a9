//! Installs the process-wide `tracing` subscriber. Called exactly once, at
//! binary startup, before any other component logs.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Controls the default filter level when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Normal,
    Debug,
}

/// Initializes the global subscriber. Safe to call once; a second call is a
/// caller bug and returns an error rather than panicking.
///
/// `log_dir` is `Some` when daemonized: stdout/stderr are already redirected
/// to `/dev/null` by then (§4.9), so logging has to go to a file instead.
/// The returned [`WorkerGuard`] must be held for the life of the process —
/// dropping it flushes the non-blocking writer's remaining buffered lines.
pub fn init(verbosity: Verbosity, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, tracing_subscriber::util::TryInitError> {
    let default_level = match verbosity {
        Verbosity::Normal => "info",
        Verbosity::Debug => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, "shore-monitor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            fmt().with_env_filter(filter).with_target(true).try_init()?;
            Ok(None)
        }
    }
}
