//! Logging setup for hosts embedding the core.
//!
//! The crate itself only emits `tracing` events; a host calls [`init`]
//! once at startup to install a subscriber. Events go to a daily-rotating
//! file under the given directory and, at info level and up, to stdout.
//! When the log directory cannot be created the subscriber degrades to
//! stdout only instead of failing startup. The filter comes from
//! `DORSAL_LOG`, then `RUST_LOG`, then a build-type default.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be held for the lifetime of the application.
///
/// Dropping this guard flushes pending file writes.
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Whether events are being written to a log file.
    pub fn file_logging(&self) -> bool {
        self._worker.is_some()
    }
}

/// Install the global subscriber, logging to `log_dir` with the
/// environment-driven filter.
///
/// Calling this more than once leaves the first subscriber in place; the
/// repeat is a no-op, not an error.
pub fn init(log_dir: &Path) -> LoggingGuard {
    init_with_filter(log_dir, None)
}

/// Install the global subscriber with an explicit filter, overriding the
/// environment.
pub fn init_with_filter(log_dir: &Path, filter: Option<&str>) -> LoggingGuard {
    let env_filter = env_filter(filter);

    match file_writer(log_dir) {
        Ok((file, worker)) => {
            // Full stream to the file, info and up mirrored to stdout.
            let writer = std::io::stdout.with_max_level(tracing::Level::INFO).and(file);
            let _ = tracing_subscriber::fmt()
                .with_writer(writer)
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_target(true)
                .try_init();
            LoggingGuard { _worker: Some(worker) }
        }
        Err(e) => {
            eprintln!("Warning: file logging unavailable ({e}), logging to stdout only");
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .try_init();
            LoggingGuard { _worker: None }
        }
    }
}

/// The log directory inside the default data directory.
pub fn default_log_dir() -> PathBuf {
    crate::services::config::default_data_dir().join("logs")
}

fn file_writer(
    log_dir: &Path,
) -> Result<(NonBlocking, WorkerGuard), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("dorsal")
        .filename_suffix("log")
        .build(log_dir)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Resolve the filter: explicit > DORSAL_LOG > RUST_LOG > build default.
fn env_filter(custom: Option<&str>) -> EnvFilter {
    if let Some(filter) = custom {
        return EnvFilter::try_new(filter)
            .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env("DORSAL_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

/// Get the default log filter based on build type.
pub fn default_log_filter() -> &'static str {
    #[cfg(debug_assertions)]
    {
        "debug,dorsal_core=trace,tokio_postgres=warn"
    }
    #[cfg(not(debug_assertions))]
    {
        "info,dorsal_core=info,tokio_postgres=warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_log_dir_and_tolerates_reinit() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");

        let guard = init(&logs);
        assert!(logs.is_dir());
        assert!(guard.file_logging());

        // Second init leaves the installed subscriber alone.
        let _again = init(&logs);
        tracing::info!("logging smoke test");
    }

    #[test]
    fn unwritable_log_dir_degrades_to_stdout() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        // create_dir_all fails because a file sits where the dir should be.
        let guard = init_with_filter(&blocker.join("logs"), Some("info"));
        assert!(!guard.file_logging());
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(default_log_filter()).is_ok());
    }

    #[test]
    fn explicit_filter_beats_environment() {
        let filter = env_filter(Some("warn")).to_string();
        assert_eq!(filter, "warn");
    }
}
