//! Logging configuration using tracing

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "CALLTRAIL_LOG";

/// Filter used when `CALLTRAIL_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "calltrail=info,calltrail_core=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/calltrail/logs/`
/// Log level is controlled by the `CALLTRAIL_LOG` environment variable.
///
/// # Examples
/// ```bash
/// CALLTRAIL_LOG=calltrail_core=trace cargo test
/// ```
pub fn init() -> Result<()> {
    init_in(&get_log_directory())
}

/// Initialize logging into `log_dir`, creating it if needed
///
/// Fails with [`Error::Logging`] if a global subscriber is already installed.
pub fn init_in(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir).map_err(|e| Error::log_directory(log_dir, e))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "calltrail.log");

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::logging(e.to_string()))?;

    tracing::info!("calltrail logging started");
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("calltrail").join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_directory_is_calltrail_logs() {
        assert!(get_log_directory().ends_with("calltrail/logs"));
    }

    #[test]
    fn test_init_in_uncreatable_directory_keeps_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let err = init_in(&blocker.join("logs")).unwrap_err();
        match err {
            Error::LogDirectory { path, source } => {
                assert_eq!(path, blocker.join("logs"));
                assert!(source.raw_os_error().is_some());
            }
            other => panic!("expected LogDirectory, got {other:?}"),
        }
    }

    #[test]
    fn test_second_init_is_logging_error() {
        let dir = tempfile::tempdir().unwrap();
        // The first call may or may not win the global subscriber slot; the
        // second can never succeed.
        let _ = init_in(dir.path());
        let err = init_in(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Logging { .. }), "got {err:?}");
        assert!(dir.path().exists());
    }
}
