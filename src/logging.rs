//! Logging infrastructure for GPO settings reconciliation
//!
//! This module sets up file-based logging to GpoSettings.log in a caller-chosen directory.

use crate::error::{AppError, AppResult};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "GpoSettings.log";

/// Initialize logging to GpoSettings.log in `log_dir`.
///
/// Returns a guard that must be kept alive for the duration of the program
/// to ensure all logs are flushed to disk. Fails if a global subscriber is
/// already installed.
pub fn init_logging(log_dir: &Path) -> AppResult<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
        )
        .try_init()
        .map_err(|e| AppError::GpoError(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_writes_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init_logging(&log_dir).unwrap();
        tracing::warn!(gpo = "Custom_WindowsUpdate", "logging test entry");
        drop(guard);

        let contents = std::fs::read_to_string(log_dir.join(LOG_FILE_NAME)).unwrap();
        assert!(contents.contains("logging test entry"));

        // A second global subscriber is refused instead of panicking
        assert!(init_logging(&log_dir).is_err());
    }
}
