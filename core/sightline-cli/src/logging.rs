//! Logging setup for the `sightline` binary.
//!
//! Human-readable events go to stderr so stdout stays clean for listings and
//! export text. When a data directory is available, the same events are also
//! appended to a daily rolling file under `<data dir>/logs`.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "sightline.log";
const DEBUG_ENV: &str = "SIGHTLINE_DEBUG_LOG";
const FILTER_ENV: &str = "SIGHTLINE_LOG";

/// Installs the global subscriber. Keep the returned guard alive until exit,
/// or buffered file output is lost.
pub fn init(logs_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match logs_dir.map(open_appender) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Some(Err(err)) => {
            eprintln!("sightline: file logging disabled: {}", err);
            (None, None)
        }
        None => (None, None),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("sightline: logging disabled: {}", err);
    }

    guard
}

fn open_appender(logs_dir: &Path) -> std::io::Result<RollingFileAppender> {
    fs_err::create_dir_all(logs_dir)?;
    Ok(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX))
}

fn env_filter() -> EnvFilter {
    if debug_forced(env::var(DEBUG_ENV).ok().as_deref()) {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn debug_forced(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_forced_values() {
        assert!(debug_forced(Some("1")));
        assert!(debug_forced(Some("yes")));
        assert!(!debug_forced(Some("0")));
        assert!(!debug_forced(Some("")));
        assert!(!debug_forced(None));
    }

    #[test]
    fn test_repeated_init_keeps_file_guard() {
        let temp = tempfile::tempdir().unwrap();
        let logs = temp.path().join("logs");
        let first = init(Some(&logs));
        // The global subscriber is already set; the failure is reported, not panicked on.
        let second = init(Some(&logs));
        assert!(first.is_some());
        assert!(second.is_some());
    }

    #[test]
    fn test_open_appender_creates_logs_dir() {
        let temp = tempfile::tempdir().unwrap();
        let logs = temp.path().join("logs");
        assert!(open_appender(&logs).is_ok());
        assert!(logs.is_dir());
    }
}
