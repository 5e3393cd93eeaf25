//! Logging setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trading_core::error::TradingError;

/// How the process logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingOptions {
    /// Filter directive, e.g. `info` or `info,trading_runner=debug`
    pub level: String,
    /// Emit JSON lines on stdout
    pub json: bool,
    /// Also write to a daily-rolling file at this path
    pub file: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Keeps the file writer alive. Drop at exit to flush.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

fn build_filter(level: &str) -> Result<EnvFilter, TradingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| TradingError::Config(format!("invalid log level '{}': {}", level, e)))
}

/// Split a log path into directory and file-name prefix.
fn split_log_path(path: &Path) -> Result<(PathBuf, String), TradingError> {
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TradingError::Config(format!("invalid log file path: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, prefix.to_string()))
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `options.level`.
pub fn setup_logging(options: &LoggingOptions) -> Result<LoggingGuard, TradingError> {
    let filter = build_filter(&options.level)?;

    let (file_layer, file_guard) = match &options.file {
        Some(path) => {
            let (dir, prefix) = split_log_path(path)?;
            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let installed = if options.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    installed.map_err(|e| TradingError::Internal(format!("failed to install logger: {}", e)))?;

    Ok(LoggingGuard { _file: file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert!(EnvFilter::try_new("info,trading_runner=debug").is_ok());
        assert!(build_filter("warn").is_ok());
    }

    #[test]
    fn test_split_log_path() {
        let (dir, prefix) = split_log_path(Path::new("logs/trader.log")).unwrap();
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(prefix, "trader.log");

        let (dir, prefix) = split_log_path(Path::new("trader.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(prefix, "trader.log");

        assert!(split_log_path(Path::new("/")).is_err());
    }
}
