//! Structured logging setup using tracing
//!
//! Console output goes to stderr so stdout only carries the one-line status
//! messages the CLI prints. File output is optional, rotated, and either
//! JSON or plain text.
//!
//! # Example
//!
//! ```no_run
//! use healthmark::logging::init_logging;
//! use healthmark::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//! // Keep _guard alive for the duration of the program
//! ```

use crate::config::LoggingConfig;
use crate::domain::{HealthmarkError, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the non-blocking file writer alive so buffered logs get flushed
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `log_level_str` when set.
///
/// # Errors
///
/// Returns `HealthmarkError::Configuration` for an unknown level or an
/// unusable log directory, and `HealthmarkError::Other` if a global
/// subscriber is already installed.
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_level = parse_log_level(log_level_str)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("healthmark={log_level}")));

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter.clone());
    layers.push(console_layer.boxed());

    let file_guard = if config.local_enabled {
        let rotation = parse_rotation(&config.local_rotation)?;

        std::fs::create_dir_all(&config.local_path).map_err(|e| {
            HealthmarkError::Configuration(format!(
                "Failed to create log directory {}: {}",
                config.local_path, e
            ))
        })?;

        let file_appender =
            RollingFileAppender::new(rotation, &config.local_path, &config.file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = if config.format == "text" {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(non_blocking)
                .with_filter(env_filter)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(non_blocking)
                .with_filter(env_filter)
                .boxed()
        };

        layers.push(file_layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| HealthmarkError::Other(format!("Failed to install logger: {e}")))?;

    tracing::debug!(
        local_enabled = config.local_enabled,
        local_path = %config.local_path,
        format = %config.format,
        "Logging initialized"
    );

    Ok(LoggingGuard::new(file_guard))
}

/// Parse log level from string
fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(HealthmarkError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}

fn parse_rotation(rotation: &str) -> Result<Rotation> {
    match rotation {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "never" => Ok(Rotation::NEVER),
        other => Err(HealthmarkError::Configuration(format!(
            "Invalid log rotation: {other}. Must be one of: daily, hourly, never"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("trace", Level::TRACE)]
    #[test_case("DEBUG", Level::DEBUG)]
    #[test_case("Info", Level::INFO)]
    #[test_case("warn", Level::WARN)]
    #[test_case("error", Level::ERROR)]
    fn test_log_levels(input: &str, expected: Level) {
        assert_eq!(parse_log_level(input).unwrap(), expected);
    }

    #[test_case("verbose")]
    #[test_case("")]
    fn test_unknown_log_level(input: &str) {
        assert!(matches!(
            parse_log_level(input),
            Err(HealthmarkError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_rotation() {
        assert!(parse_rotation("daily").is_ok());
        assert!(parse_rotation("hourly").is_ok());
        assert!(parse_rotation("never").is_ok());
        assert!(matches!(
            parse_rotation("weekly"),
            Err(HealthmarkError::Configuration(_))
        ));
    }

    #[test]
    fn test_console_only_guard_holds_no_writer() {
        let guard = LoggingGuard::new(None);
        assert!(guard._file_guard.is_none());
    }
}
