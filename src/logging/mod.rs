//! Logging and observability
//!
//! Structured logging through `tracing`, with a stderr console layer and an
//! optional rotating file layer. The macros below keep stage and error
//! events uniform across the pipeline and ingestion.
//!
//! # Example
//!
//! ```no_run
//! use healthmark::logging::init_logging;
//! use healthmark::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(table = "Health_markers_dataset", "Extracting");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use healthmark::log_stage_start;
///
/// log_stage_start!("Extracting", "Health_markers_dataset");
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $table:expr) => {
        tracing::info!(stage = %$stage, table = %$table, "Stage started");
    };
}

/// Log the completion of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use healthmark::log_stage_complete;
/// use std::time::Duration;
///
/// log_stage_complete!("PublishingCurated", 1200, Duration::from_millis(85));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            stage = %$stage,
            rows = $rows,
            duration_ms = $duration.as_millis() as u64,
            "Stage completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use healthmark::log_error_with_context;
/// use healthmark::domain::HealthmarkError;
///
/// let error = HealthmarkError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = %$context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use healthmark::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "database is locked");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
