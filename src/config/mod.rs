//! Configuration management for Healthmark.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Healthmark uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `HEALTHMARK_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use healthmark::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("healthmark.toml")?;
//!
//! println!("Store: {}", config.store_target);
//! println!("Source table: {}", config.pipeline.source_table);
//! println!("Markers checked: {}", config.validation.markers.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run switch
//! - [`StoreTarget`] - Which table store backend to use
//! - [`SqliteConfig`] / [`PostgreSQLConfig`] - Backend connection settings
//! - [`IngestConfig`] - CSV directory, extensions and delimiter
//! - [`PipelineConfig`] - Table names, version tag, threshold and retry policy
//! - [`ValidationConfig`] - Range catalog, categorical columns, score weights
//! - [`LoggingConfig`] - Console and rolling file logging
//!
//! # Example Configuration
//!
//! ```toml
//! store_target = "postgresql"
//!
//! [postgresql]
//! connection_string = "${HEALTHMARK_PG_URL}"
//! ssl_mode = "require"
//!
//! [pipeline]
//! source_table = "Health_markers_dataset"
//! quality_threshold = 80
//!
//! [[validation.markers]]
//! name = "Blood_glucose"
//! min = 40
//! max = 500
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, HealthmarkConfig, IngestConfig, LoggingConfig, PipelineConfig,
    PostgreSQLConfig, QualityWeights, RetryConfig, SqliteConfig, StoreTarget, ValidationConfig,
    ZeroIqrPolicy,
};
pub use secret::{redact_connection_string, secret_string, SecretString, SecretValue};
