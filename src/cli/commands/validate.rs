//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Healthmark configuration file.

use crate::cli::commands::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::schema::StoreTarget;
use crate::config::{load_config, redact_connection_string};
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);

        match config.store_target {
            StoreTarget::Sqlite => {
                println!("  Store: SQLite");
                println!("  SQLite Path: {}", config.sqlite.path);
            }
            StoreTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Store: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        redact_connection_string(pg_config.connection_string.expose_secret().as_ref())
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                    println!("  SSL Mode: {}", pg_config.ssl_mode);
                }
            }
        }

        let p = &config.pipeline;
        println!("  Data Directory: {}", config.ingest.data_dir);
        println!("  Source Table: {}", p.source_table);
        println!(
            "  Output Tables: {}, {}, {}, {}",
            p.raw_table, p.curated_table, p.analytics_table, p.metadata_table
        );
        println!("  Pipeline Version: {}", p.pipeline_version);
        println!("  Quality Threshold: {}", p.quality_threshold);
        println!("  Markers: {}", config.validation.markers.names().join(", "));
        println!(
            "  Categorical Columns: {}",
            config.validation.categorical_columns.join(", ")
        );
        println!();
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let args = ValidateArgs {};
        let code = args.execute("/nonexistent/healthmark.toml").await.unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nquality_threshold = 75").unwrap();

        let args = ValidateArgs {};
        let code = args
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_invalid_value() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nquality_threshold = 150").unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
