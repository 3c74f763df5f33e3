//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Healthmark using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Healthmark - Health-markers data-quality ETL
#[derive(Parser, Debug)]
#[command(name = "healthmark")]
#[command(version, about, long_about = None)]
#[command(author = "Healthmark Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "healthmark.toml", env = "HEALTHMARK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HEALTHMARK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ETL pipeline once against the source table
    Run(commands::run::RunArgs),

    /// Load CSV files from the data directory into the table store
    Ingest(commands::ingest::IngestArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show pipeline tables and recent runs
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["healthmark", "run"]);
        assert_eq!(cli.config, "healthmark.toml");
        match cli.command {
            Commands::Run(args) => {
                assert!(!args.dry_run);
                assert!(args.source_table.is_none());
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli = Cli::parse_from([
            "healthmark",
            "run",
            "--dry-run",
            "--source-table",
            "markers_2024",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.dry_run);
                assert_eq!(args.source_table.as_deref(), Some("markers_2024"));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["healthmark", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["healthmark", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_ingest() {
        let cli = Cli::parse_from(["healthmark", "ingest", "--data-dir", "incoming"]);
        match cli.command {
            Commands::Ingest(args) => assert_eq!(args.data_dir.as_deref(), Some("incoming")),
            other => panic!("expected ingest, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["healthmark", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["healthmark", "status", "--limit", "3"]);
        match cli.command {
            Commands::Status(args) => assert_eq!(args.limit, 3),
            other => panic!("expected status, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["healthmark", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
