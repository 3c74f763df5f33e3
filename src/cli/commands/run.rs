//! Run command implementation
//!
//! This module implements the `run` command, which executes one pass of the
//! ETL pipeline and prints a single status line.

use crate::adapters::store::create_table_store;
use crate::cli::commands::{exit_code_for, EXIT_CONFIG, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::pipeline::{PipelineOrchestrator, RunSummary};
use crate::domain::TableName;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Extract and validate only; skip every write
    #[arg(long)]
    pub dry_run: bool,

    /// Override the source table
    #[arg(long, value_name = "NAME")]
    pub source_table: Option<String>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                println!("ETL failed. Check logs.");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(name) = &self.source_table {
            match TableName::new(name.clone()) {
                Ok(table) => {
                    tracing::info!(source_table = %table, "Overriding source table from CLI");
                    config.pipeline.source_table = table;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Invalid --source-table");
                    println!("ETL failed. Check logs.");
                    return Ok(EXIT_CONFIG);
                }
            }
            if let Err(e) = config.validate() {
                tracing::error!(error = %e, "Configuration validation failed");
                println!("ETL failed. Check logs.");
                return Ok(EXIT_CONFIG);
            }
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        let store = match create_table_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open table store");
                println!("ETL failed. Check logs.");
                return Ok(exit_code_for(&e));
            }
        };

        let summary = PipelineOrchestrator::new(store, &config)
            .with_shutdown(shutdown_signal)
            .run()
            .await;

        println!("{}", status_line(&summary));
        Ok(run_exit_code(&summary))
    }
}

/// One-line outcome printed to stdout
pub fn status_line(summary: &RunSummary) -> String {
    if summary.is_successful() {
        let suffix = if summary.dry_run { ", dry run" } else { "" };
        format!(
            "ETL completed successfully ({} rows processed{suffix})",
            summary.rows_processed
        )
    } else {
        "ETL failed. Check logs.".to_string()
    }
}

/// Exit code for a finished run
pub fn run_exit_code(summary: &RunSummary) -> i32 {
    if summary.is_successful() {
        EXIT_SUCCESS
    } else if summary.interrupted {
        EXIT_INTERRUPTED
    } else {
        summary.error.as_ref().map_or(EXIT_FATAL, exit_code_for)
    }
}
