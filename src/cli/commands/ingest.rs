//! Ingest command implementation
//!
//! Loads every CSV file in the data directory into the table store.

use crate::adapters::store::create_table_store;
use crate::cli::commands::{
    exit_code_for, EXIT_CONFIG, EXIT_INTERRUPTED, EXIT_PARTIAL, EXIT_SUCCESS,
};
use crate::config::load_config;
use crate::core::ingest::{IngestReport, Ingestor};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Override the directory scanned for input files
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<String>,
}

impl IngestArgs {
    /// Execute the ingest command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting ingest command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(dir) = &self.data_dir {
            tracing::info!(data_dir = %dir, "Overriding data directory from CLI");
            config.ingest.data_dir = dir.clone();
        }

        let store = match create_table_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open table store");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let ingestor = Ingestor::new(store, config.ingest.clone(), config.pipeline.retry.clone())
            .with_shutdown(shutdown_signal);

        let report = match ingestor.ingest_all().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Ingestion failed");
                println!("❌ Ingestion failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_report(&report);
        Ok(ingest_exit_code(&report))
    }
}

fn print_report(report: &IngestReport) {
    println!(
        "Ingestion completed in {:.2} minutes ({} loaded, {} failed)",
        report.elapsed_minutes(),
        report.succeeded.len(),
        report.failed.len()
    );
    for table in &report.succeeded {
        println!("  ✅ {} -> {} ({} rows)", table.file_name, table.table, table.rows);
    }
    for failure in &report.failed {
        println!("  ❌ {}: {}", failure.file_name, failure.reason);
    }
    if report.interrupted {
        println!("  ⚠️  Interrupted, {} file(s) not loaded", report.skipped);
    }
}

/// Exit code for a finished ingestion batch
pub fn ingest_exit_code(report: &IngestReport) -> i32 {
    if report.interrupted {
        EXIT_INTERRUPTED
    } else if !report.failed.is_empty() {
        EXIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}
