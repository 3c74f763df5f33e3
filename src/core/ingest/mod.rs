//! CSV ingestion into the table store
//!
//! Every matching file in the data directory is loaded into a table named
//! after the file stem, replacing any previous table of that name. A file
//! that fails is logged and recorded in the [`IngestReport`]; the rest of
//! the batch continues.

pub mod reader;
pub mod scanner;

pub use reader::read_csv_table;
pub use scanner::scan_directory;

use crate::adapters::store::{TableStore, WriteMode};
use crate::config::{IngestConfig, RetryConfig};
use crate::core::pipeline::retry::retry_idempotent;
use crate::domain::{HealthmarkError, IngestFailure, Result, TableName};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// A file that was loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedTable {
    pub file_name: String,
    pub table: TableName,
    pub rows: u64,
}

/// Outcome of an ingestion batch
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub succeeded: Vec<IngestedTable>,
    pub failed: Vec<IngestFailure>,
    /// Files left unread because a shutdown signal arrived
    pub skipped: usize,
    pub interrupted: bool,
    pub duration: Duration,
}

impl IngestReport {
    /// True when every file was loaded
    pub fn is_successful(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }

    pub fn total_files(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped
    }

    pub fn total_rows(&self) -> u64 {
        self.succeeded.iter().map(|t| t.rows).sum()
    }

    /// Elapsed time in minutes, rounded to 2 decimals
    pub fn elapsed_minutes(&self) -> f64 {
        (self.duration.as_secs_f64() / 60.0 * 100.0).round() / 100.0
    }
}

/// Loads input files into the store
pub struct Ingestor {
    store: Arc<dyn TableStore + Send + Sync>,
    config: IngestConfig,
    retry: RetryConfig,
    shutdown_signal: Option<watch::Receiver<bool>>,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn TableStore + Send + Sync>,
        config: IngestConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            config,
            retry,
            shutdown_signal: None,
        }
    }

    /// Stops the batch between files once the receiver reads `true`
    pub fn with_shutdown(mut self, shutdown_signal: watch::Receiver<bool>) -> Self {
        self.shutdown_signal = Some(shutdown_signal);
        self
    }

    /// Ingests every matching file in the configured data directory
    ///
    /// # Errors
    ///
    /// Fails only when the directory cannot be scanned or the delimiter is
    /// invalid. Per-file failures land in the report.
    pub async fn ingest_all(&self) -> Result<IngestReport> {
        let start = Instant::now();
        let dir = PathBuf::from(&self.config.data_dir);
        let files = scan_directory(&dir, &self.config.extensions)?;

        tracing::info!(
            dir = %dir.display(),
            files = files.len(),
            backend = self.store.backend_name(),
            "Starting ingestion"
        );

        let mut report = IngestReport::default();
        for (i, path) in files.iter().enumerate() {
            if self.shutdown_requested() {
                tracing::warn!(remaining = files.len() - i, "Shutdown requested, stopping ingestion");
                report.interrupted = true;
                report.skipped = files.len() - i;
                break;
            }

            let file_name = display_name(path);
            match self.ingest_file(path).await {
                Ok((table, rows)) => {
                    tracing::info!(file = %file_name, table = %table, rows, "Ingested file");
                    report.succeeded.push(IngestedTable {
                        file_name,
                        table,
                        rows,
                    });
                }
                Err(e) => {
                    tracing::error!(file = %file_name, error = %e, "Failed to ingest file");
                    report.failed.push(IngestFailure::new(file_name, e.to_string()));
                }
            }
        }

        report.duration = start.elapsed();
        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped,
            minutes = report.elapsed_minutes(),
            "Ingestion completed"
        );
        Ok(report)
    }

    /// Loads one file, replacing the table named after its stem
    ///
    /// Returns the table name and the number of rows written.
    pub async fn ingest_file(&self, path: &Path) -> Result<(TableName, u64)> {
        let table_name = TableName::from_file_stem(path).map_err(HealthmarkError::Ingestion)?;
        let delimiter = self
            .config
            .delimiter_byte()
            .map_err(HealthmarkError::Configuration)?;

        let owned = path.to_path_buf();
        let table = tokio::task::spawn_blocking(move || read_csv_table(&owned, delimiter))
            .await
            .map_err(|e| HealthmarkError::Other(format!("CSV reader task failed: {e}")))??;

        let rows = retry_idempotent(&self.retry, "save_table", || {
            self.store.save_table(&table_name, &table, WriteMode::Replace)
        })
        .await?;

        Ok((table_name, rows))
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_signal
            .as_ref()
            .is_some_and(|rx| *rx.borrow())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
