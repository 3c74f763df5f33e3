//! Append-only run metadata log

use crate::adapters::store::{TableStore, WriteMode};
use crate::domain::{Cell, HealthmarkError, Result, RunId, StoreError, Table, TableName};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;

const COLUMNS: [&str; 5] = [
    "run_id",
    "run_timestamp",
    "rows_processed",
    "pipeline_version",
    "source_table",
];

/// One row of the metadata log
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub run_id: Option<RunId>,
    pub run_timestamp: DateTime<Utc>,
    pub rows_processed: u64,
    pub pipeline_version: String,
    pub source_table: String,
}

impl RunMetadata {
    pub fn new(
        run_id: RunId,
        rows_processed: u64,
        pipeline_version: impl Into<String>,
        source_table: &TableName,
    ) -> Self {
        Self {
            run_id: Some(run_id),
            run_timestamp: Utc::now(),
            rows_processed,
            pipeline_version: pipeline_version.into(),
            source_table: source_table.to_string(),
        }
    }

    /// Single-row table in the log's column layout
    pub fn to_table(&self) -> Result<Table> {
        Table::with_rows(
            COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![vec![
                self.run_id
                    .map_or(Cell::Null, |id| Cell::Text(id.to_string())),
                Cell::Text(self.run_timestamp.to_rfc3339()),
                Cell::Integer(i64::try_from(self.rows_processed).unwrap_or(i64::MAX)),
                Cell::Text(self.pipeline_version.clone()),
                Cell::Text(self.source_table.clone()),
            ]],
        )
    }

    /// Reads a stored row; rows without a readable timestamp are skipped
    fn from_row(table: &Table, row: &[Cell]) -> Option<Self> {
        let get = |name: &str| table.column_index(name).map(|idx| &row[idx]);

        let run_timestamp = get("run_timestamp")
            .and_then(Cell::to_text)
            .and_then(|s| parse_timestamp(&s))?;

        Some(Self {
            run_id: get("run_id")
                .and_then(Cell::as_text)
                .and_then(|s| RunId::from_str(s).ok()),
            run_timestamp,
            rows_processed: get("rows_processed")
                .and_then(Cell::as_i64)
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(0),
            pipeline_version: get("pipeline_version")
                .and_then(Cell::to_text)
                .unwrap_or_default(),
            source_table: get("source_table")
                .and_then(Cell::to_text)
                .unwrap_or_default(),
        })
    }
}

/// Accepts RFC 3339 and the naive `YYYY-MM-DD HH:MM:SS[.f]` form, read as UTC
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The metadata table as a log: rows are appended, never updated
pub struct MetadataLog {
    store: Arc<dyn TableStore + Send + Sync>,
    table: TableName,
}

impl MetadataLog {
    pub fn new(store: Arc<dyn TableStore + Send + Sync>, table: TableName) -> Self {
        Self { store, table }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Appends one entry
    pub async fn append(&self, entry: &RunMetadata) -> Result<()> {
        self.store
            .save_table(&self.table, &entry.to_table()?, WriteMode::Append)
            .await?;
        tracing::debug!(table = %self.table, rows_processed = entry.rows_processed, "Recorded run metadata");
        Ok(())
    }

    /// Most recent entries first; an absent log is empty
    pub async fn history(&self, limit: usize) -> Result<Vec<RunMetadata>> {
        let table = match self.store.load_table(&self.table).await {
            Ok(table) => table,
            Err(HealthmarkError::Store(StoreError::TableNotFound(_))) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries: Vec<RunMetadata> = table
            .rows()
            .iter()
            .rev()
            .filter_map(|row| RunMetadata::from_row(&table, row))
            .collect();
        // Stable sort: equal timestamps keep the later append first
        entries.sort_by(|a, b| b.run_timestamp.cmp(&a.run_timestamp));
        entries.truncate(limit);
        Ok(entries)
    }
}
