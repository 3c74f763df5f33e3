//! Status command implementation
//!
//! This module implements the `status` command, which shows the pipeline
//! tables and the most recent entries of the run metadata log.

use crate::adapters::store::{create_table_store, TableStore};
use crate::cli::commands::{exit_code_for, EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::pipeline::MetadataLog;
use crate::domain::TableName;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of recent runs to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking pipeline status");

        println!("📊 Pipeline Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let store = match create_table_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to connect to table store");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let p = &config.pipeline;
        println!("{:<30} {:<12} {:>10}", "Table", "Role", "Rows");
        println!("{}", "-".repeat(54));
        for (table, role) in [
            (&p.source_table, "source"),
            (&p.raw_table, "raw"),
            (&p.curated_table, "curated"),
            (&p.analytics_table, "analytics"),
            (&p.metadata_table, "metadata"),
        ] {
            let rows = match describe_table(store.as_ref(), table).await {
                Ok(rows) => rows,
                Err(e) => {
                    println!("❌ Failed to inspect {table}");
                    println!("   Error: {e}");
                    return Ok(exit_code_for(&e));
                }
            };
            println!("{:<30} {:<12} {:>10}", table.as_str(), role, rows);
        }
        println!();

        let log = MetadataLog::new(store, p.metadata_table.clone());
        let history = match log.history(self.limit).await {
            Ok(h) => h,
            Err(e) => {
                println!("❌ Failed to read run history");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        if history.is_empty() {
            println!("No run history found.");
            println!("Run 'healthmark run' to process the source table.");
            return Ok(EXIT_SUCCESS);
        }

        println!("Last {} run(s):", history.len());
        println!();
        println!(
            "{:<38} {:<21} {:>8} {:<10} {:<25}",
            "Run ID", "Timestamp", "Rows", "Version", "Source"
        );
        println!("{}", "-".repeat(106));
        for entry in history {
            let run_id = entry
                .run_id
                .map_or_else(|| "-".to_string(), |id| id.to_string());
            println!(
                "{:<38} {:<21} {:>8} {:<10} {:<25}",
                run_id,
                entry.run_timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.rows_processed,
                entry.pipeline_version,
                entry.source_table
            );
        }

        println!();
        Ok(EXIT_SUCCESS)
    }
}

/// Row count for display, or "missing" when the table does not exist
async fn describe_table(
    store: &(dyn TableStore + Send + Sync),
    table: &TableName,
) -> crate::domain::Result<String> {
    if store.table_exists(table).await? {
        Ok(store.row_count(table).await?.to_string())
    } else {
        Ok("missing".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{SqliteAdapter, SqliteClient};
    use crate::adapters::store::WriteMode;
    use crate::config::SqliteConfig;
    use crate::domain::{Cell, Table};
    use std::sync::Arc;

    #[test]
    fn test_status_args_defaults() {
        let args = StatusArgs { limit: 10 };
        assert_eq!(args.limit, 10);
    }

    #[tokio::test]
    async fn test_describe_table() {
        let config = SqliteConfig {
            path: ":memory:".to_string(),
            ..SqliteConfig::default()
        };
        let client = SqliteClient::new(config).await.unwrap();
        let store: Arc<dyn TableStore + Send + Sync> = Arc::new(SqliteAdapter::new(client));
        let name = TableName::new("health_markers_curated").unwrap();

        assert_eq!(describe_table(store.as_ref(), &name).await.unwrap(), "missing");

        let table = Table::with_rows(
            vec!["Patient_ID".into()],
            vec![vec![Cell::Integer(1)], vec![Cell::Integer(2)]],
        )
        .unwrap();
        store.save_table(&name, &table, WriteMode::Replace).await.unwrap();

        assert_eq!(describe_table(store.as_ref(), &name).await.unwrap(), "2");
    }
}
