//! Table store factory
//!
//! Builds the configured backend behind the [`TableStore`] trait.

use crate::adapters::postgresql::{PostgreSQLAdapter, PostgreSQLClient};
use crate::adapters::sqlite::{SqliteAdapter, SqliteClient};
use crate::adapters::store::traits::TableStore;
use crate::config::schema::{HealthmarkConfig, StoreTarget};
use crate::domain::{HealthmarkError, Result};
use std::sync::Arc;

/// Create a table store based on the configuration
///
/// # Errors
///
/// Returns `HealthmarkError::Configuration` if the selected backend has no
/// configuration section, or a store error if the backend cannot be opened.
pub async fn create_table_store(
    config: &HealthmarkConfig,
) -> Result<Arc<dyn TableStore + Send + Sync>> {
    match config.store_target {
        StoreTarget::Sqlite => {
            tracing::info!(path = %config.sqlite.path, "Creating SQLite table store");
            let client = SqliteClient::new(config.sqlite.clone()).await?;
            Ok(Arc::new(SqliteAdapter::new(client)) as Arc<dyn TableStore + Send + Sync>)
        }
        StoreTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                HealthmarkError::Configuration(
                    "postgresql configuration is required when store_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL table store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            Ok(Arc::new(PostgreSQLAdapter::new(client)) as Arc<dyn TableStore + Send + Sync>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_builds_in_memory_sqlite() {
        let mut config = HealthmarkConfig::default();
        config.sqlite.path = ":memory:".to_string();

        let store = create_table_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "sqlite");
        assert!(store.test_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_factory_requires_postgresql_section() {
        let config = HealthmarkConfig {
            store_target: StoreTarget::PostgreSQL,
            ..HealthmarkConfig::default()
        };
        let result = create_table_store(&config).await;
        assert!(matches!(result, Err(HealthmarkError::Configuration(_))));
    }
}
