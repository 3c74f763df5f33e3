//! Table store abstraction
//!
//! Every persistence backend implements [`TableStore`]. The pipeline and the
//! ingestor only ever see `Arc<dyn TableStore + Send + Sync>`.

use crate::adapters::store::view::ViewDefinition;
use crate::domain::{Result, Table, TableName};
use async_trait::async_trait;

/// How [`TableStore::save_table`] treats an existing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop any existing table and recreate it from the given rows
    Replace,
    /// Insert rows into the existing table, creating it if absent
    Append,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Replace => write!(f, "replace"),
            WriteMode::Append => write!(f, "append"),
        }
    }
}

/// Named-table storage
///
/// Column types are inferred from the cells on create. Each call that
/// writes runs in its own transaction.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Short backend name for logs and status output
    fn backend_name(&self) -> &str;

    /// Test the store connection
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Whether a table with this name exists
    async fn table_exists(&self, name: &TableName) -> Result<bool>;

    /// Names of all user tables, sorted
    async fn list_tables(&self) -> Result<Vec<TableName>>;

    /// Reads a whole table
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TableNotFound` if the table does not exist.
    async fn load_table(&self, name: &TableName) -> Result<Table>;

    /// Writes every row of `table`, returning the number of rows written
    ///
    /// # Errors
    ///
    /// In append mode, returns `StoreError::SchemaMismatch` if `table` has a
    /// column the stored table lacks. Stored columns missing from `table`
    /// are filled with NULL.
    async fn save_table(&self, name: &TableName, table: &Table, mode: WriteMode) -> Result<u64>;

    /// Drops a table; dropping a missing table is not an error
    async fn drop_table(&self, name: &TableName) -> Result<()>;

    /// Drops and recreates `view.target` from a filtered projection of
    /// `view.source`, returning the new table's row count
    async fn execute_view(&self, view: &ViewDefinition) -> Result<u64>;

    /// Number of rows in a table
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TableNotFound` if the table does not exist.
    async fn row_count(&self, name: &TableName) -> Result<u64>;
}
