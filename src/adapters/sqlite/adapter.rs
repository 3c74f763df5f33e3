//! SQLite adapter implementing the TableStore trait

use crate::adapters::sqlite::client::SqliteClient;
use crate::adapters::store::traits::{TableStore, WriteMode};
use crate::adapters::store::view::{quote_ident, ViewDefinition};
use crate::domain::{Cell, ColumnKind, HealthmarkError, Result, StoreError, Table, TableName};
use async_trait::async_trait;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, ToSql};

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Cell::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            Cell::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Cell::Bool(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
        })
    }
}

/// SQLite implementation of [`TableStore`]
pub struct SqliteAdapter {
    client: SqliteClient,
}

impl SqliteAdapter {
    pub fn new(client: SqliteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableStore for SqliteAdapter {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn test_connection(&self) -> Result<()> {
        self.client
            .with_connection(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(())).map_err(|e| {
                    HealthmarkError::Store(StoreError::ConnectionFailed(format!(
                        "Connection test failed: {e}"
                    )))
                })
            })
            .await?;
        tracing::debug!(path = %self.client.path(), "SQLite connection test successful");
        Ok(())
    }

    async fn table_exists(&self, name: &TableName) -> Result<bool> {
        let name = name.clone();
        self.client
            .with_connection(move |conn| table_exists(conn, name.as_str()))
            .await
    }

    async fn list_tables(&self) -> Result<Vec<TableName>> {
        self.client
            .with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master \
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                // Tables created outside Healthmark may not be valid names; skip them
                Ok(names
                    .into_iter()
                    .filter_map(|n| TableName::new(n).ok())
                    .collect())
            })
            .await
    }

    async fn load_table(&self, name: &TableName) -> Result<Table> {
        let name = name.clone();
        let table = self
            .client
            .with_connection(move |conn| load_table(conn, name.as_str()))
            .await?;
        tracing::debug!(rows = table.len(), columns = table.columns().len(), "Loaded table");
        Ok(table)
    }

    async fn save_table(&self, name: &TableName, table: &Table, mode: WriteMode) -> Result<u64> {
        let name = name.clone();
        let table = table.clone();
        let written = self
            .client
            .with_connection(move |conn| save_table(conn, name.as_str(), &table, mode))
            .await?;
        tracing::debug!(rows = written, mode = %mode, "Saved table");
        Ok(written)
    }

    async fn drop_table(&self, name: &TableName) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(name.as_str()));
        self.client
            .with_connection(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await
    }

    async fn execute_view(&self, view: &ViewDefinition) -> Result<u64> {
        let view = view.clone();
        self.client
            .with_connection(move |conn| execute_view(conn, &view))
            .await
    }

    async fn row_count(&self, name: &TableName) -> Result<u64> {
        let name = name.clone();
        self.client
            .with_connection(move |conn| {
                if !table_exists(conn, name.as_str())? {
                    return Err(StoreError::TableNotFound(name.to_string()).into());
                }
                count_rows(conn, name.as_str())
            })
            .await
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn count_rows(conn: &Connection, name: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
        [],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

fn table_columns(conn: &Connection, name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(name)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn load_table(conn: &Connection, name: &str) -> Result<Table> {
    if !table_exists(conn, name)? {
        return Err(StoreError::TableNotFound(name.to_string()).into());
    }

    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();
    let mut table = Table::new(columns)?;

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            let cell = match row.get_ref(i)? {
                ValueRef::Null => Cell::Null,
                ValueRef::Integer(v) => Cell::Integer(v),
                ValueRef::Real(v) => Cell::Real(v),
                ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(_) => {
                    return Err(StoreError::UnsupportedType(format!(
                        "BLOB value in {name}.{}",
                        table.columns()[i]
                    ))
                    .into())
                }
            };
            cells.push(cell);
        }
        table.push_row(cells)?;
    }
    Ok(table)
}

fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer | ColumnKind::Boolean => "INTEGER",
        ColumnKind::Real => "REAL",
        ColumnKind::Text => "TEXT",
    }
}

fn create_table_sql(name: &str, table: &Table) -> String {
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} {}", quote_ident(c), sql_type(table.column_kind(i))))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_ident(name), columns)
}

fn insert_sql(name: &str, columns: &[String]) -> String {
    let names = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        names,
        placeholders
    )
}

/// Maps a failed write, keeping busy/locked errors retryable
fn write_error(name: &str, err: rusqlite::Error) -> HealthmarkError {
    match HealthmarkError::from(err) {
        HealthmarkError::Store(StoreError::QueryFailed(msg)) => {
            StoreError::WriteFailed(format!("{name}: {msg}")).into()
        }
        other => other,
    }
}

fn save_table(conn: &mut Connection, name: &str, table: &Table, mode: WriteMode) -> Result<u64> {
    if table.columns().is_empty() {
        return Err(StoreError::WriteFailed(format!("{name}: table has no columns")).into());
    }

    let tx = conn.transaction().map_err(|e| write_error(name, e))?;

    let create = match mode {
        WriteMode::Replace => {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))
                .map_err(|e| write_error(name, e))?;
            true
        }
        WriteMode::Append => {
            if table_exists(&tx, name)? {
                let existing = table_columns(&tx, name)?;
                let unknown: Vec<&str> = table
                    .columns()
                    .iter()
                    .filter(|c| !existing.contains(c))
                    .map(String::as_str)
                    .collect();
                if !unknown.is_empty() {
                    return Err(StoreError::SchemaMismatch(format!(
                        "{name} has no column(s) {}",
                        unknown.join(", ")
                    ))
                    .into());
                }
                false
            } else {
                true
            }
        }
    };

    if create {
        tx.execute_batch(&create_table_sql(name, table))
            .map_err(|e| write_error(name, e))?;
    }

    {
        let mut stmt = tx
            .prepare(&insert_sql(name, table.columns()))
            .map_err(|e| write_error(name, e))?;
        for row in table.rows() {
            stmt.execute(rusqlite::params_from_iter(row.iter()))
                .map_err(|e| write_error(name, e))?;
        }
    }

    tx.commit().map_err(|e| write_error(name, e))?;
    Ok(table.len() as u64)
}

fn execute_view(conn: &mut Connection, view: &ViewDefinition) -> Result<u64> {
    let target = view.target.as_str();
    if !table_exists(conn, view.source.as_str())? {
        return Err(StoreError::TableNotFound(view.source.to_string()).into());
    }

    let tx = conn.transaction().map_err(|e| write_error(target, e))?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {}; CREATE TABLE {} AS {};",
        quote_ident(target),
        quote_ident(target),
        view.to_select_sql()
    ))
    .map_err(|e| write_error(target, e))?;
    let rows = count_rows(&tx, target)?;
    tx.commit().map_err(|e| write_error(target, e))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::view::RowFilter;
    use crate::config::schema::SqliteConfig;

    async fn store() -> SqliteAdapter {
        let client = SqliteClient::new(SqliteConfig {
            path: ":memory:".to_string(),
            busy_timeout_ms: 1000,
        })
        .await
        .unwrap();
        SqliteAdapter::new(client)
    }

    fn name(s: &str) -> TableName {
        TableName::new(s).unwrap()
    }

    fn markers() -> Table {
        Table::with_rows(
            vec!["id".to_string(), "LDL".to_string(), "Condition".to_string()],
            vec![
                vec![Cell::Integer(1), Cell::Real(120.5), "healthy".into()],
                vec![Cell::Integer(2), Cell::Null, "Diabetes".into()],
                vec![Cell::Integer(3), Cell::Real(95.0), Cell::Null],
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_replace_then_load() {
        let store = store().await;
        let written = store
            .save_table(&name("markers"), &markers(), WriteMode::Replace)
            .await
            .unwrap();
        assert_eq!(written, 3);

        let loaded = store.load_table(&name("markers")).await.unwrap();
        assert_eq!(loaded, markers());
    }

    #[tokio::test]
    async fn test_replace_discards_previous_rows() {
        let store = store().await;
        store
            .save_table(&name("markers"), &markers(), WriteMode::Replace)
            .await
            .unwrap();
        store
            .save_table(&name("markers"), &markers(), WriteMode::Replace)
            .await
            .unwrap();
        assert_eq!(store.row_count(&name("markers")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_append_accumulates() {
        let store = store().await;
        store
            .save_table(&name("raw"), &markers(), WriteMode::Append)
            .await
            .unwrap();
        store
            .save_table(&name("raw"), &markers(), WriteMode::Append)
            .await
            .unwrap();
        assert_eq!(store.row_count(&name("raw")).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_append_rejects_unknown_column() {
        let store = store().await;
        store
            .save_table(&name("raw"), &markers(), WriteMode::Append)
            .await
            .unwrap();

        let wider = Table::with_rows(
            vec!["id".to_string(), "HDL".to_string()],
            vec![vec![Cell::Integer(9), Cell::Real(50.0)]],
        )
        .unwrap();
        let err = store
            .save_table(&name("raw"), &wider, WriteMode::Append)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HealthmarkError::Store(StoreError::SchemaMismatch(_))
        ));
        assert_eq!(store.row_count(&name("raw")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_append_fills_missing_columns_with_null() {
        let store = store().await;
        store
            .save_table(&name("raw"), &markers(), WriteMode::Append)
            .await
            .unwrap();
        let narrow = markers().project(&["id".to_string()]).unwrap();
        store
            .save_table(&name("raw"), &narrow, WriteMode::Append)
            .await
            .unwrap();

        let loaded = store.load_table(&name("raw")).await.unwrap();
        assert_eq!(loaded.len(), 6);
        assert_eq!(loaded.rows()[5][1], Cell::Null);
    }

    #[tokio::test]
    async fn test_bools_stored_as_integers() {
        let store = store().await;
        let flags = Table::with_rows(
            vec!["flag".to_string()],
            vec![vec![Cell::Bool(true)], vec![Cell::Bool(false)]],
        )
        .unwrap();
        store
            .save_table(&name("flags"), &flags, WriteMode::Replace)
            .await
            .unwrap();
        let loaded = store.load_table(&name("flags")).await.unwrap();
        assert_eq!(loaded.rows()[0][0], Cell::Integer(1));
        assert_eq!(loaded.rows()[1][0], Cell::Integer(0));
    }

    #[tokio::test]
    async fn test_missing_table_errors() {
        let store = store().await;
        let err = store.load_table(&name("absent")).await.unwrap_err();
        assert!(matches!(
            err,
            HealthmarkError::Store(StoreError::TableNotFound(_))
        ));
        assert!(store.row_count(&name("absent")).await.is_err());
        assert!(!store.table_exists(&name("absent")).await.unwrap());
        // Dropping a missing table is fine
        assert!(store.drop_table(&name("absent")).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let store = store().await;
        for t in ["zeta", "Alpha", "mid"] {
            store
                .save_table(&name(t), &markers(), WriteMode::Replace)
                .await
                .unwrap();
        }
        let tables: Vec<String> = store
            .list_tables()
            .await
            .unwrap()
            .into_iter()
            .map(TableName::into_inner)
            .collect();
        assert_eq!(tables, vec!["Alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_execute_view_rebuilds_target() {
        let store = store().await;
        let scored = Table::with_rows(
            vec!["LDL".to_string(), "quality_score".to_string()],
            vec![
                vec![Cell::Real(100.0), Cell::Real(100.0)],
                vec![Cell::Real(600.0), Cell::Real(70.0)],
                vec![Cell::Real(110.0), Cell::Real(80.0)],
            ],
        )
        .unwrap();
        store
            .save_table(&name("curated"), &scored, WriteMode::Replace)
            .await
            .unwrap();

        let view = ViewDefinition {
            target: name("analytics"),
            source: name("curated"),
            columns: vec!["LDL".to_string()],
            filter: RowFilter::AtLeast {
                column: "quality_score".to_string(),
                threshold: 80.0,
            },
        };
        assert_eq!(store.execute_view(&view).await.unwrap(), 2);
        // Second run replaces rather than accumulates
        assert_eq!(store.execute_view(&view).await.unwrap(), 2);

        let analytics = store.load_table(&name("analytics")).await.unwrap();
        assert_eq!(analytics.columns(), &["LDL".to_string()]);
    }

    #[tokio::test]
    async fn test_quoted_names_round_trip() {
        let store = store().await;
        let table = Table::with_rows(
            vec!["odd \"col\"".to_string()],
            vec![vec![Cell::Text("x".to_string())]],
        )
        .unwrap();
        store
            .save_table(&name("lab results"), &table, WriteMode::Replace)
            .await
            .unwrap();
        let loaded = store.load_table(&name("lab results")).await.unwrap();
        assert_eq!(loaded, table);
    }
}
