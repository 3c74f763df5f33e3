//! PostgreSQL adapter implementing the TableStore trait
//!
//! Tables live in the connection's current schema. Inserted cells are
//! converted to whatever type the server reports for each target column,
//! so appending to a table created elsewhere works as long as the values fit.

use crate::adapters::postgresql::client::{map_pg_error, PostgreSQLClient};
use crate::adapters::store::traits::{TableStore, WriteMode};
use crate::adapters::store::view::{quote_ident, ViewDefinition};
use crate::domain::{Cell, ColumnKind, HealthmarkError, Result, StoreError, Table, TableName};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{GenericClient, Row};

type SqlParam = Box<dyn ToSql + Sync + Send>;

/// PostgreSQL implementation of [`TableStore`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl TableStore for PostgreSQLAdapter {
    fn backend_name(&self) -> &str {
        "postgresql"
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn table_exists(&self, name: &TableName) -> Result<bool> {
        let conn = self.client.get_connection().await?;
        table_exists(&**conn, name.as_str()).await
    }

    async fn list_tables(&self) -> Result<Vec<TableName>> {
        let conn = self.client.get_connection().await?;
        let rows = conn
            .query(
                "SELECT tablename::text FROM pg_catalog.pg_tables \
                 WHERE schemaname = current_schema() ORDER BY tablename",
                &[],
            )
            .await
            .map_err(|e| map_pg_error("Failed to list tables", e))?;
        Ok(rows
            .iter()
            .filter_map(|row| TableName::new(row.get::<_, String>(0)).ok())
            .collect())
    }

    async fn load_table(&self, name: &TableName) -> Result<Table> {
        let conn = self.client.get_connection().await?;
        if !table_exists(&**conn, name.as_str()).await? {
            return Err(StoreError::TableNotFound(name.to_string()).into());
        }

        let stmt = conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(name.as_str())))
            .await
            .map_err(|e| map_pg_error("Failed to prepare load", e))?;
        let columns: Vec<(String, Type)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), c.type_().clone()))
            .collect();
        let rows = conn
            .query(&stmt, &[])
            .await
            .map_err(|e| map_pg_error("Failed to load table", e))?;

        let mut table = Table::new(columns.iter().map(|(n, _)| n.clone()).collect())?;
        for row in &rows {
            let cells = columns
                .iter()
                .enumerate()
                .map(|(i, (col, ty))| cell_from_row(row, i, ty, col))
                .collect::<Result<Vec<_>>>()?;
            table.push_row(cells)?;
        }

        tracing::debug!(table = %name, rows = table.len(), "Loaded table");
        Ok(table)
    }

    async fn save_table(&self, name: &TableName, table: &Table, mode: WriteMode) -> Result<u64> {
        if table.columns().is_empty() {
            return Err(StoreError::WriteFailed(format!("{name}: table has no columns")).into());
        }

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| map_pg_error("Failed to begin transaction", e))?;
        let target = quote_ident(name.as_str());

        let create = match mode {
            WriteMode::Replace => {
                tx.batch_execute(&format!("DROP TABLE IF EXISTS {target}"))
                    .await
                    .map_err(|e| map_pg_error("Failed to drop table", e))?;
                true
            }
            WriteMode::Append => {
                if table_exists(&*tx, name.as_str()).await? {
                    let existing = table_columns(&*tx, name.as_str()).await?;
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
            tx.batch_execute(&create_table_sql(name.as_str(), table))
                .await
                .map_err(|e| map_pg_error("Failed to create table", e))?;
        }

        let stmt = tx
            .prepare(&insert_sql(name.as_str(), table.columns()))
            .await
            .map_err(|e| map_pg_error("Failed to prepare insert", e))?;
        let param_types = stmt.params().to_vec();

        for row in table.rows() {
            let params = row
                .iter()
                .zip(&param_types)
                .zip(table.columns())
                .map(|((cell, ty), col)| to_param(cell, ty, col))
                .collect::<Result<Vec<SqlParam>>>()?;
            let refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                .collect();
            tx.execute(&stmt, &refs).await.map_err(|e| {
                match map_pg_error(&format!("Failed to insert into {name}"), e) {
                    HealthmarkError::Store(StoreError::QueryFailed(msg)) => {
                        StoreError::WriteFailed(msg).into()
                    }
                    other => other,
                }
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| map_pg_error("Failed to commit", e))?;

        tracing::debug!(table = %name, rows = table.len(), mode = %mode, "Saved table");
        Ok(table.len() as u64)
    }

    async fn drop_table(&self, name: &TableName) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.batch_execute(&format!(
            "DROP TABLE IF EXISTS {}",
            quote_ident(name.as_str())
        ))
        .await
        .map_err(|e| map_pg_error("Failed to drop table", e))
    }

    async fn execute_view(&self, view: &ViewDefinition) -> Result<u64> {
        let mut conn = self.client.get_connection().await?;
        if !table_exists(&**conn, view.source.as_str()).await? {
            return Err(StoreError::TableNotFound(view.source.to_string()).into());
        }

        let target = quote_ident(view.target.as_str());
        let tx = conn
            .transaction()
            .await
            .map_err(|e| map_pg_error("Failed to begin transaction", e))?;
        tx.batch_execute(&format!(
            "DROP TABLE IF EXISTS {target}; CREATE TABLE {target} AS {};",
            view.to_select_sql()
        ))
        .await
        .map_err(|e| map_pg_error(&format!("Failed to build {}", view.target), e))?;
        let rows = count_rows(&*tx, view.target.as_str()).await?;
        tx.commit()
            .await
            .map_err(|e| map_pg_error("Failed to commit", e))?;
        Ok(rows)
    }

    async fn row_count(&self, name: &TableName) -> Result<u64> {
        let conn = self.client.get_connection().await?;
        if !table_exists(&**conn, name.as_str()).await? {
            return Err(StoreError::TableNotFound(name.to_string()).into());
        }
        count_rows(&**conn, name.as_str()).await
    }
}

async fn table_exists<C: GenericClient>(conn: &C, name: &str) -> Result<bool> {
    let row = conn
        .query_one(
            "SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_tables \
             WHERE schemaname = current_schema() AND tablename = $1)",
            &[&name],
        )
        .await
        .map_err(|e| map_pg_error("Failed to check table", e))?;
    Ok(row.get(0))
}

async fn table_columns<C: GenericClient>(conn: &C, name: &str) -> Result<Vec<String>> {
    let rows = conn
        .query(
            "SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 \
             ORDER BY ordinal_position",
            &[&name],
        )
        .await
        .map_err(|e| map_pg_error("Failed to read columns", e))?;
    Ok(rows.iter().map(|r| r.get(0)).collect())
}

async fn count_rows<C: GenericClient>(conn: &C, name: &str) -> Result<u64> {
    let row = conn
        .query_one(&format!("SELECT COUNT(*) FROM {}", quote_ident(name)), &[])
        .await
        .map_err(|e| map_pg_error("Failed to count rows", e))?;
    let count: i64 = row.get(0);
    Ok(u64::try_from(count).unwrap_or(0))
}

fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer => "BIGINT",
        ColumnKind::Real => "DOUBLE PRECISION",
        ColumnKind::Boolean => "BOOLEAN",
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
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        names,
        placeholders
    )
}

fn mismatch(cell: &Cell, ty: &Type, column: &str) -> HealthmarkError {
    StoreError::SchemaMismatch(format!(
        "Value {cell} does not fit column {column} of type {ty}"
    ))
    .into()
}

/// Converts a cell to a parameter of the column's server-side type
fn to_param(cell: &Cell, ty: &Type, column: &str) -> Result<SqlParam> {
    if *ty == Type::BOOL {
        let value = match cell {
            Cell::Null => None,
            Cell::Bool(b) => Some(*b),
            Cell::Integer(0) => Some(false),
            Cell::Integer(1) => Some(true),
            _ => return Err(mismatch(cell, ty, column)),
        };
        return Ok(Box::new(value));
    }
    if *ty == Type::INT8 || *ty == Type::INT4 || *ty == Type::INT2 {
        let value = match cell {
            Cell::Null => None,
            other => Some(other.as_i64().ok_or_else(|| mismatch(cell, ty, column))?),
        };
        return if *ty == Type::INT8 {
            Ok(Box::new(value))
        } else if *ty == Type::INT4 {
            let narrowed = value
                .map(i32::try_from)
                .transpose()
                .map_err(|_| mismatch(cell, ty, column))?;
            Ok(Box::new(narrowed))
        } else {
            let narrowed = value
                .map(i16::try_from)
                .transpose()
                .map_err(|_| mismatch(cell, ty, column))?;
            Ok(Box::new(narrowed))
        };
    }
    if *ty == Type::FLOAT8 || *ty == Type::FLOAT4 {
        let value = match cell {
            Cell::Null => None,
            other => Some(other.as_f64().ok_or_else(|| mismatch(cell, ty, column))?),
        };
        return if *ty == Type::FLOAT8 {
            Ok(Box::new(value))
        } else {
            Ok(Box::new(value.map(|v| v as f32)))
        };
    }
    if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME {
        return Ok(Box::new(cell.to_text()));
    }
    Err(StoreError::UnsupportedType(format!("{column} has type {ty}")).into())
}

/// Reads one column of a result row as a cell
fn cell_from_row(row: &Row, idx: usize, ty: &Type, column: &str) -> Result<Cell> {
    let read_err = |e: tokio_postgres::Error| {
        HealthmarkError::Store(StoreError::QueryFailed(format!(
            "Failed to read column {column}: {e}"
        )))
    };

    let cell = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, Cell::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, |v| Cell::Integer(i64::from(v)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, |v| Cell::Integer(i64::from(v)))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, Cell::Integer)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, |v| Cell::Real(f64::from(v)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, Cell::Real)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        row.try_get::<_, Option<String>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, Cell::Text)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, |v| Cell::Text(v.to_rfc3339()))
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, |v| Cell::Text(v.to_string()))
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<chrono::NaiveDate>>(idx)
            .map_err(read_err)?
            .map_or(Cell::Null, |v| Cell::Text(v.to_string()))
    } else {
        return Err(StoreError::UnsupportedType(format!("{column} has type {ty}")).into());
    };
    Ok(cell)
}
