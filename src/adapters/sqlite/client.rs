//! SQLite client implementation
//!
//! rusqlite is synchronous, so the single connection lives behind a mutex
//! and every call runs on tokio's blocking pool.

use crate::config::schema::SqliteConfig;
use crate::domain::{HealthmarkError, Result, StoreError};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Path value that selects an in-process database
pub const IN_MEMORY: &str = ":memory:";

/// SQLite client for Healthmark
///
/// Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct SqliteClient {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

impl SqliteClient {
    /// Opens (or creates) the database file
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the file cannot be opened.
    pub async fn new(config: SqliteConfig) -> Result<Self> {
        let path = config.path.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&config))
            .await
            .map_err(|e| HealthmarkError::Other(format!("SQLite task join error: {e}")))??;

        tracing::debug!(path = %path, "SQLite database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database path as configured
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runs `f` with exclusive access to the connection on a blocking thread
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an error if the connection lock is
    /// poisoned or the blocking task panics.
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                HealthmarkError::Store(StoreError::ConnectionFailed(
                    "SQLite connection lock poisoned".to_string(),
                ))
            })?;
            f(&mut guard)
        })
        .await
        .map_err(|e| HealthmarkError::Other(format!("SQLite task join error: {e}")))?
    }
}

fn open_connection(config: &SqliteConfig) -> Result<Connection> {
    let conn = if config.path == IN_MEMORY {
        Connection::open_in_memory()
    } else {
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::ConnectionFailed(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Connection::open(&config.path)
    }
    .map_err(|e| {
        StoreError::ConnectionFailed(format!("Failed to open SQLite database {}: {e}", config.path))
    })?;

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(conn)
}
