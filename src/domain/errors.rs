//! Domain error types
//!
//! This module defines the error hierarchy for Healthmark. All errors are
//! domain-specific and don't expose third-party types to callers.

use thiserror::Error;

/// Result alias used by every fallible Healthmark operation
pub type Result<T> = std::result::Result<T, HealthmarkError>;

/// Main Healthmark error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum HealthmarkError {
    /// Configuration-related errors, including a range catalog that names
    /// columns the input does not have
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The designated source table does not exist
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Table store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Errors reading or loading a single input file
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Errors raised while validating a record batch
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl HealthmarkError {
    /// Whether repeating the failed operation could succeed
    ///
    /// Only connection and timeout failures qualify. Missing tables,
    /// schema mismatches and configuration problems never heal on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HealthmarkError::Connection(_)
                | HealthmarkError::Store(StoreError::ConnectionFailed(_))
                | HealthmarkError::Store(StoreError::Timeout(_))
        )
    }
}

/// Table store errors
///
/// Errors that occur when talking to the backing relational store.
/// These errors don't expose driver types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Write failed
    #[error("Failed to write table: {0}")]
    WriteFailed(String),

    /// The rows being written don't fit the existing table
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Timeout
    #[error("Store operation timed out: {0}")]
    Timeout(String),

    /// A stored column type the adapter cannot map to a cell
    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),
}

/// Ingestion failure for a single file
///
/// Recorded in the ingest report; never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFailure {
    /// File name that failed
    pub file_name: String,

    /// Reason for the failure
    pub reason: String,
}

impl IngestFailure {
    /// Creates a new ingest failure
    pub fn new(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for HealthmarkError {
    fn from(err: std::io::Error) -> Self {
        HealthmarkError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for HealthmarkError {
    fn from(err: serde_json::Error) -> Self {
        HealthmarkError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for HealthmarkError {
    fn from(err: toml::de::Error) -> Self {
        HealthmarkError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv reader errors
impl From<csv::Error> for HealthmarkError {
    fn from(err: csv::Error) -> Self {
        HealthmarkError::Ingestion(format!("CSV parse error: {err}"))
    }
}

// Conversion from rusqlite errors
impl From<rusqlite::Error> for HealthmarkError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, _)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                HealthmarkError::Store(StoreError::Timeout(err.to_string()))
            }
            rusqlite::Error::SqliteFailure(ref code, _)
                if code.code == rusqlite::ErrorCode::CannotOpen =>
            {
                HealthmarkError::Store(StoreError::ConnectionFailed(err.to_string()))
            }
            _ => HealthmarkError::Store(StoreError::QueryFailed(err.to_string())),
        }
    }
}
