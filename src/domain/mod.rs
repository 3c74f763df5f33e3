//! Domain models and types for Healthmark.
//!
//! This module holds the types every other layer speaks in: tabular data,
//! the clinical range catalog, validated identifiers and the error hierarchy.
//!
//! # Overview
//!
//! - **Tabular data** ([`Table`], [`Cell`], [`ColumnKind`])
//! - **Clinical ranges** ([`RangeCatalog`], [`MarkerRange`])
//! - **Identifiers** ([`TableName`], [`RunId`])
//! - **Error types** ([`HealthmarkError`], [`StoreError`], [`IngestFailure`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use healthmark::domain::{Cell, Table};
//!
//! # fn example() -> healthmark::domain::Result<()> {
//! let mut table = Table::new(vec!["LDL".to_string(), "Condition".to_string()])?;
//! table.push_row(vec![Cell::Real(130.0), Cell::Text("healthy".to_string())])?;
//! assert_eq!(table.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod errors;
pub mod ids;
pub mod table;

// Re-export commonly used types for convenience
pub use catalog::{MarkerRange, RangeCatalog};
pub use errors::{HealthmarkError, IngestFailure, Result, StoreError};
pub use ids::{RunId, TableName};
pub use table::{Cell, ColumnKind, Table};
