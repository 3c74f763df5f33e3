//! External system integrations for Healthmark.
//!
//! - [`store`] - Backend-neutral table store trait, view definitions and factory
//! - [`sqlite`] - Embedded SQLite store (the default)
//! - [`postgresql`] - PostgreSQL store
//!
//! # Design Pattern
//!
//! The pipeline only sees [`store::TableStore`]. Each backend adapter owns
//! its connection handling and maps driver errors into
//! [`crate::domain::StoreError`] so retry decisions stay backend-agnostic.
//!
//! ```rust,no_run
//! use healthmark::adapters::store::create_table_store;
//! use healthmark::config::HealthmarkConfig;
//! use healthmark::domain::TableName;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = create_table_store(&HealthmarkConfig::default()).await?;
//! let raw = store.load_table(&TableName::new("Health_markers_dataset")?).await?;
//! println!("{} rows", raw.len());
//! # Ok(())
//! # }
//! ```

pub mod postgresql;
pub mod sqlite;
pub mod store;
