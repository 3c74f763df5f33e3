//! PostgreSQL table store
//!
//! Pooled connections through deadpool with optional native-tls.

pub mod adapter;
pub mod client;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
