//! SQLite table store
//!
//! The default backend: a single database file (or `:memory:`) accessed
//! through rusqlite.

pub mod adapter;
pub mod client;

pub use adapter::SqliteAdapter;
pub use client::SqliteClient;
