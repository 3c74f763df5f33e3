//! Table store abstraction layer
//!
//! Backend-neutral table persistence: the [`TableStore`] trait, derived
//! table definitions, and a factory that picks the backend from
//! configuration.

pub mod factory;
pub mod traits;
pub mod view;

pub use factory::create_table_store;
pub use traits::{TableStore, WriteMode};
pub use view::{quote_ident, RowFilter, ViewDefinition};
