//! Core business logic for Healthmark.
//!
//! # Modules
//!
//! - [`ingest`] - CSV discovery, typed parsing and loading into the store
//! - [`validation`] - Coercion, range and outlier flags, quality scoring
//! - [`pipeline`] - Run state machine, orchestration, metadata log and retry
//!
//! # Run Workflow
//!
//! 1. **Ingest** (separate command): load `data/*.csv` into tables named after each file
//! 2. **Extract**: read the source table
//! 3. **Preserve**: append the raw rows to the history table
//! 4. **Validate**: flag range violations and outliers, score every record
//! 5. **Publish**: replace the curated table, rebuild the analytics table
//! 6. **Record**: append run metadata
//!
//! # Example
//!
//! ```rust,no_run
//! use healthmark::adapters::store::create_table_store;
//! use healthmark::config::load_config;
//! use healthmark::core::pipeline::PipelineOrchestrator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("healthmark.toml")?;
//! let store = create_table_store(&config).await?;
//!
//! let summary = PipelineOrchestrator::new(store, &config).run().await;
//!
//! println!("State: {}", summary.final_state);
//! println!("Rows: {}", summary.rows_processed);
//! println!("Analytics rows: {}", summary.analytics_rows);
//! # Ok(())
//! # }
//! ```

pub mod ingest;
pub mod pipeline;
pub mod validation;
