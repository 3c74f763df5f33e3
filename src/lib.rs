// Healthmark - Health-markers data-quality ETL
// Copyright (c) 2025 Healthmark Contributors
// Licensed under the MIT License

//! # Healthmark - Health-markers data-quality ETL
//!
//! Healthmark is a batch ETL tool that loads clinical health-marker CSV
//! files into a table store, checks every record against clinical ranges
//! and a per-marker outlier test, scores its quality, and publishes curated
//! and analytics tables with a metadata record per run.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Ingesting** CSV files into tables named after each file
//! - **Validating** numeric markers and normalizing categorical columns
//! - **Scoring** each record from its missing, invalid and outlier markers
//! - **Publishing** raw history, curated and filtered analytics tables
//!
//! ## Architecture
//!
//! Healthmark follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (ingest, validation, pipeline)
//! - [`adapters`] - Table stores (SQLite, PostgreSQL)
//! - [`domain`] - Tables, cells, range catalog, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthmark::adapters::store::create_table_store;
//! use healthmark::config::load_config;
//! use healthmark::core::pipeline::PipelineOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("healthmark.toml")?;
//!     let store = create_table_store(&config).await?;
//!
//!     let summary = PipelineOrchestrator::new(store, &config).run().await;
//!     if summary.is_successful() {
//!         println!("Processed {} rows", summary.rows_processed);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Validation
//!
//! The engine works on an in-memory [`domain::Table`] and never touches
//! the store:
//!
//! ```rust
//! use healthmark::config::ValidationConfig;
//! use healthmark::core::validation::ValidationEngine;
//! use healthmark::domain::Table;
//!
//! # fn example(batch: Table) -> healthmark::domain::Result<()> {
//! let engine = ValidationEngine::new(ValidationConfig::default());
//! let outcome = engine.validate(batch)?;
//!
//! println!("Invalid flags: {}", outcome.invalid_total());
//! if let Some(mean) = outcome.mean_quality_score() {
//!     println!("Mean score: {mean:.1}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Healthmark uses [`domain::HealthmarkError`] for all errors:
//!
//! ```rust,no_run
//! use healthmark::domain::HealthmarkError;
//!
//! fn example() -> Result<(), HealthmarkError> {
//!     let config = healthmark::config::load_config("healthmark.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Healthmark uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!("Starting run");
//! warn!(table = "health_markers_raw", "Table not found");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
