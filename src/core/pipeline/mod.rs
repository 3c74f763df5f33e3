//! Transform orchestration
//!
//! A run moves through a fixed sequence of stages:
//!
//! 1. **Extracting**: load the source table and check its schema
//! 2. **PreservingRaw**: append the extracted rows to the raw history table
//! 3. **Cleaning**: run the [`crate::core::validation::ValidationEngine`]
//! 4. **PublishingCurated**: replace the curated table with the flagged rows
//! 5. **PublishingAnalytics**: rebuild the analytics table from the curated one
//! 6. **RecordingMetadata**: append one row to the run metadata log
//!
//! Any failure ends the run in `Error`. Earlier writes are not rolled back.

pub mod metadata;
pub mod orchestrator;
pub mod retry;
pub mod state;
pub mod summary;

pub use metadata::{MetadataLog, RunMetadata};
pub use orchestrator::PipelineOrchestrator;
pub use state::PipelineState;
pub use summary::RunSummary;
