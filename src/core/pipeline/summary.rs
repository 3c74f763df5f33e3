//! Run summary and reporting

use crate::core::pipeline::state::PipelineState;
use crate::core::validation::MissingReport;
use crate::domain::{HealthmarkError, RunId, TableName};
use std::time::Duration;

/// Summary of one pipeline run
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: RunId,
    pub source_table: TableName,

    /// `Done` or `Error`
    pub final_state: PipelineState,

    /// Stage that was running when the run failed
    pub failed_stage: Option<PipelineState>,

    /// Cause of the failure
    pub error: Option<HealthmarkError>,

    /// Rows read from the source table
    pub rows_processed: usize,

    /// Rows in the analytics table after publishing
    pub analytics_rows: u64,

    /// Records scoring under the analytics threshold
    pub rows_below_threshold: usize,

    pub invalid_flags: usize,
    pub outlier_flags: usize,
    pub mean_quality_score: Option<f64>,
    pub missing_report: Option<MissingReport>,

    /// Writes were skipped
    pub dry_run: bool,

    /// The run stopped on a shutdown signal
    pub interrupted: bool,

    pub duration: Duration,
}

impl RunSummary {
    /// Create an empty summary for a run that has not started
    pub fn new(run_id: RunId, source_table: TableName, dry_run: bool) -> Self {
        Self {
            run_id,
            source_table,
            final_state: PipelineState::INITIAL,
            failed_stage: None,
            error: None,
            rows_processed: 0,
            analytics_rows: 0,
            rows_below_threshold: 0,
            invalid_flags: 0,
            outlier_flags: 0,
            mean_quality_score: None,
            missing_report: None,
            dry_run,
            interrupted: false,
            duration: Duration::from_secs(0),
        }
    }

    /// Marks the run as failed in `stage`
    pub fn fail(&mut self, stage: PipelineState, error: HealthmarkError) {
        self.failed_stage = Some(stage);
        self.final_state = PipelineState::Error;
        self.error = Some(error);
    }

    /// Check if the run reached `Done`
    pub fn is_successful(&self) -> bool {
        self.final_state == PipelineState::Done
    }

    /// Logs the summary as one structured event
    pub fn log_summary(&self) {
        if self.is_successful() {
            tracing::info!(
                run_id = %self.run_id,
                source = %self.source_table,
                rows_processed = self.rows_processed,
                analytics_rows = self.analytics_rows,
                rows_below_threshold = self.rows_below_threshold,
                invalid_flags = self.invalid_flags,
                outlier_flags = self.outlier_flags,
                mean_quality_score = self.mean_quality_score.unwrap_or(0.0),
                dry_run = self.dry_run,
                duration_ms = self.duration.as_millis() as u64,
                "ETL run completed"
            );
        } else {
            tracing::error!(
                run_id = %self.run_id,
                source = %self.source_table,
                failed_stage = %self.failed_stage.map_or("UNKNOWN", PipelineState::as_str),
                error = %self.error.as_ref().map_or_else(String::new, ToString::to_string),
                interrupted = self.interrupted,
                duration_ms = self.duration.as_millis() as u64,
                "ETL run failed"
            );
        }
    }
}
