//! Pipeline orchestration
//!
//! Drives one run through the [`PipelineState`] stages against a
//! [`TableStore`]. The stages are not wrapped in a shared transaction: a
//! failure after raw preservation leaves the appended raw rows in place.

use crate::adapters::store::{RowFilter, TableStore, ViewDefinition, WriteMode};
use crate::config::{HealthmarkConfig, PipelineConfig};
use crate::core::pipeline::metadata::{MetadataLog, RunMetadata};
use crate::core::pipeline::retry::retry_idempotent;
use crate::core::pipeline::state::PipelineState;
use crate::core::pipeline::summary::RunSummary;
use crate::core::validation::{ValidationEngine, ValidationOutcome, QUALITY_SCORE};
use crate::domain::{HealthmarkError, Result, RunId, StoreError, Table};
use crate::{log_error_with_context, log_stage_complete, log_stage_start};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::Instrument;

/// Pipeline orchestrator
pub struct PipelineOrchestrator {
    store: Arc<dyn TableStore + Send + Sync>,
    engine: ValidationEngine,
    pipeline: PipelineConfig,
    dry_run: bool,
    shutdown_signal: Option<watch::Receiver<bool>>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator; dry run follows `application.dry_run`
    pub fn new(store: Arc<dyn TableStore + Send + Sync>, config: &HealthmarkConfig) -> Self {
        Self {
            store,
            engine: ValidationEngine::new(config.validation.clone()),
            pipeline: config.pipeline.clone(),
            dry_run: config.application.dry_run,
            shutdown_signal: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stops the run before the next stage once the receiver reads `true`
    pub fn with_shutdown(mut self, shutdown_signal: watch::Receiver<bool>) -> Self {
        self.shutdown_signal = Some(shutdown_signal);
        self
    }

    /// Definition of the analytics table
    pub fn analytics_view(&self) -> ViewDefinition {
        ViewDefinition {
            target: self.pipeline.analytics_table.clone(),
            source: self.pipeline.curated_table.clone(),
            columns: self.engine.analytics_columns(),
            filter: RowFilter::AtLeast {
                column: QUALITY_SCORE.to_string(),
                threshold: self.pipeline.quality_threshold,
            },
        }
    }

    /// Executes one run
    ///
    /// Never fails: the outcome, including any error, is in the summary.
    pub async fn run(&self) -> RunSummary {
        let run_id = RunId::generate();
        let span = tracing::info_span!(
            "etl_run",
            run_id = %run_id,
            source = %self.pipeline.source_table,
            dry_run = self.dry_run
        );

        async move {
            let start = Instant::now();
            let mut summary =
                RunSummary::new(run_id, self.pipeline.source_table.clone(), self.dry_run);

            if self.dry_run {
                tracing::info!("Dry run mode enabled - no tables will be written");
            }
            tracing::info!(backend = self.store.backend_name(), "ETL run started");

            if let Err(e) = self.execute(&mut summary).await {
                let stage = summary.final_state;
                log_error_with_context!(e, format!("stage {stage}"));
                summary.fail(stage, e);
            }

            summary.duration = start.elapsed();
            summary.log_summary();
            summary
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, summary: &mut RunSummary) -> Result<()> {
        self.enter(summary, PipelineState::INITIAL)?;
        let raw = self.extract().await?;
        summary.rows_processed = raw.len();

        self.advance(summary)?;
        self.preserve_raw(&raw).await?;

        self.advance(summary)?;
        let stage_start = Instant::now();
        let outcome = self.engine.validate(raw)?;
        summary.invalid_flags = outcome.invalid_total();
        summary.outlier_flags = outcome.outlier_total();
        summary.mean_quality_score = outcome.mean_quality_score();
        summary.rows_below_threshold = outcome.rows_below(self.pipeline.quality_threshold);
        summary.missing_report = Some(outcome.missing_report.clone());
        log_stage_complete!(PipelineState::Cleaning, outcome.table.len(), stage_start.elapsed());

        self.advance(summary)?;
        self.publish_curated(&outcome).await?;

        self.advance(summary)?;
        summary.analytics_rows = self.publish_analytics(&outcome).await?;

        self.advance(summary)?;
        self.record_metadata(summary).await?;

        self.advance(summary)
    }

    /// Moves the summary to the stage after its current one
    ///
    /// Reaching `Done` skips the shutdown check: every write has landed.
    fn advance(&self, summary: &mut RunSummary) -> Result<()> {
        let current = summary.final_state;
        let next = current
            .next()
            .ok_or_else(|| HealthmarkError::Other(format!("No stage follows {current}")))?;
        if next == PipelineState::Done {
            summary.final_state = next;
            return Ok(());
        }
        self.enter(summary, next)
    }

    /// Moves the summary to `stage`, unless shutdown was requested
    fn enter(&self, summary: &mut RunSummary, stage: PipelineState) -> Result<()> {
        if self.shutdown_requested() {
            summary.interrupted = true;
            return Err(HealthmarkError::Other(format!(
                "Run interrupted by shutdown signal before {stage}"
            )));
        }
        summary.final_state = stage;
        Ok(())
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_signal
            .as_ref()
            .is_some_and(|rx| *rx.borrow())
    }

    async fn extract(&self) -> Result<Table> {
        let source = &self.pipeline.source_table;
        log_stage_start!(PipelineState::Extracting, source);
        let stage_start = Instant::now();

        let raw = retry_idempotent(&self.pipeline.retry, "load_table", || {
            self.store.load_table(source)
        })
        .await
        .map_err(|e| match e {
            HealthmarkError::Store(StoreError::TableNotFound(_)) => {
                HealthmarkError::SourceUnavailable(format!("Source table {source} does not exist"))
            }
            other => other,
        })?;

        // Abort before any write if the configured columns are absent
        self.engine.check_schema(&raw)?;

        log_stage_complete!(PipelineState::Extracting, raw.len(), stage_start.elapsed());
        Ok(raw)
    }

    async fn preserve_raw(&self, raw: &Table) -> Result<()> {
        let target = &self.pipeline.raw_table;
        log_stage_start!(PipelineState::PreservingRaw, target);
        let stage_start = Instant::now();

        if self.dry_run {
            tracing::info!(table = %target, rows = raw.len(), "DRY RUN: would append raw rows");
        } else {
            // Appends are not retried
            self.store.save_table(target, raw, WriteMode::Append).await?;
        }

        log_stage_complete!(PipelineState::PreservingRaw, raw.len(), stage_start.elapsed());
        Ok(())
    }

    async fn publish_curated(&self, outcome: &ValidationOutcome) -> Result<()> {
        let target = &self.pipeline.curated_table;
        log_stage_start!(PipelineState::PublishingCurated, target);
        let stage_start = Instant::now();

        if self.dry_run {
            tracing::info!(
                table = %target,
                rows = outcome.table.len(),
                columns = outcome.table.columns().len(),
                "DRY RUN: would replace curated table"
            );
        } else {
            retry_idempotent(&self.pipeline.retry, "save_table", || {
                self.store
                    .save_table(target, &outcome.table, WriteMode::Replace)
            })
            .await?;
        }

        log_stage_complete!(
            PipelineState::PublishingCurated,
            outcome.table.len(),
            stage_start.elapsed()
        );
        Ok(())
    }

    async fn publish_analytics(&self, outcome: &ValidationOutcome) -> Result<u64> {
        let view = self.analytics_view();
        log_stage_start!(PipelineState::PublishingAnalytics, view.target);
        let stage_start = Instant::now();

        let rows = if self.dry_run {
            let rows = view.apply(&outcome.table)?.len() as u64;
            tracing::info!(
                table = %view.target,
                rows,
                threshold = self.pipeline.quality_threshold,
                "DRY RUN: would rebuild analytics table"
            );
            rows
        } else {
            retry_idempotent(&self.pipeline.retry, "execute_view", || {
                self.store.execute_view(&view)
            })
            .await?
        };

        log_stage_complete!(PipelineState::PublishingAnalytics, rows, stage_start.elapsed());
        Ok(rows)
    }

    async fn record_metadata(&self, summary: &RunSummary) -> Result<()> {
        let log = MetadataLog::new(self.store.clone(), self.pipeline.metadata_table.clone());
        log_stage_start!(PipelineState::RecordingMetadata, log.table());

        let entry = RunMetadata::new(
            summary.run_id,
            summary.rows_processed as u64,
            self.pipeline.pipeline_version.clone(),
            &self.pipeline.source_table,
        );

        if self.dry_run {
            tracing::info!(
                table = %log.table(),
                rows_processed = entry.rows_processed,
                "DRY RUN: would append run metadata"
            );
        } else {
            log.append(&entry).await?;
        }
        Ok(())
    }
}
