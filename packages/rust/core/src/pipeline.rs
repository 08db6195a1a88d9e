//! End-to-end enrichment pipeline: dataset → geocode each row → CSV + xlsx.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use coursegeo_dataset::{load_dataset, write_outputs};
use coursegeo_geocoder::{Geocoder, RateLimiter};
use coursegeo_shared::{CourseGeoError, OutputPaths, PipelineConfig, Result};

use crate::merge::{self, CoordinateColumns};
use crate::report::{self, DatasetSummary};
use crate::resolver::{ResolveOptions, Resolver, RowOutcome, row_names};

/// Rows shown in the post-run preview.
const PREVIEW_ROWS: usize = 10;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Rows in the dataset.
    pub rows: usize,
    /// Rows that reached a terminal state and were merged.
    pub processed: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// The run stopped before every row was processed.
    pub cancelled: bool,
    pub outputs: OutputPaths,
    /// Coverage of the written dataset (includes rows untouched by a cancelled run).
    pub summary: DatasetSummary,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once per row after its outcome has been merged.
    fn row_done(&self, outcome: &RowOutcome, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row_done(&self, _outcome: &RowOutcome, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// One operator-facing line per row: `[current/total] name → lat, lon`.
pub fn progress_line(outcome: &RowOutcome, current: usize, total: usize) -> String {
    format!("[{current}/{total}] {outcome}")
}

/// Run the enrichment pipeline.
///
/// 1. Load the dataset (fatal on failure, before any request)
/// 2. Geocode each row in order, merging each outcome into its own row
/// 3. Write the CSV and xlsx outputs (fatal on failure)
///
/// Cancelling `cancel` stops geocoding between rows; rows already processed
/// are kept and the outputs are still written.
#[instrument(skip_all, fields(input = %config.input.display(), name_column = %config.name_column))]
pub async fn run_pipeline(
    config: &PipelineConfig,
    geocoder: &dyn Geocoder,
    limiter: &dyn RateLimiter,
    cancel: &CancellationToken,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let started_at = Utc::now();

    // --- Phase 1: Load ---
    progress.phase("Loading dataset");
    let mut dataset = load_dataset(&config.input)?;

    let name_col = dataset.column_index(&config.name_column).ok_or_else(|| {
        CourseGeoError::load(
            &config.input,
            format!("missing name column {:?}", config.name_column),
        )
    })?;
    let columns = CoordinateColumns::ensure(&mut dataset);

    // --- Phase 2: Resolve + merge ---
    progress.phase("Geocoding institutions");
    let options = ResolveOptions {
        country_hint: config.country_hint.clone(),
        request_timeout: config.request_timeout,
        min_importance: config.min_importance,
    };
    let mut resolver = Resolver::new(
        geocoder,
        limiter,
        options,
        cancel.clone(),
        row_names(&dataset, name_col),
    );
    let total = resolver.total();

    info!(rows = total, country_hint = %config.country_hint, "starting geocoding");

    let mut processed = 0;
    let mut resolved = 0;
    while let Some(outcome) = resolver.next().await {
        merge::apply(&mut dataset, columns, &outcome)?;

        processed += 1;
        if outcome.result.is_resolved() {
            resolved += 1;
        }
        info!(
            row = outcome.row,
            resolved = outcome.result.is_resolved(),
            "{}",
            progress_line(&outcome, processed, total)
        );
        progress.row_done(&outcome, processed, total);
    }

    let cancelled = processed < total;
    if cancelled {
        warn!(processed, total, "geocoding cancelled, writing partial results");
    }

    // --- Phase 3: Write ---
    progress.phase("Writing outputs");
    write_outputs(&dataset, &config.outputs)?;

    let report = RunReport {
        rows: total,
        processed,
        resolved,
        unresolved: processed - resolved,
        cancelled,
        outputs: config.outputs.clone(),
        summary: report::summarize(&dataset, &config.name_column, PREVIEW_ROWS),
        started_at,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        rows = report.rows,
        resolved = report.resolved,
        unresolved = report.unresolved,
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed.as_millis(),
        "pipeline complete"
    );

    Ok(report)
}
