use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::backend::ImageBackend;
use crate::consts::{FILTERED_SUFFIX, RAW_SUFFIX};
use crate::error::{Result, ScanpipeError};
use crate::layout::{detect_layout, list_scans, LayoutKind};
use crate::output::prepare_output_tree;

use super::assemble::assemble_stack;
use super::config::BatchConfig;
use super::difference::{difference_candidates, run_difference_stage};
use super::run_log::RunLog;
use super::session::ScanSession;
use super::stages::{composite, median_filter_pass, project_max, split_channels};
use super::types::{
    BatchReporter, BatchSummary, NoOpReporter, ScanOutcome, ScanReport, ScanStage, ScanStatus,
};

/// Process every scan under `config.root` with a thread-safe progress
/// reporter.
///
/// Only an invalid configuration or an unreadable root fails the batch.
/// Every per-scan error is recorded in the run log and in the returned
/// summary, and the batch moves on to the next scan.
pub fn run_batch_reported(
    config: &BatchConfig,
    backend: &mut dyn ImageBackend,
    reporter: Arc<dyn BatchReporter>,
) -> Result<BatchSummary> {
    config.validate()?;

    let layout = match config.layout.fixed() {
        Some(kind) => kind,
        None => detect_layout(&config.root),
    };
    let scans = list_scans(&config.root, layout)?;
    info!(
        root = %config.root.display(),
        layout = %layout,
        scans = scans.len(),
        backend = backend.name(),
        "Starting batch"
    );

    let log = RunLog::new(&config.root);
    keep_going(log.begin_run(layout, scans.len()));
    reporter.begin_batch(layout, scans.len());

    let mut outcomes = Vec::with_capacity(scans.len());
    for (index, scan) in scans.iter().enumerate() {
        let basename = layout.strategy().resolve_basename(scan);
        let span = info_span!("scan", name = %basename);
        let _guard = span.enter();

        reporter.begin_scan(index, &basename);
        keep_going(log.record_start(&basename));

        let mut stage = ScanStage::Init;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            run_scan(config, &mut *backend, layout, scan, &mut stage, reporter.as_ref())
        }))
        .unwrap_or_else(|payload| Err(ScanpipeError::Panicked(panic_message(payload.as_ref()))));

        // A panic can skip the session's own cleanup.
        backend.close_all();

        let status = match result {
            Ok(report) => {
                info!("Scan completed");
                keep_going(log.record_success(&basename));
                ScanStatus::Succeeded(report)
            }
            Err(err) => {
                warn!(stage = %stage, kind = err.kind(), error = %err, "Scan failed");
                keep_going(log.record_failure(&basename, stage, &err));
                ScanStatus::Failed {
                    stage,
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
        };

        let outcome = ScanOutcome {
            scan: scan.clone(),
            basename,
            status,
        };
        reporter.finish_scan(&outcome);
        outcomes.push(outcome);
    }

    let summary = BatchSummary { layout, outcomes };
    keep_going(log.finish_run(&summary));
    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "Batch done"
    );
    Ok(summary)
}

/// Process every scan under `config.root`.
pub fn run_batch(config: &BatchConfig, backend: &mut dyn ImageBackend) -> Result<BatchSummary> {
    run_batch_reported(config, backend, Arc::new(NoOpReporter))
}

/// Run the full stage sequence on one scan.
///
/// `stage` tracks the step in progress so a caller can attribute a failure.
/// Every image the scan registered is closed before this returns.
pub fn run_scan(
    config: &BatchConfig,
    backend: &mut dyn ImageBackend,
    layout: LayoutKind,
    scan: &Path,
    stage: &mut ScanStage,
    reporter: &dyn BatchReporter,
) -> Result<ScanReport> {
    let mut session = ScanSession::new(backend);

    advance(stage, ScanStage::Layout, reporter);
    let dirs = prepare_output_tree(scan)?;

    advance(stage, ScanStage::Assemble, reporter);
    let assembled = assemble_stack(session.backend(), &config.root, scan, layout)?;
    let single_plane = config.plane_mode.is_single_plane(assembled.dims.slices);
    debug!(single_plane, "Resolved plane mode");

    advance(stage, ScanStage::Channels, reporter);
    let channels = split_channels(session.backend(), assembled.id, &dirs.raw)?;

    advance(stage, ScanStage::ProjectRaw, reporter);
    let projected = project_max(
        session.backend(),
        &channels,
        single_plane,
        config.projection_policy,
        &dirs.max_raw,
    )?;

    advance(stage, ScanStage::CompositeRaw, reporter);
    let raw_composite_dir = if single_plane { &dirs.raw } else { &dirs.max_raw };
    composite(
        session.backend(),
        &projected,
        &config.channel_colors,
        &assembled.basename,
        RAW_SUFFIX,
        raw_composite_dir,
    )?;

    if config.filtered_pass {
        advance(stage, ScanStage::Filter, reporter);
        let filtered = median_filter_pass(session.backend(), &dirs, config.median_radius)?;

        advance(stage, ScanStage::ProjectFiltered, reporter);
        let projected = project_max(
            session.backend(),
            &filtered,
            single_plane,
            config.projection_policy,
            &dirs.max_filtered,
        )?;

        advance(stage, ScanStage::CompositeFiltered, reporter);
        let filtered_composite_dir = if single_plane {
            &dirs.filtered
        } else {
            &dirs.max_filtered
        };
        composite(
            session.backend(),
            &projected,
            &config.channel_colors,
            &assembled.basename,
            FILTERED_SUFFIX,
            filtered_composite_dir,
        )?;
    }

    let mut difference_movies = Vec::new();
    if config.difference_number > 0 {
        advance(stage, ScanStage::Difference, reporter);
        let candidates = difference_candidates(&dirs, single_plane, config.difference_source)?;
        difference_movies = run_difference_stage(
            session.backend(),
            &candidates,
            &dirs.diff,
            config.difference_number,
        )?;
    }

    advance(stage, ScanStage::Cleanup, reporter);
    session.backend().close_all();

    Ok(ScanReport {
        dims: assembled.dims,
        single_plane,
        difference_movies,
    })
}

fn advance(stage: &mut ScanStage, next: ScanStage, reporter: &dyn BatchReporter) {
    *stage = next;
    reporter.stage(next);
    debug!(stage = %next, "Entering stage");
}

/// Run log writes never abort the batch.
fn keep_going(result: Result<()>) {
    if let Err(err) = result {
        warn!(error = %err, "Could not write run log entry");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
