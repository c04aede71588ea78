use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use scanpipe_core::backend::{CpuBackend, ImageBackend};
use scanpipe_core::hyperstack::ChannelColor;
use scanpipe_core::layout::LayoutKind;
use scanpipe_core::pipeline::config::{
    BatchConfig, DifferenceSource, LayoutChoice, PlaneMode, ProjectionPolicy,
};
use scanpipe_core::pipeline::run_log::RunLog;
use scanpipe_core::pipeline::{
    run_batch_reported, BatchReporter, ScanOutcome, ScanStage, ScanStatus,
};
use tracing::info;

use crate::summary::{print_batch_results, print_batch_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum PlaneModeArg {
    Auto,
    Single,
    Multi,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    Auto,
    Olympus,
    Bruker,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DiffSourceArg {
    Raw,
    Filtered,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProjectionPolicyArg {
    Fail,
    Skip,
}

#[derive(Args)]
pub struct RunArgs {
    /// Experiment root holding the scans
    pub root: PathBuf,

    /// Batch config file (TOML); the root argument overrides its root
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frames to shift for difference movies (0 disables them)
    #[arg(long, default_value = "0")]
    pub diff: usize,

    /// Comma-separated channel colors, channel 1 first (e.g. green,magenta)
    #[arg(long)]
    pub colors: Option<String>,

    /// Single-plane or multi-plane data
    #[arg(long, value_enum, default_value = "auto")]
    pub plane_mode: PlaneModeArg,

    /// Acquisition layout
    #[arg(long, value_enum, default_value = "auto")]
    pub layout: LayoutArg,

    /// Which projections feed the difference movies
    #[arg(long, value_enum, default_value = "raw")]
    pub diff_source: DiffSourceArg,

    /// What to do when projecting a stack with a single z-plane
    #[arg(long, value_enum, default_value = "fail")]
    pub projection_policy: ProjectionPolicyArg,

    /// Median filter radius in pixels
    #[arg(long, default_value = "1")]
    pub median_radius: usize,

    /// Skip the median-filtered pass
    #[arg(long)]
    pub no_filter: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let mut config: BatchConfig =
            toml::from_str(&contents).context("Invalid batch config")?;
        config.root = args.root.clone();
        info!(path = %config_path.display(), "Loaded batch config");
        config
    } else {
        build_config_from_args(args)?
    };
    config.validate()?;

    let mut backend = CpuBackend::new();
    print_batch_summary(&config, backend.name());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:24} {msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { pb: pb.clone() });

    info!(root = %config.root.display(), backend = backend.name(), "Starting batch");
    let summary = run_batch_reported(&config, &mut backend, reporter)
        .with_context(|| format!("Batch over {} failed", config.root.display()))?;
    pb.finish_with_message("Done");
    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "Batch finished"
    );

    print_batch_results(&summary, RunLog::new(&config.root).path());
    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> Result<BatchConfig> {
    let mut config = BatchConfig::new(args.root.clone());
    config.difference_number = args.diff;
    if let Some(ref colors) = args.colors {
        config.channel_colors = colors
            .split(',')
            .map(|c| c.trim().parse::<ChannelColor>())
            .collect::<std::result::Result<_, _>>()?;
    }
    config.plane_mode = match args.plane_mode {
        PlaneModeArg::Auto => PlaneMode::Auto,
        PlaneModeArg::Single => PlaneMode::Single,
        PlaneModeArg::Multi => PlaneMode::Multi,
    };
    config.layout = match args.layout {
        LayoutArg::Auto => LayoutChoice::Auto,
        LayoutArg::Olympus => LayoutChoice::Olympus,
        LayoutArg::Bruker => LayoutChoice::Bruker,
    };
    config.difference_source = match args.diff_source {
        DiffSourceArg::Raw => DifferenceSource::Raw,
        DiffSourceArg::Filtered => DifferenceSource::Filtered,
    };
    config.projection_policy = match args.projection_policy {
        ProjectionPolicyArg::Fail => ProjectionPolicy::Fail,
        ProjectionPolicyArg::Skip => ProjectionPolicy::Skip,
    };
    config.median_radius = args.median_radius;
    config.filtered_pass = !args.no_filter;
    Ok(config)
}

/// Drives a progress bar with one tick per scan.
struct BarReporter {
    pb: ProgressBar,
}

impl BatchReporter for BarReporter {
    fn begin_batch(&self, _layout: LayoutKind, total_scans: usize) {
        self.pb.set_length(total_scans as u64);
    }

    fn begin_scan(&self, _index: usize, basename: &str) {
        self.pb.set_prefix(basename.to_string());
    }

    fn stage(&self, stage: ScanStage) {
        self.pb.set_message(stage.to_string());
    }

    fn finish_scan(&self, outcome: &ScanOutcome) {
        if let ScanStatus::Failed { stage, kind, .. } = &outcome.status {
            self.pb
                .println(format!("  {} failed during {} ({})", outcome.basename, stage, kind));
        }
        self.pb.inc(1);
    }
}
