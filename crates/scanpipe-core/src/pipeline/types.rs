use std::path::PathBuf;

use crate::hyperstack::Dims;
use crate::layout::LayoutKind;

/// Step of the per-scan sequence, used for progress and failure reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStage {
    Init,
    Layout,
    Assemble,
    Channels,
    ProjectRaw,
    CompositeRaw,
    Filter,
    ProjectFiltered,
    CompositeFiltered,
    Difference,
    Cleanup,
}

impl std::fmt::Display for ScanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "Starting"),
            Self::Layout => write!(f, "Preparing output"),
            Self::Assemble => write!(f, "Assembling stack"),
            Self::Channels => write!(f, "Splitting channels"),
            Self::ProjectRaw => write!(f, "Projecting raw"),
            Self::CompositeRaw => write!(f, "Merging raw"),
            Self::Filter => write!(f, "Median filtering"),
            Self::ProjectFiltered => write!(f, "Projecting filtered"),
            Self::CompositeFiltered => write!(f, "Merging filtered"),
            Self::Difference => write!(f, "Difference movies"),
            Self::Cleanup => write!(f, "Cleaning up"),
        }
    }
}

/// What a successfully processed scan produced.
#[derive(Clone, Debug)]
pub struct ScanReport {
    pub dims: Dims,
    pub single_plane: bool,
    pub difference_movies: Vec<PathBuf>,
}

#[derive(Clone, Debug)]
pub enum ScanStatus {
    Succeeded(ScanReport),
    Failed {
        stage: ScanStage,
        kind: &'static str,
        message: String,
    },
}

#[derive(Clone, Debug)]
pub struct ScanOutcome {
    pub scan: PathBuf,
    pub basename: String,
    pub status: ScanStatus,
}

impl ScanOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, ScanStatus::Succeeded(_))
    }
}

/// Result of a whole batch. Per-scan failures live in `outcomes`.
#[derive(Clone, Debug)]
pub struct BatchSummary {
    pub layout: LayoutKind,
    pub outcomes: Vec<ScanOutcome>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Progress reporting for a batch run.
///
/// Implementors can use this to drive progress bars or logging. All
/// methods have default no-op implementations.
pub trait BatchReporter: Send + Sync {
    /// The scan list is known.
    fn begin_batch(&self, _layout: LayoutKind, _total_scans: usize) {}

    /// Scan number `index` (zero-based) is starting.
    fn begin_scan(&self, _index: usize, _basename: &str) {}

    /// The current scan entered a new stage.
    fn stage(&self, _stage: ScanStage) {}

    /// The current scan finished, successfully or not.
    fn finish_scan(&self, _outcome: &ScanOutcome) {}
}

/// No-op reporter, used by [`run_batch`](super::run_batch).
pub(super) struct NoOpReporter;
impl BatchReporter for NoOpReporter {}
