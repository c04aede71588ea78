use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::{BRUKER_INITIATOR_PATTERN, OIF_CONTAINER_SUFFIX, OIF_SUFFIX};
use crate::error::{Result, ScanpipeError};

/// Acquisition layout convention of an experiment root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    /// `.oif` initiator files next to `.oif.files` scan containers.
    Olympus,
    /// One plain directory per scan holding per-plane OME-TIFFs.
    Bruker,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Olympus => write!(f, "Olympus (OIF)"),
            Self::Bruker => write!(f, "Bruker (OME-TIFF)"),
        }
    }
}

impl LayoutKind {
    pub fn strategy(&self) -> &'static dyn LayoutStrategy {
        match self {
            Self::Olympus => &OlympusLayout,
            Self::Bruker => &BrukerLayout,
        }
    }
}

/// Classify an experiment root. Any direct child ending in `.oif` means
/// Olympus; everything else, including an unreadable root, is Bruker.
pub fn detect_layout(root: &Path) -> LayoutKind {
    let has_oif = std::fs::read_dir(root)
        .map(|entries| {
            entries.flatten().any(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(OIF_SUFFIX))
            })
        })
        .unwrap_or(false);

    let kind = if has_oif {
        LayoutKind::Olympus
    } else {
        LayoutKind::Bruker
    };
    info!(root = %root.display(), layout = %kind, "Detected acquisition layout");
    kind
}

/// List the scans under `root`, sorted by path.
///
/// Bruker scans are the root's direct subdirectories. Olympus scans are the
/// direct children named `*.oif.files`. Anything else is ignored.
pub fn list_scans(root: &Path, kind: LayoutKind) -> Result<Vec<PathBuf>> {
    let mut scans = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let is_scan = match kind {
            LayoutKind::Bruker => path.is_dir(),
            LayoutKind::Olympus => entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(OIF_CONTAINER_SUFFIX)),
        };
        if is_scan {
            debug!(scan = %path.display(), "Found scan");
            scans.push(path);
        }
    }
    scans.sort();
    info!(count = scans.len(), "Enumerated scans");
    Ok(scans)
}

/// Layout-specific naming rules, consulted once per scan by stack assembly.
pub trait LayoutStrategy: Sync {
    /// Display basename of a scan.
    fn resolve_basename(&self, scan: &Path) -> String;

    /// File handed to the backend to open the scan's acquisition.
    fn resolve_initiator(&self, root: &Path, scan: &Path, basename: &str) -> Result<PathBuf>;
}

pub struct OlympusLayout;

impl LayoutStrategy for OlympusLayout {
    /// `name.oif.files` -> `name`.
    fn resolve_basename(&self, scan: &Path) -> String {
        let name = file_name(scan);
        name.strip_suffix(OIF_CONTAINER_SUFFIX)
            .unwrap_or(&name)
            .to_string()
    }

    /// `<root>/<name>.oif`, which must exist.
    fn resolve_initiator(&self, root: &Path, _scan: &Path, basename: &str) -> Result<PathBuf> {
        let path = root.join(format!("{}{}", basename, OIF_SUFFIX));
        if path.is_file() {
            Ok(path)
        } else {
            Err(ScanpipeError::MissingInitiator(path))
        }
    }
}

pub struct BrukerLayout;

impl LayoutStrategy for BrukerLayout {
    fn resolve_basename(&self, scan: &Path) -> String {
        file_name(scan)
    }

    /// First match, lexicographically, of
    /// `<scan>/<basename>_Cycle00001_Ch?_000001.ome.tif`.
    fn resolve_initiator(&self, _root: &Path, scan: &Path, basename: &str) -> Result<PathBuf> {
        let pattern = format!(
            "{}/{}{}",
            glob::Pattern::escape(&scan.to_string_lossy()),
            glob::Pattern::escape(basename),
            BRUKER_INITIATOR_PATTERN
        );
        let mut matches: Vec<PathBuf> = glob::glob(&pattern)?.flatten().collect();
        matches.sort();
        matches
            .into_iter()
            .next()
            .ok_or_else(|| ScanpipeError::MissingInitiator(PathBuf::from(pattern)))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
