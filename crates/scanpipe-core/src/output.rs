use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::consts::PROCESSED_DIR;
use crate::error::{Result, ScanpipeError};

/// Output tree of one scan, rooted at `<scan>/processed/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDirs {
    pub processed: PathBuf,
    pub raw: PathBuf,
    pub diff: PathBuf,
    pub max_raw: PathBuf,
    pub max_filtered: PathBuf,
    pub filtered: PathBuf,
}

impl OutputDirs {
    /// Derive the output paths of a scan without touching the filesystem.
    pub fn for_scan(scan: &Path) -> Self {
        let processed = scan.join(PROCESSED_DIR);
        let max = processed.join("MAX");
        Self {
            raw: processed.join("raw"),
            diff: processed.join("diff"),
            max_raw: max.join("rawMAX"),
            max_filtered: max.join("filteredMAX"),
            filtered: processed.join("filtered"),
            processed,
        }
    }

    /// All leaf directories, in creation order.
    pub fn leaves(&self) -> [&Path; 5] {
        [
            &self.raw,
            &self.diff,
            &self.max_filtered,
            &self.max_raw,
            &self.filtered,
        ]
    }
}

/// Delete any previous `processed/` tree of `scan` and recreate it empty.
pub fn prepare_output_tree(scan: &Path) -> Result<OutputDirs> {
    let dirs = OutputDirs::for_scan(scan);

    if dirs.processed.exists() {
        info!(path = %dirs.processed.display(), "Output already exists, overwriting");
        fs::remove_dir_all(&dirs.processed).map_err(|source| ScanpipeError::Directory {
            path: dirs.processed.clone(),
            source,
        })?;
    }

    for dir in dirs.leaves() {
        fs::create_dir_all(dir).map_err(|source| ScanpipeError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(dirs)
}
