use std::error::Error as StdError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::consts::{RUN_LOG_FILE, RUN_LOG_TIME_FORMAT};
use crate::error::{Result, ScanpipeError};
use crate::layout::LayoutKind;

use super::types::{BatchSummary, ScanStage};

/// Append-only per-run record at `<root>/errorFile.txt`.
///
/// The file is opened for every entry and closed again, so whatever was
/// written survives if the process dies mid-batch. Nothing is ever
/// truncated.
#[derive(Clone, Debug)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(RUN_LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn begin_run(&self, layout: LayoutKind, scans: usize) -> Result<()> {
        self.append(&format!(
            "=== {} batch run: {} layout, {} scan(s) ===\n",
            timestamp(),
            layout,
            scans
        ))
    }

    pub fn record_start(&self, basename: &str) -> Result<()> {
        self.append(&format!("{} Processing {}\n", timestamp(), basename))
    }

    pub fn record_success(&self, basename: &str) -> Result<()> {
        self.append(&format!("{} Completed {}\n", timestamp(), basename))
    }

    pub fn record_failure(
        &self,
        basename: &str,
        stage: ScanStage,
        err: &ScanpipeError,
    ) -> Result<()> {
        self.append(&format!(
            "{} Error with {} during {}: {}: {}\n{}",
            timestamp(),
            basename,
            stage,
            err.kind(),
            err,
            format_cause_chain(err)
        ))
    }

    pub fn finish_run(&self, summary: &BatchSummary) -> Result<()> {
        self.append(&format!(
            "{} Done. {} succeeded, {} failed\n",
            timestamp(),
            summary.succeeded(),
            summary.failed()
        ))
    }

    fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// One indented `caused by:` line per error source.
pub fn format_cause_chain(err: &dyn StdError) -> String {
    let mut out = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!("    caused by: {}\n", cause));
        source = cause.source();
    }
    out
}

fn timestamp() -> String {
    Local::now().format(RUN_LOG_TIME_FORMAT).to_string()
}
