//! Motion-difference movies.
//!
//! For a series of `T` frames and a shift `k`, the "future" series keeps
//! frames `k..T` and the "past" series keeps frames `0..T-k`. Their
//! frame-wise difference `future - past` has exactly `T - k` frames: frame
//! `i` of the result is `frame[i + k] - frame[i]`, clipped at zero. Static
//! content cancels; anything that moved within `k` frames remains.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::backend::ImageBackend;
use crate::consts::RESULT_PREFIX;
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::{Hyperstack, ImageId};
use crate::output::OutputDirs;

use super::config::DifferenceSource;
use super::stages::{is_channel_artifact, list_tiffs};

/// Check that a `frames`-long series can be shifted by `shift`.
pub fn validate_shift(title: &str, frames: usize, shift: usize) -> Result<()> {
    if frames == 1 {
        return Err(ScanpipeError::SingleTimepoint {
            title: title.to_string(),
        });
    }
    if shift == 0 || shift >= frames {
        return Err(ScanpipeError::InvalidShift { shift, frames });
    }
    Ok(())
}

/// `Result of X` -> `Diff<k>-X`.
pub fn difference_title(result_title: &str, shift: usize) -> String {
    let name = result_title
        .strip_prefix(RESULT_PREFIX)
        .unwrap_or(result_title);
    format!("Diff{}-{}", shift, name)
}

/// Compute the difference movie of an in-memory stack.
pub fn shifted_difference(stack: &Hyperstack, shift: usize) -> Result<Hyperstack> {
    let frames = stack.frames();
    validate_shift(&stack.title, frames, shift)?;

    let mut future = stack.clone();
    future.keep_frames(shift..frames)?;
    let mut past = stack.clone();
    past.keep_frames(0..frames - shift)?;

    let mut diff = crate::backend::ops::subtract(&future, &past)?;
    diff.title = difference_title(&diff.title, shift);
    Ok(diff)
}

/// Compute the difference movie of a registered stack through backend
/// commands. The source and its duplicate are closed; the returned image
/// is titled `Diff<k>-<source title>`.
pub fn make_difference(
    backend: &mut dyn ImageBackend,
    id: ImageId,
    shift: usize,
) -> Result<ImageId> {
    let stack = backend.stack(id)?;
    let title = stack.title.clone();
    let frames = stack.frames();
    validate_shift(&title, frames, shift)?;

    let past = backend.duplicate(id, &format!("{}_dup", title))?;
    backend.trim_frames(id, shift, frames)?;
    backend.trim_frames(past, 0, frames - shift)?;

    let diff = backend.subtract(id, past)?;
    let diff_title = difference_title(&backend.title(diff)?, shift);
    backend.set_title(diff, &diff_title)?;

    backend.close(id);
    backend.close(past);
    Ok(diff)
}

/// Stacks that feed the difference movies of a scan.
///
/// Multi-plane data uses every projection and composite in the chosen MAX
/// directory; single-plane data uses the per-channel stacks.
pub fn difference_candidates(
    dirs: &OutputDirs,
    single_plane: bool,
    source: DifferenceSource,
) -> Result<Vec<PathBuf>> {
    match (single_plane, source) {
        (false, DifferenceSource::Raw) => list_tiffs(&dirs.max_raw, |_| true),
        (false, DifferenceSource::Filtered) => list_tiffs(&dirs.max_filtered, |_| true),
        (true, DifferenceSource::Raw) => list_tiffs(&dirs.raw, is_channel_artifact),
        (true, DifferenceSource::Filtered) => list_tiffs(&dirs.filtered, is_channel_artifact),
    }
}

/// Open every candidate, then write one difference movie per candidate to
/// `diff_dir`. Every candidate is checked against `shift` before the first
/// movie is made, so a single-timepoint candidate leaves `diff_dir` empty.
pub fn run_difference_stage(
    backend: &mut dyn ImageBackend,
    candidates: &[PathBuf],
    diff_dir: &Path,
    shift: usize,
) -> Result<Vec<PathBuf>> {
    info!(candidates = candidates.len(), shift, "Making difference movies");
    let ids = candidates
        .iter()
        .map(|path| backend.open_image(path))
        .collect::<Result<Vec<_>>>()?;
    for &id in &ids {
        let stack = backend.stack(id)?;
        validate_shift(&stack.title, stack.frames(), shift)?;
    }

    let mut written = Vec::with_capacity(ids.len());
    for id in ids {
        let diff = make_difference(backend, id, shift)?;
        written.push(backend.save_tiff(diff, diff_dir)?);
        backend.close(diff);
    }
    info!(movies = written.len(), "Finished difference movies");
    Ok(written)
}
