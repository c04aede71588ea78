use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::backend::ImageBackend;
use crate::consts::{FILTERED_SUFFIX, MERGED_PREFIX, RAW_SUFFIX, TIFF_EXTENSION};
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::{ChannelColor, ImageId};
use crate::output::OutputDirs;

use super::config::ProjectionPolicy;

/// Split the assembled stack into per-channel stacks and save each to
/// `raw_dir`. A single-channel stack is only renamed `C1-<title>`.
pub fn split_channels(
    backend: &mut dyn ImageBackend,
    id: ImageId,
    raw_dir: &Path,
) -> Result<Vec<ImageId>> {
    let channels = backend.stack(id)?.channels();
    let ids = if channels > 1 {
        backend.split_channels(id)?
    } else {
        info!("Only one channel, bypassing channel splitter");
        let title = backend.title(id)?;
        backend.set_title(id, &format!("C1-{}", title))?;
        vec![id]
    };

    for &channel in &ids {
        backend.save_tiff(channel, raw_dir)?;
    }
    info!(channels = ids.len(), "Saved channel stacks");
    Ok(ids)
}

/// Max-project each channel stack into `out_dir`, closing the sources.
///
/// Single-plane data passes through untouched. A stack with one z-plane
/// in multi-plane mode fails with `NotAStack` unless `policy` says skip.
pub fn project_max(
    backend: &mut dyn ImageBackend,
    ids: &[ImageId],
    single_plane: bool,
    policy: ProjectionPolicy,
    out_dir: &Path,
) -> Result<Vec<ImageId>> {
    if single_plane {
        info!("Single plane data, skipping z-projection");
        return Ok(ids.to_vec());
    }

    let mut projected = Vec::with_capacity(ids.len());
    for &id in ids {
        let stack = backend.stack(id)?;
        if stack.slices() == 1 {
            match policy {
                ProjectionPolicy::Fail => {
                    return Err(ScanpipeError::NotAStack {
                        title: stack.title.clone(),
                    })
                }
                ProjectionPolicy::Skip => {
                    warn!(title = %stack.title, "Cannot z-project a single plane, passing through");
                    projected.push(id);
                    continue;
                }
            }
        }
        let max = backend.z_project_max(id)?;
        backend.save_tiff(max, out_dir)?;
        backend.close(id);
        projected.push(max);
    }
    Ok(projected)
}

/// Color each channel and, with more than one channel, save a merged
/// composite `Merged_<basename><suffix>` to `out_dir`. Every open image is
/// closed afterwards.
pub fn composite(
    backend: &mut dyn ImageBackend,
    ids: &[ImageId],
    colors: &[ChannelColor],
    basename: &str,
    suffix: &str,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    for (channel, &id) in ids.iter().enumerate() {
        let color = match colors.get(channel) {
            Some(c) if c.is_assigned() => *c,
            _ => {
                return Err(ScanpipeError::Config(format!(
                    "no color assigned to channel {}",
                    channel + 1
                )))
            }
        };
        backend.apply_color(id, color)?;
        debug!(channel = channel + 1, color = %color, "Applied LUT");
    }

    let merged = if ids.len() > 1 {
        info!(channels = ids.len(), "Merging channels");
        let merged = backend.merge_channels(ids)?;
        backend.set_title(merged, &format!("{}{}{}", MERGED_PREFIX, basename, suffix))?;
        Some(backend.save_tiff(merged, out_dir)?)
    } else {
        info!("Only one channel, skipping merge");
        None
    };

    backend.close_all();
    Ok(merged)
}

/// Reopen the raw channel stacks, median filter them, rename `_raw` to
/// `_filtered` and save them to `filtered/`. The filtered stacks stay open
/// for the projection that follows.
pub fn median_filter_pass(
    backend: &mut dyn ImageBackend,
    dirs: &OutputDirs,
    radius: usize,
) -> Result<Vec<ImageId>> {
    let sources = list_tiffs(&dirs.raw, is_channel_artifact)?;
    let mut ids = Vec::with_capacity(sources.len());
    for path in sources {
        let id = backend.open_image(&path)?;
        backend.median_filter(id, radius)?;
        let title = filtered_title(&backend.title(id)?);
        backend.set_title(id, &title)?;
        backend.save_tiff(id, &dirs.filtered)?;
        ids.push(id);
    }
    info!(stacks = ids.len(), radius, "Median filtered channel stacks");
    Ok(ids)
}

/// `C1-scan_raw` -> `C1-scan_filtered`.
pub fn filtered_title(title: &str) -> String {
    match title.strip_suffix(RAW_SUFFIX) {
        Some(stem) => format!("{}{}", stem, FILTERED_SUFFIX),
        None => title.replace("raw", "filtered"),
    }
}

/// Per-channel artifacts are named `C<digits>-...`.
pub fn is_channel_artifact(file_name: &str) -> bool {
    let Some(rest) = file_name.strip_prefix('C') else {
        return false;
    };
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && rest[digits..].starts_with('-')
}

/// TIFF files in `dir` whose names pass `filter`, sorted by name.
pub fn list_tiffs(dir: &Path, filter: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_tiff = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == TIFF_EXTENSION);
        if is_tiff && path.is_file() && filter(name) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
