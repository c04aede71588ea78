//! Per-plane acquisition files and their assembly into hyperstacks.
//!
//! Both supported microscopes write one TIFF per (channel, z-plane,
//! timepoint). The plane position is encoded in the file name:
//!
//! - Bruker: `<base>_Cycle00003_Ch2_000004.ome.tif` (cycle = timepoint,
//!   `Ch` = channel, trailing index = z-plane)
//! - Olympus: `s_C002Z004T003.tif` inside the `<name>.oif.files` container

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use glob::Pattern;
use ndarray::{s, Array2, Array5};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::OME_TIFF_SUFFIX;
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::Hyperstack;

use super::tiff_io::read_plane;

/// One plane file with its 1-based position in the acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaneFile {
    pub channel: usize,
    pub slice: usize,
    pub frame: usize,
    pub path: PathBuf,
}

/// Parse `<base>_Cycle#####_Ch#_######.ome.tif` into (channel, slice, frame).
pub fn parse_bruker_plane(file_name: &str, base: &str) -> Option<(usize, usize, usize)> {
    let rest = file_name
        .strip_prefix(base)?
        .strip_prefix("_Cycle")?
        .strip_suffix(OME_TIFF_SUFFIX)?;
    let mut parts = rest.split('_');
    let frame = parts.next()?.parse().ok()?;
    let channel = parts.next()?.strip_prefix("Ch")?.parse().ok()?;
    let slice = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((channel, slice, frame))
}

/// Parse `s_C###Z###T###.tif` into (channel, slice, frame). The Z and T
/// tokens are omitted by the microscope for single-plane or single-frame
/// acquisitions and default to 1.
pub fn parse_oif_plane(file_name: &str) -> Option<(usize, usize, usize)> {
    let rest = file_name.strip_prefix("s_")?;
    let rest = rest
        .strip_suffix(".tif")
        .or_else(|| rest.strip_suffix(".tiff"))?;

    let (mut channel, mut slice, mut frame) = (None, 1, 1);
    let mut chars = rest.chars().peekable();
    while let Some(tag) = chars.next() {
        let mut digits = String::new();
        while let Some(d) = chars.peek().filter(|c| c.is_ascii_digit()) {
            digits.push(*d);
            chars.next();
        }
        let value: usize = digits.parse().ok()?;
        match tag {
            'C' => channel = Some(value),
            'Z' => slice = value,
            'T' => frame = value,
            _ => return None,
        }
    }
    let channel = channel?;
    (channel > 0 && slice > 0 && frame > 0).then_some((channel, slice, frame))
}

/// Scan basename encoded in a Bruker initiator file name.
pub fn bruker_base(initiator: &Path) -> Result<String> {
    let name = initiator
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ScanpipeError::MissingInitiator(initiator.to_path_buf()))?;
    name.rfind("_Cycle")
        .map(|idx| name[..idx].to_string())
        .ok_or_else(|| ScanpipeError::MissingInitiator(initiator.to_path_buf()))
}

/// Collect every plane file belonging to the Bruker acquisition that
/// `initiator` starts.
pub fn bruker_planes(initiator: &Path) -> Result<Vec<PlaneFile>> {
    let base = bruker_base(initiator)?;
    let dir = initiator
        .parent()
        .ok_or_else(|| ScanpipeError::MissingInitiator(initiator.to_path_buf()))?;
    let pattern = format!(
        "{}/{}_Cycle*_Ch*_*{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(&base),
        OME_TIFF_SUFFIX
    );

    let mut planes = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| ScanpipeError::Io(e.into()))?;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((channel, slice, frame)) = parse_bruker_plane(name, &base) {
            planes.push(PlaneFile {
                channel,
                slice,
                frame,
                path,
            });
        }
    }
    debug!(base = %base, planes = planes.len(), "Collected Bruker planes");
    Ok(planes)
}

/// Collect the plane files of an Olympus acquisition from the container
/// directory next to the `.oif` initiator.
pub fn oif_planes(initiator: &Path) -> Result<Vec<PlaneFile>> {
    let mut container: OsString = initiator.as_os_str().to_owned();
    container.push(".files");
    let container = PathBuf::from(container);
    if !container.is_dir() {
        return Err(ScanpipeError::MissingInitiator(container));
    }

    let mut planes = Vec::new();
    for entry in std::fs::read_dir(&container)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((channel, slice, frame)) = parse_oif_plane(name) {
            planes.push(PlaneFile {
                channel,
                slice,
                frame,
                path,
            });
        }
    }
    debug!(container = %container.display(), planes = planes.len(), "Collected OIF planes");
    Ok(planes)
}

/// Assemble plane files into hyperstacks.
///
/// Channel and z-plane numbers need not start at 1 or be contiguous: the
/// distinct numbers found are mapped, in ascending order, onto dense
/// indices. Timepoints holding every channel x z-plane combination form the
/// main stack, titled `title`. Each incomplete timepoint (an interrupted
/// acquisition) is surfaced as its own one-frame stack with the missing
/// planes left black. The main stack, if any, comes first.
pub fn assemble_planes(title: &str, planes: &[PlaneFile]) -> Result<Vec<Hyperstack>> {
    if planes.is_empty() {
        return Err(ScanpipeError::Assembly {
            reason: format!("no image planes found for {}", title),
        });
    }

    let channel_index = dense_index(planes.iter().map(|p| p.channel));
    let slice_index = dense_index(planes.iter().map(|p| p.slice));
    let (channels, slices) = (channel_index.len(), slice_index.len());

    let mut by_frame: BTreeMap<usize, Vec<&PlaneFile>> = BTreeMap::new();
    for plane in planes {
        by_frame.entry(plane.frame).or_default().push(plane);
    }

    let decoded: Vec<(usize, usize, usize, Array2<u16>, u8)> = planes
        .par_iter()
        .map(|p| {
            let (data, depth) = read_plane(&p.path)?;
            Ok((p.channel, p.slice, p.frame, data, depth))
        })
        .collect::<Result<_>>()?;

    let (height, width) = decoded[0].3.dim();
    if let Some((_, _, _, bad, _)) = decoded.iter().find(|d| d.3.dim() != (height, width)) {
        return Err(ScanpipeError::DimensionMismatch(format!(
            "{}: plane of {}x{} among planes of {}x{}",
            title,
            bad.ncols(),
            bad.nrows(),
            width,
            height
        )));
    }
    let bit_depth = decoded.iter().map(|d| d.4).max().unwrap_or(16);
    let lookup: BTreeMap<(usize, usize, usize), &Array2<u16>> = decoded
        .iter()
        .map(|(c, z, t, data, _)| ((*c, *z, *t), data))
        .collect();

    let mut complete = Vec::new();
    let mut partial = Vec::new();
    for (&frame, members) in &by_frame {
        let distinct: BTreeSet<(usize, usize)> =
            members.iter().map(|p| (p.channel, p.slice)).collect();
        if distinct.len() == channels * slices {
            complete.push(frame);
        } else {
            partial.push(frame);
        }
    }

    let build = |stack_title: String, frames: &[usize]| {
        let mut data = Array5::<u16>::zeros((channels, slices, frames.len(), height, width));
        for (ti, frame) in frames.iter().enumerate() {
            for (&c, &ci) in &channel_index {
                for (&z, &zi) in &slice_index {
                    if let Some(plane) = lookup.get(&(c, z, *frame)) {
                        data.slice_mut(s![ci, zi, ti, .., ..]).assign(*plane);
                    }
                }
            }
        }
        Hyperstack::new(stack_title, data, bit_depth)
    };

    let mut stacks = Vec::new();
    if !complete.is_empty() {
        stacks.push(build(title.to_string(), &complete));
    }
    for frame in partial {
        stacks.push(build(format!("{} (partial T{})", title, frame), &[frame]));
    }
    Ok(stacks)
}

/// Map each distinct acquisition number to its rank among them.
fn dense_index(numbers: impl Iterator<Item = usize>) -> BTreeMap<usize, usize> {
    let distinct: BTreeSet<usize> = numbers.collect();
    distinct
        .into_iter()
        .enumerate()
        .map(|(index, number)| (number, index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bruker_name_parses_cycle_channel_and_plane() {
        assert_eq!(
            parse_bruker_plane("TSeries-001_Cycle00003_Ch2_000004.ome.tif", "TSeries-001"),
            Some((2, 4, 3))
        );
        assert_eq!(
            parse_bruker_plane("TSeries-001_Cycle00003_Ch2_000004.xml", "TSeries-001"),
            None
        );
        assert_eq!(
            parse_bruker_plane("Other_Cycle00001_Ch1_000001.ome.tif", "TSeries-001"),
            None
        );
    }

    #[test]
    fn oif_name_defaults_missing_tokens() {
        assert_eq!(parse_oif_plane("s_C001Z002T003.tif"), Some((1, 2, 3)));
        assert_eq!(parse_oif_plane("s_C002T010.tif"), Some((2, 1, 10)));
        assert_eq!(parse_oif_plane("s_C001.tif"), Some((1, 1, 1)));
        assert_eq!(parse_oif_plane("s_Z001T001.tif"), None);
        assert_eq!(parse_oif_plane("s_C001Z001T001.roi"), None);
    }

    #[test]
    fn bruker_base_strips_cycle_suffix() {
        let base = bruker_base(Path::new("/data/scan_1/scan_1_Cycle00001_Ch1_000001.ome.tif"));
        assert_eq!(base.unwrap(), "scan_1");
        assert!(bruker_base(Path::new("/data/scan_1/readme.txt")).is_err());
    }

    #[test]
    fn dense_index_ranks_sparse_numbers() {
        let index = dense_index([4, 2, 2, 7].into_iter());
        assert_eq!(index.into_iter().collect::<Vec<_>>(), vec![(2, 0), (4, 1), (7, 2)]);
    }
}
