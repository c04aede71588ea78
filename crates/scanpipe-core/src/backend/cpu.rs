use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{OIF_SUFFIX, OME_TIFF_SUFFIX, TIFF_EXTENSION};
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::{ChannelColor, Hyperstack, ImageId};
use crate::io::planes::{assemble_planes, bruker_base, bruker_planes, oif_planes};
use crate::io::tiff_io::{read_hyperstack, write_hyperstack};

use super::{ops, ImageBackend};

/// In-process backend: images live in memory, pixel work runs on Rayon.
#[derive(Default)]
pub struct CpuBackend {
    images: BTreeMap<ImageId, Hyperstack>,
    next_id: u64,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn stack_mut(&mut self, id: ImageId) -> Result<&mut Hyperstack> {
        self.images
            .get_mut(&id)
            .ok_or(ScanpipeError::UnknownImage(id))
    }

    fn take(&mut self, id: ImageId) -> Result<Hyperstack> {
        self.images
            .remove(&id)
            .ok_or(ScanpipeError::UnknownImage(id))
    }
}

impl ImageBackend for CpuBackend {
    fn name(&self) -> &str {
        "CPU/Rayon"
    }

    fn open_stack(&mut self, initiator: &Path) -> Result<Vec<ImageId>> {
        if !initiator.is_file() {
            return Err(ScanpipeError::MissingInitiator(initiator.to_path_buf()));
        }
        let name = initiator
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let stacks = if name.ends_with(OIF_SUFFIX) {
            let title = name.trim_end_matches(OIF_SUFFIX);
            assemble_planes(title, &oif_planes(initiator)?)?
        } else if name.ends_with(OME_TIFF_SUFFIX) && name.contains("_Cycle") {
            let title = bruker_base(initiator)?;
            assemble_planes(&title, &bruker_planes(initiator)?)?
        } else {
            vec![read_hyperstack(initiator)?]
        };

        debug!(
            initiator = %initiator.display(),
            stacks = stacks.len(),
            "Opened acquisition"
        );
        Ok(stacks.into_iter().map(|s| self.insert(s)).collect())
    }

    fn open_image(&mut self, path: &Path) -> Result<ImageId> {
        let stack = read_hyperstack(path)?;
        Ok(self.insert(stack))
    }

    fn insert(&mut self, stack: Hyperstack) -> ImageId {
        self.next_id += 1;
        let id = ImageId(self.next_id);
        self.images.insert(id, stack);
        id
    }

    fn ids(&self) -> Vec<ImageId> {
        self.images.keys().copied().collect()
    }

    fn stack(&self, id: ImageId) -> Result<&Hyperstack> {
        self.images.get(&id).ok_or(ScanpipeError::UnknownImage(id))
    }

    fn set_title(&mut self, id: ImageId, title: &str) -> Result<()> {
        self.stack_mut(id)?.title = title.to_string();
        Ok(())
    }

    fn duplicate(&mut self, id: ImageId, title: &str) -> Result<ImageId> {
        let mut copy = self.stack(id)?.clone();
        copy.title = title.to_string();
        Ok(self.insert(copy))
    }

    fn split_channels(&mut self, id: ImageId) -> Result<Vec<ImageId>> {
        let source = self.take(id)?;
        let channels = ops::split_channels(&source);
        Ok(channels.into_iter().map(|c| self.insert(c)).collect())
    }

    fn z_project_max(&mut self, id: ImageId) -> Result<ImageId> {
        let projected = ops::z_project_max(self.stack(id)?)?;
        Ok(self.insert(projected))
    }

    fn apply_color(&mut self, id: ImageId, color: ChannelColor) -> Result<()> {
        let stack = self.stack_mut(id)?;
        stack.luts.iter_mut().for_each(|lut| *lut = Some(color));
        Ok(())
    }

    fn merge_channels(&mut self, ids: &[ImageId]) -> Result<ImageId> {
        let sources = ids
            .iter()
            .map(|&id| self.stack(id))
            .collect::<Result<Vec<_>>>()?;
        let merged = ops::merge_channels(&sources)?;
        Ok(self.insert(merged))
    }

    fn median_filter(&mut self, id: ImageId, radius: usize) -> Result<()> {
        ops::median_filter(self.stack_mut(id)?, radius);
        Ok(())
    }

    fn delete_frame(&mut self, id: ImageId, index: usize) -> Result<()> {
        self.stack_mut(id)?.remove_frame(index)
    }

    fn reverse_frames(&mut self, id: ImageId) -> Result<()> {
        self.stack_mut(id)?.reverse_frames();
        Ok(())
    }

    fn trim_frames(&mut self, id: ImageId, start: usize, end: usize) -> Result<()> {
        self.stack_mut(id)?.keep_frames(start..end)
    }

    fn subtract(&mut self, a: ImageId, b: ImageId) -> Result<ImageId> {
        let result = ops::subtract(self.stack(a)?, self.stack(b)?)?;
        Ok(self.insert(result))
    }

    fn save_tiff(&mut self, id: ImageId, dir: &Path) -> Result<PathBuf> {
        let stack = self.stack(id)?;
        let path = dir.join(format!("{}.{}", stack.title, TIFF_EXTENSION));
        write_hyperstack(stack, &path)?;
        debug!(title = %stack.title, path = %path.display(), "Saved TIFF");
        Ok(path)
    }

    fn close(&mut self, id: ImageId) {
        self.images.remove(&id);
    }
}
