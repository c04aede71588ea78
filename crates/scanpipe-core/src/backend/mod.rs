pub mod cpu;
pub mod ops;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::hyperstack::{ChannelColor, Hyperstack, ImageId};

pub use cpu::CpuBackend;

/// Image-processing backend owning a registry of open images.
///
/// Every command addresses images by [`ImageId`]. Commands that create an
/// image register it and return its id; nothing is released until
/// [`close`](ImageBackend::close) or [`close_all`](ImageBackend::close_all).
/// Ids ascend in registration order, so [`ids`](ImageBackend::ids) lists
/// images oldest first.
pub trait ImageBackend {
    fn name(&self) -> &str;

    /// Decode an acquisition starting from its initiator file as XYCZT
    /// hyperstacks. A partial acquisition may surface more than one stack.
    fn open_stack(&mut self, initiator: &Path) -> Result<Vec<ImageId>>;

    /// Open a single TIFF written by [`save_tiff`](ImageBackend::save_tiff).
    fn open_image(&mut self, path: &Path) -> Result<ImageId>;

    /// Register an in-memory stack.
    fn insert(&mut self, stack: Hyperstack) -> ImageId;

    fn ids(&self) -> Vec<ImageId>;

    fn stack(&self, id: ImageId) -> Result<&Hyperstack>;

    fn title(&self, id: ImageId) -> Result<String> {
        Ok(self.stack(id)?.title.clone())
    }

    fn set_title(&mut self, id: ImageId, title: &str) -> Result<()>;

    fn find(&self, title: &str) -> Option<ImageId> {
        self.ids()
            .into_iter()
            .find(|&id| self.stack(id).map(|s| s.title == title).unwrap_or(false))
    }

    fn duplicate(&mut self, id: ImageId, title: &str) -> Result<ImageId>;

    /// Split into one stack per channel, titled `C<i>-<title>`. The source
    /// is closed.
    fn split_channels(&mut self, id: ImageId) -> Result<Vec<ImageId>>;

    /// Per-timepoint maximum across z-planes, titled `MAX_<title>`.
    fn z_project_max(&mut self, id: ImageId) -> Result<ImageId>;

    fn apply_color(&mut self, id: ImageId, color: ChannelColor) -> Result<()>;

    /// Merge single-channel stacks, in order, into one composite titled
    /// `Merged`. Sources stay open.
    fn merge_channels(&mut self, ids: &[ImageId]) -> Result<ImageId>;

    /// Median filter every plane in place.
    fn median_filter(&mut self, id: ImageId, radius: usize) -> Result<()>;

    /// Delete one timepoint (zero-based).
    fn delete_frame(&mut self, id: ImageId, index: usize) -> Result<()>;

    fn reverse_frames(&mut self, id: ImageId) -> Result<()>;

    /// Keep only timepoints `start..end`.
    fn trim_frames(&mut self, id: ImageId, start: usize, end: usize) -> Result<()>;

    /// Frame-wise `a - b`, saturating at zero, titled `Result of <a>`.
    fn subtract(&mut self, a: ImageId, b: ImageId) -> Result<ImageId>;

    /// Save as `<dir>/<title>.tif` and return the written path.
    fn save_tiff(&mut self, id: ImageId, dir: &Path) -> Result<PathBuf>;

    /// Release an image, discarding unsaved changes.
    fn close(&mut self, id: ImageId);

    fn close_all(&mut self) {
        for id in self.ids() {
            self.close(id);
        }
    }
}
