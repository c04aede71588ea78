use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use ndarray::{s, Array5, ArrayView2, Axis, Slice};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanpipeError};

/// Axis index of the channel dimension in [`Hyperstack::data`].
pub const CHANNEL_AXIS: usize = 0;
/// Axis index of the z-plane dimension.
pub const SLICE_AXIS: usize = 1;
/// Axis index of the time dimension.
pub const FRAME_AXIS: usize = 2;

/// Handle of an image registered with a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub(crate) u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A multi-dimensional image: channels x z-planes x timepoints of 2-D planes.
#[derive(Clone, Debug)]
pub struct Hyperstack {
    pub title: String,
    /// Pixel data, shape = (channels, slices, frames, height, width)
    pub data: Array5<u16>,
    /// Bit depth of the source samples (8 or 16)
    pub bit_depth: u8,
    /// Display color per channel, `None` until one is applied
    pub luts: Vec<Option<ChannelColor>>,
}

impl Hyperstack {
    pub fn new(title: impl Into<String>, data: Array5<u16>, bit_depth: u8) -> Self {
        let channels = data.len_of(Axis(CHANNEL_AXIS));
        Self {
            title: title.into(),
            data,
            bit_depth,
            luts: vec![None; channels],
        }
    }

    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(CHANNEL_AXIS))
    }

    pub fn slices(&self) -> usize {
        self.data.len_of(Axis(SLICE_AXIS))
    }

    pub fn frames(&self) -> usize {
        self.data.len_of(Axis(FRAME_AXIS))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(4))
    }

    pub fn dims(&self) -> Dims {
        Dims {
            channels: self.channels(),
            slices: self.slices(),
            frames: self.frames(),
            height: self.height(),
            width: self.width(),
        }
    }

    /// One 2-D plane. Indices are zero-based.
    pub fn plane(&self, channel: usize, slice: usize, frame: usize) -> ArrayView2<'_, u16> {
        self.data.slice(s![channel, slice, frame, .., ..])
    }

    /// Remove a single timepoint (zero-based).
    pub fn remove_frame(&mut self, index: usize) -> Result<()> {
        let frames = self.frames();
        if index >= frames {
            return Err(ScanpipeError::Backend(format!(
                "frame {} out of range for {} ({} frames)",
                index, self.title, frames
            )));
        }
        if frames == 1 {
            return Err(ScanpipeError::Backend(format!(
                "cannot delete the only frame of {}",
                self.title
            )));
        }
        let keep: Vec<usize> = (0..frames).filter(|&i| i != index).collect();
        self.data = self.data.select(Axis(FRAME_AXIS), &keep);
        Ok(())
    }

    /// Reverse the order of timepoints.
    pub fn reverse_frames(&mut self) {
        self.data.invert_axis(Axis(FRAME_AXIS));
    }

    /// Keep only the timepoints in `range`, dropping the rest.
    pub fn keep_frames(&mut self, range: Range<usize>) -> Result<()> {
        let frames = self.frames();
        if range.start >= range.end || range.end > frames {
            return Err(ScanpipeError::Backend(format!(
                "frame range {:?} invalid for {} ({} frames)",
                range, self.title, frames
            )));
        }
        self.data = self
            .data
            .slice_axis(Axis(FRAME_AXIS), Slice::from(range))
            .to_owned();
        Ok(())
    }
}

/// Shape summary of a hyperstack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dims {
    pub channels: usize,
    pub slices: usize,
    pub frames: usize,
    pub height: usize,
    pub width: usize,
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} C={} Z={} T={}",
            self.width, self.height, self.channels, self.slices, self.frames
        )
    }
}

/// Display color (lookup table) assigned to a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelColor {
    /// Placeholder meaning "not chosen yet".
    #[default]
    Select,
    Red,
    Green,
    Blue,
    Grays,
    Cyan,
    Magenta,
    Yellow,
}

impl ChannelColor {
    pub fn is_assigned(&self) -> bool {
        !matches!(self, Self::Select)
    }
}

impl fmt::Display for ChannelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "Select",
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Grays => "Grays",
            Self::Cyan => "Cyan",
            Self::Magenta => "Magenta",
            Self::Yellow => "Yellow",
        };
        f.write_str(name)
    }
}

impl FromStr for ChannelColor {
    type Err = ScanpipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" | "" => Ok(Self::Select),
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "grays" | "grey" | "gray" | "greys" => Ok(Self::Grays),
            "cyan" => Ok(Self::Cyan),
            "magenta" => Ok(Self::Magenta),
            "yellow" => Ok(Self::Yellow),
            other => Err(ScanpipeError::Config(format!("unknown channel color '{}'", other))),
        }
    }
}
