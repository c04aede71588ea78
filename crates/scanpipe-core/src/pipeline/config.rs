use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MEDIAN_RADIUS, MAX_CHANNELS};
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::ChannelColor;
use crate::layout::LayoutKind;

/// Parameters of one batch run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Experiment root holding the scans.
    pub root: PathBuf,
    /// Frames to shift for difference movies. 0 disables them.
    #[serde(default)]
    pub difference_number: usize,
    /// Display color per channel, channel 1 first.
    #[serde(default = "default_channel_colors")]
    pub channel_colors: Vec<ChannelColor>,
    #[serde(default)]
    pub plane_mode: PlaneMode,
    #[serde(default)]
    pub layout: LayoutChoice,
    #[serde(default)]
    pub difference_source: DifferenceSource,
    #[serde(default)]
    pub projection_policy: ProjectionPolicy,
    #[serde(default = "default_median_radius")]
    pub median_radius: usize,
    /// Run the median-filtered second pass.
    #[serde(default = "default_true")]
    pub filtered_pass: bool,
}

fn default_channel_colors() -> Vec<ChannelColor> {
    vec![ChannelColor::Select]
}
fn default_median_radius() -> usize {
    DEFAULT_MEDIAN_RADIUS
}
fn default_true() -> bool {
    true
}

impl BatchConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            difference_number: 0,
            channel_colors: default_channel_colors(),
            plane_mode: PlaneMode::default(),
            layout: LayoutChoice::default(),
            difference_source: DifferenceSource::default(),
            projection_policy: ProjectionPolicy::default(),
            median_radius: DEFAULT_MEDIAN_RADIUS,
            filtered_pass: true,
        }
    }

    /// Reject configurations that would fail every scan.
    pub fn validate(&self) -> Result<()> {
        match self.channel_colors.first() {
            None => return Err(ScanpipeError::Config("no channel colors given".into())),
            Some(c) if !c.is_assigned() => {
                return Err(ScanpipeError::Config(
                    "channel 1 has no color assigned (still 'Select')".into(),
                ))
            }
            Some(_) => {}
        }
        if self.channel_colors.len() > MAX_CHANNELS {
            return Err(ScanpipeError::Config(format!(
                "{} channel colors given, at most {} channels are supported",
                self.channel_colors.len(),
                MAX_CHANNELS
            )));
        }
        if self.difference_source == DifferenceSource::Filtered
            && self.difference_number > 0
            && !self.filtered_pass
        {
            return Err(ScanpipeError::Config(
                "difference movies from filtered data need the filtered pass".into(),
            ));
        }
        Ok(())
    }
}

/// Whether the data has one z-plane per timepoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneMode {
    /// Decide from the assembled stack.
    #[default]
    Auto,
    Single,
    Multi,
}

impl PlaneMode {
    pub fn is_single_plane(&self, slices: usize) -> bool {
        match self {
            Self::Auto => slices == 1,
            Self::Single => true,
            Self::Multi => false,
        }
    }
}

impl fmt::Display for PlaneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Single => write!(f, "Single plane"),
            Self::Multi => write!(f, "Multi plane"),
        }
    }
}

/// Acquisition layout to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutChoice {
    #[default]
    Auto,
    Olympus,
    Bruker,
}

impl LayoutChoice {
    pub fn fixed(&self) -> Option<LayoutKind> {
        match self {
            Self::Auto => None,
            Self::Olympus => Some(LayoutKind::Olympus),
            Self::Bruker => Some(LayoutKind::Bruker),
        }
    }
}

impl fmt::Display for LayoutChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Olympus => write!(f, "Olympus"),
            Self::Bruker => write!(f, "Bruker"),
        }
    }
}

/// Which projections feed the difference movies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifferenceSource {
    /// `rawMAX/`, or `raw/` for single-plane data.
    #[default]
    Raw,
    /// `filteredMAX/`, or `filtered/` for single-plane data.
    Filtered,
}

impl fmt::Display for DifferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "Raw"),
            Self::Filtered => write!(f, "Filtered"),
        }
    }
}

/// What to do when multi-plane projection meets a single-plane stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionPolicy {
    /// Fail the scan with a not-a-stack error.
    #[default]
    Fail,
    /// Pass the stack through unprojected.
    Skip,
}

impl fmt::Display for ProjectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "Fail"),
            Self::Skip => write!(f, "Skip"),
        }
    }
}
