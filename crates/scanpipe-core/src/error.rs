use std::path::PathBuf;

use thiserror::Error;

use crate::hyperstack::ImageId;

#[derive(Error, Debug)]
pub enum ScanpipeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid glob pattern: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("No decodable stack: {reason} (check metadata completeness)")]
    Assembly { reason: String },

    #[error("Missing or malformed initiator file: {0}")]
    MissingInitiator(PathBuf),

    #[error("Not a stack: {title} has a single z-plane and cannot be projected")]
    NotAStack { title: String },

    #[error("Single timepoint data in {title}: cannot create a difference movie")]
    SingleTimepoint { title: String },

    #[error("Invalid frame shift {shift} for a stack with {frames} frame(s)")]
    InvalidShift { shift: usize, frames: usize },

    #[error("Cannot prepare output directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("No open image with id {0}")]
    UnknownImage(ImageId),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Panic while processing: {0}")]
    Panicked(String),
}

impl ScanpipeError {
    /// Short taxonomy name used in run log entries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Assembly { .. } | Self::MissingInitiator(_) => "AssemblyError",
            Self::NotAStack { .. } => "NotAStackError",
            Self::SingleTimepoint { .. } => "SingleTimepointError",
            Self::InvalidShift { .. } => "InvalidShiftError",
            Self::Directory { .. } => "DirectoryError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "IoError",
            Self::Panicked(_) => "Panic",
            Self::Tiff(_)
            | Self::GlobPattern(_)
            | Self::Backend(_)
            | Self::UnknownImage(_)
            | Self::DimensionMismatch(_) => "ExecutionError",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanpipeError>;
