/// Initiator file suffix that marks an Olympus (OIF) experiment root.
pub const OIF_SUFFIX: &str = ".oif";

/// Suffix of the per-scan container directories in an Olympus root.
pub const OIF_CONTAINER_SUFFIX: &str = ".oif.files";

/// Bruker initiator pattern, appended to the scan basename. The `Ch?`
/// token matches whichever channel was written first.
pub const BRUKER_INITIATOR_PATTERN: &str = "_Cycle00001_Ch?_000001.ome.tif";

/// Extension of Bruker per-plane files.
pub const OME_TIFF_SUFFIX: &str = ".ome.tif";

/// Extension used for every artifact this tool writes.
pub const TIFF_EXTENSION: &str = "tif";

/// Name of the per-scan output root.
pub const PROCESSED_DIR: &str = "processed";

/// Run log file name, written to the experiment root.
pub const RUN_LOG_FILE: &str = "errorFile.txt";

/// Median filter radius applied in the filtered pass.
pub const DEFAULT_MEDIAN_RADIUS: usize = 1;

/// Maximum number of channels that can be colored and merged.
pub const MAX_CHANNELS: usize = 3;

/// Title prefix produced by z-projection.
pub const MAX_PREFIX: &str = "MAX_";

/// Title prefix of merged composites.
pub const MERGED_PREFIX: &str = "Merged_";

/// Title prefix produced by image subtraction.
pub const RESULT_PREFIX: &str = "Result of ";

/// Stage suffix of unfiltered artifacts.
pub const RAW_SUFFIX: &str = "_raw";

/// Stage suffix of median-filtered artifacts.
pub const FILTERED_SUFFIX: &str = "_filtered";

/// Minimum plane pixel count (h*w) to filter rows in parallel.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// ImageJ version string written into hyperstack descriptions.
pub const IMAGEJ_DESCRIPTION_VERSION: &str = "1.54f";

/// Timestamp format of run log entries.
pub const RUN_LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
