use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array5};
use scanpipe_core::hyperstack::{ChannelColor, Hyperstack};
use scanpipe_core::io::tiff_io::write_hyperstack;

/// Synthetic plane height in pixels.
pub const HEIGHT: usize = 8;
/// Synthetic plane width in pixels.
pub const WIDTH: usize = 10;
/// Intensity gained per timepoint, so a shift of `k` frames differs by
/// `k * FRAME_STEP` everywhere.
pub const FRAME_STEP: u16 = 50;

/// Deterministic test pattern: a spatial ramp whose level depends on the
/// channel, rises with z, and rises by `FRAME_STEP` per timepoint.
pub fn pixel(c: usize, z: usize, t: usize, y: usize, x: usize) -> u16 {
    ((c + 1) * 1000 + z * 10 + t * FRAME_STEP as usize + y + x) as u16
}

pub fn synthetic_stack(title: &str, channels: usize, slices: usize, frames: usize) -> Hyperstack {
    let data = Array5::from_shape_fn(
        (channels, slices, frames, HEIGHT, WIDTH),
        |(c, z, t, y, x)| pixel(c, z, t, y, x),
    );
    Hyperstack::new(title, data, 16)
}

pub fn plane(c: usize, z: usize, t: usize) -> Array2<u16> {
    Array2::from_shape_fn((HEIGHT, WIDTH), |(y, x)| pixel(c, z, t, y, x))
}

/// Write one 16-bit plane as a single-page TIFF.
pub fn write_plane(path: &Path, data: Array2<u16>) {
    let (h, w) = data.dim();
    let stack = Hyperstack::new(
        "plane",
        data.into_shape_with_order((1, 1, 1, h, w)).unwrap(),
        16,
    );
    write_hyperstack(&stack, path).unwrap();
}

/// Bruker-style scan directory `<root>/<name>/` holding
/// `<name>_Cycle#####_Ch#_######.ome.tif` for every (c, z, t), plus the
/// metadata file the microscope writes next to the planes.
pub fn write_bruker_scan(
    root: &Path,
    name: &str,
    channels: usize,
    slices: usize,
    frames: usize,
) -> PathBuf {
    let scan = root.join(name);
    fs::create_dir_all(&scan).unwrap();
    fs::write(scan.join(format!("{}.xml", name)), "<PVScan/>").unwrap();
    for t in 0..frames {
        for c in 0..channels {
            for z in 0..slices {
                write_plane(&bruker_plane_path(&scan, name, c, z, t), plane(c, z, t));
            }
        }
    }
    scan
}

/// Path of plane (c, z, t), zero-based, in a Bruker scan.
pub fn bruker_plane_path(scan: &Path, name: &str, c: usize, z: usize, t: usize) -> PathBuf {
    scan.join(format!(
        "{}_Cycle{:05}_Ch{}_{:06}.ome.tif",
        name,
        t + 1,
        c + 1,
        z + 1
    ))
}

/// Olympus-style scan: `<root>/<name>.oif` plus `<root>/<name>.oif.files/`
/// holding `s_C###Z###T###.tif` planes. Returns the container directory.
pub fn write_olympus_scan(
    root: &Path,
    name: &str,
    channels: usize,
    slices: usize,
    frames: usize,
) -> PathBuf {
    fs::write(root.join(format!("{}.oif", name)), "[FileInformation]").unwrap();
    let container = root.join(format!("{}.oif.files", name));
    fs::create_dir_all(&container).unwrap();
    for t in 0..frames {
        for c in 0..channels {
            for z in 0..slices {
                let file = format!("s_C{:03}Z{:03}T{:03}.tif", c + 1, z + 1, t + 1);
                write_plane(&container.join(file), plane(c, z, t));
            }
        }
    }
    container
}

pub fn two_colors() -> Vec<ChannelColor> {
    vec![ChannelColor::Green, ChannelColor::Magenta]
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
