use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use memmap2::Mmap;
use ndarray::{s, Array2, Array5};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

use crate::consts::IMAGEJ_DESCRIPTION_VERSION;
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::{ChannelColor, Hyperstack};

/// Page index of plane (c, z, t) in XYCZT order: channel varies fastest,
/// then z-plane, then time.
pub fn page_index(
    channel: usize,
    slice: usize,
    frame: usize,
    channels: usize,
    slices: usize,
) -> usize {
    channel + channels * (slice + slices * frame)
}

/// Decoded pages of a TIFF file.
pub struct TiffPages {
    pub width: usize,
    pub height: usize,
    pub bit_depth: u8,
    pub pages: Vec<Array2<u16>>,
    pub description: Option<String>,
}

/// Decode every page of a TIFF file. All pages must share one size.
pub fn read_pages(path: &Path) -> Result<TiffPages> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let mut decoder = Decoder::new(Cursor::new(&mmap[..]))?;
    let description = decoder.get_tag_ascii_string(Tag::ImageDescription).ok();

    let (w, h) = decoder.dimensions()?;
    let (width, height) = (w as usize, h as usize);
    let mut pages = Vec::new();
    let mut bit_depth = 8u8;

    loop {
        let (pw, ph) = decoder.dimensions()?;
        if (pw as usize, ph as usize) != (width, height) {
            return Err(ScanpipeError::DimensionMismatch(format!(
                "{}: page {} is {}x{}, expected {}x{}",
                path.display(),
                pages.len(),
                pw,
                ph,
                width,
                height
            )));
        }

        let samples: Vec<u16> = match decoder.read_image()? {
            DecodingResult::U8(v) => v.into_iter().map(u16::from).collect(),
            DecodingResult::U16(v) => {
                bit_depth = 16;
                v
            }
            _ => {
                return Err(ScanpipeError::Backend(format!(
                    "{}: unsupported sample format (expected 8- or 16-bit grayscale)",
                    path.display()
                )))
            }
        };
        if samples.len() != width * height {
            return Err(ScanpipeError::Backend(format!(
                "{}: expected {} grayscale samples, got {}",
                path.display(),
                width * height,
                samples.len()
            )));
        }
        let page = Array2::from_shape_vec((height, width), samples)
            .map_err(|e| ScanpipeError::DimensionMismatch(e.to_string()))?;
        pages.push(page);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Ok(TiffPages {
        width,
        height,
        bit_depth,
        pages,
        description,
    })
}

/// Read the first page of a TIFF file as a single plane.
pub fn read_plane(path: &Path) -> Result<(Array2<u16>, u8)> {
    let TiffPages {
        bit_depth, pages, ..
    } = read_pages(path)?;
    pages
        .into_iter()
        .next()
        .map(|p| (p, bit_depth))
        .ok_or_else(|| ScanpipeError::Backend(format!("{}: no image data", path.display())))
}

/// Read a multi-page TIFF as a hyperstack.
///
/// Dimensions come from an ImageJ hyperstack description when present;
/// otherwise every page is treated as one timepoint of a single-channel,
/// single-plane series. The title is the file name without extension.
pub fn read_hyperstack(path: &Path) -> Result<Hyperstack> {
    let pages = read_pages(path)?;
    let shape = match pages.description.as_deref() {
        Some(desc) if desc.starts_with("ImageJ=") => parse_imagej_description(desc),
        _ => HyperstackShape {
            channels: 1,
            slices: 1,
            frames: pages.pages.len(),
            luts: Vec::new(),
        },
    };

    let expected = shape.channels * shape.slices * shape.frames;
    if expected != pages.pages.len() {
        return Err(ScanpipeError::DimensionMismatch(format!(
            "{}: description declares {} images, file holds {}",
            path.display(),
            expected,
            pages.pages.len()
        )));
    }

    let mut data = Array5::<u16>::zeros((
        shape.channels,
        shape.slices,
        shape.frames,
        pages.height,
        pages.width,
    ));
    for t in 0..shape.frames {
        for z in 0..shape.slices {
            for c in 0..shape.channels {
                let page = page_index(c, z, t, shape.channels, shape.slices);
                data.slice_mut(s![c, z, t, .., ..]).assign(&pages.pages[page]);
            }
        }
    }

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let mut stack = Hyperstack::new(title, data, pages.bit_depth);
    for (lut, color) in stack.luts.iter_mut().zip(shape.luts) {
        *lut = Some(color);
    }
    Ok(stack)
}

/// Write a hyperstack as a multi-page TIFF in XYCZT page order.
///
/// The first page carries an ImageJ hyperstack description so the file
/// reopens with its channel, slice and frame counts intact.
pub fn write_hyperstack(stack: &Hyperstack, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let description = imagej_description(stack);
    let (w, h) = (stack.width() as u32, stack.height() as u32);
    let mut first = true;

    for t in 0..stack.frames() {
        for z in 0..stack.slices() {
            for c in 0..stack.channels() {
                let plane = stack.plane(c, z, t);
                if stack.bit_depth <= 8 {
                    let samples: Vec<u8> = plane.iter().map(|&v| v.min(255) as u8).collect();
                    let mut image = encoder.new_image::<colortype::Gray8>(w, h)?;
                    if first {
                        image
                            .encoder()
                            .write_tag(Tag::ImageDescription, description.as_str())?;
                    }
                    image.write_data(&samples)?;
                } else {
                    let samples: Vec<u16> = plane.iter().copied().collect();
                    let mut image = encoder.new_image::<colortype::Gray16>(w, h)?;
                    if first {
                        image
                            .encoder()
                            .write_tag(Tag::ImageDescription, description.as_str())?;
                    }
                    image.write_data(&samples)?;
                }
                first = false;
            }
        }
    }
    Ok(())
}

/// Dimensions recovered from an ImageJ description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HyperstackShape {
    pub channels: usize,
    pub slices: usize,
    pub frames: usize,
    pub luts: Vec<ChannelColor>,
}

pub fn imagej_description(stack: &Hyperstack) -> String {
    let mut desc = format!(
        "ImageJ={}\nimages={}\nchannels={}\nslices={}\nframes={}\nhyperstack=true\nmode={}\n",
        IMAGEJ_DESCRIPTION_VERSION,
        stack.channels() * stack.slices() * stack.frames(),
        stack.channels(),
        stack.slices(),
        stack.frames(),
        if stack.channels() > 1 { "composite" } else { "grayscale" },
    );
    if stack.luts.iter().all(Option::is_some) && !stack.luts.is_empty() {
        let names: Vec<String> = stack
            .luts
            .iter()
            .flatten()
            .map(ToString::to_string)
            .collect();
        desc.push_str(&format!("luts={}\n", names.join(",")));
    }
    desc.push_str("loop=false\n");
    desc
}

pub fn parse_imagej_description(desc: &str) -> HyperstackShape {
    let mut shape = HyperstackShape {
        channels: 1,
        slices: 1,
        frames: 1,
        luts: Vec::new(),
    };
    for line in desc.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let count = value.trim().parse::<usize>().ok().filter(|&n| n > 0);
        match (key.trim(), count) {
            ("channels", Some(n)) => shape.channels = n,
            ("slices", Some(n)) => shape.slices = n,
            ("frames", Some(n)) => shape.frames = n,
            ("luts", _) => {
                shape.luts = value
                    .split(',')
                    .filter_map(|name| name.parse().ok())
                    .collect();
            }
            _ => {}
        }
    }
    shape
}
