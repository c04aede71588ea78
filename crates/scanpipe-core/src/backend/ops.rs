use ndarray::{concatenate, s, Array2, ArrayView2, Axis, Zip};
use rayon::prelude::*;

use crate::consts::{MAX_PREFIX, PARALLEL_PIXEL_THRESHOLD, RESULT_PREFIX};
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::{Hyperstack, CHANNEL_AXIS, SLICE_AXIS};

/// Split a stack into single-channel stacks titled `C<i>-<title>`.
pub fn split_channels(stack: &Hyperstack) -> Vec<Hyperstack> {
    (0..stack.channels())
        .map(|c| {
            let data = stack.data.slice(s![c..c + 1, .., .., .., ..]).to_owned();
            let mut channel =
                Hyperstack::new(format!("C{}-{}", c + 1, stack.title), data, stack.bit_depth);
            channel.luts = vec![stack.luts[c]];
            channel
        })
        .collect()
}

/// Maximum-intensity projection across z-planes, one plane per timepoint.
pub fn z_project_max(stack: &Hyperstack) -> Result<Hyperstack> {
    if stack.slices() == 1 {
        return Err(ScanpipeError::NotAStack {
            title: stack.title.clone(),
        });
    }
    let projected = stack
        .data
        .fold_axis(Axis(SLICE_AXIS), 0u16, |&acc, &v| acc.max(v))
        .insert_axis(Axis(SLICE_AXIS));
    let mut result = Hyperstack::new(
        format!("{}{}", MAX_PREFIX, stack.title),
        projected,
        stack.bit_depth,
    );
    result.luts = stack.luts.clone();
    Ok(result)
}

/// Concatenate single-channel stacks into one multi-channel composite.
pub fn merge_channels(stacks: &[&Hyperstack]) -> Result<Hyperstack> {
    let first = stacks.first().ok_or_else(|| {
        ScanpipeError::Backend("merge requires at least one channel".into())
    })?;
    let expected = first.dims();
    for stack in stacks {
        let dims = stack.dims();
        if dims.channels != 1
            || (dims.slices, dims.frames, dims.height, dims.width)
                != (expected.slices, expected.frames, expected.height, expected.width)
        {
            return Err(ScanpipeError::DimensionMismatch(format!(
                "cannot merge {} ({}) with {} ({})",
                stack.title, dims, first.title, expected
            )));
        }
    }

    let views: Vec<_> = stacks.iter().map(|s| s.data.view()).collect();
    let data = concatenate(Axis(CHANNEL_AXIS), &views)
        .map_err(|e| ScanpipeError::DimensionMismatch(e.to_string()))?;
    let bit_depth = stacks.iter().map(|s| s.bit_depth).max().unwrap_or(16);
    let mut merged = Hyperstack::new("Merged", data, bit_depth);
    merged.luts = stacks.iter().flat_map(|s| s.luts.iter().copied()).collect();
    Ok(merged)
}

/// Frame-wise `a - b`. Negative differences clip to zero.
pub fn subtract(a: &Hyperstack, b: &Hyperstack) -> Result<Hyperstack> {
    if a.data.dim() != b.data.dim() {
        return Err(ScanpipeError::DimensionMismatch(format!(
            "cannot subtract {} ({}) from {} ({})",
            b.title,
            b.dims(),
            a.title,
            a.dims()
        )));
    }
    let data = Zip::from(&a.data)
        .and(&b.data)
        .map_collect(|&x, &y| x.saturating_sub(y));
    let mut result = Hyperstack::new(format!("{}{}", RESULT_PREFIX, a.title), data, a.bit_depth);
    result.luts = a.luts.clone();
    Ok(result)
}

/// Offsets of a circular median kernel. Radius 1 yields the full 3x3
/// neighbourhood.
pub fn median_kernel(radius: usize) -> Vec<(isize, isize)> {
    let r = radius as isize;
    let limit = r * r + 1;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= limit {
                offsets.push((dy, dx));
            }
        }
    }
    offsets
}

/// Median filter every plane of a stack in place. Edge pixels replicate
/// the border.
pub fn median_filter(stack: &mut Hyperstack, radius: usize) {
    if radius == 0 {
        return;
    }
    let kernel = median_kernel(radius);
    let dims = stack.dims();
    let positions: Vec<(usize, usize, usize)> = (0..dims.channels)
        .flat_map(|c| {
            (0..dims.slices).flat_map(move |z| (0..dims.frames).map(move |t| (c, z, t)))
        })
        .collect();

    let source: &Hyperstack = stack;
    let filtered: Vec<Array2<u16>> = positions
        .par_iter()
        .map(|&(c, z, t)| median_plane(source.plane(c, z, t), &kernel))
        .collect();

    for ((c, z, t), plane) in positions.into_iter().zip(filtered) {
        stack.data.slice_mut(s![c, z, t, .., ..]).assign(&plane);
    }
}

fn median_plane(plane: ArrayView2<'_, u16>, kernel: &[(isize, isize)]) -> Array2<u16> {
    let (h, w) = plane.dim();
    let filter_row = |row: usize, out: &mut [u16], values: &mut Vec<u16>| {
        for (col, result) in out.iter_mut().enumerate() {
            values.clear();
            for &(dy, dx) in kernel {
                let r = (row as isize + dy).clamp(0, h as isize - 1) as usize;
                let c = (col as isize + dx).clamp(0, w as isize - 1) as usize;
                values.push(plane[[r, c]]);
            }
            let mid = values.len() / 2;
            *result = *values.select_nth_unstable(mid).1;
        }
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<u16>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut out = vec![0u16; w];
                let mut values = Vec::with_capacity(kernel.len());
                filter_row(row, &mut out, &mut values);
                out
            })
            .collect();
        let flat: Vec<u16> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((h, w), flat).unwrap_or_else(|_| Array2::zeros((h, w)))
    } else {
        let mut result = Array2::<u16>::zeros((h, w));
        let mut values = Vec::with_capacity(kernel.len());
        let mut out = vec![0u16; w];
        for row in 0..h {
            filter_row(row, &mut out, &mut values);
            for (col, v) in out.iter().enumerate() {
                result[[row, col]] = *v;
            }
        }
        result
    }
}
