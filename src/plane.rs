//! Drivers that run a stage over a whole output plane.
use std::ops::Range;

use crate::filter::ImageFilter;
use crate::{ImageBuffer, ImageBufferError, ImageBufferMut, ResizeError, ScratchBuffer};

/// Runs `filter` over every row of its output image.
///
/// `src` must keep every input row the stage asks for and `dst`
/// must be able to keep every output row.
pub fn process_plane(
    filter: &dyn ImageFilter,
    src: &ImageBuffer,
    dst: &mut ImageBufferMut,
) -> Result<(), ResizeError> {
    check_buffers(filter, src, dst)?;
    let attributes = filter.image_attributes();
    let mut tmp = ScratchBuffer::new(filter.tmp_size(0, attributes.width)?)?;
    process_rows(filter, &mut tmp, src, dst, 0..attributes.height)
}

/// Runs `filter` over every row of its output image using the rayon thread pool.
///
/// Rows of `dst` are split into bands processed in parallel. Each band
/// gets its own [ScratchBuffer].
#[cfg(feature = "rayon")]
pub fn par_process_plane(
    filter: &dyn ImageFilter,
    src: &ImageBuffer,
    dst: ImageBufferMut,
) -> Result<(), ResizeError> {
    use rayon::prelude::*;

    use crate::utils::ceil_n;

    check_buffers(filter, src, &dst)?;
    let attributes = filter.image_attributes();
    let height = attributes.height;
    let lines = filter.simultaneous_lines().max(1);
    let tmp_size = filter.tmp_size(0, attributes.width)?;

    let max_num_parts = calculate_max_parts_number(attributes.width, height, lines);
    let num_parts = (rayon::current_num_threads() as u32).clamp(1, max_num_parts);
    // Bands must not split a batch of simultaneously produced rows.
    let rows_per_band = ceil_n(height.div_ceil(num_parts), lines);

    let first_row = dst.first_row();
    let bands = dst.split_rows(height, rows_per_band)?;
    log::debug!(
        "Processing {} rows in {} bands of {} rows",
        height - first_row.min(height),
        bands.len(),
        rows_per_band
    );
    bands.into_par_iter().try_for_each_init(
        || ScratchBuffer::new(tmp_size),
        |tmp, mut band| {
            let tmp = tmp.as_mut().map_err(|err| *err)?;
            let first = band.first_row();
            let end = first.saturating_add(rows_per_band).min(height);
            process_rows(filter, tmp, src, &mut band, first..end)
        },
    )
}

/// It is not optimal to split images on too small bands.
/// For small images minimal height of a band is `constant / area`,
/// for tall images it is `height / 256`.
#[cfg(feature = "rayon")]
fn calculate_max_parts_number(width: u32, height: u32, lines: u32) -> u32 {
    if width == 0 || height == 0 {
        return 1;
    }
    let area = (height as u64) * (height.max(width) as u64);
    let min_height = ((1u64 << 14) / area).max(height as u64 / 256).max(lines as u64);
    (height as u64 / min_height).clamp(1, u32::MAX as u64) as u32
}

fn check_buffers(
    filter: &dyn ImageFilter,
    src: &ImageBuffer,
    dst: &ImageBufferMut,
) -> Result<(), ResizeError> {
    let attributes = filter.image_attributes();
    if src.pixel_type() != attributes.pixel_type || dst.pixel_type() != attributes.pixel_type {
        return Err(ResizeError::DifferentTypesOfPixels);
    }
    if attributes.width == 0 || attributes.height == 0 {
        return Ok(());
    }
    if dst.width() < attributes.width || !dst.holds_rows(attributes.height) {
        return Err(ImageBufferError::InvalidBufferSize.into());
    }

    let cols = filter.required_col_range(0, attributes.width);
    let step = filter.simultaneous_lines().max(1) as usize;
    let rows_end = (0..attributes.height)
        .step_by(step)
        .map(|i| filter.required_row_range(i).end)
        .max()
        .unwrap_or(0);
    if src.width() < cols.end || !src.holds_rows(rows_end) {
        return Err(ImageBufferError::InvalidBufferSize.into());
    }
    Ok(())
}

fn process_rows(
    filter: &dyn ImageFilter,
    tmp: &mut ScratchBuffer,
    src: &ImageBuffer,
    dst: &mut ImageBufferMut,
    rows: Range<u32>,
) -> Result<(), ResizeError> {
    let width = filter.image_attributes().width;
    let step = filter.simultaneous_lines().max(1) as usize;
    for i in rows.step_by(step) {
        filter.process(tmp, src, dst, i, 0, width)?;
    }
    Ok(())
}
