//! Helpers for integration tests and benchmarks.
use std::cell::RefCell;

use half::f16;

use crate::pixels::Pixel;
use crate::{
    process_plane, CoefficientTable, ImageBuffer, ImageBufferMut, ImageFilter, LineBuffer,
    LineBufferMut, ResizeError, UNBOUNDED_MASK,
};

thread_local!(static TEST_LOGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) });

pub fn log_message(msg: &str) {
    TEST_LOGS.with(|f| {
        let mut logs = f.borrow_mut();
        logs.push(msg.to_string());
    });
}

pub fn logs_contain(msg: &str) -> bool {
    TEST_LOGS.with(|f| {
        let logs = f.borrow();
        logs.iter().any(|line| line.contains(msg))
    })
}

pub fn clear_log() {
    TEST_LOGS.with(|f| {
        let mut logs = f.borrow_mut();
        logs.clear();
    })
}

pub trait PixelTestingExt: Pixel {
    fn pixel_type_str() -> &'static str;

    fn image_buffer(buffer: LineBuffer<'_, Self>) -> ImageBuffer<'_>;

    fn image_buffer_mut(buffer: LineBufferMut<'_, Self>) -> ImageBufferMut<'_>;

    /// Maps random bits into the range of values of samples.
    fn from_noise(noise: u32, depth: u32) -> Self;
}

impl PixelTestingExt for u16 {
    fn pixel_type_str() -> &'static str {
        "u16"
    }

    fn image_buffer(buffer: LineBuffer<'_, Self>) -> ImageBuffer<'_> {
        buffer.into()
    }

    fn image_buffer_mut(buffer: LineBufferMut<'_, Self>) -> ImageBufferMut<'_> {
        buffer.into()
    }

    fn from_noise(noise: u32, depth: u32) -> Self {
        (noise >> 16) as u16 >> (16 - depth.clamp(1, 16))
    }
}

impl PixelTestingExt for f16 {
    fn pixel_type_str() -> &'static str {
        "f16"
    }

    fn image_buffer(buffer: LineBuffer<'_, Self>) -> ImageBuffer<'_> {
        buffer.into()
    }

    fn image_buffer_mut(buffer: LineBufferMut<'_, Self>) -> ImageBufferMut<'_> {
        buffer.into()
    }

    fn from_noise(noise: u32, _depth: u32) -> Self {
        f16::from_f32((noise >> 8) as f32 / (1u32 << 24) as f32)
    }
}

impl PixelTestingExt for f32 {
    fn pixel_type_str() -> &'static str {
        "f32"
    }

    fn image_buffer(buffer: LineBuffer<'_, Self>) -> ImageBuffer<'_> {
        buffer.into()
    }

    fn image_buffer_mut(buffer: LineBufferMut<'_, Self>) -> ImageBufferMut<'_> {
        buffer.into()
    }

    fn from_noise(noise: u32, _depth: u32) -> Self {
        (noise >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Deterministic pseudo-random samples of `width x height` plane.
pub fn noise_image<P: PixelTestingExt>(width: u32, height: u32, depth: u32) -> Vec<P> {
    let mut state = 0x9E37_79B9u32 ^ width.wrapping_mul(31) ^ height;
    (0..width as usize * height as usize)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            P::from_noise(state, depth)
        })
        .collect()
}

/// Table of triangle (bilinear) filter which maps `input_width` samples
/// into `output_width` samples.
pub fn triangle_table(input_width: u32, output_width: u32) -> CoefficientTable {
    let scale = output_width as f64 / input_width as f64;
    let support = (1.0 / scale).max(1.0);
    let filter_width = ((support * 2.0).ceil() as u32).clamp(1, input_width);

    let mut left = Vec::with_capacity(output_width as usize);
    let mut weights = Vec::with_capacity(output_width as usize * filter_width as usize);
    for i in 0..output_width {
        let center = (i as f64 + 0.5) / scale - 0.5;
        let top = (center - filter_width as f64 / 2.0).floor() + 1.0;
        let top = top.clamp(0.0, (input_width - filter_width) as f64) as u32;

        let row: Vec<f64> = (top..top + filter_width)
            .map(|x| (1.0 - (x as f64 - center).abs() / support).max(0.0))
            .collect();
        let sum: f64 = row.iter().sum();
        if sum > 0.0 {
            weights.extend(row.iter().map(|&w| (w / sum) as f32));
        } else {
            let nearest = (center.round().max(0.0) as u32).clamp(top, top + filter_width - 1);
            weights.extend((top..top + filter_width).map(|x| (x == nearest) as u32 as f32));
        }
        left.push(top);
    }
    CoefficientTable::new(input_width, filter_width, left, &weights).unwrap()
}

/// Table that copies every input sample.
pub fn identity_table(width: u32) -> CoefficientTable {
    CoefficientTable::new(width, 1, (0..width).collect(), &vec![1.; width as usize]).unwrap()
}

/// Table of `filter_width` taps with uneven weights, including negative ones,
/// which maps `input_width` samples into `output_width` samples.
pub fn uneven_table(input_width: u32, output_width: u32, filter_width: u32) -> CoefficientTable {
    assert!(filter_width <= input_width);
    let max_left = (input_width - filter_width) as u64;
    let last = output_width.saturating_sub(1).max(1) as u64;
    let mut left = Vec::with_capacity(output_width as usize);
    let mut weights = Vec::with_capacity(output_width as usize * filter_width as usize);
    for i in 0..output_width as u64 {
        left.push((i * max_left / last) as u32);
        let row: Vec<f32> = (0..filter_width as u64)
            .map(|k| {
                let h = ((i * 7 + k * 13) % 11) as f32 / 11.;
                if k % 3 == 2 {
                    -0.05 * h
                } else {
                    0.1 + h
                }
            })
            .collect();
        let sum: f32 = row.iter().sum();
        weights.extend(row.iter().map(|w| w / sum));
    }
    CoefficientTable::new(input_width, filter_width, left, &weights).unwrap()
}

/// Same filter as [triangle_table] but with rows in reversed order,
/// so tap windows are not sorted.
pub fn reversed_table(input_width: u32, output_width: u32) -> CoefficientTable {
    let table = triangle_table(input_width, output_width);
    let rows = (0..table.filter_rows() as usize).rev();
    let left = rows.clone().map(|i| table.left()[i]).collect();
    let weights: Vec<f32> = rows.flat_map(|i| table.coeffs(i).to_vec()).collect();
    CoefficientTable::new(input_width, table.filter_width(), left, &weights).unwrap()
}

/// Applies `filter` to unbounded `src` plane and returns the output plane.
pub fn run_filter<P: PixelTestingExt>(
    filter: &dyn ImageFilter,
    src: &[P],
    src_width: u32,
) -> Result<Vec<P>, ResizeError> {
    let attributes = filter.image_attributes();
    let mut dst = vec![P::default(); attributes.width as usize * attributes.height as usize];
    let src_buffer = LineBuffer::new(src, src_width, src_width as usize, UNBOUNDED_MASK)?;
    let dst_buffer = LineBufferMut::new(
        &mut dst,
        attributes.width,
        attributes.width as usize,
        UNBOUNDED_MASK,
    )?;
    process_plane(
        filter,
        &P::image_buffer(src_buffer),
        &mut P::image_buffer_mut(dst_buffer),
    )?;
    Ok(dst)
}
