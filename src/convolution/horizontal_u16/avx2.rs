use std::arch::x86_64::*;
use std::mem::size_of;
use std::ops::Range;

use crate::convolution::{CoefficientTable, FixedPointCodec};
use crate::simd_utils;
use crate::utils::{ceil_n, floor_n};
use crate::{LineBuffer, LineBufferMut, ResizeError, ScratchBuffer};

/// Count of rows produced by one call.
pub(crate) const LINES: u32 = 16;

pub(crate) struct Context<'a> {
    table: &'a CoefficientTable,
    /// Input columns transposed so that column `c` occupies 16 items
    /// starting from `(c - src_base) * 16`.
    transposed: &'a [u16],
    src_base: usize,
    pixel_max: u16,
}

pub(crate) type ResizeLine16 = unsafe fn(&Context, &mut [&mut [u16]; 16], usize, usize, usize);

static RESIZE_LINE16_H_U16_SMALL: [ResizeLine16; 8] = [
    resize_line16_h_u16::<false, 2>,
    resize_line16_h_u16::<false, 2>,
    resize_line16_h_u16::<false, 4>,
    resize_line16_h_u16::<false, 4>,
    resize_line16_h_u16::<false, 6>,
    resize_line16_h_u16::<false, 6>,
    resize_line16_h_u16::<false, 8>,
    resize_line16_h_u16::<false, 8>,
];

static RESIZE_LINE16_H_U16_LARGE: [ResizeLine16; 8] = [
    resize_line16_h_u16::<true, 0>,
    resize_line16_h_u16::<true, 2>,
    resize_line16_h_u16::<true, 2>,
    resize_line16_h_u16::<true, 4>,
    resize_line16_h_u16::<true, 4>,
    resize_line16_h_u16::<true, 6>,
    resize_line16_h_u16::<true, 6>,
    resize_line16_h_u16::<true, 0>,
];

pub(crate) fn select_kernel(filter_width: u32) -> ResizeLine16 {
    let filter_width = filter_width as usize;
    if filter_width <= 8 {
        RESIZE_LINE16_H_U16_SMALL[filter_width - 1]
    } else {
        RESIZE_LINE16_H_U16_LARGE[filter_width % 8]
    }
}

fn transposed_len(col_range: &Range<u32>) -> Option<usize> {
    let src_base = floor_n(col_range.start as usize, 16);
    (col_range.end as usize - src_base)
        .checked_add(16)?
        .checked_mul(16)
}

pub(crate) fn tmp_size(col_range: &Range<u32>) -> Result<usize, ResizeError> {
    transposed_len(col_range)
        .and_then(|len| len.checked_mul(size_of::<u16>()))
        .ok_or(ResizeError::TmpSizeOverflow)
}

/// - `col_range` must be the range of input columns required
///   to produce columns `[left, right)`.
/// - `i + n` rows of `src` must be readable for every `n` such that `i + n < height`.
///
/// # Safety
/// CPU must support AVX2.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn process(
    kernel: ResizeLine16,
    table: &CoefficientTable,
    codec: FixedPointCodec,
    tmp: &mut ScratchBuffer,
    src: &LineBuffer<u16>,
    dst: &mut LineBufferMut<u16>,
    height: u32,
    col_range: Range<u32>,
    i: u32,
    left: u32,
    right: u32,
) {
    let src_base = floor_n(col_range.start as usize, 16);
    let src_end = ceil_n(col_range.end as usize, 16);
    // Length was checked by tmp_size() before allocation of `tmp`.
    let tmp_len = (col_range.end as usize - src_base + 16) * 16;
    let transposed = tmp.typed_mut::<u16>(tmp_len);

    // Rows beyond the image are replicated from the last one,
    // results for them are never written.
    let src_rows: [&[u16]; 16] =
        std::array::from_fn(|n| src.row(i.saturating_add(n as u32).min(height - 1)));
    transpose_line_16x16(transposed, &src_rows, src_base, src_end);

    let valid_rows = (height - i).min(LINES) as usize;
    let mut dst_rows: [&mut [u16]; 16] = dst.rows_mut(i, valid_rows);
    let ctx = Context {
        table,
        transposed,
        src_base,
        pixel_max: codec.pixel_max(),
    };
    kernel(
        &ctx,
        &mut dst_rows,
        valid_rows,
        left as usize,
        right as usize,
    );
}

/// - `dst.len() >= (right - left) * 16`
/// - `left` and `right` must be multiples of 16.
#[target_feature(enable = "avx2")]
unsafe fn transpose_line_16x16(dst: &mut [u16], src: &[&[u16]; 16], left: usize, right: usize) {
    let mut j = left;
    while j < right {
        let mut x = [_mm256_setzero_si256(); 16];
        for (v, &row) in x.iter_mut().zip(src) {
            *v = if j + 16 <= row.len() {
                simd_utils::loadu_si256(row, j)
            } else {
                let buf: [u16; 16] = simd_utils::partial_array(row, j);
                simd_utils::loadu_si256(&buf, 0)
            };
        }
        simd_utils::mm256_transpose16_epi16(&mut x);
        for (n, v) in x.into_iter().enumerate() {
            simd_utils::storeu_si256(dst, (j - left + n) * 16, v);
        }
        j += 16;
    }
}

#[inline(always)]
unsafe fn madd_pair(
    accum_lo: &mut __m256i,
    accum_hi: &mut __m256i,
    coeffs: &[i16],
    src: &[u16],
    k: usize,
) {
    let c = simd_utils::ptr_i16_to_256set1_epi32(coeffs, k);
    let x0 = simd_utils::loadu_si256(src, k * 16);
    let x1 = simd_utils::loadu_si256(src, (k + 1) * 16);
    simd_utils::madd_u16_pair(accum_lo, accum_hi, c, x0, x1);
}

/// Dot product of coefficients of output column `j` with 16 transposed rows.
///
/// Taps are processed by pairs, so the count of processed taps is rounded up
/// to even number. The extra tap has zero coefficient.
#[inline(always)]
unsafe fn resize_line16_h_u16_xiter<const DO_LOOP: bool, const TAIL: usize>(
    ctx: &Context,
    j: usize,
) -> __m256i {
    let filter_width = ctx.table.filter_width() as usize;
    let coeffs = ctx.table.coeffs_i16_padded(j);
    let top = *ctx.table.left().get_unchecked(j) as usize;
    let src = ctx.transposed.get_unchecked((top - ctx.src_base) * 16..);

    let mut accum_lo = _mm256_setzero_si256();
    let mut accum_hi = _mm256_setzero_si256();

    let k_end = if DO_LOOP {
        floor_n(filter_width + 1, 8)
    } else {
        0
    };
    let mut k = 0;
    while k < k_end {
        madd_pair(&mut accum_lo, &mut accum_hi, coeffs, src, k);
        madd_pair(&mut accum_lo, &mut accum_hi, coeffs, src, k + 2);
        madd_pair(&mut accum_lo, &mut accum_hi, coeffs, src, k + 4);
        madd_pair(&mut accum_lo, &mut accum_hi, coeffs, src, k + 6);
        k += 8;
    }
    let mut t = 0;
    while t < TAIL {
        madd_pair(&mut accum_lo, &mut accum_hi, coeffs, src, k_end + t);
        t += 2;
    }

    simd_utils::mm256_pack_i30_u16(accum_lo, accum_hi, ctx.pixel_max)
}

/// For safety, it is necessary to ensure the following conditions:
/// - first `valid_rows` items of `dst` must have length >= `right`
/// - `ctx.transposed` must contain columns up to `left[right - 1] + filter_width`
#[target_feature(enable = "avx2")]
unsafe fn resize_line16_h_u16<const DO_LOOP: bool, const TAIL: usize>(
    ctx: &Context,
    dst: &mut [&mut [u16]; 16],
    valid_rows: usize,
    left: usize,
    right: usize,
) {
    let mut j = left;

    while j + 16 <= right {
        let mut x = [_mm256_setzero_si256(); 16];
        for (n, v) in x.iter_mut().enumerate() {
            *v = resize_line16_h_u16_xiter::<DO_LOOP, TAIL>(ctx, j + n);
        }
        simd_utils::mm256_transpose16_epi16(&mut x);
        for (row, v) in dst.iter_mut().zip(x).take(valid_rows) {
            simd_utils::storeu_si256(row, j, v);
        }
        j += 16;
    }

    let mut buf = [0u16; 16];
    while j < right {
        let x = resize_line16_h_u16_xiter::<DO_LOOP, TAIL>(ctx, j);
        simd_utils::storeu_si256(&mut buf, 0, x);
        for (row, &v) in dst.iter_mut().zip(&buf).take(valid_rows) {
            *row.get_unchecked_mut(j) = v;
        }
        j += 1;
    }
}
