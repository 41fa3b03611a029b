use std::arch::x86_64::*;
use std::mem::size_of;
use std::ops::Range;

use crate::convolution::avx2_float::Avx2Float;
use crate::convolution::CoefficientTable;
use crate::simd_utils;
use crate::utils::{ceil_n, floor_n};
use crate::{LineBuffer, LineBufferMut, ResizeError, ScratchBuffer};

/// Count of rows produced by one call.
pub(crate) const LINES: u32 = 8;

pub(crate) struct Context<'a, P> {
    table: &'a CoefficientTable,
    /// Input columns transposed so that column `c` occupies 8 items
    /// starting from `(c - src_base) * 8`.
    transposed: &'a [P],
    src_base: usize,
}

pub(crate) type ResizeLine8<P> = unsafe fn(&Context<P>, &mut [&mut [P]; 8], usize, usize, usize);

/// Specializations of the kernel keyed by filter width.
pub(crate) trait HorizontalKernels: Avx2Float {
    /// Kernels for filters with 1-8 taps, indexed by `filter_width - 1`.
    const SMALL: [ResizeLine8<Self>; 8] = [
        resize_line8_h_fp::<Self, 1, 1>,
        resize_line8_h_fp::<Self, 2, 2>,
        resize_line8_h_fp::<Self, 3, 3>,
        resize_line8_h_fp::<Self, 4, 4>,
        resize_line8_h_fp::<Self, 5, 5>,
        resize_line8_h_fp::<Self, 6, 6>,
        resize_line8_h_fp::<Self, 7, 7>,
        resize_line8_h_fp::<Self, 8, 8>,
    ];

    /// Kernels for wider filters, indexed by `filter_width % 8`.
    const LARGE: [ResizeLine8<Self>; 8] = [
        resize_line8_h_fp::<Self, 0, 0>,
        resize_line8_h_fp::<Self, 0, 1>,
        resize_line8_h_fp::<Self, 0, 2>,
        resize_line8_h_fp::<Self, 0, 3>,
        resize_line8_h_fp::<Self, 0, 4>,
        resize_line8_h_fp::<Self, 0, 5>,
        resize_line8_h_fp::<Self, 0, 6>,
        resize_line8_h_fp::<Self, 0, 7>,
    ];
}

impl<P: Avx2Float> HorizontalKernels for P {}

pub(crate) fn select_kernel<P: HorizontalKernels>(filter_width: u32) -> ResizeLine8<P> {
    let filter_width = filter_width as usize;
    if filter_width <= 8 {
        P::SMALL[filter_width - 1]
    } else {
        P::LARGE[filter_width % 8]
    }
}

pub(crate) fn tmp_size<P>(col_range: &Range<u32>) -> Result<usize, ResizeError> {
    let src_base = floor_n(col_range.start as usize, 8);
    (col_range.end as usize - src_base)
        .checked_add(8)
        .and_then(|v| v.checked_mul(8 * size_of::<P>()))
        .ok_or(ResizeError::TmpSizeOverflow)
}

/// - `col_range` must be the range of input columns required
///   to produce columns `[left, right)`.
/// - `i + n` rows of `src` must be readable for every `n` such that `i + n < height`.
///
/// # Safety
/// CPU must support AVX2 and F16C.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn process<P: Avx2Float>(
    kernel: ResizeLine8<P>,
    table: &CoefficientTable,
    tmp: &mut ScratchBuffer,
    src: &LineBuffer<P>,
    dst: &mut LineBufferMut<P>,
    height: u32,
    col_range: Range<u32>,
    i: u32,
    left: u32,
    right: u32,
) {
    let src_base = floor_n(col_range.start as usize, 8);
    let src_end = ceil_n(col_range.end as usize, 8);
    // Length was checked by tmp_size() before allocation of `tmp`.
    let tmp_len = (col_range.end as usize - src_base + 8) * 8;
    let transposed = tmp.typed_mut::<P>(tmp_len);

    // Rows beyond the image are replicated from the last one,
    // results for them are never written.
    let src_rows: [&[P]; 8] =
        std::array::from_fn(|n| src.row(i.saturating_add(n as u32).min(height - 1)));
    transpose_line_8x8(transposed, &src_rows, src_base, src_end);

    let valid_rows = (height - i).min(LINES) as usize;
    let mut dst_rows: [&mut [P]; 8] = dst.rows_mut(i, valid_rows);
    let ctx = Context {
        table,
        transposed,
        src_base,
    };
    kernel(
        &ctx,
        &mut dst_rows,
        valid_rows,
        left as usize,
        right as usize,
    );
}

/// - `dst.len() >= (right - left) * 8`
/// - `left` and `right` must be multiples of 8.
#[target_feature(enable = "avx2,f16c")]
unsafe fn transpose_line_8x8<P: Avx2Float>(
    dst: &mut [P],
    src: &[&[P]; 8],
    left: usize,
    right: usize,
) {
    let mut j = left;
    while j < right {
        let mut x = [P::zero_raw(); 8];
        for (v, &row) in x.iter_mut().zip(src) {
            *v = if j + 8 <= row.len() {
                P::load8_raw(row, j)
            } else {
                let buf: [P; 8] = simd_utils::partial_array(row, j);
                P::load8_raw(&buf, 0)
            };
        }
        P::transpose8(&mut x);
        for (n, v) in x.into_iter().enumerate() {
            P::store8_raw(dst, (j - left + n) * 8, v);
        }
        j += 8;
    }
}

#[inline(always)]
unsafe fn madd<P: Avx2Float>(accum: __m256, coeffs: &[f32], src: &[P], k: usize) -> __m256 {
    let c = _mm256_set1_ps(*coeffs.get_unchecked(k));
    _mm256_add_ps(accum, _mm256_mul_ps(c, P::load8(src, k * 8)))
}

/// Dot product of coefficients of output column `j` with 8 transposed rows.
///
/// Taps are accumulated one by one in their order, so results are equal
/// to results of the native kernel.
#[inline(always)]
unsafe fn resize_line8_h_fp_xiter<P: Avx2Float, const FWIDTH: usize, const TAIL: usize>(
    ctx: &Context<P>,
    j: usize,
) -> __m256 {
    let filter_width = if FWIDTH != 0 {
        FWIDTH
    } else {
        ctx.table.filter_width() as usize
    };
    let coeffs = ctx.table.coeffs_padded(j);
    let top = *ctx.table.left().get_unchecked(j) as usize;
    let src = ctx.transposed.get_unchecked((top - ctx.src_base) * 8..);

    let mut accum = _mm256_setzero_ps();
    let k_end = filter_width - TAIL;
    let mut k = 0;
    while k < k_end {
        for t in 0..8 {
            accum = madd(accum, coeffs, src, k + t);
        }
        k += 8;
    }
    let mut t = 0;
    while t < TAIL {
        accum = madd(accum, coeffs, src, k_end + t);
        t += 1;
    }
    accum
}

/// For safety, it is necessary to ensure the following conditions:
/// - first `valid_rows` items of `dst` must have length >= `right`
/// - `ctx.transposed` must contain columns up to `left[right - 1] + filter_width`
#[target_feature(enable = "avx2,f16c")]
unsafe fn resize_line8_h_fp<P: Avx2Float, const FWIDTH: usize, const TAIL: usize>(
    ctx: &Context<P>,
    dst: &mut [&mut [P]; 8],
    valid_rows: usize,
    left: usize,
    right: usize,
) {
    let mut j = left;

    while j + 8 <= right {
        let mut x = [_mm256_setzero_ps(); 8];
        for (n, v) in x.iter_mut().enumerate() {
            *v = resize_line8_h_fp_xiter::<P, FWIDTH, TAIL>(ctx, j + n);
        }
        simd_utils::mm256_transpose8_ps(&mut x);
        for (row, v) in dst.iter_mut().zip(x).take(valid_rows) {
            P::store8(row, j, v);
        }
        j += 8;
    }

    let mut buf = [P::default(); 8];
    while j < right {
        let x = resize_line8_h_fp_xiter::<P, FWIDTH, TAIL>(ctx, j);
        P::store8(&mut buf, 0, x);
        for (row, &v) in dst.iter_mut().zip(&buf).take(valid_rows) {
            *row.get_unchecked_mut(j) = v;
        }
        j += 1;
    }
}
