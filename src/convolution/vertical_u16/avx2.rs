use std::arch::x86_64::*;
use std::mem::size_of;

use crate::convolution::{CoefficientTable, FixedPointCodec};
use crate::simd_utils;
use crate::utils::{ceil_n, checked_ceil_n};
use crate::{LineBuffer, LineBufferMut, ResizeError, ScratchBuffer};

/// Applies up to 8 taps to `[left, right)` columns of 8 source lines.
type ResizeLineV = unsafe fn(&[i16], &[&[u16]; 8], &mut [u16], &mut [i32], usize, usize, u16);

/// Kernels for the only chunk of taps, indexed by `taps - 1`.
static RESIZE_LINE_V_U16_ONLY: [ResizeLineV; 8] = [
    resize_line_v_u16::<1, false, false>,
    resize_line_v_u16::<1, false, false>,
    resize_line_v_u16::<2, false, false>,
    resize_line_v_u16::<2, false, false>,
    resize_line_v_u16::<3, false, false>,
    resize_line_v_u16::<3, false, false>,
    resize_line_v_u16::<4, false, false>,
    resize_line_v_u16::<4, false, false>,
];

/// Kernels for the final chunk of taps, indexed by `taps - 1`.
static RESIZE_LINE_V_U16_FINAL: [ResizeLineV; 8] = [
    resize_line_v_u16::<1, true, false>,
    resize_line_v_u16::<1, true, false>,
    resize_line_v_u16::<2, true, false>,
    resize_line_v_u16::<2, true, false>,
    resize_line_v_u16::<3, true, false>,
    resize_line_v_u16::<3, true, false>,
    resize_line_v_u16::<4, true, false>,
    resize_line_v_u16::<4, true, false>,
];

/// Size of accumulator buffer required for filters with more than 8 taps.
pub(crate) fn tmp_size(filter_width: u32, left: u32, right: u32) -> Result<usize, ResizeError> {
    if filter_width <= 8 {
        return Ok(0);
    }
    checked_ceil_n((right - left) as usize, 16)
        .and_then(|v| v.checked_mul(size_of::<i32>()))
        .ok_or(ResizeError::TmpSizeOverflow)
}

/// # Safety
/// CPU must support AVX2.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn process(
    table: &CoefficientTable,
    codec: FixedPointCodec,
    tmp: &mut ScratchBuffer,
    src: &LineBuffer<u16>,
    dst: &mut LineBufferMut<u16>,
    i: u32,
    left: u32,
    right: u32,
) {
    let filter_width = table.filter_width() as usize;
    let coeffs = table.coeffs_i16_padded(i as usize);
    let top = table.left()[i as usize];
    let (left, right) = (left as usize, right as usize);
    let pixel_max = codec.pixel_max();

    let accum: &mut [i32] = if filter_width > 8 {
        tmp.typed_mut(ceil_n(right - left, 16))
    } else {
        &mut []
    };
    let dst_row = dst.row_mut(i);

    let mut k = 0;
    while k + 8 < filter_width {
        let lines: [&[u16]; 8] = std::array::from_fn(|n| src.row(top + (k + n) as u32));
        let kernel: ResizeLineV = if k == 0 {
            resize_line_v_u16::<4, false, true>
        } else {
            resize_line_v_u16::<4, true, true>
        };
        kernel(&coeffs[k..], &lines, dst_row, accum, left, right, pixel_max);
        k += 8;
    }

    // Odd count of taps is padded with the last line, its coefficient is zero.
    let taps = filter_width - k;
    let lines: [&[u16]; 8] =
        std::array::from_fn(|n| src.row(top + (k + n.min(taps - 1)) as u32));
    let kernel = if k == 0 {
        RESIZE_LINE_V_U16_ONLY[taps - 1]
    } else {
        RESIZE_LINE_V_U16_FINAL[taps - 1]
    };
    kernel(&coeffs[k..], &lines, dst_row, accum, left, right, pixel_max);
}

#[inline(always)]
unsafe fn resize_line_v_u16_xiter<const PAIRS: usize, const READ_ACCUM: bool>(
    coeffs: &[__m256i; 4],
    src: &[[__m256i; 2]; 4],
    accum: &[i32],
    index: usize,
) -> (__m256i, __m256i) {
    let (mut accum_lo, mut accum_hi) = if READ_ACCUM {
        (
            simd_utils::loadu_si256(accum, index),
            simd_utils::loadu_si256(accum, index + 8),
        )
    } else {
        (_mm256_setzero_si256(), _mm256_setzero_si256())
    };
    for p in 0..PAIRS {
        let [x0, x1] = src[p];
        simd_utils::madd_u16_pair(&mut accum_lo, &mut accum_hi, coeffs[p], x0, x1);
    }
    (accum_lo, accum_hi)
}

/// For safety, it is necessary to ensure the following conditions:
/// - `coeffs.len() >= PAIRS * 2`
/// - lines of `src` and `dst` must have length >= `right`
/// - `accum.len() >= ceil(right - left, 16)` if `READ_ACCUM` or `WRITE_ACCUM`
#[target_feature(enable = "avx2")]
unsafe fn resize_line_v_u16<const PAIRS: usize, const READ_ACCUM: bool, const WRITE_ACCUM: bool>(
    coeffs: &[i16],
    src: &[&[u16]; 8],
    dst: &mut [u16],
    accum: &mut [i32],
    left: usize,
    right: usize,
    pixel_max: u16,
) {
    let mut c = [_mm256_setzero_si256(); 4];
    for (p, v) in c.iter_mut().enumerate().take(PAIRS) {
        *v = simd_utils::ptr_i16_to_256set1_epi32(coeffs, p * 2);
    }

    let mut x = [[_mm256_setzero_si256(); 2]; 4];
    let mut j = left;
    while j + 16 <= right {
        for (p, pair) in x.iter_mut().enumerate().take(PAIRS) {
            pair[0] = simd_utils::loadu_si256(src[p * 2], j);
            pair[1] = simd_utils::loadu_si256(src[p * 2 + 1], j);
        }
        let (lo, hi) = resize_line_v_u16_xiter::<PAIRS, READ_ACCUM>(&c, &x, accum, j - left);
        if WRITE_ACCUM {
            simd_utils::storeu_si256(accum, j - left, lo);
            simd_utils::storeu_si256(accum, j - left + 8, hi);
        } else {
            simd_utils::storeu_si256(dst, j, simd_utils::mm256_pack_i30_u16(lo, hi, pixel_max));
        }
        j += 16;
    }

    if j < right {
        let count = right - j;
        for (p, pair) in x.iter_mut().enumerate().take(PAIRS) {
            let buf0: [u16; 16] = simd_utils::partial_array(src[p * 2], j);
            let buf1: [u16; 16] = simd_utils::partial_array(src[p * 2 + 1], j);
            pair[0] = simd_utils::loadu_si256(&buf0, 0);
            pair[1] = simd_utils::loadu_si256(&buf1, 0);
        }
        let (lo, hi) = resize_line_v_u16_xiter::<PAIRS, READ_ACCUM>(&c, &x, accum, j - left);
        if WRITE_ACCUM {
            // Accumulator has room for the whole register.
            simd_utils::storeu_si256(accum, j - left, lo);
            simd_utils::storeu_si256(accum, j - left + 8, hi);
        } else {
            let mut buf = [0u16; 16];
            let packed = simd_utils::mm256_pack_i30_u16(lo, hi, pixel_max);
            simd_utils::storeu_si256(&mut buf, 0, packed);
            dst.get_unchecked_mut(j..right)
                .copy_from_slice(&buf[..count]);
        }
    }
}
