use std::arch::x86_64::*;
use std::mem::size_of;

use crate::convolution::avx2_float::Avx2Float;
use crate::convolution::CoefficientTable;
use crate::simd_utils;
use crate::utils::{ceil_n, checked_ceil_n};
use crate::{LineBuffer, LineBufferMut, ResizeError, ScratchBuffer};

/// Applies up to 8 taps to `[left, right)` columns of 8 source lines.
type ResizeLineV<P> = unsafe fn(&[f32], &[&[P]; 8], &mut [P], &mut [f32], usize, usize);

/// Specializations of the kernel keyed by count of taps in a chunk.
pub(crate) trait VerticalKernels: Avx2Float {
    /// Kernels for the only chunk of taps, indexed by `taps - 1`.
    const ONLY: [ResizeLineV<Self>; 8] = [
        resize_line_v_fp::<Self, 1, false, false>,
        resize_line_v_fp::<Self, 2, false, false>,
        resize_line_v_fp::<Self, 3, false, false>,
        resize_line_v_fp::<Self, 4, false, false>,
        resize_line_v_fp::<Self, 5, false, false>,
        resize_line_v_fp::<Self, 6, false, false>,
        resize_line_v_fp::<Self, 7, false, false>,
        resize_line_v_fp::<Self, 8, false, false>,
    ];

    /// Kernels for the final chunk of taps, indexed by `taps - 1`.
    const FINAL: [ResizeLineV<Self>; 8] = [
        resize_line_v_fp::<Self, 1, true, false>,
        resize_line_v_fp::<Self, 2, true, false>,
        resize_line_v_fp::<Self, 3, true, false>,
        resize_line_v_fp::<Self, 4, true, false>,
        resize_line_v_fp::<Self, 5, true, false>,
        resize_line_v_fp::<Self, 6, true, false>,
        resize_line_v_fp::<Self, 7, true, false>,
        resize_line_v_fp::<Self, 8, true, false>,
    ];
}

impl<P: Avx2Float> VerticalKernels for P {}

/// Size of accumulator buffer required for filters with more than 8 taps.
pub(crate) fn tmp_size(filter_width: u32, left: u32, right: u32) -> Result<usize, ResizeError> {
    if filter_width <= 8 {
        return Ok(0);
    }
    checked_ceil_n((right - left) as usize, 8)
        .and_then(|v| v.checked_mul(size_of::<f32>()))
        .ok_or(ResizeError::TmpSizeOverflow)
}

/// # Safety
/// CPU must support AVX2 and F16C.
pub(crate) unsafe fn process<P: VerticalKernels>(
    table: &CoefficientTable,
    tmp: &mut ScratchBuffer,
    src: &LineBuffer<P>,
    dst: &mut LineBufferMut<P>,
    i: u32,
    left: u32,
    right: u32,
) {
    let filter_width = table.filter_width() as usize;
    let coeffs = table.coeffs_padded(i as usize);
    let top = table.left()[i as usize];
    let (left, right) = (left as usize, right as usize);

    // Partial sums are kept in f32 for every pixel type.
    let accum: &mut [f32] = if filter_width > 8 {
        tmp.typed_mut(ceil_n(right - left, 8))
    } else {
        &mut []
    };
    let dst_row = dst.row_mut(i);

    let mut k = 0;
    while k + 8 < filter_width {
        let lines: [&[P]; 8] = std::array::from_fn(|n| src.row(top + (k + n) as u32));
        let kernel: ResizeLineV<P> = if k == 0 {
            resize_line_v_fp::<P, 8, false, true>
        } else {
            resize_line_v_fp::<P, 8, true, true>
        };
        kernel(&coeffs[k..], &lines, dst_row, accum, left, right);
        k += 8;
    }

    let taps = filter_width - k;
    let lines: [&[P]; 8] = std::array::from_fn(|n| src.row(top + (k + n.min(taps - 1)) as u32));
    let kernel = if k == 0 {
        P::ONLY[taps - 1]
    } else {
        P::FINAL[taps - 1]
    };
    kernel(&coeffs[k..], &lines, dst_row, accum, left, right);
}

#[inline(always)]
unsafe fn resize_line_v_fp_xiter<const TAPS: usize, const READ_ACCUM: bool>(
    coeffs: &[__m256; 8],
    src: &[__m256; 8],
    accum: &[f32],
    index: usize,
) -> __m256 {
    let mut sum = if READ_ACCUM {
        simd_utils::loadu_ps256(accum, index)
    } else {
        _mm256_setzero_ps()
    };
    for k in 0..TAPS {
        sum = _mm256_add_ps(sum, _mm256_mul_ps(coeffs[k], src[k]));
    }
    sum
}

/// For safety, it is necessary to ensure the following conditions:
/// - `coeffs.len() >= TAPS`
/// - lines of `src` and `dst` must have length >= `right`
/// - `accum.len() >= ceil(right - left, 8)` if `READ_ACCUM` or `WRITE_ACCUM`
#[target_feature(enable = "avx2,f16c")]
unsafe fn resize_line_v_fp<
    P: Avx2Float,
    const TAPS: usize,
    const READ_ACCUM: bool,
    const WRITE_ACCUM: bool,
>(
    coeffs: &[f32],
    src: &[&[P]; 8],
    dst: &mut [P],
    accum: &mut [f32],
    left: usize,
    right: usize,
) {
    let mut c = [_mm256_setzero_ps(); 8];
    for (v, &coeff) in c.iter_mut().zip(coeffs).take(TAPS) {
        *v = _mm256_set1_ps(coeff);
    }

    let mut x = [_mm256_setzero_ps(); 8];
    let mut j = left;
    while j + 8 <= right {
        for (v, &line) in x.iter_mut().zip(src).take(TAPS) {
            *v = P::load8(line, j);
        }
        let sum = resize_line_v_fp_xiter::<TAPS, READ_ACCUM>(&c, &x, accum, j - left);
        if WRITE_ACCUM {
            simd_utils::storeu_ps256(accum, j - left, sum);
        } else {
            P::store8(dst, j, sum);
        }
        j += 8;
    }

    if j < right {
        let count = right - j;
        for (v, &line) in x.iter_mut().zip(src).take(TAPS) {
            let buf: [P; 8] = simd_utils::partial_array(line, j);
            *v = P::load8(&buf, 0);
        }
        let sum = resize_line_v_fp_xiter::<TAPS, READ_ACCUM>(&c, &x, accum, j - left);
        if WRITE_ACCUM {
            // Accumulator has room for the whole register.
            simd_utils::storeu_ps256(accum, j - left, sum);
        } else {
            let mut buf = [P::default(); 8];
            P::store8(&mut buf, 0, sum);
            dst.get_unchecked_mut(j..right)
                .copy_from_slice(&buf[..count]);
        }
    }
}
