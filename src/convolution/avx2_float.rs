use std::arch::x86_64::*;

use half::f16;

use crate::pixels::FloatPixel;
use crate::simd_utils;

/// Vector operations over 8 float samples of one type.
///
/// Raw vectors keep samples in the stored representation, they are used
/// to move samples through transposition buffers. Arithmetic always happens
/// on `__m256` values returned by [Avx2Float::load8].
pub(crate) trait Avx2Float: FloatPixel {
    type Raw: Copy;

    unsafe fn zero_raw() -> Self::Raw;

    unsafe fn load8_raw(buf: &[Self], index: usize) -> Self::Raw;

    unsafe fn store8_raw(buf: &mut [Self], index: usize, v: Self::Raw);

    unsafe fn transpose8(x: &mut [Self::Raw; 8]);

    unsafe fn load8(buf: &[Self], index: usize) -> __m256;

    unsafe fn store8(buf: &mut [Self], index: usize, v: __m256);
}

impl Avx2Float for f32 {
    type Raw = __m256;

    #[inline(always)]
    unsafe fn zero_raw() -> Self::Raw {
        _mm256_setzero_ps()
    }

    #[inline(always)]
    unsafe fn load8_raw(buf: &[Self], index: usize) -> Self::Raw {
        simd_utils::loadu_ps256(buf, index)
    }

    #[inline(always)]
    unsafe fn store8_raw(buf: &mut [Self], index: usize, v: Self::Raw) {
        simd_utils::storeu_ps256(buf, index, v)
    }

    #[inline(always)]
    unsafe fn transpose8(x: &mut [Self::Raw; 8]) {
        simd_utils::mm256_transpose8_ps(x)
    }

    #[inline(always)]
    unsafe fn load8(buf: &[Self], index: usize) -> __m256 {
        simd_utils::loadu_ps256(buf, index)
    }

    #[inline(always)]
    unsafe fn store8(buf: &mut [Self], index: usize, v: __m256) {
        simd_utils::storeu_ps256(buf, index, v)
    }
}

impl Avx2Float for f16 {
    type Raw = __m128i;

    #[inline(always)]
    unsafe fn zero_raw() -> Self::Raw {
        _mm_setzero_si128()
    }

    #[inline(always)]
    unsafe fn load8_raw(buf: &[Self], index: usize) -> Self::Raw {
        simd_utils::loadu_si128(buf, index)
    }

    #[inline(always)]
    unsafe fn store8_raw(buf: &mut [Self], index: usize, v: Self::Raw) {
        simd_utils::storeu_si128(buf, index, v)
    }

    #[inline(always)]
    unsafe fn transpose8(x: &mut [Self::Raw; 8]) {
        simd_utils::mm_transpose8_epi16(x)
    }

    #[inline(always)]
    unsafe fn load8(buf: &[Self], index: usize) -> __m256 {
        _mm256_cvtph_ps(simd_utils::loadu_si128(buf, index))
    }

    #[inline(always)]
    unsafe fn store8(buf: &mut [Self], index: usize, v: __m256) {
        let halves = _mm256_cvtps_ph::<_MM_FROUND_TO_NEAREST_INT>(v);
        simd_utils::storeu_si128(buf, index, halves)
    }
}
