use std::arch::x86_64::*;

use crate::convolution::fixed_point::{FRACTION_BITS, ROUNDING_BIAS};

#[inline(always)]
pub unsafe fn loadu_si128<T>(buf: &[T], index: usize) -> __m128i {
    _mm_loadu_si128(buf.get_unchecked(index..).as_ptr() as *const __m128i)
}

#[inline(always)]
pub unsafe fn loadu_si256<T>(buf: &[T], index: usize) -> __m256i {
    _mm256_loadu_si256(buf.get_unchecked(index..).as_ptr() as *const __m256i)
}

#[inline(always)]
pub unsafe fn loadu_ps256<T>(buf: &[T], index: usize) -> __m256 {
    _mm256_loadu_ps(buf.get_unchecked(index..).as_ptr() as *const f32)
}

#[inline(always)]
pub unsafe fn storeu_si128<T>(buf: &mut [T], index: usize, v: __m128i) {
    _mm_storeu_si128(buf.get_unchecked_mut(index..).as_mut_ptr() as *mut __m128i, v)
}

#[inline(always)]
pub unsafe fn storeu_si256<T>(buf: &mut [T], index: usize, v: __m256i) {
    _mm256_storeu_si256(buf.get_unchecked_mut(index..).as_mut_ptr() as *mut __m256i, v)
}

#[inline(always)]
pub unsafe fn storeu_ps256<T>(buf: &mut [T], index: usize, v: __m256) {
    _mm256_storeu_ps(buf.get_unchecked_mut(index..).as_mut_ptr() as *mut f32, v)
}

/// Broadcasts pair of coefficients `buf[index]` and `buf[index + 1]`.
#[inline(always)]
pub unsafe fn ptr_i16_to_256set1_epi32(buf: &[i16], index: usize) -> __m256i {
    let ptr = buf.get_unchecked(index..).as_ptr() as *const i32;
    _mm256_set1_epi32(ptr.read_unaligned())
}

/// Copies up to `N` items of `buf` starting from `index`
/// into array filled with default values.
#[inline(always)]
pub fn partial_array<T: Copy + Default, const N: usize>(buf: &[T], index: usize) -> [T; N] {
    let mut res = [T::default(); N];
    let src = buf.get(index..).unwrap_or(&[]);
    let count = src.len().min(N);
    res[..count].copy_from_slice(&src[..count]);
    res
}

/// Multiplies pairs of unsigned 16-bit samples (`x0`, `x1`), mapped onto the
/// signed domain, by a pair of coefficients and adds products to accumulators.
/// `accum_lo` gets columns 0-3 and 8-11, `accum_hi` gets columns 4-7 and 12-15.
#[inline(always)]
pub unsafe fn madd_u16_pair(
    accum_lo: &mut __m256i,
    accum_hi: &mut __m256i,
    coeffs: __m256i,
    x0: __m256i,
    x1: __m256i,
) {
    let bias = _mm256_set1_epi16(i16::MIN);
    let x0 = _mm256_add_epi16(x0, bias);
    let x1 = _mm256_add_epi16(x1, bias);
    let lo = _mm256_unpacklo_epi16(x0, x1);
    let hi = _mm256_unpackhi_epi16(x0, x1);
    *accum_lo = _mm256_add_epi32(*accum_lo, _mm256_madd_epi16(coeffs, lo));
    *accum_hi = _mm256_add_epi32(*accum_hi, _mm256_madd_epi16(coeffs, hi));
}

/// Converts accumulators filled by [madd_u16_pair] into 16 unsigned samples
/// with rounding and saturation to `[0, pixel_max]`.
#[inline(always)]
pub unsafe fn mm256_pack_i30_u16(accum_lo: __m256i, accum_hi: __m256i, pixel_max: u16) -> __m256i {
    let round = _mm256_set1_epi32(ROUNDING_BIAS);
    let lo = _mm256_srai_epi32::<{ FRACTION_BITS as i32 }>(_mm256_add_epi32(accum_lo, round));
    let hi = _mm256_srai_epi32::<{ FRACTION_BITS as i32 }>(_mm256_add_epi32(accum_hi, round));
    let packed = _mm256_packs_epi32(lo, hi);
    let limit = _mm256_set1_epi16((pixel_max as i32 + i16::MIN as i32) as i16);
    let packed = _mm256_min_epi16(packed, limit);
    _mm256_sub_epi16(packed, _mm256_set1_epi16(i16::MIN))
}

/// Transposes 8x8 matrix of floats, `x[n]` becomes column `n`.
#[inline(always)]
pub unsafe fn mm256_transpose8_ps(x: &mut [__m256; 8]) {
    let t0 = _mm256_unpacklo_ps(x[0], x[1]);
    let t1 = _mm256_unpackhi_ps(x[0], x[1]);
    let t2 = _mm256_unpacklo_ps(x[2], x[3]);
    let t3 = _mm256_unpackhi_ps(x[2], x[3]);
    let t4 = _mm256_unpacklo_ps(x[4], x[5]);
    let t5 = _mm256_unpackhi_ps(x[4], x[5]);
    let t6 = _mm256_unpacklo_ps(x[6], x[7]);
    let t7 = _mm256_unpackhi_ps(x[6], x[7]);

    let tt0 = _mm256_shuffle_ps::<0x44>(t0, t2);
    let tt1 = _mm256_shuffle_ps::<0xEE>(t0, t2);
    let tt2 = _mm256_shuffle_ps::<0x44>(t1, t3);
    let tt3 = _mm256_shuffle_ps::<0xEE>(t1, t3);
    let tt4 = _mm256_shuffle_ps::<0x44>(t4, t6);
    let tt5 = _mm256_shuffle_ps::<0xEE>(t4, t6);
    let tt6 = _mm256_shuffle_ps::<0x44>(t5, t7);
    let tt7 = _mm256_shuffle_ps::<0xEE>(t5, t7);

    x[0] = _mm256_permute2f128_ps::<0x20>(tt0, tt4);
    x[1] = _mm256_permute2f128_ps::<0x20>(tt1, tt5);
    x[2] = _mm256_permute2f128_ps::<0x20>(tt2, tt6);
    x[3] = _mm256_permute2f128_ps::<0x20>(tt3, tt7);
    x[4] = _mm256_permute2f128_ps::<0x31>(tt0, tt4);
    x[5] = _mm256_permute2f128_ps::<0x31>(tt1, tt5);
    x[6] = _mm256_permute2f128_ps::<0x31>(tt2, tt6);
    x[7] = _mm256_permute2f128_ps::<0x31>(tt3, tt7);
}

/// Transposes 8x8 matrix of 16-bit values, `x[n]` becomes column `n`.
#[inline(always)]
pub unsafe fn mm_transpose8_epi16(x: &mut [__m128i; 8]) {
    let t0 = _mm_unpacklo_epi16(x[0], x[1]);
    let t1 = _mm_unpacklo_epi16(x[2], x[3]);
    let t2 = _mm_unpacklo_epi16(x[4], x[5]);
    let t3 = _mm_unpacklo_epi16(x[6], x[7]);
    let t4 = _mm_unpackhi_epi16(x[0], x[1]);
    let t5 = _mm_unpackhi_epi16(x[2], x[3]);
    let t6 = _mm_unpackhi_epi16(x[4], x[5]);
    let t7 = _mm_unpackhi_epi16(x[6], x[7]);

    let tt0 = _mm_unpacklo_epi32(t0, t1);
    let tt1 = _mm_unpackhi_epi32(t0, t1);
    let tt2 = _mm_unpacklo_epi32(t2, t3);
    let tt3 = _mm_unpackhi_epi32(t2, t3);
    let tt4 = _mm_unpacklo_epi32(t4, t5);
    let tt5 = _mm_unpackhi_epi32(t4, t5);
    let tt6 = _mm_unpacklo_epi32(t6, t7);
    let tt7 = _mm_unpackhi_epi32(t6, t7);

    x[0] = _mm_unpacklo_epi64(tt0, tt2);
    x[1] = _mm_unpackhi_epi64(tt0, tt2);
    x[2] = _mm_unpacklo_epi64(tt1, tt3);
    x[3] = _mm_unpackhi_epi64(tt1, tt3);
    x[4] = _mm_unpacklo_epi64(tt4, tt6);
    x[5] = _mm_unpackhi_epi64(tt4, tt6);
    x[6] = _mm_unpacklo_epi64(tt5, tt7);
    x[7] = _mm_unpackhi_epi64(tt5, tt7);
}

/// Transposes 8 rows of 16-bit values inside of every 128-bit lane.
#[inline(always)]
unsafe fn mm256_transpose8_lanes_epi16(x: &mut [__m256i]) {
    let t0 = _mm256_unpacklo_epi16(x[0], x[1]);
    let t1 = _mm256_unpacklo_epi16(x[2], x[3]);
    let t2 = _mm256_unpacklo_epi16(x[4], x[5]);
    let t3 = _mm256_unpacklo_epi16(x[6], x[7]);
    let t4 = _mm256_unpackhi_epi16(x[0], x[1]);
    let t5 = _mm256_unpackhi_epi16(x[2], x[3]);
    let t6 = _mm256_unpackhi_epi16(x[4], x[5]);
    let t7 = _mm256_unpackhi_epi16(x[6], x[7]);

    let tt0 = _mm256_unpacklo_epi32(t0, t1);
    let tt1 = _mm256_unpackhi_epi32(t0, t1);
    let tt2 = _mm256_unpacklo_epi32(t2, t3);
    let tt3 = _mm256_unpackhi_epi32(t2, t3);
    let tt4 = _mm256_unpacklo_epi32(t4, t5);
    let tt5 = _mm256_unpackhi_epi32(t4, t5);
    let tt6 = _mm256_unpacklo_epi32(t6, t7);
    let tt7 = _mm256_unpackhi_epi32(t6, t7);

    x[0] = _mm256_unpacklo_epi64(tt0, tt2);
    x[1] = _mm256_unpackhi_epi64(tt0, tt2);
    x[2] = _mm256_unpacklo_epi64(tt1, tt3);
    x[3] = _mm256_unpackhi_epi64(tt1, tt3);
    x[4] = _mm256_unpacklo_epi64(tt4, tt6);
    x[5] = _mm256_unpackhi_epi64(tt4, tt6);
    x[6] = _mm256_unpacklo_epi64(tt5, tt7);
    x[7] = _mm256_unpackhi_epi64(tt5, tt7);
}

/// Transposes 16x16 matrix of 16-bit values, `x[n]` becomes column `n`.
#[inline(always)]
pub unsafe fn mm256_transpose16_epi16(x: &mut [__m256i; 16]) {
    let (top, bottom) = x.split_at_mut(8);
    mm256_transpose8_lanes_epi16(top);
    mm256_transpose8_lanes_epi16(bottom);

    // Lanes of top[n] hold columns n and n + 8 of rows 0-7,
    // lanes of bottom[n] hold the same columns of rows 8-15.
    for n in 0..8 {
        let a = top[n];
        let b = bottom[n];
        top[n] = _mm256_permute2x128_si256::<0x20>(a, b);
        bottom[n] = _mm256_permute2x128_si256::<0x31>(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose16() {
        if !std::is_x86_feature_detected!("avx2") {
            return;
        }
        let src: Vec<u16> = (0..256).collect();
        let mut dst = [0u16; 256];
        unsafe { transpose16_avx2(&src, &mut dst) };
        for row in 0..16 {
            for col in 0..16 {
                assert_eq!(dst[col * 16 + row], src[row * 16 + col]);
            }
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn transpose16_avx2(src: &[u16], dst: &mut [u16]) {
        let mut x = [_mm256_setzero_si256(); 16];
        for (n, v) in x.iter_mut().enumerate() {
            *v = loadu_si256(src, n * 16);
        }
        mm256_transpose16_epi16(&mut x);
        for (n, v) in x.into_iter().enumerate() {
            storeu_si256(dst, n * 16, v);
        }
    }

    #[test]
    fn transpose8_ps() {
        if !std::is_x86_feature_detected!("avx2") {
            return;
        }
        let src: Vec<f32> = (0..64).map(|v| v as f32).collect();
        let mut dst = [0f32; 64];
        unsafe { transpose8_avx2(&src, &mut dst) };
        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(dst[col * 8 + row], src[row * 8 + col]);
            }
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn transpose8_avx2(src: &[f32], dst: &mut [f32]) {
        let mut x = [_mm256_setzero_ps(); 8];
        for (n, v) in x.iter_mut().enumerate() {
            *v = loadu_ps256(src, n * 8);
        }
        mm256_transpose8_ps(&mut x);
        for (n, v) in x.into_iter().enumerate() {
            storeu_ps256(dst, n * 8, v);
        }
    }
}
