use crate::convolution::fixed_point::FRACTION_BITS;
use crate::utils::ceil_n;
use crate::CoefficientTableError;

/// Alignment (in elements) of rows of float coefficients.
const F32_ROW_ALIGNMENT: usize = 8;
/// Alignment (in elements) of rows of fixed-point coefficients.
const I16_ROW_ALIGNMENT: usize = 16;

/// Discretized filter: support window and weights of every output sample.
///
/// Weights are stored twice, as `f32` for float pixels and as `i16`
/// with 14 fractional bits for 16-bit integer pixels. Every row of
/// both matrices is padded with zeros up to a multiple of the vector width,
/// so vector kernels may read whole registers of coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    filter_width: u32,
    filter_rows: u32,
    input_width: u32,
    stride: usize,
    stride_i16: usize,
    left: Vec<u32>,
    data: Vec<f32>,
    data_i16: Vec<i16>,
    is_sorted: bool,
}

impl CoefficientTable {
    /// Creates table from dense `left.len() x filter_width` matrix of weights.
    ///
    /// Fixed-point weights are derived by quantization with error diffusion along
    /// every row; the rounding residue of the row sum is added to the
    /// coefficient with the greatest magnitude.
    pub fn new(
        input_width: u32,
        filter_width: u32,
        left: Vec<u32>,
        weights: &[f32],
    ) -> Result<Self, CoefficientTableError> {
        let mut table = Self::with_layout(input_width, filter_width, left, weights.len())?;
        let fw = filter_width as usize;
        for (row, src) in weights.chunks_exact(fw).enumerate() {
            let dst = &mut table.data[row * table.stride..][..fw];
            dst.copy_from_slice(src);
            let dst_i16 = &mut table.data_i16[row * table.stride_i16..][..fw];
            quantize_row(src, dst_i16)
                .ok_or(CoefficientTableError::CoefficientIsOutOfRange { row })?;
        }
        Ok(table)
    }

    /// Creates table from weights already encoded in both representations.
    pub fn with_fixed_point(
        input_width: u32,
        filter_width: u32,
        left: Vec<u32>,
        weights: &[f32],
        weights_i16: &[i16],
    ) -> Result<Self, CoefficientTableError> {
        if weights_i16.len() != weights.len() {
            return Err(CoefficientTableError::InvalidWeightsCount {
                expected: weights.len(),
                actual: weights_i16.len(),
            });
        }
        let mut table = Self::with_layout(input_width, filter_width, left, weights.len())?;
        let fw = filter_width as usize;
        let rows = weights.chunks_exact(fw).zip(weights_i16.chunks_exact(fw));
        for (row, (src, src_i16)) in rows.enumerate() {
            table.data[row * table.stride..][..fw].copy_from_slice(src);
            table.data_i16[row * table.stride_i16..][..fw].copy_from_slice(src_i16);
        }
        Ok(table)
    }

    fn with_layout(
        input_width: u32,
        filter_width: u32,
        left: Vec<u32>,
        weights_count: usize,
    ) -> Result<Self, CoefficientTableError> {
        if filter_width == 0 {
            return Err(CoefficientTableError::ZeroFilterWidth);
        }
        if left.is_empty() {
            return Err(CoefficientTableError::ZeroFilterRows);
        }
        let filter_rows = u32::try_from(left.len()).map_err(|_| {
            CoefficientTableError::InvalidWeightsCount {
                expected: u32::MAX as usize,
                actual: left.len(),
            }
        })?;
        let fw = filter_width as usize;
        let expected = left.len().saturating_mul(fw);
        if weights_count != expected {
            return Err(CoefficientTableError::InvalidWeightsCount {
                expected,
                actual: weights_count,
            });
        }
        for (row, &l) in left.iter().enumerate() {
            let end = l as u64 + filter_width as u64;
            if end > input_width as u64 {
                return Err(CoefficientTableError::WindowIsOutOfInput {
                    row,
                    end,
                    input_width,
                });
            }
        }

        let stride = ceil_n(fw, F32_ROW_ALIGNMENT);
        let stride_i16 = ceil_n(fw, I16_ROW_ALIGNMENT);
        let is_sorted = left.is_sorted();
        Ok(Self {
            filter_width,
            filter_rows,
            input_width,
            stride,
            stride_i16,
            data: vec![0.; stride * left.len()],
            data_i16: vec![0; stride_i16 * left.len()],
            left,
            is_sorted,
        })
    }

    /// Count of taps of every output sample.
    #[inline(always)]
    pub fn filter_width(&self) -> u32 {
        self.filter_width
    }

    /// Count of output samples.
    #[inline(always)]
    pub fn filter_rows(&self) -> u32 {
        self.filter_rows
    }

    /// Size of the input axis.
    #[inline(always)]
    pub fn input_width(&self) -> u32 {
        self.input_width
    }

    /// Distance between rows of float coefficients.
    #[inline(always)]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Distance between rows of fixed-point coefficients.
    #[inline(always)]
    pub fn stride_i16(&self) -> usize {
        self.stride_i16
    }

    /// Index of the first input sample of every output sample.
    #[inline(always)]
    pub fn left(&self) -> &[u32] {
        &self.left
    }

    /// Returns `true` if `left` is non-decreasing.
    #[inline(always)]
    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }

    /// Float coefficients of the output sample `i` (without padding).
    #[inline(always)]
    pub fn coeffs(&self, i: usize) -> &[f32] {
        &self.coeffs_padded(i)[..self.filter_width as usize]
    }

    /// Fixed-point coefficients of the output sample `i` (without padding).
    #[inline(always)]
    pub fn coeffs_i16(&self, i: usize) -> &[i16] {
        &self.coeffs_i16_padded(i)[..self.filter_width as usize]
    }

    #[inline(always)]
    pub(crate) fn coeffs_padded(&self, i: usize) -> &[f32] {
        &self.data[i * self.stride..][..self.stride]
    }

    #[inline(always)]
    pub(crate) fn coeffs_i16_padded(&self, i: usize) -> &[i16] {
        &self.data_i16[i * self.stride_i16..][..self.stride_i16]
    }
}

/// Quantizes one row of weights into 14-bit fixed-point values.
/// Returns `None` if some value doesn't fit into `i16`.
fn quantize_row(src: &[f32], dst: &mut [i16]) -> Option<()> {
    let scale = (1 << FRACTION_BITS) as f64;
    let mut error = 0f64;
    let mut sum = 0i32;
    let mut greatest = 0i32;
    let mut greatest_idx = 0usize;

    for (i, (&coeff, d)) in src.iter().zip(dst.iter_mut()).enumerate() {
        let expected = coeff as f64 * scale - error;
        let quantized = expected.round_ties_even();
        let value = i16::try_from(quantized as i32).ok()?;
        error = value as f64 - expected;
        if (value as i32).abs() > greatest {
            greatest = (value as i32).abs();
            greatest_idx = i;
        }
        sum += value as i32;
        *d = value;
    }

    let src_sum: f64 = src.iter().map(|&c| c as f64).sum();
    let target = (src_sum * scale).round() as i32;
    let fixed = dst[greatest_idx] as i32 + target - sum;
    dst[greatest_idx] = i16::try_from(fixed).ok()?;
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_with_zeros() {
        let weights = [0.25, 0.5, 0.25, 0.5, 0.25, 0.25];
        let table = CoefficientTable::new(4, 3, vec![0, 1], &weights).unwrap();
        assert_eq!(table.stride(), 8);
        assert_eq!(table.stride_i16(), 16);
        assert_eq!(table.coeffs(1), &[0.5, 0.25, 0.25]);
        assert_eq!(table.coeffs_i16(0), &[4096, 8192, 4096]);
        assert!(table.coeffs_padded(0)[3..].iter().all(|&c| c == 0.));
        assert!(table.coeffs_i16_padded(1)[3..].iter().all(|&c| c == 0));
    }

    #[test]
    fn quantized_rows_keep_their_sum() {
        let weights = [1. / 3.; 3];
        let mut dst = [0i16; 3];
        quantize_row(&weights, &mut dst).unwrap();
        assert_eq!(dst.iter().map(|&v| v as i32).sum::<i32>(), 1 << FRACTION_BITS);

        let weights = [-0.1, 0.35, 0.5, 0.35, -0.1];
        let mut dst = [0i16; 5];
        quantize_row(&weights, &mut dst).unwrap();
        assert_eq!(dst.iter().map(|&v| v as i32).sum::<i32>(), 1 << FRACTION_BITS);
    }

    #[test]
    fn too_big_coefficient() {
        let res = CoefficientTable::new(2, 1, vec![0], &[3.0]);
        assert_eq!(
            res,
            Err(CoefficientTableError::CoefficientIsOutOfRange { row: 0 })
        );
    }

    #[test]
    fn invalid_layout() {
        assert_eq!(
            CoefficientTable::new(4, 0, vec![0], &[]),
            Err(CoefficientTableError::ZeroFilterWidth)
        );
        assert_eq!(
            CoefficientTable::new(4, 2, vec![], &[]),
            Err(CoefficientTableError::ZeroFilterRows)
        );
        assert_eq!(
            CoefficientTable::new(4, 2, vec![0, 1], &[0.5, 0.5]),
            Err(CoefficientTableError::InvalidWeightsCount {
                expected: 4,
                actual: 2
            })
        );
        assert_eq!(
            CoefficientTable::new(4, 2, vec![0, 3], &[0.5; 4]),
            Err(CoefficientTableError::WindowIsOutOfInput {
                row: 1,
                end: 5,
                input_width: 4
            })
        );
    }

    #[test]
    fn sorted_flag() {
        let table = CoefficientTable::new(4, 1, vec![0, 1, 1, 3], &[1.; 4]).unwrap();
        assert!(table.is_sorted());
        let table = CoefficientTable::new(4, 1, vec![0, 2, 1, 3], &[1.; 4]).unwrap();
        assert!(!table.is_sorted());
    }
}
