use crate::ResizeError;

/// Count of fractional bits of 16-bit fixed-point coefficients.
pub const FRACTION_BITS: u32 = 14;
/// Half of the smallest unit of the coefficient domain.
pub(crate) const ROUNDING_BIAS: i32 = 1 << (FRACTION_BITS - 1);
/// Value of the stored domain that maps to zero in the signed domain.
pub(crate) const ZERO_BIAS: i32 = 1 << 15;

/// Conversion between stored 16-bit samples and the signed accumulator domain.
///
/// All integer kernels produce output through [FixedPointCodec::pack],
/// vector kernels reproduce the same rounding and saturation lane by lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPointCodec {
    pixel_max: u16,
}

impl FixedPointCodec {
    /// Creates codec for output samples with given bit depth (1..=16).
    pub fn new(depth: u32) -> Result<Self, ResizeError> {
        if !(1..=16).contains(&depth) {
            return Err(ResizeError::UnsupportedBitDepth(depth));
        }
        Ok(Self {
            pixel_max: ((1u32 << depth) - 1) as u16,
        })
    }

    /// Maximal value of an output sample.
    #[inline(always)]
    pub fn pixel_max(&self) -> u16 {
        self.pixel_max
    }

    /// Maps stored sample onto the signed domain centered at zero.
    #[inline(always)]
    pub fn unpack(x: u16) -> i32 {
        x as i32 - ZERO_BIAS
    }

    /// Rounds accumulator with 14 fractional bits to nearest (half-way values up)
    /// and saturates result to `[0, pixel_max]`.
    #[inline(always)]
    pub fn pack(&self, accum: i32) -> u16 {
        let x = (accum.wrapping_add(ROUNDING_BIAS) >> FRACTION_BITS) + ZERO_BIAS;
        x.clamp(0, self.pixel_max as i32) as u16
    }
}

impl Default for FixedPointCodec {
    fn default() -> Self {
        Self { pixel_max: u16::MAX }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: i32 = 1 << FRACTION_BITS;

    #[test]
    fn unpack_centers_samples() {
        assert_eq!(FixedPointCodec::unpack(0), -32768);
        assert_eq!(FixedPointCodec::unpack(32768), 0);
        assert_eq!(FixedPointCodec::unpack(u16::MAX), 32767);
    }

    #[test]
    fn pack_inverts_unpack_with_unit_coefficient() {
        let codec = FixedPointCodec::default();
        for x in [0u16, 1, 1000, 32767, 32768, 65534, 65535] {
            assert_eq!(codec.pack(FixedPointCodec::unpack(x) * ONE), x);
        }
    }

    #[test]
    fn pack_rounds_half_up() {
        let codec = FixedPointCodec::default();
        // 100.5 in the signed domain
        let accum = 100 * ONE + ONE / 2;
        assert_eq!(codec.pack(accum), 32768 + 101);
        assert_eq!(codec.pack(accum - 1), 32768 + 100);
        // -100.5 rounds towards +infinity too
        let accum = -100 * ONE - ONE / 2;
        assert_eq!(codec.pack(accum), 32768 - 100);
        assert_eq!(codec.pack(accum - 1), 32768 - 101);
    }

    #[test]
    fn pack_saturates() {
        let codec = FixedPointCodec::default();
        assert_eq!(codec.pack(-32769 * ONE), 0);
        assert_eq!(codec.pack(i32::MIN / 2), 0);
        assert_eq!(codec.pack(32768 * ONE), u16::MAX);
        assert_eq!(codec.pack(i32::MAX / 2), u16::MAX);

        let codec = FixedPointCodec::new(10).unwrap();
        assert_eq!(codec.pixel_max(), 1023);
        assert_eq!(codec.pack((1024 - 32768) * ONE), 1023);
        assert_eq!(codec.pack((1023 - 32768) * ONE), 1023);
        assert_eq!(codec.pack((1022 - 32768) * ONE), 1022);
    }

    #[test]
    fn invalid_depth() {
        assert_eq!(
            FixedPointCodec::new(0),
            Err(ResizeError::UnsupportedBitDepth(0))
        );
        assert_eq!(
            FixedPointCodec::new(17),
            Err(ResizeError::UnsupportedBitDepth(17))
        );
    }
}
