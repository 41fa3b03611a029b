//! Representations of samples of one image plane.
use std::fmt::Debug;
use std::mem::size_of;

use half::f16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    /// 8-bit unsigned integer. Resize filters don't support it.
    U8,
    /// 16-bit unsigned integer with configurable bit depth.
    U16,
    /// IEEE 754 half-precision float.
    F16,
    /// IEEE 754 single-precision float.
    F32,
}

impl PixelType {
    /// Size of one sample in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::U8 => size_of::<u8>(),
            Self::U16 => size_of::<u16>(),
            Self::F16 => size_of::<f16>(),
            Self::F32 => size_of::<f32>(),
        }
    }
}

/// Sample type that can be stored in line buffers.
pub trait Pixel: bytemuck::Pod + Default + Debug + Send + Sync + 'static {
    fn pixel_type() -> PixelType;
}

/// Sample type processed in the float domain.
pub trait FloatPixel: Pixel {
    fn to_f32(self) -> f32;

    /// Narrows with rounding to the nearest, ties to even.
    fn from_f32(v: f32) -> Self;
}

macro_rules! pixel_impl {
    ($type:ty, $pixel_type:expr) => {
        impl Pixel for $type {
            #[inline(always)]
            fn pixel_type() -> PixelType {
                $pixel_type
            }
        }
    };
}

pixel_impl!(u16, PixelType::U16);
pixel_impl!(f16, PixelType::F16);
pixel_impl!(f32, PixelType::F32);

impl FloatPixel for f16 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        f16::from_f32(v)
    }
}

impl FloatPixel for f32 {
    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_narrowing_rounds_to_nearest_even() {
        // 2049 lies between two representable halves (2048 and 2050).
        assert_eq!(<f16 as FloatPixel>::from_f32(2049.0).to_f32(), 2048.0);
        assert_eq!(<f16 as FloatPixel>::from_f32(2051.0).to_f32(), 2052.0);
        assert_eq!(<f16 as FloatPixel>::from_f32(0.5).to_f32(), 0.5);
    }
}
