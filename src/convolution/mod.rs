//! Separable resampling stages.
//!
//! A stage applies a [CoefficientTable] along one axis of a plane. Horizontal
//! stages produce output row `i` from input row `i`, vertical stages produce
//! output row `i` from a window of input rows described by the table.
use std::ops::Range;

use half::f16;

pub use coefficients::CoefficientTable;
pub use fixed_point::{FixedPointCodec, FRACTION_BITS};

use crate::filter::{FilterFlags, ImageAttributes, ImageFilter, BUFFER_MAX};
use crate::pixels::FloatPixel;
use crate::{CpuExtensions, ImageBuffer, ImageBufferMut, PixelType, ResizeError, ScratchBuffer};
use horizontal_fp::HorizontalFp;
use horizontal_u16::HorizontalU16;
use vertical_fp::VerticalFp;
use vertical_u16::VerticalU16;

#[cfg(target_arch = "x86_64")]
mod avx2_float;
mod coefficients;
pub(crate) mod fixed_point;
mod horizontal_fp;
mod horizontal_u16;
mod vertical_fp;
mod vertical_u16;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub(crate) trait FloatConvolution: FloatPixel + avx2_float::Avx2Float {}
    } else {
        pub(crate) trait FloatConvolution: FloatPixel {}
    }
}

impl FloatConvolution for f16 {}
impl FloatConvolution for f32 {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Parameters of a resize stage.
#[derive(Debug, Clone, Copy)]
pub struct ResizeFilterBuilder {
    axis: Axis,
    pixel_type: PixelType,
    dimension: u32,
    depth: u32,
    cpu_extensions: CpuExtensions,
}

impl ResizeFilterBuilder {
    /// `dimension` is the size of the output image along the other axis:
    /// height for horizontal stages and width for vertical ones.
    pub fn new(axis: Axis, pixel_type: PixelType, dimension: u32) -> Self {
        Self {
            axis,
            pixel_type,
            dimension,
            depth: 16,
            cpu_extensions: Default::default(),
        }
    }

    /// Sets bit depth of output samples of [PixelType::U16] images.
    /// Float images ignore it.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn cpu_extensions(&self) -> CpuExtensions {
        self.cpu_extensions
    }

    /// # Safety
    /// This is unsafe because this method allows you to set a CPU-extensions
    /// that is not actually supported by your CPU.
    pub unsafe fn set_cpu_extensions(&mut self, extensions: CpuExtensions) {
        self.cpu_extensions = extensions;
    }

    /// Creates stage that applies `table` along the axis of the builder.
    pub fn build(self, table: CoefficientTable) -> Result<Box<dyn ImageFilter>, ResizeError> {
        if self.dimension == 0 {
            return Err(ResizeError::ZeroDimension);
        }
        let codec = match self.pixel_type {
            PixelType::U16 => FixedPointCodec::new(self.depth)?,
            PixelType::F16 | PixelType::F32 => FixedPointCodec::default(),
            PixelType::U8 => return Err(ResizeError::UnsupportedPixelType(self.pixel_type)),
        };
        let cpu = self.cpu_extensions;

        let filter: Box<dyn ImageFilter> = match self.axis {
            Axis::Horizontal => {
                let kernel = match self.pixel_type {
                    PixelType::U16 => HorizontalKernel::U16(HorizontalU16::new(&table, cpu), codec),
                    PixelType::F16 => HorizontalKernel::F16(HorizontalFp::new(&table, cpu)),
                    _ => HorizontalKernel::F32(HorizontalFp::new(&table, cpu)),
                };
                Box::new(ResizeImplH {
                    attributes: ImageAttributes {
                        width: table.filter_rows(),
                        height: self.dimension,
                        pixel_type: self.pixel_type,
                    },
                    table,
                    kernel,
                })
            }
            Axis::Vertical => {
                let kernel = match self.pixel_type {
                    PixelType::U16 => VerticalKernel::U16(VerticalU16::new(cpu), codec),
                    PixelType::F16 => VerticalKernel::F16(VerticalFp::new(cpu)),
                    _ => VerticalKernel::F32(VerticalFp::new(cpu)),
                };
                Box::new(ResizeImplV {
                    attributes: ImageAttributes {
                        width: self.dimension,
                        height: table.filter_rows(),
                        pixel_type: self.pixel_type,
                    },
                    table,
                    kernel,
                })
            }
        };

        // Reject configurations whose scratch memory can't be addressed.
        let attributes = filter.image_attributes();
        let tmp_size = filter.tmp_size(0, attributes.width)?;
        log::debug!(
            "{:?} resize filter {}x{} {:?}: cpu_extensions={:?}, simultaneous_lines={}, tmp_size={}",
            self.axis,
            attributes.width,
            attributes.height,
            self.pixel_type,
            cpu,
            filter.simultaneous_lines(),
            tmp_size,
        );
        #[cfg(feature = "for_testing")]
        crate::testing::log_message(&format!(
            "resize_{:?}_{:?}_{:?}",
            self.axis, self.pixel_type, cpu
        ));
        Ok(filter)
    }
}

#[derive(Debug, Clone, Copy)]
enum HorizontalKernel {
    U16(HorizontalU16, FixedPointCodec),
    F16(HorizontalFp<f16>),
    F32(HorizontalFp<f32>),
}

/// Horizontal stage: output row `i` depends only on input row `i`.
#[derive(Debug)]
struct ResizeImplH {
    table: CoefficientTable,
    attributes: ImageAttributes,
    kernel: HorizontalKernel,
}

impl ImageFilter for ResizeImplH {
    fn flags(&self) -> FilterFlags {
        FilterFlags {
            same_row: true,
            entire_row: !self.table.is_sorted(),
            entire_plane: false,
        }
    }

    fn image_attributes(&self) -> ImageAttributes {
        self.attributes
    }

    fn required_row_range(&self, i: u32) -> Range<u32> {
        let end = i.saturating_add(self.simultaneous_lines());
        i..end.min(self.attributes.height)
    }

    fn required_col_range(&self, left: u32, right: u32) -> Range<u32> {
        if left >= right {
            return 0..0;
        }
        if self.table.is_sorted() {
            let lo = self.table.left()[left as usize];
            let hi = self.table.left()[right as usize - 1] + self.table.filter_width();
            lo..hi
        } else {
            0..self.table.input_width()
        }
    }

    fn simultaneous_lines(&self) -> u32 {
        match &self.kernel {
            HorizontalKernel::U16(k, _) => k.simultaneous_lines(),
            HorizontalKernel::F16(k) => k.simultaneous_lines(),
            HorizontalKernel::F32(k) => k.simultaneous_lines(),
        }
    }

    fn max_buffering(&self) -> u32 {
        self.simultaneous_lines()
    }

    fn tmp_size(&self, left: u32, right: u32) -> Result<usize, ResizeError> {
        let col_range = self.required_col_range(left, right);
        match &self.kernel {
            HorizontalKernel::U16(k, _) => k.tmp_size(col_range),
            HorizontalKernel::F16(k) => k.tmp_size(col_range),
            HorizontalKernel::F32(k) => k.tmp_size(col_range),
        }
    }

    fn process(
        &self,
        tmp: &mut ScratchBuffer,
        src: &ImageBuffer,
        dst: &mut ImageBufferMut,
        i: u32,
        left: u32,
        right: u32,
    ) -> Result<(), ResizeError> {
        check_region(&self.attributes, src, dst, i, left, right)?;
        if left >= right {
            return Ok(());
        }

        let height = self.attributes.height;
        let col_range = self.required_col_range(left, right);
        if col_range.end > src.width() {
            return Err(ResizeError::RegionIsOutOfBounds { row: i, left, right });
        }
        let table = &self.table;
        match (&self.kernel, src, dst) {
            (HorizontalKernel::U16(k, codec), ImageBuffer::U16(src), ImageBufferMut::U16(dst)) => {
                k.process(table, *codec, tmp, src, dst, height, col_range, i, left, right)
            }
            (HorizontalKernel::F16(k), ImageBuffer::F16(src), ImageBufferMut::F16(dst)) => {
                k.process(table, tmp, src, dst, height, col_range, i, left, right)
            }
            (HorizontalKernel::F32(k), ImageBuffer::F32(src), ImageBufferMut::F32(dst)) => {
                k.process(table, tmp, src, dst, height, col_range, i, left, right)
            }
            _ => return Err(ResizeError::DifferentTypesOfPixels),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum VerticalKernel {
    U16(VerticalU16, FixedPointCodec),
    F16(VerticalFp),
    F32(VerticalFp),
}

/// Vertical stage: output row `i` depends on a window of input rows.
#[derive(Debug)]
struct ResizeImplV {
    table: CoefficientTable,
    attributes: ImageAttributes,
    kernel: VerticalKernel,
}

impl ImageFilter for ResizeImplV {
    fn flags(&self) -> FilterFlags {
        let is_sorted = self.table.is_sorted();
        FilterFlags {
            same_row: false,
            entire_row: !is_sorted,
            entire_plane: !is_sorted,
        }
    }

    fn image_attributes(&self) -> ImageAttributes {
        self.attributes
    }

    fn required_row_range(&self, i: u32) -> Range<u32> {
        if self.table.is_sorted() {
            let top = self.table.left()[i as usize];
            top..top + self.table.filter_width()
        } else {
            0..self.table.input_width()
        }
    }

    fn required_col_range(&self, left: u32, right: u32) -> Range<u32> {
        left..right
    }

    fn simultaneous_lines(&self) -> u32 {
        1
    }

    fn max_buffering(&self) -> u32 {
        if self.table.is_sorted() {
            self.table.filter_width()
        } else {
            BUFFER_MAX
        }
    }

    fn tmp_size(&self, left: u32, right: u32) -> Result<usize, ResizeError> {
        if left >= right {
            return Ok(0);
        }
        match &self.kernel {
            VerticalKernel::U16(k, _) => k.tmp_size(&self.table, left, right),
            VerticalKernel::F16(k) | VerticalKernel::F32(k) => {
                k.tmp_size(&self.table, left, right)
            }
        }
    }

    fn process(
        &self,
        tmp: &mut ScratchBuffer,
        src: &ImageBuffer,
        dst: &mut ImageBufferMut,
        i: u32,
        left: u32,
        right: u32,
    ) -> Result<(), ResizeError> {
        check_region(&self.attributes, src, dst, i, left, right)?;
        if right > src.width() {
            return Err(ResizeError::RegionIsOutOfBounds { row: i, left, right });
        }
        if left >= right {
            return Ok(());
        }

        let table = &self.table;
        match (&self.kernel, src, dst) {
            (VerticalKernel::U16(k, codec), ImageBuffer::U16(src), ImageBufferMut::U16(dst)) => {
                k.process(table, *codec, tmp, src, dst, i, left, right)
            }
            (VerticalKernel::F16(k), ImageBuffer::F16(src), ImageBufferMut::F16(dst)) => {
                k.process(table, tmp, src, dst, i, left, right)
            }
            (VerticalKernel::F32(k), ImageBuffer::F32(src), ImageBufferMut::F32(dst)) => {
                k.process(table, tmp, src, dst, i, left, right)
            }
            _ => return Err(ResizeError::DifferentTypesOfPixels),
        }
        Ok(())
    }
}

/// Checks pixel types of buffers and that output row `i` and
/// columns up to `right` exist in the image and in `dst`.
fn check_region(
    attributes: &ImageAttributes,
    src: &ImageBuffer,
    dst: &ImageBufferMut,
    i: u32,
    left: u32,
    right: u32,
) -> Result<(), ResizeError> {
    if src.pixel_type() != attributes.pixel_type || dst.pixel_type() != attributes.pixel_type {
        return Err(ResizeError::DifferentTypesOfPixels);
    }
    if i >= attributes.height || right > attributes.width || right > dst.width() {
        return Err(ResizeError::RegionIsOutOfBounds { row: i, left, right });
    }
    Ok(())
}
