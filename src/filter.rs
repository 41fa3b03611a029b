//! Interface that a tile scheduler uses to negotiate ranges and buffering
//! with a stage before calling [ImageFilter::process].
use std::ops::Range;

use crate::{ImageBuffer, ImageBufferMut, PixelType, ResizeError, ScratchBuffer};

/// Count of rows or columns that means "everything".
pub const BUFFER_MAX: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterFlags {
    /// Output row `i` depends only on input row `i`.
    pub same_row: bool,
    /// The stage needs whole input rows regardless of requested columns.
    pub entire_row: bool,
    /// The stage needs the whole input plane to produce any output row.
    pub entire_plane: bool,
}

/// Dimensions and pixel type of an output image of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAttributes {
    pub width: u32,
    pub height: u32,
    pub pixel_type: PixelType,
}

/// Stage of an image pipeline.
///
/// All methods are pure functions of the immutable state of a stage,
/// so a stage may be shared between threads which process
/// different rows or tiles concurrently.
pub trait ImageFilter: Send + Sync {
    fn flags(&self) -> FilterFlags;

    fn image_attributes(&self) -> ImageAttributes;

    /// Rows of the input image required to produce output row `i`.
    fn required_row_range(&self, i: u32) -> Range<u32>;

    /// Columns of the input image required to produce output columns `[left, right)`.
    fn required_col_range(&self, left: u32, right: u32) -> Range<u32>;

    /// Count of output rows produced by one call of [ImageFilter::process].
    fn simultaneous_lines(&self) -> u32;

    /// Count of input rows that must stay available in a line buffer.
    /// [BUFFER_MAX] means the whole plane.
    fn max_buffering(&self) -> u32;

    /// Size in bytes of [ScratchBuffer] required by [ImageFilter::process]
    /// to produce output columns `[left, right)`.
    fn tmp_size(&self, left: u32, right: u32) -> Result<usize, ResizeError>;

    /// Writes output columns `[left, right)` of rows
    /// `[i, min(i + simultaneous_lines, height))`.
    ///
    /// Input rows and columns reported by [ImageFilter::required_row_range] and
    /// [ImageFilter::required_col_range] must already be present in `src`.
    ///
    /// Returns [ResizeError::RegionIsOutOfBounds] if row `i` or columns `[left, right)`
    /// lie outside the output image or outside rows of `src` and `dst`.
    fn process(
        &self,
        tmp: &mut ScratchBuffer,
        src: &ImageBuffer,
        dst: &mut ImageBufferMut,
        i: u32,
        left: u32,
        right: u32,
    ) -> Result<(), ResizeError>;
}
