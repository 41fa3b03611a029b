use thiserror::Error;

use crate::PixelType;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageBufferError {
    #[error("Size of buffer is smaller than required")]
    InvalidBufferSize,
    #[error("Alignment of buffer don't match to alignment of pixel type")]
    InvalidBufferAlignment,
    #[error("Stride of buffer is smaller than width of row or not a multiple of pixel size")]
    InvalidStride,
    #[error("Width of row must be greater than zero")]
    ZeroWidth,
    #[error("Buffer with bounded mask can't be split into bands of rows")]
    BoundedBufferCannotBeSplit,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoefficientTableError {
    #[error("Filter width must be greater than zero")]
    ZeroFilterWidth,
    #[error("Coefficient table must contain at least one row")]
    ZeroFilterRows,
    #[error("Count of weights ({actual}) don't match to filter_rows * filter_width ({expected})")]
    InvalidWeightsCount { expected: usize, actual: usize },
    #[error("Tap window of row {row} ends at {end} which is out of input width {input_width}")]
    WindowIsOutOfInput { row: usize, end: u64, input_width: u32 },
    #[error("Coefficient of row {row} can't be represented as 16-bit fixed-point value")]
    CoefficientIsOutOfRange { row: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeError {
    #[error("Pixel type {0:?} is not supported by resize filters")]
    UnsupportedPixelType(PixelType),
    #[error("Bit depth {0} is not supported, it must be in range [1, 16]")]
    UnsupportedBitDepth(u32),
    #[error("Dimensions of output image must be greater than zero")]
    ZeroDimension,
    #[error("Size of temporary buffer overflows addressable memory")]
    TmpSizeOverflow,
    #[error("Failed to allocate {0} bytes of memory")]
    OutOfMemory(usize),
    #[error(transparent)]
    InvalidCoefficientTable(#[from] CoefficientTableError),
    #[error(transparent)]
    ImageBuffer(#[from] ImageBufferError),
    #[error("Type of pixels of the source image is not equal to pixel type of the destination image")]
    DifferentTypesOfPixels,
    #[error("Columns [{left}, {right}) of row {row} are out of the image or the buffers")]
    RegionIsOutOfBounds { row: u32, left: u32, right: u32 },
}
