//! Rows of image planes addressed by index masked with a ring mask.
use std::mem::size_of;
use std::slice;

use half::f16;

use crate::pixels::Pixel;
use crate::utils::try_alloc_vec;
use crate::{ImageBufferError, PixelType, ResizeError, BUFFER_MAX};

/// Mask of a buffer that keeps every row of an image.
pub const UNBOUNDED_MASK: u32 = u32::MAX;

/// Returns the smallest mask of a ring buffer that holds `count` rows.
///
/// Masks are always `2^k - 1`. [UNBOUNDED_MASK] is returned if `count` is
/// [BUFFER_MAX] or the ring would be bigger than `2^31` rows.
pub fn select_buffer_mask(count: u32) -> u32 {
    if count == BUFFER_MAX {
        return UNBOUNDED_MASK;
    }
    match count.checked_next_power_of_two() {
        Some(rows) if rows <= 1 << 31 => rows - 1,
        _ => UNBOUNDED_MASK,
    }
}

fn check_layout(
    len: usize,
    width: u32,
    stride: usize,
    mask: u32,
) -> Result<(), ImageBufferError> {
    if width == 0 {
        return Err(ImageBufferError::ZeroWidth);
    }
    if stride < width as usize {
        return Err(ImageBufferError::InvalidStride);
    }
    let required = if mask == UNBOUNDED_MASK {
        Some(width as usize)
    } else {
        (mask as usize)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(width as usize))
    };
    match required {
        Some(required) if required <= len => Ok(()),
        _ => Err(ImageBufferError::InvalidBufferSize),
    }
}

/// Checks that `rows` consecutive rows can be addressed without
/// overlapping each other.
fn holds_rows(len: usize, width: usize, stride: usize, mask: u32, rows: u32) -> bool {
    if rows == 0 {
        return true;
    }
    if mask != UNBOUNDED_MASK {
        return rows as u64 <= mask as u64 + 1;
    }
    (rows as usize - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .is_some_and(|required| required <= len)
}

fn cast_bytes<T: Pixel>(data: &[u8], stride_bytes: usize) -> Result<(&[T], usize), ImageBufferError> {
    if stride_bytes % size_of::<T>() != 0 {
        return Err(ImageBufferError::InvalidStride);
    }
    let data_len = data.len() - data.len() % size_of::<T>();
    let typed = bytemuck::try_cast_slice(&data[..data_len])
        .map_err(|_| ImageBufferError::InvalidBufferAlignment)?;
    Ok((typed, stride_bytes / size_of::<T>()))
}

/// Read-only view of rows of one plane.
///
/// Row `i` starts at element `(i & mask) * stride`.
#[derive(Debug, Clone, Copy)]
pub struct LineBuffer<'a, T> {
    data: &'a [T],
    width: usize,
    stride: usize,
    mask: u32,
}

impl<'a, T: Pixel> LineBuffer<'a, T> {
    /// `stride` is a distance between rows in elements.
    pub fn new(data: &'a [T], width: u32, stride: usize, mask: u32) -> Result<Self, ImageBufferError> {
        check_layout(data.len(), width, stride, mask)?;
        Ok(Self {
            data,
            width: width as usize,
            stride,
            mask,
        })
    }

    /// Creates view of raw bytes, `stride_bytes` is a distance between rows in bytes.
    pub fn from_bytes(
        data: &'a [u8],
        width: u32,
        stride_bytes: usize,
        mask: u32,
    ) -> Result<Self, ImageBufferError> {
        let (typed, stride) = cast_bytes(data, stride_bytes)?;
        Self::new(typed, width, stride, mask)
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width as u32
    }

    #[inline(always)]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline(always)]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Returns `true` if rows `[0, rows)` are all present in the view.
    pub fn holds_rows(&self, rows: u32) -> bool {
        holds_rows(self.data.len(), self.width, self.stride, self.mask, rows)
    }

    #[inline(always)]
    pub fn row(&self, i: u32) -> &'a [T] {
        let offset = (i & self.mask) as usize * self.stride;
        &self.data[offset..offset + self.width]
    }
}

/// Mutable view of rows of one plane.
#[derive(Debug)]
pub struct LineBufferMut<'a, T> {
    data: &'a mut [T],
    width: usize,
    stride: usize,
    mask: u32,
    first_row: u32,
}

impl<'a, T: Pixel> LineBufferMut<'a, T> {
    /// `stride` is a distance between rows in elements.
    pub fn new(
        data: &'a mut [T],
        width: u32,
        stride: usize,
        mask: u32,
    ) -> Result<Self, ImageBufferError> {
        check_layout(data.len(), width, stride, mask)?;
        Ok(Self {
            data,
            width: width as usize,
            stride,
            mask,
            first_row: 0,
        })
    }

    /// Creates view of raw bytes, `stride_bytes` is a distance between rows in bytes.
    pub fn from_bytes(
        data: &'a mut [u8],
        width: u32,
        stride_bytes: usize,
        mask: u32,
    ) -> Result<Self, ImageBufferError> {
        if stride_bytes % size_of::<T>() != 0 {
            return Err(ImageBufferError::InvalidStride);
        }
        let data_len = data.len() - data.len() % size_of::<T>();
        let typed = bytemuck::try_cast_slice_mut(&mut data[..data_len])
            .map_err(|_| ImageBufferError::InvalidBufferAlignment)?;
        Self::new(typed, width, stride_bytes / size_of::<T>(), mask)
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width as u32
    }

    #[inline(always)]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Index of the first row that the view can address.
    /// Views returned by [LineBufferMut::split_rows] start from non-zero rows.
    #[inline(always)]
    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    /// Returns `true` if rows `[first_row, end)` are all present in the view.
    pub fn holds_rows(&self, end: u32) -> bool {
        let rows = end.saturating_sub(self.first_row);
        holds_rows(self.data.len(), self.width, self.stride, self.mask, rows)
    }

    #[inline(always)]
    fn offset(&self, i: u32) -> usize {
        debug_assert!(i >= self.first_row);
        (i.wrapping_sub(self.first_row) & self.mask) as usize * self.stride
    }

    #[inline(always)]
    pub fn row(&self, i: u32) -> &[T] {
        let offset = self.offset(i);
        &self.data[offset..offset + self.width]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, i: u32) -> &mut [T] {
        let offset = self.offset(i);
        &mut self.data[offset..offset + self.width]
    }

    /// Returns `count` consecutive rows starting from `first`,
    /// the rest of `N` items are empty slices.
    pub(crate) fn rows_mut<const N: usize>(&mut self, first: u32, count: usize) -> [&mut [T]; N] {
        assert!(count <= N);
        // Rows of a ring are distinct only while they don't wrap around.
        assert!(count as u64 <= self.mask as u64 + 1);
        let offsets: [usize; N] = std::array::from_fn(|n| {
            if n < count {
                self.offset(first + n as u32)
            } else {
                0
            }
        });
        let width = self.width;
        let len = self.data.len();
        let ptr = self.data.as_mut_ptr();
        std::array::from_fn(|n| {
            if n < count {
                let offset = offsets[n];
                assert!(offset + width <= len);
                // SAFETY: offsets of rows are distinct and every row occupies
                // `width <= stride` elements, so the returned slices never overlap.
                unsafe { slice::from_raw_parts_mut(ptr.add(offset), width) }
            } else {
                &mut []
            }
        })
    }

    /// Splits unbounded view into disjoint bands of `rows_per_band` rows
    /// which cover rows `[first_row, height)`.
    pub fn split_rows(
        self,
        height: u32,
        rows_per_band: u32,
    ) -> Result<Vec<LineBufferMut<'a, T>>, ImageBufferError> {
        if self.mask != UNBOUNDED_MASK {
            return Err(ImageBufferError::BoundedBufferCannotBeSplit);
        }
        if height <= self.first_row {
            return Ok(Vec::new());
        }
        let rows = (height - self.first_row) as usize;
        let required = (rows - 1)
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(self.width))
            .ok_or(ImageBufferError::InvalidBufferSize)?;
        if required > self.data.len() {
            return Err(ImageBufferError::InvalidBufferSize);
        }

        let rows_per_band = rows_per_band.max(1);
        let mut bands = Vec::with_capacity(rows.div_ceil(rows_per_band as usize));
        let mut rest = self.data;
        let mut first_row = self.first_row;
        while first_row < height {
            let band_rows = rows_per_band.min(height - first_row);
            let band_len = (band_rows as usize * self.stride).min(rest.len());
            let (band, tail) = rest.split_at_mut(band_len);
            rest = tail;
            bands.push(LineBufferMut {
                data: band,
                width: self.width,
                stride: self.stride,
                mask: UNBOUNDED_MASK,
                first_row,
            });
            first_row += band_rows;
        }
        Ok(bands)
    }
}

/// Owned storage of rows of one plane.
///
/// Rows are written by a caller that drives the pipeline,
/// stages only read them through [LineStore::as_buffer].
#[derive(Debug, Clone)]
pub struct LineStore<T> {
    buffer: Vec<T>,
    width: u32,
    mask: u32,
}

impl<T: Pixel> LineStore<T> {
    /// Creates ring buffer that can keep at least `rows` trailing rows.
    pub fn with_capacity(width: u32, rows: u32) -> Result<Self, ResizeError> {
        let mask = select_buffer_mask(rows);
        if mask == UNBOUNDED_MASK {
            return Err(ResizeError::TmpSizeOverflow);
        }
        Self::allocate(width, mask as usize + 1, mask)
    }

    /// Creates buffer that keeps every row of an image.
    pub fn unbounded(width: u32, height: u32) -> Result<Self, ResizeError> {
        Self::allocate(width, height as usize, UNBOUNDED_MASK)
    }

    /// Wraps pixels of an image with given width.
    pub fn from_vec(width: u32, buffer: Vec<T>) -> Result<Self, ImageBufferError> {
        if width == 0 {
            return Err(ImageBufferError::ZeroWidth);
        }
        if buffer.len() % width as usize != 0 || buffer.is_empty() {
            return Err(ImageBufferError::InvalidBufferSize);
        }
        Ok(Self {
            buffer,
            width,
            mask: UNBOUNDED_MASK,
        })
    }

    fn allocate(width: u32, rows: usize, mask: u32) -> Result<Self, ResizeError> {
        if width == 0 || rows == 0 {
            return Err(ResizeError::ZeroDimension);
        }
        let len = rows
            .checked_mul(width as usize)
            .ok_or(ResizeError::TmpSizeOverflow)?;
        Ok(Self {
            buffer: try_alloc_vec(len)?,
            width,
            mask,
        })
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Count of rows physically stored in the buffer.
    pub fn rows_count(&self) -> usize {
        self.buffer.len() / self.width as usize
    }

    pub fn row(&self, i: u32) -> &[T] {
        let offset = (i & self.mask) as usize * self.width as usize;
        &self.buffer[offset..offset + self.width as usize]
    }

    pub fn row_mut(&mut self, i: u32) -> &mut [T] {
        let offset = (i & self.mask) as usize * self.width as usize;
        &mut self.buffer[offset..offset + self.width as usize]
    }

    pub fn as_buffer(&self) -> LineBuffer<'_, T> {
        LineBuffer {
            data: &self.buffer,
            width: self.width as usize,
            stride: self.width as usize,
            mask: self.mask,
        }
    }

    pub fn as_buffer_mut(&mut self) -> LineBufferMut<'_, T> {
        LineBufferMut {
            data: &mut self.buffer,
            width: self.width as usize,
            stride: self.width as usize,
            mask: self.mask,
            first_row: 0,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.buffer
    }
}

/// Type-erased read-only view of rows of one plane.
#[derive(Debug, Clone, Copy)]
pub enum ImageBuffer<'a> {
    U16(LineBuffer<'a, u16>),
    F16(LineBuffer<'a, f16>),
    F32(LineBuffer<'a, f32>),
}

/// Type-erased mutable view of rows of one plane.
#[derive(Debug)]
pub enum ImageBufferMut<'a> {
    U16(LineBufferMut<'a, u16>),
    F16(LineBufferMut<'a, f16>),
    F32(LineBufferMut<'a, f32>),
}

macro_rules! image_buffer_from {
    ($type:ty, $variant:ident) => {
        impl<'a> From<LineBuffer<'a, $type>> for ImageBuffer<'a> {
            fn from(buffer: LineBuffer<'a, $type>) -> Self {
                Self::$variant(buffer)
            }
        }

        impl<'a> From<LineBufferMut<'a, $type>> for ImageBufferMut<'a> {
            fn from(buffer: LineBufferMut<'a, $type>) -> Self {
                Self::$variant(buffer)
            }
        }
    };
}

image_buffer_from!(u16, U16);
image_buffer_from!(f16, F16);
image_buffer_from!(f32, F32);

impl<'a> ImageBuffer<'a> {
    /// Creates view of raw bytes with samples of given type.
    pub fn from_bytes(
        pixel_type: PixelType,
        data: &'a [u8],
        width: u32,
        stride_bytes: usize,
        mask: u32,
    ) -> Result<Self, ResizeError> {
        Ok(match pixel_type {
            PixelType::U16 => LineBuffer::<u16>::from_bytes(data, width, stride_bytes, mask)?.into(),
            PixelType::F16 => LineBuffer::<f16>::from_bytes(data, width, stride_bytes, mask)?.into(),
            PixelType::F32 => LineBuffer::<f32>::from_bytes(data, width, stride_bytes, mask)?.into(),
            PixelType::U8 => return Err(ResizeError::UnsupportedPixelType(pixel_type)),
        })
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::U16(_) => PixelType::U16,
            Self::F16(_) => PixelType::F16,
            Self::F32(_) => PixelType::F32,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::U16(b) => b.width(),
            Self::F16(b) => b.width(),
            Self::F32(b) => b.width(),
        }
    }

    pub fn holds_rows(&self, rows: u32) -> bool {
        match self {
            Self::U16(b) => b.holds_rows(rows),
            Self::F16(b) => b.holds_rows(rows),
            Self::F32(b) => b.holds_rows(rows),
        }
    }
}

impl<'a> ImageBufferMut<'a> {
    /// Creates view of raw bytes with samples of given type.
    pub fn from_bytes(
        pixel_type: PixelType,
        data: &'a mut [u8],
        width: u32,
        stride_bytes: usize,
        mask: u32,
    ) -> Result<Self, ResizeError> {
        Ok(match pixel_type {
            PixelType::U16 => {
                LineBufferMut::<u16>::from_bytes(data, width, stride_bytes, mask)?.into()
            }
            PixelType::F16 => {
                LineBufferMut::<f16>::from_bytes(data, width, stride_bytes, mask)?.into()
            }
            PixelType::F32 => {
                LineBufferMut::<f32>::from_bytes(data, width, stride_bytes, mask)?.into()
            }
            PixelType::U8 => return Err(ResizeError::UnsupportedPixelType(pixel_type)),
        })
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::U16(_) => PixelType::U16,
            Self::F16(_) => PixelType::F16,
            Self::F32(_) => PixelType::F32,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::U16(b) => b.width(),
            Self::F16(b) => b.width(),
            Self::F32(b) => b.width(),
        }
    }

    /// Index of the first row that the view can address.
    pub fn first_row(&self) -> u32 {
        match self {
            Self::U16(b) => b.first_row(),
            Self::F16(b) => b.first_row(),
            Self::F32(b) => b.first_row(),
        }
    }

    pub fn holds_rows(&self, end: u32) -> bool {
        match self {
            Self::U16(b) => b.holds_rows(end),
            Self::F16(b) => b.holds_rows(end),
            Self::F32(b) => b.holds_rows(end),
        }
    }

    /// Splits unbounded view into disjoint bands of rows.
    /// Look at [LineBufferMut::split_rows].
    pub fn split_rows(self, height: u32, rows_per_band: u32) -> Result<Vec<Self>, ImageBufferError> {
        Ok(match self {
            Self::U16(b) => b
                .split_rows(height, rows_per_band)?
                .into_iter()
                .map(Self::U16)
                .collect(),
            Self::F16(b) => b
                .split_rows(height, rows_per_band)?
                .into_iter()
                .map(Self::F16)
                .collect(),
            Self::F32(b) => b
                .split_rows(height, rows_per_band)?
                .into_iter()
                .map(Self::F32)
                .collect(),
        })
    }
}
