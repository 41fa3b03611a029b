use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::utils::try_alloc_vec;
use crate::ResizeError;

const BLOCK_SIZE: usize = 32;

#[derive(Debug, Clone, Copy)]
#[repr(C, align(32))]
struct AlignedBlock([u8; BLOCK_SIZE]);

impl Default for AlignedBlock {
    fn default() -> Self {
        Self([0; BLOCK_SIZE])
    }
}

// SAFETY: the struct has the same size as its only field, so it has no padding.
unsafe impl Zeroable for AlignedBlock {}
unsafe impl Pod for AlignedBlock {}

/// Temporary memory exclusively owned by one `process` call of a stage.
///
/// Memory is aligned to 32 bytes, so it can be viewed as a slice
/// of any pixel or accumulator type.
#[derive(Debug, Clone, Default)]
pub struct ScratchBuffer {
    blocks: Vec<AlignedBlock>,
}

impl ScratchBuffer {
    /// Allocates zeroed buffer of at least `size` bytes.
    pub fn new(size: usize) -> Result<Self, ResizeError> {
        let blocks = try_alloc_vec(size.div_ceil(BLOCK_SIZE))?;
        Ok(Self { blocks })
    }

    /// Size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.blocks.len() * BLOCK_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.blocks)
    }

    /// Returns first `len` elements of the buffer viewed as `T`.
    ///
    /// Panics if the buffer is too small.
    pub(crate) fn typed_mut<T: Pod>(&mut self, len: usize) -> &mut [T] {
        let bytes = len * size_of::<T>();
        assert!(bytes <= self.len(), "scratch buffer is too small");
        bytemuck::cast_slice_mut(&mut self.as_bytes_mut()[..bytes])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_views_are_aligned() {
        let mut buffer = ScratchBuffer::new(100).unwrap();
        assert_eq!(buffer.len(), 128);
        let floats: &mut [f32] = buffer.typed_mut(25);
        assert_eq!(floats.as_ptr() as usize % 32, 0);
        assert!(floats.iter().all(|&v| v == 0.));
        assert!(ScratchBuffer::new(0).unwrap().is_empty());
    }
}
