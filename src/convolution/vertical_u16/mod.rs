use crate::convolution::{CoefficientTable, FixedPointCodec};
use crate::{CpuExtensions, LineBuffer, LineBufferMut, ResizeError, ScratchBuffer};

#[cfg(target_arch = "x86_64")]
mod avx2;
mod native;

/// Vertical kernel for 16-bit samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerticalU16 {
    Native,
    #[cfg(target_arch = "x86_64")]
    Avx2,
}

impl VerticalU16 {
    pub fn new(cpu_extensions: CpuExtensions) -> Self {
        match cpu_extensions {
            #[cfg(target_arch = "x86_64")]
            CpuExtensions::Avx2 => Self::Avx2,
            _ => Self::Native,
        }
    }

    pub fn tmp_size(
        &self,
        table: &CoefficientTable,
        left: u32,
        right: u32,
    ) -> Result<usize, ResizeError> {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2 => avx2::tmp_size(table.filter_width(), left, right),
            Self::Native => Ok(0),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &self,
        table: &CoefficientTable,
        codec: FixedPointCodec,
        tmp: &mut ScratchBuffer,
        src: &LineBuffer<u16>,
        dst: &mut LineBufferMut<u16>,
        i: u32,
        left: u32,
        right: u32,
    ) {
        // Check safety conditions
        debug_assert!(right <= dst.width());
        debug_assert!(right <= src.width());

        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2 => unsafe {
                // SAFETY: the kernel is selected only if CPU supports AVX2.
                avx2::process(table, codec, tmp, src, dst, i, left, right)
            },
            Self::Native => native::resize_line_v(
                table,
                codec,
                src,
                dst.row_mut(i),
                i as usize,
                left as usize,
                right as usize,
            ),
        }
    }
}
