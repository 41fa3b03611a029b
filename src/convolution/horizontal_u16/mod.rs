use std::ops::Range;

use crate::convolution::{CoefficientTable, FixedPointCodec};
use crate::{CpuExtensions, LineBuffer, LineBufferMut, ResizeError, ScratchBuffer};

#[cfg(target_arch = "x86_64")]
mod avx2;
mod native;

/// Horizontal kernel for 16-bit samples, chosen once per coefficient table.
#[derive(Debug, Clone, Copy)]
pub(crate) enum HorizontalU16 {
    Native,
    #[cfg(target_arch = "x86_64")]
    Avx2(avx2::ResizeLine16),
}

impl HorizontalU16 {
    pub fn new(table: &CoefficientTable, cpu_extensions: CpuExtensions) -> Self {
        match cpu_extensions {
            #[cfg(target_arch = "x86_64")]
            CpuExtensions::Avx2 => Self::Avx2(avx2::select_kernel(table.filter_width())),
            _ => Self::Native,
        }
    }

    pub fn simultaneous_lines(&self) -> u32 {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2(_) => avx2::LINES,
            Self::Native => 1,
        }
    }

    pub fn tmp_size(&self, col_range: Range<u32>) -> Result<usize, ResizeError> {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2(_) => avx2::tmp_size(&col_range),
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
        height: u32,
        col_range: Range<u32>,
        i: u32,
        left: u32,
        right: u32,
    ) {
        match *self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2(kernel) => unsafe {
                // SAFETY: the kernel is selected only if CPU supports AVX2.
                avx2::process(
                    kernel, table, codec, tmp, src, dst, height, col_range, i, left, right,
                )
            },
            Self::Native => native::resize_line_h(
                table,
                codec,
                src.row(i),
                dst.row_mut(i),
                left as usize,
                right as usize,
            ),
        }
    }
}
