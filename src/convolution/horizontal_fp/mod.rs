use std::marker::PhantomData;
use std::ops::Range;

use crate::convolution::{CoefficientTable, FloatConvolution};
use crate::{CpuExtensions, LineBuffer, LineBufferMut, ResizeError, ScratchBuffer};

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;
mod native;

/// Horizontal kernel for float samples, chosen once per coefficient table.
#[derive(Debug, Clone, Copy)]
pub(crate) enum HorizontalFp<P> {
    Native(PhantomData<P>),
    #[cfg(target_arch = "x86_64")]
    Avx2(avx2::ResizeLine8<P>),
}

impl<P: FloatConvolution> HorizontalFp<P> {
    pub fn new(table: &CoefficientTable, cpu_extensions: CpuExtensions) -> Self {
        match cpu_extensions {
            #[cfg(target_arch = "x86_64")]
            CpuExtensions::Avx2 => Self::Avx2(avx2::select_kernel(table.filter_width())),
            _ => Self::Native(PhantomData),
        }
    }

    pub fn simultaneous_lines(&self) -> u32 {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2(_) => avx2::LINES,
            Self::Native(_) => 1,
        }
    }

    pub fn tmp_size(&self, col_range: Range<u32>) -> Result<usize, ResizeError> {
        match self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2(_) => avx2::tmp_size::<P>(&col_range),
            Self::Native(_) => Ok(0),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &self,
        table: &CoefficientTable,
        tmp: &mut ScratchBuffer,
        src: &LineBuffer<P>,
        dst: &mut LineBufferMut<P>,
        height: u32,
        col_range: Range<u32>,
        i: u32,
        left: u32,
        right: u32,
    ) {
        match *self {
            #[cfg(target_arch = "x86_64")]
            Self::Avx2(kernel) => unsafe {
                // SAFETY: the kernel is selected only if CPU supports AVX2 and F16C.
                avx2::process(
                    kernel, table, tmp, src, dst, height, col_range, i, left, right,
                )
            },
            Self::Native(_) => native::resize_line_h(
                table,
                src.row(i),
                dst.row_mut(i),
                left as usize,
                right as usize,
            ),
        }
    }
}
