#![doc = include_str!("../README.md")]
//!
//! ## Feature flags
#![doc = document_features::document_features!()]

pub use convolution::{Axis, CoefficientTable, FixedPointCodec, ResizeFilterBuilder, FRACTION_BITS};
pub use cpu_extensions::CpuExtensions;
pub use errors::*;
pub use filter::{FilterFlags, ImageAttributes, ImageFilter, BUFFER_MAX};
pub use line_buffer::{
    select_buffer_mask, ImageBuffer, ImageBufferMut, LineBuffer, LineBufferMut, LineStore,
    UNBOUNDED_MASK,
};
#[cfg(feature = "rayon")]
pub use plane::par_process_plane;
pub use plane::process_plane;
pub use pixels::PixelType;
pub use scratch::ScratchBuffer;

mod utils;

mod convolution;
mod cpu_extensions;
mod errors;
mod filter;
mod line_buffer;
pub mod pixels;
mod plane;
mod scratch;
#[cfg(target_arch = "x86_64")]
mod simd_utils;
#[cfg(feature = "for_testing")]
pub mod testing;
