use std::mem::size_of;

use num_traits::PrimInt;

use crate::ResizeError;

/// Rounds `x` down to a multiple of `n`. `n` must be a power of two.
#[inline(always)]
pub(crate) fn floor_n<T: PrimInt>(x: T, n: T) -> T {
    debug_assert!(n.count_ones() == 1);
    x & !(n - T::one())
}

/// Rounds `x` up to a multiple of `n`. `n` must be a power of two.
#[inline(always)]
pub(crate) fn ceil_n<T: PrimInt>(x: T, n: T) -> T {
    floor_n(x + (n - T::one()), n)
}

/// Same as [ceil_n] but returns `None` if the result overflows `T`.
#[inline(always)]
pub(crate) fn checked_ceil_n<T: PrimInt>(x: T, n: T) -> Option<T> {
    x.checked_add(&(n - T::one())).map(|v| floor_n(v, n))
}

/// Allocates vector filled with default values without aborting
/// the process if there is not enough memory.
pub(crate) fn try_alloc_vec<T: Default + Clone>(len: usize) -> Result<Vec<T>, ResizeError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| ResizeError::OutOfMemory(len.saturating_mul(size_of::<T>())))?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
