//! Fallible allocation for engine-owned buffers.
//!
//! Every owned buffer in the vector layer is allocated through these helpers so
//! that allocation failure surfaces as [`VectorError::OutOfMemory`] instead of
//! aborting the process.

use tracing::trace;

use crate::error::{Result, VectorError};

/// An empty `Vec<T>` with room for exactly `capacity` elements.
pub fn try_with_capacity<T>(capacity: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    try_reserve(&mut v, capacity)?;
    Ok(v)
}

/// A `Vec<T>` of `len` elements, every element `T::default()`.
pub fn try_zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let mut v = try_with_capacity(len)?;
    v.resize(len, T::default());
    Ok(v)
}

/// Reserve room for `additional` more elements or fail with `OutOfMemory`.
pub fn try_reserve<T>(v: &mut Vec<T>, additional: usize) -> Result<()> {
    if additional == 0 {
        return Ok(());
    }
    trace!(
        "reserving {} x {} bytes",
        additional,
        std::mem::size_of::<T>()
    );
    v.try_reserve_exact(additional)
        .map_err(|_| VectorError::OutOfMemory {
            bytes: additional.saturating_mul(std::mem::size_of::<T>()),
        })
}

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub const fn bytes_for_bits(bits: usize) -> usize {
    (bits + 7) / 8
}
