//! Owned vs. foreign buffer storage.
//!
//! A vector's data, offsets and validity buffers are each held in a
//! [`Storage`], which is either:
//!
//! * [`Storage::Owned`]: allocated by the engine. Shared between clones through
//!   an `Arc` and freed exactly once, when the last clone drops.
//! * [`Storage::Foreign`]: a window into an Arrow [`Buffer`] owned by someone
//!   else. The `Buffer` handle is retained only to keep the allocation alive;
//!   the vector never frees it.
//!
//! All raw-pointer arithmetic of the wrap path lives in this module. A
//! [`ForeignSlice`] is only constructed after its byte range has been checked
//! against the owner's length and its start address against the element
//! alignment, which is what makes [`Storage::as_slice`] sound.

use std::fmt;
use std::marker::PhantomData;
use std::panic::RefUnwindSafe;
use std::ptr::NonNull;
use std::sync::Arc;

use arrow_buffer::Buffer;
use tracing::debug;

use crate::alloc::try_with_capacity;
use crate::error::{Result, VectorError};

/// Plain-old-data element types that may be viewed directly in foreign memory.
///
/// # Safety
///
/// Implementors must have no padding, no invalid bit patterns and no drop
/// glue, so that any properly aligned run of `size_of::<Self>()` bytes is a
/// valid value.
pub unsafe trait Element:
    Copy + Default + PartialEq + fmt::Debug + Send + Sync + RefUnwindSafe + 'static
{
}

unsafe impl Element for u8 {}
unsafe impl Element for i32 {}
unsafe impl Element for i64 {}
unsafe impl Element for f64 {}

/// Buffer storage for a run of `T`, owned or aliased.
#[derive(Clone)]
pub enum Storage<T: Element> {
    Owned(Arc<Vec<T>>),
    Foreign(ForeignSlice<T>),
}

/// A typed, bounds- and alignment-checked window into a foreign Arrow buffer.
#[derive(Clone)]
pub struct ForeignSlice<T> {
    /// Keeps the foreign allocation alive; never written, never freed here.
    owner: Buffer,
    byte_offset: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> Storage<T> {
    pub fn from_vec(values: Vec<T>) -> Self {
        Storage::Owned(Arc::new(values))
    }

    /// Alias `len` elements of `owner` starting at element `offset`.
    ///
    /// The element pointer is `owner.as_ptr() + offset * size_of::<T>()`. If
    /// that address is not aligned for `T` the elements are copied into owned
    /// storage instead.
    pub fn wrap(owner: &Buffer, offset: usize, len: usize) -> Result<Self> {
        let size = std::mem::size_of::<T>();
        let byte_offset = offset
            .checked_mul(size)
            .ok_or_else(|| VectorError::invalid_array("buffer offset overflows"))?;
        let byte_len = len
            .checked_mul(size)
            .ok_or_else(|| VectorError::invalid_array("buffer length overflows"))?;
        let end = byte_offset
            .checked_add(byte_len)
            .ok_or_else(|| VectorError::invalid_array("buffer range overflows"))?;
        if end > owner.len() {
            return Err(VectorError::invalid_array(format!(
                "buffer holds {} bytes, array needs {}",
                owner.len(),
                end
            )));
        }

        let address = (owner.as_ptr() as usize).wrapping_add(byte_offset);
        if address % std::mem::align_of::<T>() != 0 {
            debug!(
                "foreign buffer at {:#x} not aligned for {}-byte elements, copying {} elements",
                address,
                std::mem::align_of::<T>(),
                len
            );
            return Self::copy_range(owner, byte_offset, len);
        }

        Ok(Storage::Foreign(ForeignSlice {
            owner: owner.clone(),
            byte_offset,
            len,
            _marker: PhantomData,
        }))
    }

    /// Copy `len` possibly unaligned elements out of `owner` into owned storage.
    fn copy_range(owner: &Buffer, byte_offset: usize, len: usize) -> Result<Self> {
        let size = std::mem::size_of::<T>();
        let bytes = &owner.as_slice()[byte_offset..byte_offset + len * size];
        let mut values = try_with_capacity(len)?;
        for chunk in bytes.chunks_exact(size) {
            // SAFETY: `chunk` holds exactly `size_of::<T>()` initialized bytes
            // and `T: Element` is valid for any bit pattern.
            values.push(unsafe { std::ptr::read_unaligned(chunk.as_ptr().cast::<T>()) });
        }
        Ok(Storage::from_vec(values))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Storage::Owned(values) => values.as_slice(),
            Storage::Foreign(foreign) => {
                // SAFETY: `wrap` verified that `byte_offset + len * size_of::<T>()`
                // lies inside `owner` and that the start address is aligned for
                // `T`. Arrow buffers are immutable and `owner` keeps the
                // allocation alive for as long as this slice is borrowed.
                unsafe {
                    let start = foreign.owner.as_ptr().add(foreign.byte_offset);
                    std::slice::from_raw_parts(start.cast::<T>(), foreign.len)
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Storage::Owned(values) => values.len(),
            Storage::Foreign(foreign) => foreign.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Storage::Owned(_))
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self, Storage::Foreign(_))
    }

    pub fn as_ptr(&self) -> *const T {
        self.as_slice().as_ptr()
    }

    /// Copy into engine-owned storage, releasing any foreign owner.
    pub fn detach(&self) -> Result<Self> {
        if self.is_owned() {
            return Ok(self.clone());
        }
        let mut values = try_with_capacity(self.len())?;
        values.extend_from_slice(self.as_slice());
        Ok(Storage::from_vec(values))
    }

    /// Export as an Arrow buffer without copying.
    ///
    /// Foreign storage re-slices the retained owner; owned storage hands Arrow
    /// a clone of its `Arc` as the allocation owner.
    pub fn to_arrow_buffer(&self) -> Buffer {
        match self {
            Storage::Foreign(foreign) => foreign
                .owner
                .slice_with_length(foreign.byte_offset, foreign.len * std::mem::size_of::<T>()),
            Storage::Owned(values) => {
                let ptr = NonNull::from(values.as_slice()).cast::<u8>();
                let byte_len = std::mem::size_of_val(values.as_slice());
                // SAFETY: `ptr` points to `byte_len` initialized bytes owned by
                // `values`; the Arc clone passed as owner keeps the Vec alive,
                // and nothing mutates it through the Arc.
                unsafe { Buffer::from_custom_allocation(ptr, byte_len, values.clone()) }
            }
        }
    }
}

impl<T: Element> From<Vec<T>> for Storage<T> {
    fn from(values: Vec<T>) -> Self {
        Storage::from_vec(values)
    }
}

impl<T: Element> PartialEq for Storage<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Element> fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_owned() { "Owned" } else { "Foreign" };
        f.debug_struct("Storage")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}
