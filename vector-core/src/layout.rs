//! Raw buffer descriptors for external consumers.
//!
//! A descriptor is a borrowed snapshot of a vector's buffers: base pointers,
//! element width, row count and validity. The pointers stay valid for the
//! descriptor's lifetime `'a`, which is tied to the vector it came from.
//! Validity bitmaps are always re-based, so `validity_bit_offset` is `0`.

use std::marker::PhantomData;

use vector_memory::Bitmap;

use crate::types::TypeTag;

pub(crate) fn validity_ptr(validity: Option<&Bitmap>) -> Option<*const u8> {
    validity.map(Bitmap::as_ptr)
}

/// Contiguous fixed-size elements.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthBuffer<'a> {
    pub data: *const u8,
    pub item_size: usize,
    pub len: usize,
    pub type_tag: TypeTag,
    pub validity: Option<*const u8>,
    pub validity_bit_offset: usize,
    pub(crate) _borrow: PhantomData<&'a ()>,
}

/// Concatenated bytes plus `len + 1` `i32` offsets starting at `0`.
#[derive(Debug, Clone, Copy)]
pub struct VariableWidthBuffer<'a> {
    pub data: *const u8,
    pub data_len: usize,
    pub offsets: *const i32,
    pub len: usize,
    pub validity: Option<*const u8>,
    pub validity_bit_offset: usize,
    pub(crate) _borrow: PhantomData<&'a ()>,
}

/// `len + 1` `i32` offsets into a child vector.
#[derive(Debug, Clone, Copy)]
pub struct NestedBuffer<'a, C> {
    pub offsets: *const i32,
    pub len: usize,
    pub validity: Option<*const u8>,
    pub validity_bit_offset: usize,
    pub child: &'a C,
    pub child_type: TypeTag,
}
