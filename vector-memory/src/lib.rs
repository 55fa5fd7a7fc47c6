//! Memory layer of the vector engine.
//!
//! Owns the rules every vector buffer follows:
//!
//! * **Ownership** ([`Storage`]): a buffer is either engine-owned or a
//!   checked window into a foreign Arrow buffer whose owner is retained for
//!   the wrapper's lifetime.
//! * **Validity** ([`Bitmap`]): LSB-first, `1` = valid, always starting at
//!   bit 0. Foreign bitmaps at non-byte-aligned offsets are realigned on wrap.
//! * **Allocation** ([`alloc`]): fallible, surfacing [`VectorError::OutOfMemory`].

pub mod alloc;
pub mod bitmap;
pub mod error;
pub mod storage;

pub use bitmap::{realign_bits, Bitmap, BitmapBuilder};
pub use error::{check_index, Result, VectorError};
pub use storage::{Element, ForeignSlice, Storage};
