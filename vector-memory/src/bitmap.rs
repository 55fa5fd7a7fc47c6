//! Bit-packed validity (and boolean value) bitmaps.
//!
//! Layout: one bit per row, LSB-first within each byte, `1` = valid. A
//! [`Bitmap`] always starts at bit 0 of its first byte. Wrapping a foreign
//! bitmap whose first row sits at a non-byte-aligned bit position goes
//! through [`realign_bits`], which is the single allocation on an otherwise
//! zero-copy wrap path.

use arrow_buffer::{BooleanBuffer, Buffer, NullBuffer};
use tracing::debug;

use crate::alloc::{bytes_for_bits, try_reserve, try_with_capacity, try_zeroed};
use crate::error::{Result, VectorError};
use crate::storage::Storage;

#[derive(Clone)]
pub struct Bitmap {
    bits: Storage<u8>,
    len: usize,
}

impl Bitmap {
    /// Build from packed bytes that already start at bit 0.
    pub fn from_bytes(bytes: Vec<u8>, len: usize) -> Result<Self> {
        if bytes.len() < bytes_for_bits(len) {
            return Err(VectorError::invalid_array(format!(
                "{} bitmap bytes cannot hold {} bits",
                bytes.len(),
                len
            )));
        }
        Ok(Self {
            bits: Storage::from_vec(bytes),
            len,
        })
    }

    /// Every bit set.
    pub fn new_set(len: usize) -> Result<Self> {
        let mut bytes = try_zeroed(bytes_for_bits(len))?;
        bytes.fill(0xFF);
        mask_trailing(&mut bytes, len);
        Self::from_bytes(bytes, len)
    }

    /// Every bit clear.
    pub fn new_unset(len: usize) -> Result<Self> {
        Self::from_bytes(try_zeroed(bytes_for_bits(len))?, len)
    }

    pub fn from_bools<I: IntoIterator<Item = bool>>(bits: I) -> Result<Self> {
        let iter = bits.into_iter();
        let mut builder = BitmapBuilder::with_capacity(iter.size_hint().0)?;
        for bit in iter {
            builder.append(bit)?;
        }
        Ok(builder.finish())
    }

    /// Wrap `len` bits of a foreign buffer starting at absolute bit `bit_offset`.
    ///
    /// Byte-aligned offsets alias the foreign bytes directly. Any other offset
    /// produces a private, zero-based copy.
    pub fn from_foreign(owner: &Buffer, bit_offset: usize, len: usize) -> Result<Self> {
        let needed = bytes_for_bits(bit_offset + len);
        if owner.len() < needed {
            return Err(VectorError::invalid_array(format!(
                "bitmap holds {} bytes, {} bits at offset {} need {}",
                owner.len(),
                len,
                bit_offset,
                needed
            )));
        }

        if bit_offset % 8 == 0 {
            let bits = Storage::wrap(owner, bit_offset / 8, bytes_for_bits(len))?;
            return Ok(Self { bits, len });
        }

        debug!(
            "realigning validity bitmap: {} rows at bit offset {} (shift {})",
            len,
            bit_offset,
            bit_offset % 8
        );
        let bytes = realign_bits(owner.as_slice(), bit_offset, len)?;
        Self::from_bytes(bytes, len)
    }

    pub fn from_boolean_buffer(buffer: &BooleanBuffer) -> Result<Self> {
        Self::from_foreign(buffer.inner(), buffer.offset(), buffer.len())
    }

    pub fn from_null_buffer(nulls: &NullBuffer) -> Result<Self> {
        Self::from_foreign(nulls.buffer(), nulls.offset(), nulls.len())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Always zero: every bitmap produced by this crate starts at bit 0.
    pub fn bit_offset(&self) -> usize {
        0
    }

    pub fn is_foreign(&self) -> bool {
        self.bits.is_foreign()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_slice()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.bits.as_ptr()
    }

    /// Test bit `i`. Panics if `i` is past the backing bytes.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len, "bit {} out of range {}", i, self.len);
        get_bit(self.as_bytes(), i)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        let bytes = self.as_bytes();
        (0..self.len).map(move |i| get_bit(bytes, i))
    }

    /// Number of set bits among the first `len` bits.
    pub fn count_set(&self) -> usize {
        let bytes = &self.as_bytes()[..bytes_for_bits(self.len)];
        let full = self.len / 8;
        let mut count: usize = bytes[..full].iter().map(|b| b.count_ones() as usize).sum();
        let rem = self.len % 8;
        if rem != 0 {
            count += (bytes[full] & ((1u8 << rem) - 1)).count_ones() as usize;
        }
        count
    }

    pub fn count_unset(&self) -> usize {
        self.len - self.count_set()
    }

    pub fn detach(&self) -> Result<Self> {
        Ok(Self {
            bits: self.bits.detach()?,
            len: self.len,
        })
    }

    pub fn to_boolean_buffer(&self) -> BooleanBuffer {
        BooleanBuffer::new(self.bits.to_arrow_buffer(), 0, self.len)
    }

    pub fn to_null_buffer(&self) -> NullBuffer {
        NullBuffer::new(self.to_boolean_buffer())
    }

    /// Bitwise combination with another bitmap of the same length.
    pub fn zip_with(&self, other: &Bitmap, op: impl Fn(u8, u8) -> u8) -> Result<Bitmap> {
        if self.len != other.len {
            return Err(VectorError::LengthMismatch {
                left: self.len,
                right: other.len,
            });
        }
        let n = bytes_for_bits(self.len);
        let mut bytes = try_with_capacity(n)?;
        bytes.extend(
            self.as_bytes()[..n]
                .iter()
                .zip(&other.as_bytes()[..n])
                .map(|(a, b)| op(*a, *b)),
        );
        mask_trailing(&mut bytes, self.len);
        Self::from_bytes(bytes, self.len)
    }

    pub fn not(&self) -> Result<Bitmap> {
        self.zip_with(self, |a, _| !a)
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits: String = self.iter().map(|b| if b { '1' } else { '0' }).collect();
        f.debug_struct("Bitmap")
            .field("len", &self.len)
            .field("bits", &bits)
            .finish()
    }
}

#[inline]
pub fn get_bit(bytes: &[u8], i: usize) -> bool {
    (bytes[i >> 3] >> (i & 7)) & 1 == 1
}

/// Clear the bits past `len` in the last byte.
fn mask_trailing(bytes: &mut [u8], len: usize) {
    let rem = len % 8;
    if rem != 0 {
        if let Some(last) = bytes.get_mut(len / 8) {
            *last &= (1u8 << rem) - 1;
        }
    }
}

/// Copy `len` bits starting at absolute bit `bit_offset` of `src` into a new
/// zero-based buffer of `ceil(len / 8)` bytes.
///
/// With `shift = bit_offset % 8` and `src` re-based at byte `bit_offset / 8`,
/// output byte `i` is `(src[i] >> shift) | (src[i + 1] << (8 - shift))`. The
/// high half reads one byte past the last row's byte; Arrow pads its buffers
/// so that byte is normally present, and a missing one reads as zero.
pub fn realign_bits(src: &[u8], bit_offset: usize, len: usize) -> Result<Vec<u8>> {
    let start = bit_offset / 8;
    let shift = (bit_offset % 8) as u32;
    let n = bytes_for_bits(len);
    if src.len() < bytes_for_bits(bit_offset + len) {
        return Err(VectorError::invalid_array(format!(
            "{} source bytes cannot hold {} bits at offset {}",
            src.len(),
            len,
            bit_offset
        )));
    }

    let mut out = try_with_capacity(n)?;
    if shift == 0 {
        out.extend_from_slice(&src[start..start + n]);
    } else {
        for i in 0..n {
            let lo = src[start + i] >> shift;
            let hi = src.get(start + i + 1).map_or(0, |b| b << (8 - shift));
            out.push(lo | hi);
        }
    }
    mask_trailing(&mut out, len);
    Ok(out)
}

/// Append-only bitmap construction.
#[derive(Debug, Default)]
pub struct BitmapBuilder {
    bytes: Vec<u8>,
    len: usize,
}

impl BitmapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Result<Self> {
        Ok(Self {
            bytes: try_with_capacity(bytes_for_bits(bits))?,
            len: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn append(&mut self, bit: bool) -> Result<()> {
        if self.len % 8 == 0 {
            if self.bytes.len() == self.bytes.capacity() {
                let grow = self.bytes.capacity().max(8);
                try_reserve(&mut self.bytes, grow)?;
            }
            self.bytes.push(0);
        }
        if bit {
            self.bytes[self.len / 8] |= 1 << (self.len % 8);
        }
        self.len += 1;
        Ok(())
    }

    pub fn append_n(&mut self, n: usize, bit: bool) -> Result<()> {
        let additional = bytes_for_bits(self.len + n).saturating_sub(self.bytes.len());
        try_reserve(&mut self.bytes, additional)?;
        for _ in 0..n {
            self.append(bit)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Bitmap {
        Bitmap {
            bits: Storage::from_vec(self.bytes),
            len: self.len,
        }
    }
}
