//! Row-at-a-time construction of [`BytesVector`]s.
//!
//! A builder declares its row count up front and accepts rows strictly in
//! order. Two byte policies exist:
//!
//! * **strict** ([`BytesVectorBuilder::with_counts`]): the exact total byte
//!   count is declared; exceeding it fails, and so does finishing short of it.
//! * **growable** ([`BytesVectorBuilder::with_estimate`]): an estimate per row
//!   sizes the first allocation; the data buffer grows to
//!   `max(2 * capacity, needed)` when full.
//!
//! Nulls come from `append_null`/`set_null`, from a bulk validity mask
//! ([`BytesVectorBuilder::set_validity_mask`]), or both; a row is valid only
//! if neither marks it null.
//!
//! Any failed call leaves the builder unusable. `finish` is terminal and
//! returns the same vector on every later call.

use std::sync::Arc;

use tracing::debug;
use vector_memory::alloc::{bytes_for_bits, try_reserve, try_with_capacity};
use vector_memory::{Bitmap, BitmapBuilder, Result, Storage, VectorError};

use crate::bytes::BytesVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BytePolicy {
    Strict { declared: usize },
    Growable,
}

#[derive(Debug)]
enum State {
    Building,
    Finished(Arc<BytesVector>),
    Failed,
}

#[derive(Debug)]
pub struct BytesVectorBuilder {
    rows: usize,
    appended: usize,
    data: Vec<u8>,
    offsets: Vec<i32>,
    /// Created on the first null.
    validity: Option<BitmapBuilder>,
    /// Bulk mask over all declared rows, LSB-first, `1` = valid.
    mask: Option<Bitmap>,
    policy: BytePolicy,
    byte_capacity: usize,
    state: State,
}

impl BytesVectorBuilder {
    /// Strict builder for exactly `rows` rows holding `bytes` bytes in total.
    pub fn with_counts(rows: usize, bytes: usize) -> Result<Self> {
        Self::allocate(rows, bytes, BytePolicy::Strict { declared: bytes })
    }

    /// Alias of [`BytesVectorBuilder::with_counts`].
    pub fn new(rows: usize, bytes: usize) -> Result<Self> {
        Self::with_counts(rows, bytes)
    }

    /// Growable builder sized for `rows * bytes_per_row` bytes.
    pub fn with_estimate(rows: usize, bytes_per_row: usize) -> Result<Self> {
        Self::allocate(rows, rows.saturating_mul(bytes_per_row), BytePolicy::Growable)
    }

    fn allocate(rows: usize, bytes: usize, policy: BytePolicy) -> Result<Self> {
        let data = try_with_capacity(bytes)?;
        let mut offsets = try_with_capacity(rows.saturating_add(1))?;
        offsets.push(0);
        Ok(Self {
            rows,
            appended: 0,
            data,
            offsets,
            validity: None,
            mask: None,
            policy,
            byte_capacity: bytes,
            state: State::Building,
        })
    }

    /// Declared row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rows appended so far.
    pub fn len(&self) -> usize {
        self.appended
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes_used(&self) -> usize {
        self.data.len()
    }

    /// Current byte capacity. Only changes for growable builders.
    pub fn byte_capacity(&self) -> usize {
        self.byte_capacity
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished(_))
    }

    pub fn append(&mut self, value: &[u8]) -> Result<()> {
        let next = self.len();
        self.set(next, value)
    }

    pub fn append_null(&mut self) -> Result<()> {
        let next = self.len();
        self.set_null(next)
    }

    /// Write row `index`, which must be the next row.
    pub fn set(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.guarded(|b| b.write(index, Some(value)))
    }

    /// Mark row `index`, which must be the next row, as null.
    pub fn set_null(&mut self, index: usize) -> Result<()> {
        self.guarded(|b| b.write(index, None))
    }

    /// Apply a packed validity mask covering all declared rows. Rows already
    /// null stay null; repeated masks are intersected.
    pub fn set_validity_mask(&mut self, mask: &[u8]) -> Result<()> {
        self.guarded(|b| {
            let needed = bytes_for_bits(b.rows);
            if mask.len() < needed {
                return Err(VectorError::invalid_array(format!(
                    "validity mask is too small: {} bytes for {} rows, need {}",
                    mask.len(),
                    b.rows,
                    needed
                )));
            }
            let mut bytes = try_with_capacity(needed)?;
            bytes.extend_from_slice(&mask[..needed]);
            let incoming = Bitmap::from_bytes(bytes, b.rows)?;
            let base = match b.mask.take() {
                Some(previous) => previous,
                None => Bitmap::new_set(b.rows)?,
            };
            b.mask = Some(base.zip_with(&incoming, |x, y| x & y)?);
            Ok(())
        })
    }

    fn guarded(&mut self, op: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        match self.state {
            State::Building => {}
            State::Failed => return Err(VectorError::BuilderFailed),
            State::Finished(_) => {
                return Err(VectorError::OutOfSequence {
                    expected: self.rows,
                    got: self.len(),
                })
            }
        }
        let result = op(self);
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    fn write(&mut self, index: usize, value: Option<&[u8]>) -> Result<()> {
        let next = self.len();
        if index != next || index >= self.rows {
            return Err(VectorError::OutOfSequence {
                expected: next,
                got: index,
            });
        }

        let bytes = value.unwrap_or_default();
        let needed = self.data.len() + bytes.len();
        if needed > self.byte_capacity {
            self.grow(needed)?;
        }
        let end = i32::try_from(needed).map_err(|_| VectorError::Overflow)?;

        match (&mut self.validity, value.is_some()) {
            (Some(validity), valid) => validity.append(valid)?,
            (None, true) => {}
            (None, false) => {
                let mut validity = BitmapBuilder::with_capacity(self.rows)?;
                validity.append_n(next, true)?;
                validity.append(false)?;
                self.validity = Some(validity);
            }
        }
        self.data.extend_from_slice(bytes);
        self.offsets.push(end);
        self.appended += 1;
        Ok(())
    }

    fn grow(&mut self, needed: usize) -> Result<()> {
        match self.policy {
            BytePolicy::Strict { declared } => Err(VectorError::ByteBudget {
                declared,
                actual: needed,
            }),
            BytePolicy::Growable => {
                let target = self.byte_capacity.saturating_mul(2).max(needed);
                debug!("growing byte buffer {} -> {}", self.byte_capacity, target);
                let additional = target - self.data.len();
                try_reserve(&mut self.data, additional)?;
                self.byte_capacity = target;
                Ok(())
            }
        }
    }

    /// Seal the builder. Fails if rows are missing or, for a strict builder,
    /// if fewer bytes than declared were written.
    pub fn finish(&mut self) -> Result<Arc<BytesVector>> {
        match &self.state {
            State::Finished(vector) => return Ok(Arc::clone(vector)),
            State::Failed => return Err(VectorError::BuilderFailed),
            State::Building => {}
        }

        if self.len() != self.rows {
            self.state = State::Failed;
            return Err(VectorError::Incomplete {
                appended: self.len(),
                declared: self.rows,
            });
        }
        if let BytePolicy::Strict { declared } = self.policy {
            if self.data.len() != declared {
                self.state = State::Failed;
                return Err(VectorError::ByteBudget {
                    declared,
                    actual: self.data.len(),
                });
            }
        }

        let validity = match self.merged_validity() {
            Ok(validity) => validity,
            Err(err) => {
                self.state = State::Failed;
                return Err(err);
            }
        };
        let vector = Arc::new(BytesVector::from_parts(
            Storage::from_vec(std::mem::take(&mut self.data)),
            Storage::from_vec(std::mem::take(&mut self.offsets)),
            validity,
            false,
        ));
        self.state = State::Finished(Arc::clone(&vector));
        Ok(vector)
    }

    fn merged_validity(&mut self) -> Result<Option<Bitmap>> {
        let written = self.validity.take().map(BitmapBuilder::finish);
        let validity = match (written, self.mask.take()) {
            (written, None) => written,
            (None, Some(mask)) => Some(mask),
            (Some(written), Some(mask)) => Some(written.zip_with(&mask, |x, y| x & y)?),
        };
        Ok(validity.filter(|v| v.count_unset() > 0))
    }

    /// Finish and take the vector out of the builder.
    pub fn build(mut self) -> Result<BytesVector> {
        let vector = self.finish()?;
        drop(self);
        Ok(Arc::try_unwrap(vector).unwrap_or_else(|shared| (*shared).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector;

    #[test]
    fn test_strict_builder_contract() {
        let mut builder = BytesVectorBuilder::with_counts(3, 10).unwrap();
        builder.append(b"abc").unwrap();
        builder.append_null().unwrap();
        builder.append(b"defghij").unwrap();
        assert!(matches!(
            builder.append(b"x"),
            Err(VectorError::OutOfSequence { expected: 3, got: 3 })
        ));
        assert!(matches!(builder.finish(), Err(VectorError::BuilderFailed)));
    }

    #[test]
    fn test_strict_builder_finishes_and_is_idempotent() {
        let mut builder = BytesVectorBuilder::with_counts(3, 10).unwrap();
        builder.append(b"abc").unwrap();
        builder.append_null().unwrap();
        builder.append(b"defghij").unwrap();
        let first = builder.finish().unwrap();
        let second = builder.finish().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 3);
        assert!(first.is_null(1));
        assert_eq!(first.offsets(), &[0, 3, 3, 10]);
    }

    #[test]
    fn test_strict_byte_budget() {
        let mut builder = BytesVectorBuilder::with_counts(2, 4).unwrap();
        builder.append(b"abc").unwrap();
        assert!(matches!(
            builder.append(b"de"),
            Err(VectorError::ByteBudget { declared: 4, actual: 5 })
        ));
        assert!(matches!(builder.append(b"d"), Err(VectorError::BuilderFailed)));

        let mut short = BytesVectorBuilder::with_counts(1, 4).unwrap();
        short.append(b"abc").unwrap();
        assert!(matches!(short.finish(), Err(VectorError::ByteBudget { .. })));
    }

    #[test]
    fn test_growable_builder_reallocates() {
        let mut builder = BytesVectorBuilder::with_estimate(5, 4).unwrap();
        assert_eq!(builder.byte_capacity(), 20);
        for _ in 0..5 {
            builder.append(&[7u8; 10]).unwrap();
        }
        assert!(builder.byte_capacity() >= 50);
        let vector = builder.finish().unwrap();
        assert_eq!(vector.lengths(), vec![10; 5]);
        assert!(vector.validity().is_none());
    }

    #[test]
    fn test_set_requires_next_row() {
        let mut builder = BytesVectorBuilder::with_counts(3, 0).unwrap();
        builder.set_null(0).unwrap();
        assert!(matches!(
            builder.set(2, b""),
            Err(VectorError::OutOfSequence { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_incomplete_finish_fails() {
        let mut builder = BytesVectorBuilder::with_estimate(2, 1).unwrap();
        builder.append(b"a").unwrap();
        assert!(matches!(
            builder.finish(),
            Err(VectorError::Incomplete { appended: 1, declared: 2 })
        ));
    }

    #[test]
    fn test_validity_mask_marks_rows_null() {
        let mut builder = BytesVectorBuilder::with_counts(2, 4).unwrap();
        builder.append(b"ab").unwrap();
        builder.append(b"cd").unwrap();
        builder.set_validity_mask(&[0b01]).unwrap();
        let vector = builder.build().unwrap();
        assert_eq!(vector.value(0).unwrap(), Some(&b"ab"[..]));
        assert_eq!(vector.value(1).unwrap(), None);
    }

    #[test]
    fn test_validity_mask_keeps_written_nulls() {
        let mut builder = BytesVectorBuilder::with_counts(3, 2).unwrap();
        builder.set_validity_mask(&[0b011]).unwrap();
        builder.append(b"a").unwrap();
        builder.set_null(1).unwrap();
        builder.append(b"c").unwrap();
        let vector = builder.build().unwrap();
        let bits: Vec<bool> = vector.validity().unwrap().iter().collect();
        assert_eq!(bits, vec![true, false, false]);
    }

    #[test]
    fn test_all_valid_mask_leaves_no_bitmap() {
        let mut builder = BytesVectorBuilder::with_counts(2, 2).unwrap();
        builder.append(b"a").unwrap();
        builder.append(b"b").unwrap();
        builder.set_validity_mask(&[0xff]).unwrap();
        assert!(builder.build().unwrap().validity().is_none());
    }

    #[test]
    fn test_short_validity_mask_is_rejected() {
        let mut builder = BytesVectorBuilder::with_counts(10, 10).unwrap();
        for _ in 0..10 {
            builder.append(b"x").unwrap();
        }
        assert!(matches!(
            builder.set_validity_mask(&[0xff]),
            Err(VectorError::InvalidArray { .. })
        ));
        assert!(matches!(builder.finish(), Err(VectorError::BuilderFailed)));
    }

    #[test]
    fn test_validity_only_when_a_null_was_written() {
        let mut builder = BytesVectorBuilder::with_counts(4, 2).unwrap();
        builder.append(b"a").unwrap();
        builder.append(b"b").unwrap();
        builder.append_null().unwrap();
        builder.append(b"").unwrap();
        let vector = builder.build().unwrap();
        let validity = vector.validity().unwrap();
        assert_eq!(validity.iter().collect::<Vec<_>>(), vec![true, true, false, true]);
    }
}
