//! Variable-width byte-string vectors.
//!
//! Values live back to back in one data buffer. `len + 1` `i32` offsets,
//! starting at `0`, delimit them: row `i` is `data[offsets[i]..offsets[i + 1]]`.
//! Vectors wrapped from `Utf8` arrays remember it and export as `Utf8` again.

use std::marker::PhantomData;

use arrow_array::{make_array, Array, ArrayRef};
use arrow_data::ArrayData;
use arrow_schema::DataType;
use tracing::debug;
use vector_kernels::{compare, gather, hash, CmpOp};
use vector_memory::{check_index, Bitmap, Result, Storage, VectorError};

use crate::boolean::BoolVector;
use crate::builder::BytesVectorBuilder;
use crate::layout::{validity_ptr, VariableWidthBuffer};
use crate::types::{TypeTag, Value};
use crate::vector::{
    cast_foreign, check_validity_len, export_nulls, import_offsets, import_validity, validate_offsets,
    Vector,
};
use crate::VectorConfig;

#[derive(Clone, Debug)]
pub struct BytesVector {
    data: Storage<u8>,
    offsets: Storage<i32>,
    validity: Option<Bitmap>,
    utf8: bool,
}

impl BytesVector {
    /// Assemble from raw parts. Offsets must start at `0`, never decrease and
    /// end at `data.len()`.
    pub fn try_new(data: Vec<u8>, offsets: Vec<i32>, validity: Option<Bitmap>) -> Result<Self> {
        validate_offsets(&offsets, data.len())?;
        check_validity_len(validity.as_ref(), offsets.len() - 1)?;
        Ok(Self {
            data: Storage::from_vec(data),
            offsets: Storage::from_vec(offsets),
            validity,
            utf8: false,
        })
    }

    pub(crate) fn from_parts(
        data: Storage<u8>,
        offsets: Storage<i32>,
        validity: Option<Bitmap>,
        utf8: bool,
    ) -> Self {
        Self {
            data,
            offsets,
            validity,
            utf8,
        }
    }

    pub fn from_values<I, B>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<B>>,
        B: AsRef<[u8]>,
    {
        let items: Vec<Option<B>> = items.into_iter().collect();
        let bytes = items
            .iter()
            .flatten()
            .map(|b| b.as_ref().len())
            .sum();
        let mut builder = BytesVectorBuilder::with_counts(items.len(), bytes)?;
        for item in &items {
            match item {
                Some(b) => builder.append(b.as_ref())?,
                None => builder.append_null()?,
            }
        }
        builder.build()
    }

    pub fn from_strs<'a, I: IntoIterator<Item = Option<&'a str>>>(items: I) -> Result<Self> {
        let mut vector = Self::from_values(items)?;
        vector.utf8 = true;
        Ok(vector)
    }

    /// Whether every value is known to be valid UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    /// Mark as UTF-8 after checking every slot, null slots included, since
    /// Arrow validates the whole values buffer on export.
    pub fn into_utf8(mut self) -> Result<Self> {
        for i in 0..self.len() {
            if std::str::from_utf8(self.value_unchecked(i)).is_err() {
                return Err(VectorError::type_mismatch("valid UTF-8", format!("row {}", i)));
            }
        }
        self.utf8 = true;
        Ok(self)
    }

    /// Bytes of row `i`, null or not. Panics if `i >= len()`.
    pub fn value_unchecked(&self, i: usize) -> &[u8] {
        let offsets = self.offsets.as_slice();
        &self.data.as_slice()[offsets[i] as usize..offsets[i + 1] as usize]
    }

    pub fn value(&self, i: usize) -> Result<Option<&[u8]>> {
        check_index(i, self.len())?;
        Ok((!self.is_null(i)).then(|| self.value_unchecked(i)))
    }

    /// `0` for a null row.
    pub fn byte_length(&self, i: usize) -> Result<usize> {
        check_index(i, self.len())?;
        if self.is_null(i) {
            return Ok(0);
        }
        let offsets = self.offsets.as_slice();
        Ok((offsets[i + 1] - offsets[i]) as usize)
    }

    /// Byte length of every row; `0` for nulls, whatever their slot holds.
    pub fn lengths(&self) -> Vec<usize> {
        self.offsets
            .as_slice()
            .windows(2)
            .enumerate()
            .map(|(i, w)| if self.is_null(i) { 0 } else { (w[1] - w[0]) as usize })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&[u8]>> + '_ {
        (0..self.len()).map(move |i| (!self.is_null(i)).then(|| self.value_unchecked(i)))
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn offsets(&self) -> &[i32] {
        self.offsets.as_slice()
    }

    pub fn is_foreign(&self) -> bool {
        self.data.is_foreign()
    }

    pub fn buffer(&self) -> VariableWidthBuffer<'_> {
        VariableWidthBuffer {
            data: self.data.as_ptr(),
            data_len: self.data.len(),
            offsets: self.offsets.as_ptr(),
            len: self.len(),
            validity: validity_ptr(self.validity.as_ref()),
            validity_bit_offset: 0,
            _borrow: PhantomData,
        }
    }

    // ------------------------------------------------------------------
    // Comparisons
    //
    // Null rows never match. Equality tests the byte length before the bytes;
    // ordering is lexicographic on unsigned bytes.
    // ------------------------------------------------------------------

    pub fn compare_scalar(&self, scalar: &[u8], op: CmpOp) -> Result<BoolVector> {
        compare::pack_bits(self.len(), |i| {
            !self.is_null(i) && compare_bytes(self.value_unchecked(i), scalar, op)
        })
        .map(BoolVector::from_mask)
    }

    pub fn compare_vector(&self, other: &BytesVector, op: CmpOp) -> Result<BoolVector> {
        compare::check_lengths(self.len(), other.len())?;
        compare::pack_bits(self.len(), |i| {
            !self.is_null(i)
                && !other.is_null(i)
                && compare_bytes(self.value_unchecked(i), other.value_unchecked(i), op)
        })
        .map(BoolVector::from_mask)
    }

    pub fn equals(&self, scalar: &[u8]) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Eq)
    }

    pub fn not_equals(&self, scalar: &[u8]) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Ne)
    }

    pub fn equals_vector(&self, other: &BytesVector) -> Result<BoolVector> {
        self.compare_vector(other, CmpOp::Eq)
    }

    pub fn not_equals_vector(&self, other: &BytesVector) -> Result<BoolVector> {
        self.compare_vector(other, CmpOp::Ne)
    }

    fn wrap(data: &ArrayData, config: &VectorConfig, utf8: bool) -> Result<Self> {
        let values = data
            .buffers()
            .get(1)
            .ok_or_else(|| VectorError::invalid_array("missing data buffer"))?;
        let (offsets, start, end) = import_offsets(data, config, values.len())?;
        let mut bytes = Storage::wrap(values, start, end - start)?;
        if !config.zero_copy {
            bytes = bytes.detach()?;
        }
        let validity = import_validity(data, config)?;
        debug!(
            "wrapped {} byte strings ({} data bytes from {}, offsets foreign {})",
            data.len(),
            end - start,
            start,
            offsets.is_foreign()
        );
        Ok(Self::from_parts(bytes, offsets, validity, utf8))
    }
}

fn compare_bytes(left: &[u8], right: &[u8], op: CmpOp) -> bool {
    match op {
        CmpOp::Eq => left.len() == right.len() && left == right,
        CmpOp::Ne => left.len() != right.len() || left != right,
        _ => op.apply(left, right),
    }
}

impl Vector for BytesVector {
    fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Bytes
    }

    fn data_type(&self) -> DataType {
        if self.utf8 {
            DataType::Utf8
        } else {
            DataType::Binary
        }
    }

    fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    fn value_at(&self, i: usize) -> Option<Value> {
        (!self.is_null(i)).then(|| Value::Bytes(self.value_unchecked(i).to_vec()))
    }

    fn take(&self, indices: &[usize]) -> Result<Self> {
        gather::check_indices(indices, self.len())?;
        let bytes = indices
            .iter()
            .filter(|&&i| !self.is_null(i))
            .map(|&i| self.value_unchecked(i).len())
            .sum();
        let mut builder = BytesVectorBuilder::with_counts(indices.len(), bytes)?;
        for &i in indices {
            if self.is_null(i) {
                builder.append_null()?;
            } else {
                builder.append(self.value_unchecked(i))?;
            }
        }
        let mut taken = builder.build()?;
        taken.utf8 = self.utf8;
        Ok(taken)
    }

    fn to_arrow(&self) -> Result<ArrayRef> {
        let data = ArrayData::builder(self.data_type())
            .len(self.len())
            .add_buffer(self.offsets.to_arrow_buffer())
            .add_buffer(self.data.to_arrow_buffer())
            .nulls(export_nulls(self.validity.as_ref()))
            .build()?;
        Ok(make_array(data))
    }

    fn from_arrow_with(array: &dyn Array, config: &VectorConfig) -> Result<Self> {
        match array.data_type() {
            DataType::Binary => Self::wrap(&array.to_data(), config, false),
            DataType::Utf8 => Self::wrap(&array.to_data(), config, true),
            DataType::LargeBinary if config.allow_casts => {
                let cast = cast_foreign(array, &DataType::Binary)?;
                Self::wrap(&cast.to_data(), config, false)
            }
            DataType::LargeUtf8 if config.allow_casts => {
                let cast = cast_foreign(array, &DataType::Utf8)?;
                Self::wrap(&cast.to_data(), config, true)
            }
            other => Err(VectorError::type_mismatch("Binary or Utf8", other)),
        }
    }

    fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()> {
        hash::hash_rows(out, offset, self.len(), self.validity.as_ref(), |i| {
            hash::hash_bytes(self.value_unchecked(i))
        })
    }
}
