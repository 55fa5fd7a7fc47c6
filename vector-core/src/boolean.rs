//! Bit-packed boolean vectors. Also the result type of every comparison.

use std::marker::PhantomData;
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, BooleanArray};
use arrow_schema::DataType;
use tracing::debug;
use vector_kernels::{compare, gather, hash, CmpOp};
use vector_memory::{check_index, Bitmap, BitmapBuilder, Result, VectorError};

use crate::layout::{validity_ptr, FixedWidthBuffer};
use crate::types::{TypeTag, Value};
use crate::vector::{check_validity_len, export_nulls, import_validity, Vector};
use crate::VectorConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct BoolVector {
    values: Bitmap,
    validity: Option<Bitmap>,
}

impl BoolVector {
    pub fn try_new(values: Bitmap, validity: Option<Bitmap>) -> Result<Self> {
        check_validity_len(validity.as_ref(), values.len())?;
        Ok(Self { values, validity })
    }

    /// A mask with no nulls.
    pub fn from_mask(values: Bitmap) -> Self {
        Self {
            values,
            validity: None,
        }
    }

    pub fn from_bools<I: IntoIterator<Item = bool>>(values: I) -> Result<Self> {
        Bitmap::from_bools(values).map(Self::from_mask)
    }

    pub fn from_options<I: IntoIterator<Item = Option<bool>>>(items: I) -> Result<Self> {
        let mut values = BitmapBuilder::new();
        let mut validity = BitmapBuilder::new();
        let mut nulls = 0;
        for item in items {
            values.append(item.unwrap_or(false))?;
            validity.append(item.is_some())?;
            nulls += item.is_none() as usize;
        }
        let validity = (nulls > 0).then(|| validity.finish());
        Self::try_new(values.finish(), validity)
    }

    /// The stored bits, nulls included.
    pub fn values(&self) -> &Bitmap {
        &self.values
    }

    pub fn value(&self, i: usize) -> Result<Option<bool>> {
        check_index(i, self.len())?;
        Ok((!self.is_null(i)).then(|| self.values.get(i)))
    }

    /// Stored bits as `bool`s, ignoring validity.
    pub fn to_bools(&self) -> Vec<bool> {
        self.values.iter().collect()
    }

    pub fn is_foreign(&self) -> bool {
        self.values.is_foreign()
    }

    /// Descriptor of the bit-packed values; `item_size` is nominally 1.
    pub fn buffer(&self) -> FixedWidthBuffer<'_> {
        FixedWidthBuffer {
            data: self.values.as_ptr(),
            item_size: TypeTag::Boolean.item_size(),
            len: self.len(),
            type_tag: TypeTag::Boolean,
            validity: validity_ptr(self.validity.as_ref()),
            validity_bit_offset: 0,
            _borrow: PhantomData,
        }
    }

    // ------------------------------------------------------------------
    // Logical operators
    //
    // A row of the result is null when it is null in either operand.
    // ------------------------------------------------------------------

    pub fn and(&self, other: &BoolVector) -> Result<BoolVector> {
        self.combine(other, |a, b| a & b)
    }

    pub fn or(&self, other: &BoolVector) -> Result<BoolVector> {
        self.combine(other, |a, b| a | b)
    }

    pub fn xor(&self, other: &BoolVector) -> Result<BoolVector> {
        self.combine(other, |a, b| a ^ b)
    }

    pub fn not(&self) -> Result<BoolVector> {
        Ok(Self {
            values: self.values.not()?,
            validity: self.validity.clone(),
        })
    }

    fn combine(&self, other: &BoolVector, op: impl Fn(u8, u8) -> u8) -> Result<BoolVector> {
        let values = self.values.zip_with(&other.values, op)?;
        let validity = match (&self.validity, &other.validity) {
            (None, None) => None,
            (Some(v), None) | (None, Some(v)) => Some(v.clone()),
            (Some(a), Some(b)) => Some(a.zip_with(b, |x, y| x & y)?),
        };
        Ok(Self { values, validity })
    }

    /// True if some valid row is true. False for an empty vector.
    pub fn any(&self) -> bool {
        match &self.validity {
            None => self.values.count_set() > 0,
            Some(validity) => self.values.iter().zip(validity.iter()).any(|(v, ok)| v && ok),
        }
    }

    /// True if there are no nulls and every row is true. True for an empty
    /// vector.
    pub fn all(&self) -> bool {
        self.null_count() == 0 && self.values.count_set() == self.len()
    }

    /// Number of valid rows that are true.
    pub fn count_true(&self) -> usize {
        match &self.validity {
            None => self.values.count_set(),
            Some(validity) => self
                .values
                .iter()
                .zip(validity.iter())
                .filter(|&(v, ok)| v && ok)
                .count(),
        }
    }

    // ------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------

    pub fn compare_scalar(&self, scalar: bool, op: CmpOp) -> Result<BoolVector> {
        compare::pack_bits(self.len(), |i| op.apply(&self.values.get(i), &scalar)).map(Self::from_mask)
    }

    pub fn compare_vector(&self, other: &BoolVector, op: CmpOp) -> Result<BoolVector> {
        compare::check_lengths(self.len(), other.len())?;
        compare::pack_bits(self.len(), |i| op.apply(&self.values.get(i), &other.values.get(i)))
            .map(Self::from_mask)
    }

    pub fn equals(&self, scalar: bool) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Eq)
    }

    pub fn not_equals(&self, scalar: bool) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Ne)
    }
}

impl Vector for BoolVector {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Boolean
    }

    fn data_type(&self) -> DataType {
        DataType::Boolean
    }

    fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    fn value_at(&self, i: usize) -> Option<Value> {
        (!self.is_null(i)).then(|| Value::Boolean(self.values.get(i)))
    }

    fn take(&self, indices: &[usize]) -> Result<Self> {
        let values = gather::take_bits(&self.values, indices)?;
        let validity = gather::take_validity(self.validity.as_ref(), indices)?;
        Ok(Self { values, validity })
    }

    fn to_arrow(&self) -> Result<ArrayRef> {
        Ok(Arc::new(BooleanArray::new(
            self.values.to_boolean_buffer(),
            export_nulls(self.validity.as_ref()),
        )))
    }

    fn from_arrow_with(array: &dyn Array, config: &VectorConfig) -> Result<Self> {
        if array.data_type() != &DataType::Boolean {
            return Err(VectorError::type_mismatch("Boolean", array.data_type()));
        }
        let data = array.to_data();
        let buffer = data
            .buffers()
            .first()
            .ok_or_else(|| VectorError::invalid_array("missing values buffer"))?;
        let mut values = Bitmap::from_foreign(buffer, data.offset(), data.len())?;
        if !config.zero_copy {
            values = values.detach()?;
        }
        let validity = import_validity(&data, config)?;
        debug!(
            "wrapped {} booleans (bit offset {}, foreign {})",
            data.len(),
            data.offset(),
            values.is_foreign()
        );
        Ok(Self { values, validity })
    }

    fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()> {
        hash::hash_rows(out, offset, self.len(), self.validity.as_ref(), |i| {
            hash::digest_bool(self.values.get(i))
        })
    }
}
