//! Interval vectors.
//!
//! Each row is a `(months, micros)` pair of `i64`, stored interleaved in one
//! buffer (`[m0, us0, m1, us1, ...]`, 16 bytes per row). Arrow's
//! month-day-nano intervals are converted on the way in and out, so interval
//! vectors never alias foreign value buffers.

use std::marker::PhantomData;
use std::sync::Arc;

use arrow_array::types::IntervalMonthDayNanoType;
use arrow_array::{Array, ArrayRef, IntervalMonthDayNanoArray, PrimitiveArray};
use arrow_buffer::{IntervalMonthDayNano, ScalarBuffer};
use arrow_schema::{DataType, IntervalUnit};
use tracing::debug;
use vector_kernels::{compare, gather, hash, mix_hash, CmpOp};
use vector_memory::alloc::try_with_capacity;
use vector_memory::{check_index, Bitmap, Result, Storage, VectorError};

use crate::boolean::BoolVector;
use crate::layout::{validity_ptr, FixedWidthBuffer};
use crate::types::{IntervalValue, TypeTag, Value};
use crate::vector::{cast_foreign, check_validity_len, export_nulls, import_validity, Vector};
use crate::VectorConfig;

pub const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Collapse days and nanoseconds into microseconds. Sub-microsecond
/// nanoseconds are floored.
pub fn from_month_day_nano(v: IntervalMonthDayNano) -> Result<IntervalValue> {
    let micros = (v.days as i64)
        .checked_mul(MICROS_PER_DAY)
        .and_then(|d| d.checked_add(v.nanoseconds.div_euclid(1_000)))
        .ok_or(VectorError::Overflow)?;
    Ok(IntervalValue::new(v.months as i64, micros))
}

/// Split microseconds into whole days and a non-negative remainder below one
/// day, expressed in nanoseconds.
pub fn to_month_day_nano(v: IntervalValue) -> Result<IntervalMonthDayNano> {
    let months = i32::try_from(v.months).map_err(|_| VectorError::Overflow)?;
    let days = i32::try_from(v.micros.div_euclid(MICROS_PER_DAY)).map_err(|_| VectorError::Overflow)?;
    let nanos = v.micros.rem_euclid(MICROS_PER_DAY) * 1_000;
    Ok(IntervalMonthDayNano::new(months, days, nanos))
}

#[derive(Clone, Debug)]
pub struct IntervalVector {
    pairs: Storage<i64>,
    validity: Option<Bitmap>,
}

impl IntervalVector {
    pub fn try_new(values: &[IntervalValue], validity: Option<Bitmap>) -> Result<Self> {
        check_validity_len(validity.as_ref(), values.len())?;
        let mut pairs = try_with_capacity(values.len() * 2)?;
        for v in values {
            pairs.push(v.months);
            pairs.push(v.micros);
        }
        Ok(Self {
            pairs: Storage::from_vec(pairs),
            validity,
        })
    }

    pub fn from_values(values: &[IntervalValue]) -> Result<Self> {
        Self::try_new(values, None)
    }

    /// Stored pair of row `i`, null or not. Panics if `i >= len()`.
    pub fn value_unchecked(&self, i: usize) -> IntervalValue {
        let pairs = self.pairs.as_slice();
        IntervalValue::new(pairs[2 * i], pairs[2 * i + 1])
    }

    pub fn value(&self, i: usize) -> Result<Option<IntervalValue>> {
        check_index(i, self.len())?;
        Ok((!self.is_null(i)).then(|| self.value_unchecked(i)))
    }

    pub fn buffer(&self) -> FixedWidthBuffer<'_> {
        FixedWidthBuffer {
            data: self.pairs.as_ptr().cast::<u8>(),
            item_size: TypeTag::Interval.item_size(),
            len: self.len(),
            type_tag: TypeTag::Interval,
            validity: validity_ptr(self.validity.as_ref()),
            validity_bit_offset: 0,
            _borrow: PhantomData,
        }
    }

    /// Lexicographic by `(months, micros)`.
    pub fn compare_scalar(&self, scalar: IntervalValue, op: CmpOp) -> Result<BoolVector> {
        compare::pack_bits(self.len(), |i| op.apply(&self.value_unchecked(i), &scalar))
            .map(BoolVector::from_mask)
    }

    pub fn compare_vector(&self, other: &IntervalVector, op: CmpOp) -> Result<BoolVector> {
        compare::check_lengths(self.len(), other.len())?;
        compare::pack_bits(self.len(), |i| {
            op.apply(&self.value_unchecked(i), &other.value_unchecked(i))
        })
        .map(BoolVector::from_mask)
    }

    pub fn equals(&self, scalar: IntervalValue) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Eq)
    }

    fn wrap(array: &IntervalMonthDayNanoArray, config: &VectorConfig) -> Result<Self> {
        let mut pairs = try_with_capacity(array.len() * 2)?;
        for (i, v) in array.values().iter().enumerate() {
            // Null slots hold arbitrary bytes and are stored as zero.
            let v = if array.is_null(i) {
                IntervalValue::default()
            } else {
                from_month_day_nano(*v)?
            };
            pairs.push(v.months);
            pairs.push(v.micros);
        }
        let validity = import_validity(&array.to_data(), config)?;
        debug!("converted {} month-day-nano intervals", array.len());
        Ok(Self {
            pairs: Storage::from_vec(pairs),
            validity,
        })
    }
}

impl Vector for IntervalVector {
    fn len(&self) -> usize {
        self.pairs.len() / 2
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Interval
    }

    fn data_type(&self) -> DataType {
        DataType::Interval(IntervalUnit::MonthDayNano)
    }

    fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    fn value_at(&self, i: usize) -> Option<Value> {
        (!self.is_null(i)).then(|| Value::Interval(self.value_unchecked(i)))
    }

    fn take(&self, indices: &[usize]) -> Result<Self> {
        let pairs = gather::take_strided(self.pairs.as_slice(), 2, indices)?;
        let validity = gather::take_validity(self.validity.as_ref(), indices)?;
        Ok(Self {
            pairs: Storage::from_vec(pairs),
            validity,
        })
    }

    fn to_arrow(&self) -> Result<ArrayRef> {
        let mut values = try_with_capacity(self.len())?;
        for i in 0..self.len() {
            let value = if self.is_null(i) {
                IntervalMonthDayNano::new(0, 0, 0)
            } else {
                to_month_day_nano(self.value_unchecked(i))?
            };
            values.push(value);
        }
        let array = PrimitiveArray::<IntervalMonthDayNanoType>::try_new(
            ScalarBuffer::from(values),
            export_nulls(self.validity.as_ref()),
        )?;
        Ok(Arc::new(array))
    }

    fn from_arrow_with(array: &dyn Array, config: &VectorConfig) -> Result<Self> {
        let target = DataType::Interval(IntervalUnit::MonthDayNano);
        match array.data_type() {
            DataType::Interval(IntervalUnit::MonthDayNano) => {}
            DataType::Interval(_) if config.allow_casts => {
                let cast = cast_foreign(array, &target)?;
                return Self::from_arrow_with(cast.as_ref(), config);
            }
            other => return Err(VectorError::type_mismatch("Interval", other)),
        }
        let intervals = array
            .as_any()
            .downcast_ref::<IntervalMonthDayNanoArray>()
            .ok_or_else(|| VectorError::invalid_array("interval array of unexpected layout"))?;
        Self::wrap(intervals, config)
    }

    fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()> {
        hash::hash_rows(out, offset, self.len(), self.validity.as_ref(), |i| {
            let v = self.value_unchecked(i);
            mix_hash(mix_hash(0, v.months as u64), v.micros as u64)
        })
    }
}
