//! Fixed-width vectors.
//!
//! One container, [`FixedWidthVector`], is shared by every logical type whose
//! elements are a single primitive. A zero-sized kind marker supplies the
//! native element type, the Arrow types it accepts and the per-row digest.

use std::fmt;
use std::marker::PhantomData;

use arrow_array::{make_array, Array, ArrayRef};
use arrow_data::ArrayData;
use arrow_schema::{DataType, TimeUnit};
use tracing::debug;
use vector_kernels::{aggregate, compare, gather, hash, CmpOp};
use vector_memory::alloc::try_with_capacity;
use vector_memory::{check_index, Bitmap, BitmapBuilder, Element, Result, Storage, VectorError};

use crate::boolean::BoolVector;
use crate::layout::{validity_ptr, FixedWidthBuffer};
use crate::types::{TypeTag, Value};
use crate::vector::{cast_foreign, check_validity_len, export_nulls, import_validity, Vector};
use crate::VectorConfig;

/// Logical type of a [`FixedWidthVector`].
pub trait FixedWidthKind: Clone + Copy + fmt::Debug + Send + Sync + 'static {
    type Native: Element + PartialOrd;

    const TAG: TypeTag;

    /// Arrow type used for natively built vectors.
    fn default_data_type() -> DataType;

    /// Whether arrays of `dt` can be aliased without conversion.
    fn is_native(dt: &DataType) -> bool;

    /// Type a foreign array of `dt` is cast to before wrapping, if any.
    fn cast_target(_dt: &DataType) -> Option<DataType> {
        None
    }

    fn digest(v: Self::Native) -> u64;

    fn to_value(v: Self::Native) -> Value;
}

#[derive(Debug, Clone, Copy)]
pub struct Int64Kind;

impl FixedWidthKind for Int64Kind {
    type Native = i64;
    const TAG: TypeTag = TypeTag::Int64;

    fn default_data_type() -> DataType {
        DataType::Int64
    }

    fn is_native(dt: &DataType) -> bool {
        matches!(dt, DataType::Int64)
    }

    fn cast_target(dt: &DataType) -> Option<DataType> {
        match dt {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32 => Some(DataType::Int64),
            _ => None,
        }
    }

    fn digest(v: i64) -> u64 {
        hash::digest_i64(v)
    }

    fn to_value(v: i64) -> Value {
        Value::Int64(v)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Float64Kind;

impl FixedWidthKind for Float64Kind {
    type Native = f64;
    const TAG: TypeTag = TypeTag::Float64;

    fn default_data_type() -> DataType {
        DataType::Float64
    }

    fn is_native(dt: &DataType) -> bool {
        matches!(dt, DataType::Float64)
    }

    fn cast_target(dt: &DataType) -> Option<DataType> {
        matches!(dt, DataType::Float32).then_some(DataType::Float64)
    }

    fn digest(v: f64) -> u64 {
        hash::digest_f64(v)
    }

    fn to_value(v: f64) -> Value {
        Value::Float64(v)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Date32Kind;

impl FixedWidthKind for Date32Kind {
    type Native = i32;
    const TAG: TypeTag = TypeTag::Date32;

    fn default_data_type() -> DataType {
        DataType::Date32
    }

    fn is_native(dt: &DataType) -> bool {
        matches!(dt, DataType::Date32)
    }

    fn digest(v: i32) -> u64 {
        hash::digest_i32(v)
    }

    fn to_value(v: i32) -> Value {
        Value::Date32(v)
    }
}

/// Time of day in the unit recorded by the vector's Arrow type.
#[derive(Debug, Clone, Copy)]
pub struct Time32Kind;

impl FixedWidthKind for Time32Kind {
    type Native = i32;
    const TAG: TypeTag = TypeTag::Time32;

    fn default_data_type() -> DataType {
        DataType::Time32(TimeUnit::Second)
    }

    fn is_native(dt: &DataType) -> bool {
        matches!(dt, DataType::Time32(_))
    }

    fn digest(v: i32) -> u64 {
        hash::digest_i32(v)
    }

    fn to_value(v: i32) -> Value {
        Value::Time32(v)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Time64Kind;

impl FixedWidthKind for Time64Kind {
    type Native = i64;
    const TAG: TypeTag = TypeTag::Time64;

    fn default_data_type() -> DataType {
        DataType::Time64(TimeUnit::Microsecond)
    }

    fn is_native(dt: &DataType) -> bool {
        matches!(dt, DataType::Time64(_))
    }

    fn digest(v: i64) -> u64 {
        hash::digest_i64(v)
    }

    fn to_value(v: i64) -> Value {
        Value::Time64(v)
    }
}

/// Microseconds since the epoch. Other units are converted on wrap; the
/// timezone is kept.
#[derive(Debug, Clone, Copy)]
pub struct TimestampKind;

impl FixedWidthKind for TimestampKind {
    type Native = i64;
    const TAG: TypeTag = TypeTag::Timestamp;

    fn default_data_type() -> DataType {
        DataType::Timestamp(TimeUnit::Microsecond, None)
    }

    fn is_native(dt: &DataType) -> bool {
        matches!(dt, DataType::Timestamp(TimeUnit::Microsecond, _))
    }

    fn cast_target(dt: &DataType) -> Option<DataType> {
        match dt {
            DataType::Timestamp(_, tz) => Some(DataType::Timestamp(TimeUnit::Microsecond, tz.clone())),
            _ => None,
        }
    }

    fn digest(v: i64) -> u64 {
        hash::digest_i64(v)
    }

    fn to_value(v: i64) -> Value {
        Value::Timestamp(v)
    }
}

pub type Int64Vector = FixedWidthVector<Int64Kind>;
pub type Float64Vector = FixedWidthVector<Float64Kind>;
pub type Date32Vector = FixedWidthVector<Date32Kind>;
pub type Time32Vector = FixedWidthVector<Time32Kind>;
pub type Time64Vector = FixedWidthVector<Time64Kind>;
pub type TimestampVector = FixedWidthVector<TimestampKind>;

/// Contiguous fixed-size values plus optional validity.
#[derive(Clone, Debug)]
pub struct FixedWidthVector<K: FixedWidthKind> {
    values: Storage<K::Native>,
    validity: Option<Bitmap>,
    data_type: DataType,
    _kind: PhantomData<K>,
}

impl<K: FixedWidthKind> FixedWidthVector<K> {
    pub fn from_values(values: Vec<K::Native>) -> Self {
        Self {
            values: Storage::from_vec(values),
            validity: None,
            data_type: K::default_data_type(),
            _kind: PhantomData,
        }
    }

    pub fn try_new(values: Vec<K::Native>, validity: Option<Bitmap>) -> Result<Self> {
        check_validity_len(validity.as_ref(), values.len())?;
        Ok(Self {
            validity,
            ..Self::from_values(values)
        })
    }

    /// Null slots hold the default value of the native type.
    pub fn from_options<I: IntoIterator<Item = Option<K::Native>>>(items: I) -> Result<Self> {
        let items = items.into_iter();
        let mut values = try_with_capacity(items.size_hint().0)?;
        let mut validity = BitmapBuilder::with_capacity(items.size_hint().0)?;
        let mut nulls = 0;
        for item in items {
            validity.append(item.is_some())?;
            nulls += item.is_none() as usize;
            values.push(item.unwrap_or_default());
        }
        let validity = (nulls > 0).then(|| validity.finish());
        Self::try_new(values, validity)
    }

    /// Relabel with another Arrow type of the same kind, e.g. a different
    /// time unit or timezone.
    pub fn with_data_type(mut self, data_type: DataType) -> Result<Self> {
        if !K::is_native(&data_type) {
            return Err(VectorError::type_mismatch(K::TAG.name(), &data_type));
        }
        self.data_type = data_type;
        Ok(self)
    }

    pub fn values(&self) -> &[K::Native] {
        self.values.as_slice()
    }

    pub fn value(&self, i: usize) -> Result<Option<K::Native>> {
        check_index(i, self.len())?;
        Ok((!self.is_null(i)).then(|| self.values()[i]))
    }

    /// Whether the values alias a foreign Arrow buffer.
    pub fn is_foreign(&self) -> bool {
        self.values.is_foreign()
    }

    pub fn buffer(&self) -> FixedWidthBuffer<'_> {
        FixedWidthBuffer {
            data: self.values.as_ptr().cast::<u8>(),
            item_size: K::TAG.item_size(),
            len: self.len(),
            type_tag: K::TAG,
            validity: validity_ptr(self.validity.as_ref()),
            validity_bit_offset: 0,
            _borrow: PhantomData,
        }
    }

    // ------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------

    /// Compare every stored value against `scalar`. Nulls compare as their
    /// stored slot; the result has no validity.
    pub fn compare_scalar(&self, scalar: K::Native, op: CmpOp) -> Result<BoolVector> {
        compare::compare_scalar(self.values(), scalar, op).map(BoolVector::from_mask)
    }

    pub fn compare_vector(&self, other: &Self, op: CmpOp) -> Result<BoolVector> {
        compare::compare_slices(self.values(), other.values(), op).map(BoolVector::from_mask)
    }

    pub fn equals(&self, scalar: K::Native) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Eq)
    }

    pub fn not_equals(&self, scalar: K::Native) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Ne)
    }

    pub fn less_than(&self, scalar: K::Native) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Lt)
    }

    pub fn less_than_or_equals(&self, scalar: K::Native) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Le)
    }

    pub fn greater_than(&self, scalar: K::Native) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Gt)
    }

    pub fn greater_than_or_equals(&self, scalar: K::Native) -> Result<BoolVector> {
        self.compare_scalar(scalar, CmpOp::Ge)
    }

    // ------------------------------------------------------------------
    // Reductions
    // ------------------------------------------------------------------

    pub fn min(&self) -> Result<K::Native> {
        aggregate::min(self.values(), self.validity.as_ref())
    }

    pub fn max(&self) -> Result<K::Native> {
        aggregate::max(self.values(), self.validity.as_ref())
    }

    fn wrap(data: &ArrayData, config: &VectorConfig) -> Result<Self> {
        let buffer = data
            .buffers()
            .first()
            .ok_or_else(|| VectorError::invalid_array("missing values buffer"))?;
        let mut values = Storage::wrap(buffer, data.offset(), data.len())?;
        if !config.zero_copy {
            values = values.detach()?;
        }
        let validity = import_validity(data, config)?;
        debug!(
            "wrapped {} rows of {} (offset {}, foreign {}, nulls {})",
            data.len(),
            data.data_type(),
            data.offset(),
            values.is_foreign(),
            validity.as_ref().map_or(0, Bitmap::count_unset)
        );
        Ok(Self {
            values,
            validity,
            data_type: data.data_type().clone(),
            _kind: PhantomData,
        })
    }
}

impl FixedWidthVector<Int64Kind> {
    /// Checked sum of valid values; `0` for an empty or all-null vector.
    pub fn sum(&self) -> Result<i64> {
        aggregate::sum_i64(self.values(), self.validity.as_ref())
    }
}

impl FixedWidthVector<Float64Kind> {
    pub fn sum(&self) -> f64 {
        aggregate::sum_f64(self.values(), self.validity.as_ref())
    }
}

impl<K: FixedWidthKind> Vector for FixedWidthVector<K> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn type_tag(&self) -> TypeTag {
        K::TAG
    }

    fn data_type(&self) -> DataType {
        self.data_type.clone()
    }

    fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    fn value_at(&self, i: usize) -> Option<Value> {
        (!self.is_null(i)).then(|| K::to_value(self.values()[i]))
    }

    fn take(&self, indices: &[usize]) -> Result<Self> {
        let values = gather::take_values(self.values(), indices)?;
        let validity = gather::take_validity(self.validity.as_ref(), indices)?;
        Ok(Self {
            values: Storage::from_vec(values),
            validity,
            data_type: self.data_type.clone(),
            _kind: PhantomData,
        })
    }

    fn to_arrow(&self) -> Result<ArrayRef> {
        let data = ArrayData::builder(self.data_type.clone())
            .len(self.len())
            .add_buffer(self.values.to_arrow_buffer())
            .nulls(export_nulls(self.validity.as_ref()))
            .build()?;
        Ok(make_array(data))
    }

    fn from_arrow_with(array: &dyn Array, config: &VectorConfig) -> Result<Self> {
        let dt = array.data_type();
        if K::is_native(dt) {
            return Self::wrap(&array.to_data(), config);
        }
        match K::cast_target(dt) {
            Some(target) if config.allow_casts => {
                let cast = cast_foreign(array, &target)?;
                Self::wrap(&cast.to_data(), config)
            }
            _ => Err(VectorError::type_mismatch(K::TAG.name(), dt)),
        }
    }

    fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()> {
        hash::hash_values(out, offset, self.values(), self.validity.as_ref(), K::digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{
        Float32Array, Int32Array, Int64Array, Time32MillisecondArray, TimestampMillisecondArray,
    };

    #[test]
    fn test_wrap_aliases_the_arrow_buffer() {
        let array = Int64Array::from(vec![1, 2, 3, 4]);
        let vector = Int64Vector::from_arrow(&array).unwrap();
        assert!(vector.is_foreign());
        assert_eq!(vector.buffer().data, array.values().as_ptr().cast::<u8>());
        assert_eq!(vector.values(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_sliced_wrap_keeps_logical_rows() {
        let array = Int64Array::from(vec![Some(0), None, Some(2), Some(3), None, Some(5)]);
        let sliced = array.slice(1, 4);
        let vector = Int64Vector::from_arrow(&sliced).unwrap();
        assert_eq!(vector.len(), 4);
        assert!(vector.is_null(0));
        assert!(vector.is_null(3));
        assert_eq!(vector.value(1).unwrap(), Some(2));
        assert_eq!(vector.null_count(), 2);
    }

    #[test]
    fn test_copy_mode_detaches() {
        let array = Int64Array::from(vec![7, 8]);
        let config = VectorConfig {
            zero_copy: false,
            ..VectorConfig::default()
        };
        let vector = Int64Vector::from_arrow_with(&array, &config).unwrap();
        assert!(!vector.is_foreign());
        assert_eq!(vector.values(), &[7, 8]);
    }

    #[test]
    fn test_narrow_types_are_widened() {
        let array = Int32Array::from(vec![Some(-1), None, Some(3)]);
        let vector = Int64Vector::from_arrow(&array).unwrap();
        assert_eq!(vector.to_list(), vec![Some(Value::Int64(-1)), None, Some(Value::Int64(3))]);

        let floats = Float32Array::from(vec![1.5f32]);
        assert_eq!(Float64Vector::from_arrow(&floats).unwrap().values(), &[1.5]);

        let strict = VectorConfig {
            allow_casts: false,
            ..VectorConfig::default()
        };
        assert!(matches!(
            Int64Vector::from_arrow_with(&array, &strict),
            Err(VectorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_timestamps_are_held_in_micros() {
        let array = TimestampMillisecondArray::from(vec![1_000, 2_500]).with_timezone("UTC");
        let vector = TimestampVector::from_arrow(&array).unwrap();
        assert_eq!(vector.values(), &[1_000_000, 2_500_000]);
        assert_eq!(
            vector.data_type(),
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        );
    }

    #[test]
    fn test_time_unit_is_preserved() {
        let array = Time32MillisecondArray::from(vec![3_600_000]);
        let vector = Time32Vector::from_arrow(&array).unwrap();
        let back = vector.to_arrow().unwrap();
        assert_eq!(back.data_type(), &DataType::Time32(TimeUnit::Millisecond));
    }

    #[test]
    fn test_to_arrow_shares_owned_storage() {
        let vector = Int64Vector::from_options([Some(1), None, Some(3)]).unwrap();
        let array = vector.to_arrow().unwrap();
        let ints = array.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ints.values().as_ptr().cast::<u8>(), vector.buffer().data);
        assert!(ints.is_null(1));
        assert_eq!(ints.value(2), 3);
    }

    #[test]
    fn test_take_gathers_values_and_nulls() {
        let vector = Int64Vector::from_options([Some(10), None, Some(30)]).unwrap();
        let taken = vector.take(&[2, 1, 0, 2]).unwrap();
        assert_eq!(
            taken.to_list(),
            vec![Some(Value::Int64(30)), None, Some(Value::Int64(10)), Some(Value::Int64(30))]
        );
        assert!(matches!(
            vector.take(&[0, 3]),
            Err(VectorError::IndexOutOfBounds { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_scalar_and_vector_comparisons() {
        let vector = Int64Vector::from_values(vec![1, 5, 3]);
        let mask = vector.greater_than(2).unwrap();
        assert_eq!(mask.to_bools(), vec![false, true, true]);
        assert_eq!(mask.null_count(), 0);

        let other = Int64Vector::from_values(vec![1, 4, 4]);
        let eq = vector.compare_vector(&other, CmpOp::Eq).unwrap();
        assert_eq!(eq.to_bools(), vec![true, false, false]);

        let short = Int64Vector::from_values(vec![1]);
        assert!(matches!(
            vector.compare_vector(&short, CmpOp::Lt),
            Err(VectorError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_reductions() {
        let vector = Int64Vector::from_options([Some(4), None, Some(-2)]).unwrap();
        assert_eq!(vector.min().unwrap(), -2);
        assert_eq!(vector.max().unwrap(), 4);
        assert_eq!(vector.sum().unwrap(), 2);

        let empty = Float64Vector::from_values(vec![]);
        assert!(matches!(empty.min(), Err(VectorError::EmptyReduction)));
        assert_eq!(empty.sum(), 0.0);
    }

    #[test]
    fn test_date_and_int_hash_alike() {
        let dates = Date32Vector::from_values(vec![-3, 0, 19_000]);
        let ints = Int64Vector::from_values(vec![-3, 0, 19_000]);
        assert_eq!(dates.hash().unwrap(), ints.hash().unwrap());
    }

    #[test]
    fn test_relabel_checks_kind() {
        let times = Time64Vector::from_values(vec![1]);
        assert!(times
            .clone()
            .with_data_type(DataType::Time64(TimeUnit::Nanosecond))
            .is_ok());
        assert!(times.with_data_type(DataType::Int64).is_err());
    }
}
