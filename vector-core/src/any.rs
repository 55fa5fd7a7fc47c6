//! A vector of any supported type, chosen at runtime from the Arrow type.

use arrow_array::{Array, ArrayRef};
use arrow_schema::DataType;
use vector_kernels::CmpOp;
use vector_memory::{Bitmap, Result, VectorError};

use crate::boolean::BoolVector;
use crate::bytes::BytesVector;
use crate::fixed::{
    Date32Vector, Float64Vector, Int64Vector, Time32Vector, Time64Vector, TimestampVector,
};
use crate::interval::IntervalVector;
use crate::nested::NestedVector;
use crate::types::{TypeTag, Value};
use crate::vector::Vector;
use crate::VectorConfig;

#[derive(Clone, Debug)]
pub enum AnyVector {
    Int64(Int64Vector),
    Float64(Float64Vector),
    Boolean(BoolVector),
    Date32(Date32Vector),
    Time32(Time32Vector),
    Time64(Time64Vector),
    Timestamp(TimestampVector),
    Interval(IntervalVector),
    Bytes(BytesVector),
    List(NestedVector<AnyVector>),
}

macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            AnyVector::Int64($v) => $body,
            AnyVector::Float64($v) => $body,
            AnyVector::Boolean($v) => $body,
            AnyVector::Date32($v) => $body,
            AnyVector::Time32($v) => $body,
            AnyVector::Time64($v) => $body,
            AnyVector::Timestamp($v) => $body,
            AnyVector::Interval($v) => $body,
            AnyVector::Bytes($v) => $body,
            AnyVector::List($v) => $body,
        }
    };
}

/// Like `dispatch!`, wrapping the result back into the same variant.
macro_rules! dispatch_map {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            AnyVector::Int64($v) => AnyVector::Int64($body),
            AnyVector::Float64($v) => AnyVector::Float64($body),
            AnyVector::Boolean($v) => AnyVector::Boolean($body),
            AnyVector::Date32($v) => AnyVector::Date32($body),
            AnyVector::Time32($v) => AnyVector::Time32($body),
            AnyVector::Time64($v) => AnyVector::Time64($body),
            AnyVector::Timestamp($v) => AnyVector::Timestamp($body),
            AnyVector::Interval($v) => AnyVector::Interval($body),
            AnyVector::Bytes($v) => AnyVector::Bytes($body),
            AnyVector::List($v) => AnyVector::List($body),
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for AnyVector {
                fn from(v: $ty) -> Self {
                    AnyVector::$variant(v)
                }
            }
        )*
    };
}

impl_from!(
    Int64(Int64Vector),
    Float64(Float64Vector),
    Boolean(BoolVector),
    Date32(Date32Vector),
    Time32(Time32Vector),
    Time64(Time64Vector),
    Timestamp(TimestampVector),
    Interval(IntervalVector),
    Bytes(BytesVector),
    List(NestedVector<AnyVector>),
);

impl AnyVector {
    /// Compare every row against a scalar of the same logical type.
    pub fn compare_scalar(&self, scalar: &Value, op: CmpOp) -> Result<BoolVector> {
        match (self, scalar) {
            (AnyVector::Int64(v), Value::Int64(s)) => v.compare_scalar(*s, op),
            (AnyVector::Float64(v), Value::Float64(s)) => v.compare_scalar(*s, op),
            (AnyVector::Boolean(v), Value::Boolean(s)) => v.compare_scalar(*s, op),
            (AnyVector::Date32(v), Value::Date32(s)) => v.compare_scalar(*s, op),
            (AnyVector::Time32(v), Value::Time32(s)) => v.compare_scalar(*s, op),
            (AnyVector::Time64(v), Value::Time64(s)) => v.compare_scalar(*s, op),
            (AnyVector::Timestamp(v), Value::Timestamp(s)) => v.compare_scalar(*s, op),
            (AnyVector::Interval(v), Value::Interval(s)) => v.compare_scalar(*s, op),
            (AnyVector::Bytes(v), Value::Bytes(s)) => v.compare_scalar(s, op),
            (vector, scalar) => Err(VectorError::type_mismatch(
                format!("a comparable {} scalar", vector.type_tag()),
                scalar.type_tag(),
            )),
        }
    }

    /// Element-wise comparison of two vectors of the same variant.
    pub fn compare(&self, other: &AnyVector, op: CmpOp) -> Result<BoolVector> {
        match (self, other) {
            (AnyVector::Int64(a), AnyVector::Int64(b)) => a.compare_vector(b, op),
            (AnyVector::Float64(a), AnyVector::Float64(b)) => a.compare_vector(b, op),
            (AnyVector::Boolean(a), AnyVector::Boolean(b)) => a.compare_vector(b, op),
            (AnyVector::Date32(a), AnyVector::Date32(b)) => a.compare_vector(b, op),
            (AnyVector::Time32(a), AnyVector::Time32(b)) => a.compare_vector(b, op),
            (AnyVector::Time64(a), AnyVector::Time64(b)) => a.compare_vector(b, op),
            (AnyVector::Timestamp(a), AnyVector::Timestamp(b)) => a.compare_vector(b, op),
            (AnyVector::Interval(a), AnyVector::Interval(b)) => a.compare_vector(b, op),
            (AnyVector::Bytes(a), AnyVector::Bytes(b)) => a.compare_vector(b, op),
            (a, b) => Err(VectorError::type_mismatch(
                format!("a comparable {} vector", a.type_tag()),
                b.type_tag(),
            )),
        }
    }

    pub fn as_int64(&self) -> Option<&Int64Vector> {
        match self {
            AnyVector::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&BytesVector> {
        match self {
            AnyVector::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&NestedVector<AnyVector>> {
        match self {
            AnyVector::List(v) => Some(v),
            _ => None,
        }
    }
}

impl Vector for AnyVector {
    fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    fn type_tag(&self) -> TypeTag {
        dispatch!(self, v => v.type_tag())
    }

    fn data_type(&self) -> DataType {
        dispatch!(self, v => v.data_type())
    }

    fn validity(&self) -> Option<&Bitmap> {
        dispatch!(self, v => v.validity())
    }

    fn value_at(&self, i: usize) -> Option<Value> {
        dispatch!(self, v => v.value_at(i))
    }

    fn take(&self, indices: &[usize]) -> Result<Self> {
        Ok(dispatch_map!(self, v => v.take(indices)?))
    }

    fn to_arrow(&self) -> Result<ArrayRef> {
        dispatch!(self, v => v.to_arrow())
    }

    fn from_arrow_with(array: &dyn Array, config: &VectorConfig) -> Result<Self> {
        Ok(match TypeTag::from_arrow(array.data_type(), config)? {
            TypeTag::Int64 => Int64Vector::from_arrow_with(array, config)?.into(),
            TypeTag::Float64 => Float64Vector::from_arrow_with(array, config)?.into(),
            TypeTag::Boolean => BoolVector::from_arrow_with(array, config)?.into(),
            TypeTag::Date32 => Date32Vector::from_arrow_with(array, config)?.into(),
            TypeTag::Time32 => Time32Vector::from_arrow_with(array, config)?.into(),
            TypeTag::Time64 => Time64Vector::from_arrow_with(array, config)?.into(),
            TypeTag::Timestamp => TimestampVector::from_arrow_with(array, config)?.into(),
            TypeTag::Interval => IntervalVector::from_arrow_with(array, config)?.into(),
            TypeTag::Bytes => BytesVector::from_arrow_with(array, config)?.into(),
            TypeTag::List => NestedVector::<AnyVector>::from_arrow_with(array, config)?.into(),
        })
    }

    fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()> {
        dispatch!(self, v => v.hash_into(out, offset))
    }
}
