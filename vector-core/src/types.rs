//! Physical type tags and materialized values.

use arrow_schema::{DataType, IntervalUnit, TimeUnit};
use vector_memory::{Result, VectorError};

use crate::VectorConfig;

/// Physical representation of a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int64,
    Float64,
    /// Bit-packed; nominal item size 1.
    Boolean,
    /// Days since the epoch.
    Date32,
    Time32,
    Time64,
    /// Microseconds since the epoch.
    Timestamp,
    /// `(months: i64, micros: i64)`.
    Interval,
    Bytes,
    List,
}

impl TypeTag {
    /// Bytes per element. Variable-width and nested types report the width of
    /// one offset.
    pub fn item_size(self) -> usize {
        match self {
            TypeTag::Int64 | TypeTag::Float64 | TypeTag::Time64 | TypeTag::Timestamp => 8,
            TypeTag::Date32 | TypeTag::Time32 => 4,
            TypeTag::Boolean => 1,
            TypeTag::Interval => 16,
            TypeTag::Bytes | TypeTag::List => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Int64 => "Int64",
            TypeTag::Float64 => "Float64",
            TypeTag::Boolean => "Boolean",
            TypeTag::Date32 => "Date32",
            TypeTag::Time32 => "Time32",
            TypeTag::Time64 => "Time64",
            TypeTag::Timestamp => "Timestamp",
            TypeTag::Interval => "Interval",
            TypeTag::Bytes => "Bytes",
            TypeTag::List => "List",
        }
    }

    /// Map an Arrow `DataType` to the vector that will hold it.
    ///
    /// Types outside the native set are only accepted when
    /// `config.allow_casts` is set; they are converted on wrap.
    pub fn from_arrow(dt: &DataType, config: &VectorConfig) -> Result<Self> {
        let (tag, native) = match dt {
            DataType::Int64 => (TypeTag::Int64, true),
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32 => (TypeTag::Int64, false),

            DataType::Float64 => (TypeTag::Float64, true),
            DataType::Float32 => (TypeTag::Float64, false),

            DataType::Boolean => (TypeTag::Boolean, true),
            DataType::Date32 => (TypeTag::Date32, true),
            DataType::Time32(_) => (TypeTag::Time32, true),
            DataType::Time64(_) => (TypeTag::Time64, true),
            DataType::Timestamp(TimeUnit::Microsecond, _) => (TypeTag::Timestamp, true),
            DataType::Timestamp(_, _) => (TypeTag::Timestamp, false),

            DataType::Interval(IntervalUnit::MonthDayNano) => (TypeTag::Interval, true),
            DataType::Interval(_) => (TypeTag::Interval, false),

            DataType::Binary | DataType::Utf8 => (TypeTag::Bytes, true),
            DataType::LargeBinary | DataType::LargeUtf8 => (TypeTag::Bytes, false),

            DataType::List(_) => (TypeTag::List, true),
            DataType::LargeList(_) => (TypeTag::List, false),

            other => return Err(VectorError::type_mismatch("a supported vector type", other)),
        };

        if native || config.allow_casts {
            Ok(tag)
        } else {
            Err(VectorError::type_mismatch(tag.name(), dt))
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An interval as held by the engine: whole months plus microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IntervalValue {
    pub months: i64,
    pub micros: i64,
}

impl IntervalValue {
    pub fn new(months: i64, micros: i64) -> Self {
        Self { months, micros }
    }
}

/// One materialized element.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    Date32(i32),
    Time32(i32),
    Time64(i64),
    Timestamp(i64),
    Interval(IntervalValue),
    Bytes(Vec<u8>),
    List(Vec<Option<Value>>),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Int64(_) => TypeTag::Int64,
            Value::Float64(_) => TypeTag::Float64,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Date32(_) => TypeTag::Date32,
            Value::Time32(_) => TypeTag::Time32,
            Value::Time64(_) => TypeTag::Time64,
            Value::Timestamp(_) => TypeTag::Timestamp,
            Value::Interval(_) => TypeTag::Interval,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::List(_) => TypeTag::List,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}
