//! Typed columnar vectors.
//!
//! Every vector is an immutable view over [`vector_memory::Storage`] buffers
//! plus an optional validity [`Bitmap`](vector_memory::Bitmap). Vectors are
//! built natively, by [`BytesVectorBuilder`], or by wrapping an Arrow array
//! without copying its buffers. The same buffers are handed back to Arrow by
//! [`Vector::to_arrow`].

pub mod any;
pub mod boolean;
pub mod builder;
pub mod bytes;
pub mod fixed;
pub mod interval;
pub mod layout;
pub mod nested;
pub mod types;
pub mod vector;

pub use any::AnyVector;
pub use boolean::BoolVector;
pub use builder::BytesVectorBuilder;
pub use bytes::BytesVector;
pub use fixed::{
    Date32Vector, FixedWidthKind, FixedWidthVector, Float64Vector, Int64Vector, Time32Vector,
    Time64Vector, TimestampVector,
};
pub use interval::IntervalVector;
pub use layout::{FixedWidthBuffer, NestedBuffer, VariableWidthBuffer};
pub use nested::NestedVector;
pub use types::{IntervalValue, TypeTag, Value};
pub use vector::Vector;

pub use vector_kernels::CmpOp;
pub use vector_memory::{Bitmap, Result, VectorError};

/// Options applied when wrapping foreign arrays.
#[derive(Debug, Clone)]
pub struct VectorConfig {
    /// Convert near-miss Arrow types (narrower integers, `Float32`, other
    /// timestamp units, large offsets) to the native vector type instead of
    /// rejecting them.
    pub allow_casts: bool,
    /// Alias foreign buffers. When off, every wrapped buffer is copied into
    /// engine-owned memory.
    pub zero_copy: bool,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            allow_casts: true,
            zero_copy: true,
        }
    }
}
