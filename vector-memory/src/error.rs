//! Error taxonomy shared by every crate of the vector layer.

use arrow_schema::ArrowError;
use thiserror::Error;

/// Errors raised by vector construction, access and kernels.
///
/// Nothing in the vector layer is retried: every variant is either a
/// programming error, a structural problem with foreign input, or resource
/// exhaustion.
#[derive(Error, Debug)]
pub enum VectorError {
    /// Row index outside `[0, len)`.
    #[error("index {index} out of bounds for vector of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Unsupported or unexpected logical type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Allocation failure. Fatal, never retried.
    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// Builder append or set out of the required monotonic order.
    #[error("out of sequence: expected row {expected}, got row {got}")]
    OutOfSequence { expected: usize, got: usize },

    /// `min` / `max` over an empty or all-null vector.
    #[error("cannot reduce an empty or all-null vector")]
    EmptyReduction,

    /// Vector-vector operation on operands of different length.
    #[error("operands must have the same length: {left} != {right}")]
    LengthMismatch { left: usize, right: usize },

    /// `hash_into` output window too short.
    #[error("output buffer too small: need {needed} slots, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// Builder finished before every declared row was appended.
    #[error("builder incomplete: {appended} of {declared} rows appended")]
    Incomplete { appended: usize, declared: usize },

    /// Strict builder byte budget violated.
    #[error("byte budget violated: declared {declared} bytes, got {actual}")]
    ByteBudget { declared: usize, actual: usize },

    /// A previous builder call failed; the builder can no longer be used.
    #[error("builder is in a failed state")]
    BuilderFailed,

    /// Checked integer reduction overflowed.
    #[error("integer overflow during reduction")]
    Overflow,

    /// Foreign array whose buffers do not match its declared shape.
    #[error("invalid foreign array: {reason}")]
    InvalidArray { reason: String },

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

impl VectorError {
    pub fn type_mismatch(expected: impl Into<String>, found: impl std::fmt::Debug) -> Self {
        VectorError::TypeMismatch {
            expected: expected.into(),
            found: format!("{:?}", found),
        }
    }

    pub fn invalid_array(reason: impl Into<String>) -> Self {
        VectorError::InvalidArray {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VectorError>;

/// Bounds check used by every checked accessor.
#[inline]
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(VectorError::IndexOutOfBounds { index, len })
    }
}
