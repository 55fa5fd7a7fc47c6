//! Kernels over plain slices and bitmaps.
//!
//! - [`hash`]      – row-hash mixing for join / group-by keys
//! - [`gather`]    – take by index
//! - [`compare`]   – scalar and element-wise comparisons into packed masks
//! - [`aggregate`] – null-skipping min / max / sum

pub mod aggregate;
pub mod compare;
pub mod gather;
pub mod hash;

pub use compare::CmpOp;
pub use hash::{mix_hash, HASH_BATCH_ROWS, LIST_SEED, MIX_HASH_CONSTANT, NULL_HASH};
