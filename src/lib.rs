//! Columnar vector layer.
//!
//! | crate            | role                                                  |
//! |------------------|-------------------------------------------------------|
//! | `vector-memory`  | buffer ownership, validity bitmaps, errors            |
//! | `vector-kernels` | hashing, gather, comparisons and reductions on slices |
//! | `vector-core`    | typed vectors and Arrow wrap / export                 |
//! | `arrow-interop`  | `RecordBatch` ↔ column batches, multi-column row keys |

pub use arrow_interop::{ColumnBatch, SchemaExt};
pub use vector_core::*;
pub use vector_kernels::hash::{mix_hash, HASH_BATCH_ROWS, MIX_HASH_CONSTANT, NULL_HASH};

pub mod memory {
    pub use vector_memory::*;
}

pub mod kernels {
    pub use vector_kernels::*;
}

pub mod interop {
    pub use arrow_interop::*;
}
