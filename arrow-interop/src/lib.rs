//! Arrow `RecordBatch` ↔ vector column batches.
//!
//! A [`ColumnBatch`] is a schema plus one [`AnyVector`](vector_core::AnyVector)
//! per field, all of the same length. Converting a `RecordBatch` wraps every
//! column without copying its buffers wherever the vector layer allows it.
//!
//! # Row keys
//!
//! [`ColumnBatch::hash`] and [`ColumnBatch::hash_columns`] fold every selected
//! column into one 64-bit key per row, in the order given:
//!
//! ```text
//! key[i] = mix(... mix(mix(0, col0[i]), col1[i]) ..., colN[i])
//! ```
//!
//! Equal rows give equal keys; different rows may collide.

pub mod column_batch;
pub mod record_batch_convert;
pub mod schema_utils;

pub use column_batch::ColumnBatch;
pub use record_batch_convert::{columns_to_record_batch, record_batch_to_columns};
pub use schema_utils::SchemaExt;
