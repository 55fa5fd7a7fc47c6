//! Conversion between Arrow `RecordBatch` and [`ColumnBatch`].

use anyhow::{Context, Result};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::Field;
use tracing::{debug, info};
use vector_core::{AnyVector, Vector, VectorConfig};

use crate::column_batch::ColumnBatch;

// ---------------------------------------------------------------------------
// Arrow → vectors
// ---------------------------------------------------------------------------

/// Wrap every column of `batch`. The batch schema is kept as is, so types
/// widened on wrap are narrowed again by [`columns_to_record_batch`].
pub fn record_batch_to_columns(batch: &RecordBatch, config: &VectorConfig) -> Result<ColumnBatch> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, col) in schema.fields().iter().zip(batch.columns()) {
        let vector = column_to_vector(field, col.as_ref(), config)
            .with_context(|| format!("Converting column '{}'", field.name()))?;
        columns.push(vector);
    }

    info!(
        "Converted RecordBatch: {} rows x {} columns",
        batch.num_rows(),
        batch.num_columns()
    );
    ColumnBatch::try_new(schema, columns)
}

fn column_to_vector(field: &Field, array: &dyn Array, config: &VectorConfig) -> Result<AnyVector> {
    let vector = AnyVector::from_arrow_with(array, config)?;
    debug!(
        "column '{}': {} -> {} ({} rows, {} nulls)",
        field.name(),
        array.data_type(),
        vector.type_tag(),
        vector.len(),
        vector.null_count()
    );
    Ok(vector)
}

// ---------------------------------------------------------------------------
// Vectors → Arrow
// ---------------------------------------------------------------------------

/// Rebuild a `RecordBatch` against the batch's own schema. Column buffers are
/// shared, not copied, unless a column has to be cast back to its field type.
pub fn columns_to_record_batch(batch: &ColumnBatch) -> Result<RecordBatch> {
    let schema = batch.schema().clone();
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

    for (field, vector) in schema.fields().iter().zip(batch.columns()) {
        let array = vector_to_array(field, vector)
            .with_context(|| format!("Exporting column '{}'", field.name()))?;
        arrays.push(array);
    }

    RecordBatch::try_new(schema, arrays).context("Building RecordBatch from vectors")
}

fn vector_to_array(field: &Field, vector: &AnyVector) -> Result<ArrayRef> {
    let array = vector.to_arrow()?;
    if array.data_type() == field.data_type() {
        return Ok(array);
    }
    debug!(
        "column '{}': casting {} back to {}",
        field.name(),
        array.data_type(),
        field.data_type()
    );
    Ok(arrow_cast::cast::cast(array.as_ref(), field.data_type())?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
