//! A named set of equal-length vectors.

use anyhow::{anyhow, bail, Context, Result};
use arrow_array::RecordBatch;
use arrow_schema::{Field, Schema, SchemaRef};
use std::sync::Arc;
use tracing::debug;
use vector_core::{AnyVector, Vector, VectorConfig};

use crate::record_batch_convert::{columns_to_record_batch, record_batch_to_columns};
use crate::schema_utils::SchemaExt;

#[derive(Debug, Clone)]
pub struct ColumnBatch {
    schema: SchemaRef,
    columns: Vec<AnyVector>,
    num_rows: usize,
}

impl ColumnBatch {
    /// Assemble from a schema and one vector per field.
    pub fn try_new(schema: SchemaRef, columns: Vec<AnyVector>) -> Result<Self> {
        if schema.fields().len() != columns.len() {
            bail!(
                "Schema has {} fields but {} columns were given",
                schema.fields().len(),
                columns.len()
            );
        }
        let num_rows = columns.first().map_or(0, |c| c.len());
        for (field, column) in schema.fields().iter().zip(&columns) {
            if column.len() != num_rows {
                bail!(
                    "Column '{}' has {} rows, expected {}",
                    field.name(),
                    column.len(),
                    num_rows
                );
            }
        }
        Ok(Self {
            schema,
            columns,
            num_rows,
        })
    }

    /// Assemble from `(name, vector)` pairs; field types follow the vectors.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, AnyVector)>) -> Result<Self> {
        let mut fields = Vec::with_capacity(columns.len());
        let mut vectors = Vec::with_capacity(columns.len());
        for (name, vector) in columns {
            fields.push(Field::new(name, vector.data_type(), true));
            vectors.push(vector);
        }
        Self::try_new(Arc::new(Schema::new(fields)), vectors)
    }

    pub fn from_record_batch(batch: &RecordBatch, config: &VectorConfig) -> Result<Self> {
        record_batch_to_columns(batch, config)
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        columns_to_record_batch(self)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[AnyVector] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&AnyVector> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&AnyVector> {
        let index = self.schema.index_of(name).ok()?;
        self.columns.get(index)
    }

    /// Gather the same rows from every column.
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let columns = self
            .schema
            .fields()
            .iter()
            .zip(&self.columns)
            .map(|(field, column)| {
                column
                    .take(indices)
                    .with_context(|| format!("Gathering column '{}'", field.name()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema: self.schema.clone(),
            columns,
            num_rows: indices.len(),
        })
    }

    /// One key per row over every column, in schema order.
    pub fn hash(&self) -> Result<Vec<u64>> {
        let mut out = vec![0u64; self.num_rows];
        for (field, column) in self.schema.fields().iter().zip(&self.columns) {
            column
                .hash_into(&mut out, 0)
                .with_context(|| format!("Hashing column '{}'", field.name()))?;
        }
        Ok(out)
    }

    /// The named columns, in the order given. Column buffers are shared.
    pub fn project(&self, names: &[&str]) -> Result<Self> {
        let schema = Arc::new(self.schema.project_by_name(names)?);
        let columns = names
            .iter()
            .map(|name| {
                self.column_by_name(name)
                    .cloned()
                    .ok_or_else(|| anyhow!("Column '{}' not found", name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema,
            columns,
            num_rows: self.num_rows,
        })
    }

    /// One key per row over the named columns, in the order given.
    pub fn hash_columns(&self, names: &[&str]) -> Result<Vec<u64>> {
        let keys = self.project(names)?;
        debug!("hashing {} rows over {} key columns", self.num_rows, names.len());
        keys.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_core::{BytesVector, Int64Vector};

    fn batch() -> ColumnBatch {
        ColumnBatch::from_columns(vec![
            ("id", Int64Vector::from_values(vec![1, 2, 1]).into()),
            (
                "name",
                BytesVector::from_strs([Some("a"), Some("b"), Some("a")])
                    .unwrap()
                    .into(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_equal_rows_share_keys() {
        let keys = batch().hash().unwrap();
        assert_eq!(keys[0], keys[2]);
        assert_ne!(keys[0], keys[1]);
    }

    #[test]
    fn test_column_order_changes_keys() {
        let b = batch();
        let forward = b.hash_columns(&["id", "name"]).unwrap();
        let backward = b.hash_columns(&["name", "id"]).unwrap();
        assert_ne!(forward[0], backward[0]);
        assert_eq!(forward, b.hash().unwrap());
        assert!(b.hash_columns(&["missing"]).is_err());
    }

    #[test]
    fn test_project_keeps_order_and_rows() {
        let b = batch();
        let projected = b.project(&["name", "id"]).unwrap();
        assert_eq!(projected.num_columns(), 2);
        assert_eq!(projected.num_rows(), 3);
        assert_eq!(projected.schema().field(0).name(), "name");
        assert!(projected.column(1).unwrap().as_int64().is_some());
        assert_eq!(projected.hash().unwrap(), b.hash_columns(&["name", "id"]).unwrap());
        assert!(b.project(&["id", "missing"]).is_err());
    }

    #[test]
    fn test_take_gathers_every_column() {
        let taken = batch().take(&[1, 1]).unwrap();
        assert_eq!(taken.num_rows(), 2);
        let names = taken.column_by_name("name").unwrap().as_bytes().unwrap();
        assert_eq!(names.value(0).unwrap(), Some(&b"b"[..]));
        assert!(batch().take(&[3]).is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = ColumnBatch::from_columns(vec![
            ("a", Int64Vector::from_values(vec![1]).into()),
            ("b", Int64Vector::from_values(vec![1, 2]).into()),
        ]);
        assert!(result.is_err());
    }
}
