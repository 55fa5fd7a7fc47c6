//! List vectors: per-row ranges into a child vector.

use std::ops::Range;
use std::sync::Arc;

use arrow_array::{make_array, Array, ArrayRef, ListArray};
use arrow_buffer::{OffsetBuffer, ScalarBuffer};
use arrow_schema::{DataType, Field, FieldRef};
use tracing::debug;
use vector_kernels::{gather, hash, mix_hash, LIST_SEED};
use vector_memory::alloc::{try_with_capacity, try_zeroed};
use vector_memory::{check_index, Bitmap, Result, Storage, VectorError};

use crate::layout::{validity_ptr, NestedBuffer};
use crate::types::{TypeTag, Value};
use crate::vector::{
    cast_foreign, check_validity_len, export_nulls, import_offsets, import_validity,
    offsets_from_lengths, validate_offsets, Vector,
};
use crate::VectorConfig;

/// Row `i` is `child[offsets[i]..offsets[i + 1]]`.
///
/// The child is shared, never copied, between a vector and the clones and
/// descriptors made from it. `child_field` records the Arrow field the child
/// was observed with, so a child widened on wrap is cast back on export.
#[derive(Clone, Debug)]
pub struct NestedVector<C> {
    offsets: Storage<i32>,
    child: Arc<C>,
    validity: Option<Bitmap>,
    child_field: FieldRef,
}

impl<C: Vector> NestedVector<C> {
    pub fn try_new(offsets: Vec<i32>, child: C, validity: Option<Bitmap>) -> Result<Self> {
        validate_offsets(&offsets, child.len())?;
        check_validity_len(validity.as_ref(), offsets.len() - 1)?;
        let child_field = Arc::new(Field::new("item", child.data_type(), true));
        Ok(Self {
            offsets: Storage::from_vec(offsets),
            child: Arc::new(child),
            validity,
            child_field,
        })
    }

    /// Build from per-row lengths over a child laid out row after row.
    pub fn from_lengths(lengths: &[usize], child: C, validity: Option<Bitmap>) -> Result<Self> {
        let offsets = offsets_from_lengths(lengths.iter().copied(), lengths.len())?;
        Self::try_new(offsets, child, validity)
    }

    pub fn child(&self) -> &C {
        &self.child
    }

    pub fn child_field(&self) -> &FieldRef {
        &self.child_field
    }

    pub fn offsets(&self) -> &[i32] {
        self.offsets.as_slice()
    }

    /// Child positions of row `i`. Panics if `i >= len()`.
    pub fn row_range(&self, i: usize) -> Range<usize> {
        let offsets = self.offsets.as_slice();
        offsets[i] as usize..offsets[i + 1] as usize
    }

    pub fn row_len(&self, i: usize) -> Result<usize> {
        check_index(i, self.len())?;
        Ok(self.row_range(i).len())
    }

    /// Elements of row `i` as a new child vector.
    pub fn row(&self, i: usize) -> Result<Option<C>> {
        check_index(i, self.len())?;
        if self.is_null(i) {
            return Ok(None);
        }
        let indices: Vec<usize> = self.row_range(i).collect();
        self.child.take(&indices).map(Some)
    }

    pub fn buffer(&self) -> NestedBuffer<'_, C> {
        NestedBuffer {
            offsets: self.offsets.as_ptr(),
            len: self.len(),
            validity: validity_ptr(self.validity.as_ref()),
            validity_bit_offset: 0,
            child: &self.child,
            child_type: self.child.type_tag(),
        }
    }
}

impl<C: Vector> Vector for NestedVector<C> {
    fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::List
    }

    fn data_type(&self) -> DataType {
        DataType::List(self.child_field.clone())
    }

    fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    fn value_at(&self, i: usize) -> Option<Value> {
        if self.is_null(i) {
            return None;
        }
        Some(Value::List(
            self.row_range(i).map(|j| self.child.value_at(j)).collect(),
        ))
    }

    fn take(&self, indices: &[usize]) -> Result<Self> {
        gather::check_indices(indices, self.len())?;
        let offsets = offsets_from_lengths(
            indices.iter().map(|&i| self.row_range(i).len()),
            indices.len(),
        )?;
        let total = offsets[offsets.len() - 1] as usize;
        let mut flat: Vec<usize> = try_with_capacity(total)?;
        for &i in indices {
            flat.extend(self.row_range(i));
        }
        let child = self.child.take(&flat)?;
        let validity = gather::take_validity(self.validity.as_ref(), indices)?;
        Ok(Self {
            offsets: Storage::from_vec(offsets),
            child: Arc::new(child),
            validity,
            child_field: self.child_field.clone(),
        })
    }

    fn to_arrow(&self) -> Result<ArrayRef> {
        let mut values = self.child.to_arrow()?;
        if values.data_type() != self.child_field.data_type() {
            debug!(
                "casting list child {} back to {}",
                values.data_type(),
                self.child_field.data_type()
            );
            values = arrow_cast::cast::cast(values.as_ref(), self.child_field.data_type())?;
        }
        let offsets = OffsetBuffer::new(ScalarBuffer::new(
            self.offsets.to_arrow_buffer(),
            0,
            self.offsets.len(),
        ));
        let array = ListArray::try_new(
            self.child_field.clone(),
            offsets,
            values,
            export_nulls(self.validity.as_ref()),
        )?;
        Ok(Arc::new(array))
    }

    fn from_arrow_with(array: &dyn Array, config: &VectorConfig) -> Result<Self> {
        let child_field = match array.data_type() {
            DataType::List(field) => field.clone(),
            DataType::LargeList(field) if config.allow_casts => {
                let cast = cast_foreign(array, &DataType::List(field.clone()))?;
                return Self::from_arrow_with(cast.as_ref(), config);
            }
            other => return Err(VectorError::type_mismatch("List", other)),
        };

        let data = array.to_data();
        let child_data = data
            .child_data()
            .first()
            .ok_or_else(|| VectorError::invalid_array("list without child array"))?;
        let (offsets, start, end) = import_offsets(&data, config, child_data.len())?;

        let mut values = make_array(child_data.clone());
        if start != 0 || end != values.len() {
            values = values.slice(start, end - start);
        }
        let child = C::from_arrow_with(values.as_ref(), config)?;
        let validity = import_validity(&data, config)?;
        debug!(
            "wrapped {} lists over {} child rows of {}",
            data.len(),
            child.len(),
            child_field.data_type()
        );
        Ok(Self {
            offsets,
            child: Arc::new(child),
            validity,
            child_field,
        })
    }

    /// A row's digest folds its length and the digests of its elements,
    /// starting from [`LIST_SEED`]. An empty list therefore differs from a
    /// null row.
    fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()> {
        hash::output_window(out, offset, self.len())?;
        let mut digests: Vec<u64> = try_zeroed(self.child.len())?;
        self.child.hash_into(&mut digests, 0)?;
        hash::hash_rows(out, offset, self.len(), self.validity.as_ref(), |i| {
            let range = self.row_range(i);
            let seed = mix_hash(LIST_SEED, range.len() as u64);
            digests[range].iter().fold(seed, |h, d| mix_hash(h, *d))
        })
    }
}
