//! The contract every vector variant implements.

use arrow_array::{Array, ArrayRef};
use arrow_buffer::NullBuffer;
use arrow_data::ArrayData;
use arrow_schema::DataType;
use tracing::debug;
use vector_memory::alloc::{try_with_capacity, try_zeroed};
use vector_memory::{check_index, Bitmap, Result, Storage, VectorError};

use crate::types::{TypeTag, Value};
use crate::VectorConfig;

/// A typed, immutable column of `len()` rows.
///
/// Row `i` is null iff a validity bitmap is present and its bit `i` is `0`.
/// Operations that build a new vector (`take`, comparisons, builders) always
/// produce engine-owned buffers; wrapping (`from_arrow`) may alias foreign
/// buffers, which then stay alive as long as the vector does.
pub trait Vector: Sized + Clone + std::fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn type_tag(&self) -> TypeTag;

    /// Arrow type produced by [`Vector::to_arrow`].
    fn data_type(&self) -> DataType;

    fn item_size(&self) -> usize {
        self.type_tag().item_size()
    }

    fn validity(&self) -> Option<&Bitmap>;

    /// Panics if `i >= len()`.
    fn is_null(&self, i: usize) -> bool {
        assert!(
            i < self.len(),
            "row {} out of bounds for vector of length {}",
            i,
            self.len()
        );
        self.validity().map_or(false, |v| !v.get(i))
    }

    fn null_count(&self) -> usize {
        self.validity().map_or(0, Bitmap::count_unset)
    }

    /// Materialize row `i`. Panics if `i >= len()`.
    fn value_at(&self, i: usize) -> Option<Value>;

    fn get(&self, i: usize) -> Result<Option<Value>> {
        check_index(i, self.len())?;
        Ok(self.value_at(i))
    }

    fn to_list(&self) -> Vec<Option<Value>> {
        (0..self.len()).map(|i| self.value_at(i)).collect()
    }

    /// New vector with `out[k] = self[indices[k]]`. Every index is checked
    /// before any output buffer is allocated.
    fn take(&self, indices: &[usize]) -> Result<Self>;

    /// Hand the buffers to Arrow without copying them.
    fn to_arrow(&self) -> Result<ArrayRef>;

    fn from_arrow_with(array: &dyn Array, config: &VectorConfig) -> Result<Self>;

    fn from_arrow(array: &dyn Array) -> Result<Self> {
        Self::from_arrow_with(array, &VectorConfig::default())
    }

    /// Fold one digest per row into `out[offset..offset + len()]`.
    fn hash_into(&self, out: &mut [u64], offset: usize) -> Result<()>;

    /// Fresh per-row hashes, mixed from a zero seed.
    fn hash(&self) -> Result<Vec<u64>> {
        let mut out: Vec<u64> = try_zeroed(self.len())?;
        self.hash_into(&mut out, 0)?;
        Ok(out)
    }
}

/// Validity of a foreign array, rebased to bit 0. A bitmap without any null
/// is dropped.
pub(crate) fn import_validity(data: &ArrayData, config: &VectorConfig) -> Result<Option<Bitmap>> {
    match data.nulls() {
        Some(nulls) if nulls.null_count() > 0 => {
            let bitmap = Bitmap::from_null_buffer(nulls)?;
            if config.zero_copy {
                Ok(Some(bitmap))
            } else {
                bitmap.detach().map(Some)
            }
        }
        _ => Ok(None),
    }
}

pub(crate) fn export_nulls(validity: Option<&Bitmap>) -> Option<NullBuffer> {
    validity.map(Bitmap::to_null_buffer)
}

/// Convert a foreign array to the type a vector holds natively.
pub(crate) fn cast_foreign(array: &dyn Array, target: &DataType) -> Result<ArrayRef> {
    debug!(
        "casting foreign {} array of {} rows to {}",
        array.data_type(),
        array.len(),
        target
    );
    Ok(arrow_cast::cast::cast(array, target)?)
}

/// Offsets of a var-width or nested array, rebased to start at `0`.
///
/// Returns the offsets and the `[first, last)` range of the data or child they
/// cover. Offsets that already start at `0` stay aliased.
pub(crate) fn import_offsets(
    data: &ArrayData,
    config: &VectorConfig,
    target_len: usize,
) -> Result<(Storage<i32>, usize, usize)> {
    if data.len() == 0 {
        return Ok((Storage::from_vec(vec![0]), 0, 0));
    }

    let buffer = data
        .buffers()
        .first()
        .ok_or_else(|| VectorError::invalid_array("missing offsets buffer"))?;
    let offsets = Storage::<i32>::wrap(buffer, data.offset(), data.len() + 1)?;
    let slice = offsets.as_slice();
    let first = slice[0];
    let last = slice[data.len()];
    if first < 0 || last < first || last as usize > target_len {
        return Err(VectorError::invalid_array(format!(
            "offsets [{}, {}) outside target of length {}",
            first, last, target_len
        )));
    }

    if first == 0 {
        let offsets = if config.zero_copy { offsets } else { offsets.detach()? };
        return Ok((offsets, 0, last as usize));
    }

    debug!(
        "rebasing {} offsets starting at {} to zero",
        data.len() + 1,
        first
    );
    let mut rebased = try_with_capacity(slice.len())?;
    rebased.extend(slice.iter().map(|o| o - first));
    Ok((Storage::from_vec(rebased), first as usize, last as usize))
}

/// Check `len + 1` owned offsets: start at `0`, never decrease, end at
/// `target_len`.
pub(crate) fn validate_offsets(offsets: &[i32], target_len: usize) -> Result<()> {
    match offsets.first() {
        Some(0) => {}
        _ => return Err(VectorError::invalid_array("offsets must start at 0")),
    }
    if offsets.windows(2).any(|w| w[1] < w[0]) {
        return Err(VectorError::invalid_array("offsets must not decrease"));
    }
    let last = offsets[offsets.len() - 1];
    if last as usize != target_len {
        return Err(VectorError::invalid_array(format!(
            "last offset {} does not match data length {}",
            last, target_len
        )));
    }
    Ok(())
}

/// Prefix-sum row lengths into fresh `i32` offsets.
pub(crate) fn offsets_from_lengths(lengths: impl Iterator<Item = usize>, rows: usize) -> Result<Vec<i32>> {
    let mut offsets = try_with_capacity(rows + 1)?;
    offsets.push(0i32);
    let mut total: i32 = 0;
    for len in lengths {
        let len = i32::try_from(len).map_err(|_| VectorError::Overflow)?;
        total = total.checked_add(len).ok_or(VectorError::Overflow)?;
        offsets.push(total);
    }
    Ok(offsets)
}

/// Check that an owned validity bitmap covers exactly `len` rows.
pub(crate) fn check_validity_len(validity: Option<&Bitmap>, len: usize) -> Result<()> {
    match validity {
        Some(v) if v.len() != len => Err(VectorError::LengthMismatch {
            left: len,
            right: v.len(),
        }),
        _ => Ok(()),
    }
}
