//! Gather (take) kernels: build a new buffer from rows at given indices.

use tracing::trace;
use vector_memory::alloc::try_with_capacity;
use vector_memory::{Bitmap, BitmapBuilder, Result, VectorError};

/// Fail on the first index outside `[0, len)`.
pub fn check_indices(indices: &[usize], len: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(VectorError::IndexOutOfBounds { index, len }),
        None => Ok(()),
    }
}

/// `out[k] = values[indices[k]]`.
pub fn take_values<T: Copy>(values: &[T], indices: &[usize]) -> Result<Vec<T>> {
    check_indices(indices, values.len())?;
    trace!("take_values: {} of {}", indices.len(), values.len());
    let mut out = try_with_capacity(indices.len())?;
    out.extend(indices.iter().map(|&i| values[i]));
    Ok(out)
}

/// Gather fixed-size groups of `stride` elements: row `i` is
/// `values[i * stride .. (i + 1) * stride]`.
pub fn take_strided<T: Copy>(values: &[T], stride: usize, indices: &[usize]) -> Result<Vec<T>> {
    let rows = if stride == 0 { 0 } else { values.len() / stride };
    check_indices(indices, rows)?;
    let mut out = try_with_capacity(indices.len() * stride)?;
    for &i in indices {
        out.extend_from_slice(&values[i * stride..(i + 1) * stride]);
    }
    Ok(out)
}

pub fn take_bits(bits: &Bitmap, indices: &[usize]) -> Result<Bitmap> {
    check_indices(indices, bits.len())?;
    let mut builder = BitmapBuilder::with_capacity(indices.len())?;
    for &i in indices {
        builder.append(bits.get(i))?;
    }
    Ok(builder.finish())
}

/// Gather a validity bitmap. An absent bitmap stays absent, and a gathered
/// bitmap with no nulls left is dropped.
pub fn take_validity(validity: Option<&Bitmap>, indices: &[usize]) -> Result<Option<Bitmap>> {
    match validity {
        None => Ok(None),
        Some(bits) => {
            let taken = take_bits(bits, indices)?;
            Ok((taken.count_unset() > 0).then_some(taken))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_reorders_and_duplicates() {
        let values = [10i64, 20, 30];
        assert_eq!(take_values(&values, &[2, 0, 0, 1]).unwrap(), vec![30, 10, 10, 20]);
        assert!(take_values(&values, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_index_fails() {
        let err = take_values(&[1i64, 2], &[0, 2]).unwrap_err();
        assert!(matches!(err, VectorError::IndexOutOfBounds { index: 2, len: 2 }));
    }

    #[test]
    fn test_strided_take() {
        let pairs = [1i64, 100, 2, 200, 3, 300];
        assert_eq!(take_strided(&pairs, 2, &[2, 0]).unwrap(), vec![3, 300, 1, 100]);
        assert!(take_strided(&pairs, 2, &[3]).is_err());
    }

    #[test]
    fn test_validity_is_gathered_or_dropped() {
        let validity = Bitmap::from_bools([true, false, true]).unwrap();
        let taken = take_validity(Some(&validity), &[1, 1, 0]).unwrap().unwrap();
        assert_eq!(taken.iter().collect::<Vec<_>>(), vec![false, false, true]);
        assert!(take_validity(Some(&validity), &[0, 2]).unwrap().is_none());
        assert!(take_validity(None, &[0]).unwrap().is_none());
    }

    proptest::proptest! {
        #[test]
        fn test_gathered_bits_follow_indices(
            bits in proptest::collection::vec(proptest::bool::ANY, 1..200),
            picks in proptest::collection::vec(0usize..1000, 0..100),
        ) {
            let indices: Vec<usize> = picks.iter().map(|p| p % bits.len()).collect();
            let bitmap = Bitmap::from_bools(bits.iter().copied()).unwrap();
            let taken = take_bits(&bitmap, &indices).unwrap();
            let expected: Vec<bool> = indices.iter().map(|&i| bits[i]).collect();
            proptest::prop_assert_eq!(taken.iter().collect::<Vec<_>>(), expected);
        }
    }
}
