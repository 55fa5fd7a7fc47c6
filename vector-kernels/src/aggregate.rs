//! Null-skipping reductions.

use vector_memory::{Bitmap, Result, VectorError};

fn valid_values<'a, T: Copy>(
    values: &'a [T],
    validity: Option<&'a Bitmap>,
) -> impl Iterator<Item = T> + 'a {
    values
        .iter()
        .enumerate()
        .filter(move |(i, _)| validity.map_or(true, |v| v.get(*i)))
        .map(|(_, v)| *v)
}

/// Smallest and largest valid value. `EmptyReduction` when there are none.
pub fn min_max<T: PartialOrd + Copy>(values: &[T], validity: Option<&Bitmap>) -> Result<(T, T)> {
    let mut iter = valid_values(values, validity);
    let first = iter.next().ok_or(VectorError::EmptyReduction)?;
    Ok(iter.fold((first, first), |(lo, hi), v| {
        (
            if v < lo { v } else { lo },
            if v > hi { v } else { hi },
        )
    }))
}

pub fn min<T: PartialOrd + Copy>(values: &[T], validity: Option<&Bitmap>) -> Result<T> {
    min_max(values, validity).map(|(lo, _)| lo)
}

pub fn max<T: PartialOrd + Copy>(values: &[T], validity: Option<&Bitmap>) -> Result<T> {
    min_max(values, validity).map(|(_, hi)| hi)
}

/// Checked integer sum of valid values; zero when there are none.
pub fn sum_i64(values: &[i64], validity: Option<&Bitmap>) -> Result<i64> {
    valid_values(values, validity).try_fold(0i64, |acc, v| acc.checked_add(v).ok_or(VectorError::Overflow))
}

/// Sum of valid values; zero when there are none.
pub fn sum_f64(values: &[f64], validity: Option<&Bitmap>) -> f64 {
    valid_values(values, validity).sum()
}
