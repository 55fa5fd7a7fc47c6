//! Row hashing for join and group-by keys.
//!
//! Every column folds one 64-bit digest per row into a shared output buffer
//! with [`mix_hash`]. Hashing several columns into the same buffer, one after
//! the other, yields a combined per-row key: equal rows always produce equal
//! keys, and column order changes the key. Collisions between different rows
//! are possible and must be resolved by the consumer with an equality check.

use tracing::trace;
use vector_memory::{Bitmap, Result, VectorError};
use xxhash_rust::xxh3::xxh3_64;

/// Multiplier of the mix step (the 64-bit golden ratio).
pub const MIX_HASH_CONSTANT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Digest substituted for a null row, whatever the column type.
pub const NULL_HASH: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed of the per-row digest of a nested (list) row.
pub const LIST_SEED: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// Rows per batch on the null-free path.
pub const HASH_BATCH_ROWS: usize = 256;

/// `(prev ^ value) * MIX_HASH_CONSTANT + 1`, then fold the high half down.
#[inline]
pub fn mix_hash(prev: u64, value: u64) -> u64 {
    let mixed = (prev ^ value)
        .wrapping_mul(MIX_HASH_CONSTANT)
        .wrapping_add(1);
    mixed ^ (mixed >> 32)
}

/// Mix `digests[i]` into `dest[i]` for every `i`.
#[inline]
pub fn mix_into(dest: &mut [u64], digests: &[u64]) {
    debug_assert_eq!(dest.len(), digests.len());
    for (d, v) in dest.iter_mut().zip(digests) {
        *d = mix_hash(*d, *v);
    }
}

/// Content hash of a byte string. Equal bytes always hash equal.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

#[inline]
pub fn digest_i64(v: i64) -> u64 {
    v as u64
}

/// Sign-extends, so a 4-byte value digests like the same value held in 8 bytes.
#[inline]
pub fn digest_i32(v: i32) -> u64 {
    v as i64 as u64
}

/// `-0.0` digests as `0.0` and every NaN as the canonical NaN.
#[inline]
pub fn digest_f64(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

#[inline]
pub fn digest_bool(v: bool) -> u64 {
    v as u64
}

/// The `len` output slots starting at `offset`.
pub fn output_window(out: &mut [u64], offset: usize, len: usize) -> Result<&mut [u64]> {
    let available = out.len().saturating_sub(offset);
    if len > available {
        return Err(VectorError::BufferTooSmall {
            needed: len,
            available,
        });
    }
    Ok(&mut out[offset..offset + len])
}

/// Fold `digest_at(i)` for rows `0..len` into `out[offset..offset + len]`.
///
/// Null rows (per `validity`) contribute [`NULL_HASH`] and `digest_at` is not
/// called for them. Without a validity bitmap the rows are digested in
/// batches of [`HASH_BATCH_ROWS`] with no per-row null branch.
pub fn hash_rows(
    out: &mut [u64],
    offset: usize,
    len: usize,
    validity: Option<&Bitmap>,
    mut digest_at: impl FnMut(usize) -> u64,
) -> Result<()> {
    let window = output_window(out, offset, len)?;
    trace!("hash_rows: {} rows at offset {}", len, offset);

    match validity {
        None => {
            let mut digests = [0u64; HASH_BATCH_ROWS];
            for (batch_idx, dest) in window.chunks_mut(HASH_BATCH_ROWS).enumerate() {
                let base = batch_idx * HASH_BATCH_ROWS;
                for (i, slot) in digests[..dest.len()].iter_mut().enumerate() {
                    *slot = digest_at(base + i);
                }
                mix_into(dest, &digests[..dest.len()]);
            }
        }
        Some(validity) => {
            for (i, dest) in window.iter_mut().enumerate() {
                let digest = if validity.get(i) { digest_at(i) } else { NULL_HASH };
                *dest = mix_hash(*dest, digest);
            }
        }
    }
    Ok(())
}

/// [`hash_rows`] over a slice of fixed-width values.
pub fn hash_values<T: Copy>(
    out: &mut [u64],
    offset: usize,
    values: &[T],
    validity: Option<&Bitmap>,
    digest: impl Fn(T) -> u64,
) -> Result<()> {
    hash_rows(out, offset, values.len(), validity, |i| digest(values[i]))
}
