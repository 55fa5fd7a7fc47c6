//! Comparison kernels producing bit-packed boolean masks.
//!
//! Comparisons read the stored values only. Validity is ignored: a null row
//! compares as whatever bit pattern sits in its slot, and the result carries
//! no validity bitmap. Masking nulls is left to the caller.

use vector_memory::alloc::{bytes_for_bits, try_zeroed};
use vector_memory::{Bitmap, Result, VectorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    #[inline]
    pub fn apply<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Pack `pred(i)` for `i` in `0..len` into an LSB-first bitmap.
pub fn pack_bits(len: usize, mut pred: impl FnMut(usize) -> bool) -> Result<Bitmap> {
    let mut bytes: Vec<u8> = try_zeroed(bytes_for_bits(len))?;
    for (byte_idx, byte) in bytes.iter_mut().enumerate() {
        let base = byte_idx * 8;
        let end = (base + 8).min(len);
        let mut packed = 0u8;
        for i in base..end {
            packed |= (pred(i) as u8) << (i - base);
        }
        *byte = packed;
    }
    Bitmap::from_bytes(bytes, len)
}

pub fn check_lengths(left: usize, right: usize) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(VectorError::LengthMismatch { left, right })
    }
}

// One monomorphic loop per operator so the comparison is not re-dispatched
// per row.
macro_rules! comparison_kernels {
    ($($op:ident => $scalar_fn:ident, $slices_fn:ident, $cmp:tt;)*) => {
        $(
            pub fn $scalar_fn<T: PartialOrd + Copy>(values: &[T], scalar: T) -> Result<Bitmap> {
                pack_bits(values.len(), |i| values[i] $cmp scalar)
            }

            pub fn $slices_fn<T: PartialOrd + Copy>(left: &[T], right: &[T]) -> Result<Bitmap> {
                check_lengths(left.len(), right.len())?;
                pack_bits(left.len(), |i| left[i] $cmp right[i])
            }
        )*

        /// Compare every value against `scalar`.
        pub fn compare_scalar<T: PartialOrd + Copy>(values: &[T], scalar: T, op: CmpOp) -> Result<Bitmap> {
            match op {
                $(CmpOp::$op => $scalar_fn(values, scalar),)*
            }
        }

        /// Compare two equal-length slices element-wise.
        pub fn compare_slices<T: PartialOrd + Copy>(left: &[T], right: &[T], op: CmpOp) -> Result<Bitmap> {
            match op {
                $(CmpOp::$op => $slices_fn(left, right),)*
            }
        }
    };
}

comparison_kernels! {
    Eq => eq_scalar, eq_slices, ==;
    Ne => ne_scalar, ne_slices, !=;
    Lt => lt_scalar, lt_slices, <;
    Le => le_scalar, le_slices, <=;
    Gt => gt_scalar, gt_slices, >;
    Ge => ge_scalar, ge_slices, >=;
}
