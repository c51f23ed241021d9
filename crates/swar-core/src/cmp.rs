//! Lane-wise predicates, comparisons and reductions.
//!
//! Every comparison returns a mask array of the same shape holding 1 in the
//! lanes where it holds and 0 elsewhere. Ordering comparisons read the sign
//! bit of a lane-wise difference, so they are exact when both operands are
//! below `2^(bits_val - 1)`.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::Result;
use crate::lanes::Lanes;
use crate::mask::{ones, Masks};
use crate::ops::sub_raw;

/// 1 where the lane is non-zero.
///
/// Lending each lane `2^bits_val` and subtracting 1 leaves the low padding
/// bit set exactly when the lane was non-zero.
fn nonzero_raw(m: &Masks, a: &BigUint) -> BigUint {
    let lent = (a | m.pad_low()) - m.lane_ones();
    (lent >> m.shape().bits_val()) & m.lane_ones()
}

/// Bit `bits_val - 1` of every lane, moved to bit 0.
fn sign_raw(m: &Masks, a: &BigUint) -> BigUint {
    (a >> (m.shape().bits_val() - 1)) & m.lane_ones()
}

impl Lanes {
    /// 1 where the lane is non-zero.
    pub fn is_true(&self) -> Lanes {
        self.with_data(nonzero_raw(self.masks(), self.data()))
    }

    /// 1 where the lane is zero.
    pub fn is_false(&self) -> Lanes {
        let m = self.masks();
        self.with_data(nonzero_raw(m, self.data()) ^ m.lane_ones())
    }

    pub fn simd_eq(&self, rhs: &Lanes) -> Result<Lanes> {
        Ok(self.try_xor(rhs)?.is_false())
    }

    pub fn simd_ne(&self, rhs: &Lanes) -> Result<Lanes> {
        Ok(self.try_xor(rhs)?.is_true())
    }

    pub fn simd_lt(&self, rhs: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(rhs)?;
        let m = self.masks();
        Ok(self.with_data(sign_raw(m, &sub_raw(m, self.data(), rhs.data()))))
    }

    pub fn simd_gt(&self, rhs: &Lanes) -> Result<Lanes> {
        rhs.simd_lt(self)
    }

    pub fn simd_le(&self, rhs: &Lanes) -> Result<Lanes> {
        self.simd_lt(rhs)?.try_or(&self.simd_eq(rhs)?)
    }

    pub fn simd_ge(&self, rhs: &Lanes) -> Result<Lanes> {
        self.simd_gt(rhs)?.try_or(&self.simd_eq(rhs)?)
    }

    pub fn simd_eq_scalar(&self, rhs: u64) -> Lanes {
        self.xor_scalar(rhs).is_false()
    }

    pub fn simd_ne_scalar(&self, rhs: u64) -> Lanes {
        self.xor_scalar(rhs).is_true()
    }

    pub fn simd_lt_scalar(&self, rhs: u64) -> Lanes {
        let m = self.masks();
        self.with_data(sign_raw(m, self.sub_scalar(rhs).data()))
    }

    pub fn simd_gt_scalar(&self, rhs: u64) -> Lanes {
        let m = self.masks();
        self.with_data(sign_raw(m, self.rsub_scalar(rhs).data()))
    }

    pub fn simd_le_scalar(&self, rhs: u64) -> Lanes {
        self.simd_lt_scalar(rhs) | self.simd_eq_scalar(rhs)
    }

    pub fn simd_ge_scalar(&self, rhs: u64) -> Lanes {
        self.simd_gt_scalar(rhs) | self.simd_eq_scalar(rhs)
    }

    /// Lanes of `on_true` where `self` is non-zero, of `on_false` elsewhere.
    pub fn select(&self, on_true: &Lanes, on_false: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(on_true)?;
        self.ensure_same_shape(on_false)?;
        let m = self.masks();
        let pick = nonzero_raw(m, self.data()) * ones(u64::from(m.shape().bits_val()));
        let keep = m.value_mask() ^ &pick;
        Ok(self.with_data((on_true.data() & pick) | (on_false.data() & keep)))
    }

    /// Whether any lane is non-zero.
    pub fn any(&self) -> bool {
        !self.data().is_zero()
    }

    /// Whether every lane is non-zero. Vacuously true for an empty array.
    pub fn all(&self) -> bool {
        self.is_false().data().is_zero()
    }

    /// Number of non-zero lanes.
    pub fn count_true(&self) -> usize {
        self.iter().filter(|&value| value != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    fn s() -> Shape {
        Shape::new(5, 4, 4).unwrap()
    }

    fn vals(values: [u64; 5]) -> Lanes {
        Lanes::from_values(values, s()).unwrap()
    }

    #[test]
    fn test_truthiness() {
        let a = vals([1, 2, 3, 0, 15]);
        assert_eq!(a.is_true().to_vec(), vec![1, 1, 1, 0, 1]);
        assert_eq!(a.is_false().to_vec(), vec![0, 0, 0, 1, 0]);
        assert!(a.any());
        assert!(!a.all());
        assert_eq!(a.count_true(), 4);
    }

    #[test]
    fn test_truthiness_with_one_padding_bit() {
        let shape = Shape::new(4, 3, 1).unwrap();
        let a = Lanes::from_values([0, 7, 0, 1], shape).unwrap();
        assert_eq!(a.is_true().to_vec(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_empty_reductions() {
        let empty = Lanes::zeros(Shape::new(0, 4, 4).unwrap());
        assert!(!empty.any());
        assert!(empty.all());
        assert_eq!(empty.count_true(), 0);
    }

    #[test]
    fn test_scalar_comparisons() {
        let a = vals([1, 2, 3, 4, 5]);
        assert_eq!(a.simd_eq_scalar(3).to_vec(), vec![0, 0, 1, 0, 0]);
        assert_eq!(a.simd_ne_scalar(3).to_vec(), vec![1, 1, 0, 1, 1]);
        assert_eq!(a.simd_lt_scalar(3).to_vec(), vec![1, 1, 0, 0, 0]);
        assert_eq!(a.simd_gt_scalar(3).to_vec(), vec![0, 0, 0, 1, 1]);
        assert_eq!(a.simd_le_scalar(3).to_vec(), vec![1, 1, 1, 0, 0]);
        assert_eq!(a.simd_ge_scalar(3).to_vec(), vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_select() {
        let mask = vals([1, 0, 7, 0, 1]);
        let yes = vals([10, 11, 12, 13, 14]);
        let no = vals([1, 2, 3, 4, 5]);
        assert_eq!(mask.select(&yes, &no).unwrap().to_vec(), vec![10, 2, 12, 4, 14]);
    }
}
