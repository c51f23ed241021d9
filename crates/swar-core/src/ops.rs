//! Lane-wise arithmetic and bitwise operators.
//!
//! The `try_*` methods check shapes and return [`Result`]. The `std::ops`
//! impls delegate to them and panic on a shape mismatch, the same contract
//! slice and matrix operators use for length mismatches. Scalar operands are
//! reduced modulo `2^bits_val` and broadcast to every lane.

use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Neg, Not, Shl, Shr, Sub};

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::Result;
use crate::lanes::Lanes;
use crate::mask::{ones, Masks};

/// `(a + b) & value_mask`. The padding bit absorbs each lane's carry.
pub(crate) fn add_raw(m: &Masks, a: &BigUint, b: &BigUint) -> BigUint {
    (a + b) & m.value_mask()
}

/// `((a | pad_low) - b) & value_mask`. Setting the low padding bit lends
/// every lane `2^bits_val` so no borrow crosses a lane boundary.
pub(crate) fn sub_raw(m: &Masks, a: &BigUint, b: &BigUint) -> BigUint {
    ((a | m.pad_low()) - b) & m.value_mask()
}

/// Shift each lane left by `k` inside its value field.
fn shl_raw(m: &Masks, a: &BigUint, k: u32) -> BigUint {
    let bits_val = m.shape().bits_val();
    if k >= bits_val {
        return BigUint::zero();
    }
    (a & m.low_value_bits(bits_val - k)) << k
}

fn shr_raw(m: &Masks, a: &BigUint, k: u32) -> BigUint {
    if k >= m.shape().bits_val() {
        return BigUint::zero();
    }
    let keep = m.value_mask() ^ m.low_value_bits(k);
    (a & keep) >> k
}

/// Shift-and-add over the bits of `b`, one lane-wise add per bit.
fn mul_raw(m: &Masks, a: &BigUint, b: &BigUint) -> BigUint {
    let bits_val = m.shape().bits_val();
    // One lane wide, so each selected lane spreads only into its own field.
    let lane_value = ones(u64::from(bits_val));
    let mut acc = BigUint::zero();
    for i in 0..bits_val {
        let selected = (b >> i) & m.lane_ones();
        if selected.is_zero() {
            continue;
        }
        let spread = selected * &lane_value;
        let partial = shl_raw(m, &(a & spread), i);
        acc = add_raw(m, &acc, &partial);
    }
    acc
}

fn mul_scalar_raw(m: &Masks, a: &BigUint, c: u64) -> BigUint {
    let bits_val = m.shape().bits_val();
    let mut acc = BigUint::zero();
    for i in 0..bits_val {
        if (c >> i) & 1 == 0 {
            continue;
        }
        acc = add_raw(m, &acc, &shl_raw(m, a, i));
    }
    acc
}

impl Lanes {
    pub fn try_add(&self, rhs: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(rhs)?;
        Ok(self.with_data(add_raw(self.masks(), self.data(), rhs.data())))
    }

    pub fn try_sub(&self, rhs: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(rhs)?;
        Ok(self.with_data(sub_raw(self.masks(), self.data(), rhs.data())))
    }

    pub fn try_mul(&self, rhs: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(rhs)?;
        Ok(self.with_data(mul_raw(self.masks(), self.data(), rhs.data())))
    }

    pub fn try_and(&self, rhs: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(rhs)?;
        Ok(self.with_data(self.data() & rhs.data()))
    }

    pub fn try_or(&self, rhs: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(rhs)?;
        Ok(self.with_data(self.data() | rhs.data()))
    }

    pub fn try_xor(&self, rhs: &Lanes) -> Result<Lanes> {
        self.ensure_same_shape(rhs)?;
        Ok(self.with_data(self.data() ^ rhs.data()))
    }

    pub fn add_scalar(&self, rhs: u64) -> Lanes {
        let rhs = self.broadcast(rhs);
        self.with_data(add_raw(self.masks(), self.data(), rhs.data()))
    }

    /// `self - rhs` in every lane.
    pub fn sub_scalar(&self, rhs: u64) -> Lanes {
        let rhs = self.broadcast(rhs);
        self.with_data(sub_raw(self.masks(), self.data(), rhs.data()))
    }

    /// `lhs - self` in every lane.
    pub fn rsub_scalar(&self, lhs: u64) -> Lanes {
        let lhs = self.broadcast(lhs);
        self.with_data(sub_raw(self.masks(), lhs.data(), self.data()))
    }

    pub fn mul_scalar(&self, rhs: u64) -> Lanes {
        let rhs = rhs & self.shape().value_max();
        self.with_data(mul_scalar_raw(self.masks(), self.data(), rhs))
    }

    pub fn and_scalar(&self, rhs: u64) -> Lanes {
        self.with_data(self.data() & self.broadcast(rhs).data())
    }

    pub fn or_scalar(&self, rhs: u64) -> Lanes {
        self.with_data(self.data() | self.broadcast(rhs).data())
    }

    pub fn xor_scalar(&self, rhs: u64) -> Lanes {
        self.with_data(self.data() ^ self.broadcast(rhs).data())
    }

    /// Logical left shift of every lane; bits pushed out of a lane are lost.
    pub fn shift_left(&self, k: u32) -> Lanes {
        self.with_data(shl_raw(self.masks(), self.data(), k))
    }

    /// Logical right shift of every lane.
    pub fn shift_right(&self, k: u32) -> Lanes {
        self.with_data(shr_raw(self.masks(), self.data(), k))
    }

    /// Bitwise complement of every value field.
    pub fn invert(&self) -> Lanes {
        self.with_data(self.data() ^ self.masks().value_mask())
    }

    /// Two's complement negation of every lane; zero lanes stay zero.
    pub fn negate(&self) -> Lanes {
        let m = self.masks();
        self.with_data((m.pad_low() - self.data()) & m.value_mask())
    }
}

macro_rules! lane_binop {
    ($Trait:ident, $method:ident, $try:ident, $scalar:ident, $scalar_lhs:ident) => {
        /// # Panics
        ///
        /// Panics if the shapes differ; use the `try_` method to handle that.
        impl $Trait<&Lanes> for &Lanes {
            type Output = Lanes;

            fn $method(self, rhs: &Lanes) -> Lanes {
                match self.$try(rhs) {
                    Ok(out) => out,
                    Err(e) => panic!("{e}"),
                }
            }
        }

        impl $Trait<Lanes> for Lanes {
            type Output = Lanes;

            fn $method(self, rhs: Lanes) -> Lanes {
                $Trait::$method(&self, &rhs)
            }
        }

        impl $Trait<&Lanes> for Lanes {
            type Output = Lanes;

            fn $method(self, rhs: &Lanes) -> Lanes {
                $Trait::$method(&self, rhs)
            }
        }

        impl $Trait<Lanes> for &Lanes {
            type Output = Lanes;

            fn $method(self, rhs: Lanes) -> Lanes {
                $Trait::$method(self, &rhs)
            }
        }

        impl $Trait<u64> for &Lanes {
            type Output = Lanes;

            fn $method(self, rhs: u64) -> Lanes {
                self.$scalar(rhs)
            }
        }

        impl $Trait<u64> for Lanes {
            type Output = Lanes;

            fn $method(self, rhs: u64) -> Lanes {
                self.$scalar(rhs)
            }
        }

        impl $Trait<&Lanes> for u64 {
            type Output = Lanes;

            fn $method(self, rhs: &Lanes) -> Lanes {
                rhs.$scalar_lhs(self)
            }
        }

        impl $Trait<Lanes> for u64 {
            type Output = Lanes;

            fn $method(self, rhs: Lanes) -> Lanes {
                rhs.$scalar_lhs(self)
            }
        }
    };
}

lane_binop!(Add, add, try_add, add_scalar, add_scalar);
lane_binop!(Sub, sub, try_sub, sub_scalar, rsub_scalar);
lane_binop!(Mul, mul, try_mul, mul_scalar, mul_scalar);
lane_binop!(BitAnd, bitand, try_and, and_scalar, and_scalar);
lane_binop!(BitOr, bitor, try_or, or_scalar, or_scalar);
lane_binop!(BitXor, bitxor, try_xor, xor_scalar, xor_scalar);

macro_rules! lane_unop {
    ($Trait:ident, $method:ident, $inherent:ident) => {
        impl $Trait for &Lanes {
            type Output = Lanes;

            fn $method(self) -> Lanes {
                self.$inherent()
            }
        }

        impl $Trait for Lanes {
            type Output = Lanes;

            fn $method(self) -> Lanes {
                self.$inherent()
            }
        }
    };
}

lane_unop!(Not, not, invert);
lane_unop!(Neg, neg, negate);

impl Shl<u32> for &Lanes {
    type Output = Lanes;

    fn shl(self, k: u32) -> Lanes {
        self.shift_left(k)
    }
}

impl Shl<u32> for Lanes {
    type Output = Lanes;

    fn shl(self, k: u32) -> Lanes {
        self.shift_left(k)
    }
}

impl Shr<u32> for &Lanes {
    type Output = Lanes;

    fn shr(self, k: u32) -> Lanes {
        self.shift_right(k)
    }
}

impl Shr<u32> for Lanes {
    type Output = Lanes;

    fn shr(self, k: u32) -> Lanes {
        self.shift_right(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwarError;
    use crate::shape::Shape;

    fn s() -> Shape {
        Shape::new(5, 4, 4).unwrap()
    }

    fn small() -> Shape {
        Shape::new(4, 2, 2).unwrap()
    }

    fn lanes(data: u64, shape: Shape) -> Lanes {
        Lanes::new(BigUint::from(data), shape).unwrap()
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let a = lanes(0, s());
        let b = lanes(0, Shape::new(5, 3, 5).unwrap());
        assert!(matches!(a.try_add(&b), Err(SwarError::ShapeMismatch { .. })));
        assert!(matches!(a.try_xor(&b), Err(SwarError::ShapeMismatch { .. })));
    }

    #[test]
    #[should_panic(expected = "Shape mismatch")]
    fn test_operator_panics_on_mismatch() {
        let _ = lanes(0, s()) + lanes(0, small());
    }

    #[test]
    fn test_add_wraps_per_lane() {
        let a = Lanes::from_values([15, 15, 0, 7, 8], s()).unwrap();
        let b = Lanes::from_values([1, 15, 0, 9, 8], s()).unwrap();
        assert_eq!((&a + &b).to_vec(), vec![0, 14, 0, 0, 0]);
    }

    #[test]
    fn test_sub_borrow_stays_in_lane() {
        let a = Lanes::from_values([0, 1, 15, 0, 3], s()).unwrap();
        let b = Lanes::from_values([1, 1, 0, 15, 2], s()).unwrap();
        assert_eq!((&a - &b).to_vec(), vec![15, 0, 15, 1, 1]);
    }

    #[test]
    fn test_mul_with_minimal_padding() {
        // One padding bit must be enough: partial products never leak.
        let shape = Shape::new(4, 4, 1).unwrap();
        let a = Lanes::from_values([15, 7, 3, 12], shape).unwrap();
        let b = Lanes::from_values([15, 5, 0, 11], shape).unwrap();
        let expected: Vec<u64> = [(15, 15), (7, 5), (3, 0), (12, 11)]
            .iter()
            .map(|&(x, y)| (x * y) % 16)
            .collect();
        assert_eq!((&a * &b).to_vec(), expected);
    }

    #[test]
    fn test_mul_scalar_reduces_scalar() {
        let a = Lanes::from_values([1, 2, 3, 4, 5], s()).unwrap();
        assert_eq!((&a * 3).to_vec(), vec![3, 6, 9, 12, 15]);
        assert_eq!((&a * 19).to_vec(), (&a * 3).to_vec());
        assert_eq!((&a * 0).to_vec(), vec![0; 5]);
    }

    #[test]
    fn test_shifts_do_not_cross_lanes() {
        let shape = Shape::new(3, 4, 1).unwrap();
        let a = Lanes::from_values([0b1111, 0b1001, 0b0110], shape).unwrap();
        assert_eq!((&a << 3).to_vec(), vec![0b1000, 0b1000, 0b0000]);
        assert_eq!((&a >> 3).to_vec(), vec![0b0001, 0b0001, 0b0000]);
        assert_eq!((&a << 4).to_vec(), vec![0; 3]);
        assert_eq!((&a >> 9).to_vec(), vec![0; 3]);
        assert_eq!(&a << 0, a);
    }

    #[test]
    fn test_negate_zero_keeps_padding_clean() {
        let a = Lanes::from_values([0, 1, 8, 15, 0], s()).unwrap();
        let n = -&a;
        assert_eq!(n.to_vec(), vec![0, 15, 8, 1, 0]);
        assert!(Lanes::new(n.data().clone(), s()).is_ok());
    }

    #[test]
    fn test_scalar_on_the_left() {
        let a = lanes(0x05_04_03_02_01, s());
        assert_eq!(3u64 - &a, a.rsub_scalar(3));
        assert_eq!(14u64 + &a, &a + 14);
        assert_eq!(4u64 * a.clone(), a.clone() * 4);
    }
}
