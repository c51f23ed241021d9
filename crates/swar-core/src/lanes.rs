//! The packed array type.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bits::{read_field, Iter};
use crate::error::{Result, SwarError};
use crate::mask::Masks;
use crate::shape::Shape;

/// `len` unsigned lanes packed into one arbitrary-width integer.
///
/// ```text
/// Lanes(0x0504030201, S(len=5, bv=4, bp=4))
///
///    0    5     0    4     0    3     0    2     0    1
/// 0000 0101  0000 0100  0000 0011  0000 0010  0000 0001
/// ^^^^       ^^^^       ^^^^       ^^^^       ^^^^      padding
///      ^^^^       ^^^^       ^^^^       ^^^^       ^^^^ values
///         4          3          2          1          0 lane index
/// ```
///
/// Padding bits are zero in every value this type hands out. Arithmetic
/// wraps modulo `2^bits_val` per lane and never carries across lanes.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "LanesRepr", into = "LanesRepr")]
pub struct Lanes {
    data: BigUint,
    masks: Arc<Masks>,
}

impl Lanes {
    /// Wrap `data` laid out as `shape`.
    ///
    /// Fails if `data` is wider than the array or has a padding bit set.
    pub fn new(data: BigUint, shape: Shape) -> Result<Self> {
        let bits = data.bits();
        if bits > shape.total_bits() {
            debug!(%shape, bits, "rejecting data wider than the array");
            return Err(SwarError::DataTooWide {
                bits,
                capacity: shape.total_bits(),
                shape,
            });
        }

        let masks = Masks::for_shape(shape);
        let dirty = &data & masks.pad_mask();
        if !dirty.is_zero() {
            let first_bit = dirty.trailing_zeros().unwrap_or(0);
            let lane = (first_bit / u64::from(shape.bits_item())) as usize;
            debug!(%shape, lane, "rejecting data with non-zero padding");
            return Err(SwarError::DirtyPadding { lane, shape });
        }

        Ok(Self { data, masks })
    }

    /// All lanes zero.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            data: BigUint::zero(),
            masks: Masks::for_shape(shape),
        }
    }

    /// Every lane holds `value`.
    pub fn splat(value: u64, shape: Shape) -> Result<Self> {
        check_value(value, shape)?;
        let masks = Masks::for_shape(shape);
        let data = masks.lane_ones() * value;
        Ok(Self { data, masks })
    }

    /// Lane `i` holds the `i`-th value; exactly `shape.len()` values are required.
    pub fn from_values<I>(values: I, shape: Shape) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut data = BigUint::zero();
        let mut count = 0usize;
        for value in values {
            check_value(value, shape)?;
            if count < shape.len() && value != 0 {
                data |= BigUint::from(value) << shape.lane_offset(count);
            }
            count += 1;
        }
        if count != shape.len() {
            return Err(SwarError::LengthMismatch {
                expected: shape.len(),
                actual: count,
            });
        }
        Ok(Self {
            data,
            masks: Masks::for_shape(shape),
        })
    }

    /// Same shape, every lane `value` reduced modulo `2^bits_val`.
    pub fn broadcast(&self, value: u64) -> Self {
        let value = value & self.shape().value_max();
        self.with_data(self.masks.lane_ones() * value)
    }

    /// Build a result sharing this array's masks. `data` must already be clean.
    pub(crate) fn with_data(&self, data: BigUint) -> Self {
        Self {
            data,
            masks: Arc::clone(&self.masks),
        }
    }

    pub(crate) fn masks(&self) -> &Masks {
        &self.masks
    }

    pub fn shape(&self) -> Shape {
        self.masks.shape()
    }

    pub fn len(&self) -> usize {
        self.shape().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape().is_empty()
    }

    /// The backing integer.
    pub fn data(&self) -> &BigUint {
        &self.data
    }

    pub fn into_data(self) -> BigUint {
        self.data
    }

    /// Value of lane `index`.
    pub fn get(&self, index: usize) -> Option<u64> {
        self.get_padded(index).map(|(_, value)| value)
    }

    /// `(padding, value)` of lane `index`.
    pub fn get_padded(&self, index: usize) -> Option<(u64, u64)> {
        if index >= self.len() {
            return None;
        }
        let shape = self.shape();
        let digits = self.data.to_u64_digits();
        let offset = shape.lane_offset(index);
        let value = read_field(&digits, offset, shape.bits_val());
        let pad = read_field(&digits, offset + u64::from(shape.bits_val()), shape.bits_pad());
        Some((pad, value))
    }

    /// Lane values, lane 0 first.
    pub fn iter(&self) -> Iter {
        Iter::new(&self.data, self.shape())
    }

    pub fn to_vec(&self) -> Vec<u64> {
        self.iter().collect()
    }

    pub(crate) fn ensure_same_shape(&self, other: &Lanes) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(SwarError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }
}

fn check_value(value: u64, shape: Shape) -> Result<()> {
    if value > shape.value_max() {
        debug!(%shape, value, "lane value out of range");
        return Err(SwarError::ValueOutOfRange {
            value,
            bits_val: shape.bits_val(),
        });
    }
    Ok(())
}

impl PartialEq for Lanes {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.data == other.data
    }
}

impl Eq for Lanes {}

impl IntoIterator for &Lanes {
    type Item = u64;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

/// `[0000_0001, 0000_0010, ...]`, lane 0 first, padding then value bits.
impl fmt::Display for Lanes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self.shape();
        let bp = shape.bits_pad() as usize;
        let bv = shape.bits_val() as usize;
        let digits = self.data.to_u64_digits();
        write!(f, "[")?;
        for index in 0..self.len() {
            let offset = shape.lane_offset(index);
            let value = read_field(&digits, offset, shape.bits_val());
            let pad = read_field(&digits, offset + bv as u64, shape.bits_pad());
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pad:0bp$b}_{value:0bv$b}")?;
        }
        write!(f, "]")
    }
}

/// `Lanes(0x0504030201, S(len=5, bv=4, bp=4))`, data zero-padded to the
/// array width in hex digits.
impl fmt::Debug for Lanes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self.shape();
        let width = shape.total_bits().div_ceil(4).max(1) as usize;
        write!(f, "Lanes(0x{:0width$x}, {shape})", self.data)
    }
}

#[derive(Serialize, Deserialize)]
struct LanesRepr {
    shape: Shape,
    values: Vec<u64>,
}

impl From<Lanes> for LanesRepr {
    fn from(lanes: Lanes) -> Self {
        Self {
            shape: lanes.shape(),
            values: lanes.to_vec(),
        }
    }
}

impl TryFrom<LanesRepr> for Lanes {
    type Error = SwarError;

    fn try_from(repr: LanesRepr) -> Result<Self> {
        Lanes::from_values(repr.values, repr.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s() -> Shape {
        Shape::new(5, 4, 4).unwrap()
    }

    fn lanes(data: u64, shape: Shape) -> Lanes {
        Lanes::new(BigUint::from(data), shape).unwrap()
    }

    #[test]
    fn test_new_rejects_dirty_padding() {
        let err = Lanes::new(BigUint::from(0x05_04_63_02_01u64), s()).unwrap_err();
        assert_eq!(err, SwarError::DirtyPadding { lane: 2, shape: s() });
    }

    #[test]
    fn test_new_rejects_wide_data() {
        let err = Lanes::new(BigUint::from(0x01_05_04_03_02_01u64), s()).unwrap_err();
        assert!(matches!(err, SwarError::DataTooWide { bits: 41, capacity: 40, .. }));
    }

    #[test]
    fn test_wide_data_is_rejected_before_masks_are_built() {
        let shape = Shape::new(1_000_003, 7, 3).unwrap();
        let data = BigUint::from(1u32) << shape.total_bits();
        let err = Lanes::new(data, shape).unwrap_err();
        assert!(matches!(err, SwarError::DataTooWide { .. }));
        assert!(!Masks::is_cached(shape));
    }

    #[test]
    fn test_splat_and_values() {
        assert_eq!(Lanes::splat(5, s()).unwrap(), lanes(0x05_05_05_05_05, s()));
        assert!(Lanes::splat(16, s()).is_err());

        let a = Lanes::from_values([1, 2, 3, 4, 5], s()).unwrap();
        assert_eq!(a, lanes(0x05_04_03_02_01, s()));
        assert_eq!(a.to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_from_values_checks_count_and_range() {
        assert_eq!(
            Lanes::from_values([1, 2, 3], s()).unwrap_err(),
            SwarError::LengthMismatch { expected: 5, actual: 3 }
        );
        assert_eq!(
            Lanes::from_values([1, 2, 3, 4, 5, 6], s()).unwrap_err(),
            SwarError::LengthMismatch { expected: 5, actual: 6 }
        );
        assert!(Lanes::from_values([1, 2, 3, 4, 99], s()).is_err());
    }

    #[test]
    fn test_broadcast_wraps() {
        let a = Lanes::zeros(s());
        assert_eq!(a.broadcast(14), lanes(0x0e_0e_0e_0e_0e, s()));
        assert_eq!(a.broadcast(17), lanes(0x01_01_01_01_01, s()));
    }

    #[test]
    fn test_get() {
        let a = lanes(0x05_04_03_02_01, s());
        assert_eq!(a.len(), 5);
        assert_eq!(a.get(0), Some(1));
        assert_eq!(a.get(4), Some(5));
        assert_eq!(a.get(5), None);
        assert_eq!(a.get_padded(2), Some((0, 3)));
    }

    #[test]
    fn test_equality_includes_shape() {
        let other = Shape::new(5, 3, 5).unwrap();
        assert_eq!(lanes(0x02_04_02_04_02, s()), lanes(0x02_04_02_04_02, s()));
        assert_ne!(lanes(0x02_04_02_04_02, s()), lanes(0x02_04_02_04_03, s()));
        assert_ne!(lanes(0x02_04_02_04_02, s()), lanes(0x02_04_02_04_02, other));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            lanes(0x05_04_03_02_01, s()).to_string(),
            "[0000_0001, 0000_0010, 0000_0011, 0000_0100, 0000_0101]"
        );
        let empty = Lanes::zeros(Shape::new(0, 4, 4).unwrap());
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn test_debug() {
        assert_eq!(
            format!("{:?}", lanes(0x02_04_02_04_02, s())),
            "Lanes(0x0204020402, S(len=5, bv=4, bp=4))"
        );
        let odd = Shape::new(3, 3, 2).unwrap();
        assert_eq!(format!("{:?}", Lanes::zeros(odd)), "Lanes(0x0000, S(len=3, bv=3, bp=2))");
        let empty = Shape::new(0, 4, 4).unwrap();
        assert_eq!(format!("{:?}", Lanes::zeros(empty)), "Lanes(0x0, S(len=0, bv=4, bp=4))");
    }

    #[test]
    fn test_serde() {
        let a = lanes(0x05_04_03_02_01, s());
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "shape": {"len": 5, "bits_val": 4, "bits_pad": 4},
                "values": [1, 2, 3, 4, 5]
            })
        );
        let back: Lanes = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);

        let bad = serde_json::json!({
            "shape": {"len": 2, "bits_val": 4, "bits_pad": 4},
            "values": [1, 200]
        });
        assert!(serde_json::from_value::<Lanes>(bad).is_err());
    }
}
