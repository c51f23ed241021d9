//! Lane layout of a packed array.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwarError};

/// Widest value or padding field a lane may carry.
pub const MAX_FIELD_BITS: u32 = 64;

/// Widest backing integer a shape may describe (`len * bits_item`).
///
/// Every shape gets a cached set of full-width masks, so this bounds the
/// memory one shape can pin at a few hundred MiB.
pub const MAX_TOTAL_BITS: u64 = 1 << 30;

/// Layout of a packed array: `len` lanes of `bits_pad + bits_val` bits each.
///
/// Lane `i` occupies bits `[i * bits_item, (i + 1) * bits_item)` of the
/// backing integer; its low `bits_val` bits hold the value and the high
/// `bits_pad` bits are padding that absorbs carries and borrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawShape")]
pub struct Shape {
    len: usize,
    bits_val: u32,
    bits_pad: u32,
}

#[derive(Deserialize)]
struct RawShape {
    len: usize,
    bits_val: u32,
    bits_pad: u32,
}

impl TryFrom<RawShape> for Shape {
    type Error = SwarError;

    fn try_from(raw: RawShape) -> Result<Self> {
        Shape::new(raw.len, raw.bits_val, raw.bits_pad)
    }
}

impl Shape {
    /// Create a validated shape.
    ///
    /// Both fields must be at least one bit wide: lane arithmetic relies on
    /// at least one padding bit, and a zero-width value carries nothing.
    pub fn new(len: usize, bits_val: u32, bits_pad: u32) -> Result<Self> {
        if bits_val == 0 || bits_val > MAX_FIELD_BITS {
            return Err(SwarError::InvalidShape(format!(
                "bits_val must be in 1..={MAX_FIELD_BITS}, got {bits_val}"
            )));
        }
        if bits_pad == 0 || bits_pad > MAX_FIELD_BITS {
            return Err(SwarError::InvalidShape(format!(
                "bits_pad must be in 1..={MAX_FIELD_BITS}, got {bits_pad}"
            )));
        }
        let total_bits = (len as u128) * u128::from(bits_val + bits_pad);
        if total_bits > u128::from(MAX_TOTAL_BITS) {
            return Err(SwarError::InvalidShape(format!(
                "{len} lanes of {} bits exceed the {MAX_TOTAL_BITS}-bit limit",
                bits_val + bits_pad
            )));
        }
        Ok(Self {
            len,
            bits_val,
            bits_pad,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits_val(&self) -> u32 {
        self.bits_val
    }

    pub fn bits_pad(&self) -> u32 {
        self.bits_pad
    }

    /// Width of one lane (padding plus value).
    pub fn bits_item(&self) -> u32 {
        self.bits_val + self.bits_pad
    }

    /// Width of the whole backing integer.
    pub fn total_bits(&self) -> u64 {
        self.len as u64 * u64::from(self.bits_item())
    }

    /// Largest value a lane can hold.
    pub fn value_max(&self) -> u64 {
        low_bits(self.bits_val)
    }

    /// Bit offset of lane `index` in the backing integer.
    pub(crate) fn lane_offset(&self, index: usize) -> u64 {
        index as u64 * u64::from(self.bits_item())
    }
}

/// `bits` low bits set, for `bits <= 64`.
pub(crate) fn low_bits(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S(len={}, bv={}, bp={})",
            self.len, self.bits_val, self.bits_pad
        )
    }
}

/// Parses `LEN,BV,BP` or `LENxBVxBP`.
impl FromStr for Shape {
    type Err = SwarError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c == 'x' || c == 'X')
            .map(str::trim)
            .collect();
        if parts.len() != 3 {
            return Err(SwarError::InvalidShape(format!(
                "expected LEN,BV,BP, got '{s}'"
            )));
        }
        let field = |name: &str, raw: &str| -> Result<u64> {
            raw.parse::<u64>()
                .map_err(|e| SwarError::InvalidShape(format!("{name} '{raw}': {e}")))
        };
        let len = field("len", parts[0])?;
        let bits_val = field("bits_val", parts[1])?;
        let bits_pad = field("bits_pad", parts[2])?;

        let len = usize::try_from(len)
            .map_err(|_| SwarError::InvalidShape(format!("len {len} is too large")))?;
        let narrow = |name: &str, v: u64| {
            u32::try_from(v)
                .map_err(|_| SwarError::InvalidShape(format!("{name} {v} is too large")))
        };
        Shape::new(len, narrow("bits_val", bits_val)?, narrow("bits_pad", bits_pad)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_width_fields() {
        assert!(Shape::new(5, 0, 4).is_err());
        assert!(Shape::new(5, 4, 0).is_err());
        assert!(Shape::new(5, 65, 4).is_err());
        assert!(Shape::new(0, 4, 4).is_ok(), "empty arrays are allowed");
    }

    #[test]
    fn test_rejects_arrays_past_the_total_width_limit() {
        let lanes_at_limit = (MAX_TOTAL_BITS / 8) as usize;
        assert_eq!(Shape::new(lanes_at_limit, 4, 4).unwrap().total_bits(), MAX_TOTAL_BITS);
        assert!(matches!(
            Shape::new(lanes_at_limit + 1, 4, 4),
            Err(SwarError::InvalidShape(_))
        ));
        assert!("100000000000000,4,4".parse::<Shape>().is_err());
        assert!(Shape::new(usize::MAX, 64, 64).is_err());
    }

    #[test]
    fn test_derived_widths() {
        let s = Shape::new(5, 4, 4).unwrap();
        assert_eq!(s.bits_item(), 8);
        assert_eq!(s.total_bits(), 40);
        assert_eq!(s.value_max(), 15);
        assert_eq!(s.lane_offset(3), 24);
        assert_eq!(Shape::new(1, 64, 1).unwrap().value_max(), u64::MAX);
    }

    #[test]
    fn test_display() {
        let s = Shape::new(5, 4, 4).unwrap();
        assert_eq!(s.to_string(), "S(len=5, bv=4, bp=4)");
    }

    #[test]
    fn test_parse() {
        let s: Shape = "5,4,4".parse().unwrap();
        assert_eq!(s, Shape::new(5, 4, 4).unwrap());
        let s: Shape = "3x8x4".parse().unwrap();
        assert_eq!(s, Shape::new(3, 8, 4).unwrap());
        assert!("5,4".parse::<Shape>().is_err());
        assert!("5,four,4".parse::<Shape>().is_err());
        assert!("5,4,0".parse::<Shape>().is_err());
    }

    #[test]
    fn test_serde_validates() {
        let s = Shape::new(4, 2, 2).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"len":4,"bits_val":2,"bits_pad":2}"#);
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);

        let bad = serde_json::from_str::<Shape>(r#"{"len":4,"bits_val":2,"bits_pad":0}"#);
        assert!(bad.is_err(), "zero padding must be rejected on deserialize");
    }
}
