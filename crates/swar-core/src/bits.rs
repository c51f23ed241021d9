//! Bit-field reads over the little-endian `u64` digits of a `BigUint`.

use num_bigint::BigUint;

use crate::shape::{low_bits, Shape};

/// Read `width <= 64` bits starting at bit `offset`.
pub(crate) fn read_field(digits: &[u64], offset: u64, width: u32) -> u64 {
    let word = (offset / 64) as usize;
    let shift = (offset % 64) as u32;
    let lo = digits.get(word).copied().unwrap_or(0) >> shift;
    let hi = match shift {
        0 => 0,
        _ => digits.get(word + 1).copied().unwrap_or(0) << (64 - shift),
    };
    (lo | hi) & low_bits(width)
}

/// Iterator over lane values, lane 0 first.
///
/// Takes one snapshot of the backing digits, so a full pass is linear in the
/// array width.
#[derive(Debug, Clone)]
pub struct Iter {
    digits: Vec<u64>,
    shape: Shape,
    front: usize,
    back: usize,
}

impl Iter {
    pub(crate) fn new(data: &BigUint, shape: Shape) -> Self {
        Self {
            digits: data.to_u64_digits(),
            shape,
            front: 0,
            back: shape.len(),
        }
    }

    fn value_at(&self, index: usize) -> u64 {
        read_field(
            &self.digits,
            self.shape.lane_offset(index),
            self.shape.bits_val(),
        )
    }
}

impl Iterator for Iter {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.front >= self.back {
            return None;
        }
        let value = self.value_at(self.front);
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter {
    fn next_back(&mut self) -> Option<u64> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.value_at(self.back))
    }
}

impl ExactSizeIterator for Iter {}
